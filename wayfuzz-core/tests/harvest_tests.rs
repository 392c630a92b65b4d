// End-to-end tests for the harvest pipeline against a mock archive index

use std::collections::HashMap;
use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncReadExt, BufReader, ReadBuf};
use wayfuzz_core::filter::FilterConfig;
use wayfuzz_core::harvest::{
    DomainErrorCallback, HarvestOptions, HarvestProgressCallback, execute_harvest,
};
use wayfuzz_scanner::{ArchiveClient, ArchiveError, StatusCodes};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

const EXAMPLE_COM: &str = "\
com,example)/ 20150101000000 http://example.com/ text/html 200 A 1
com,example)/foo/bar 20150101000000 http://www.example.com/foo/bar text/html 200 B 1
com,example)/img/logo.png 20160101000000 https://cdn.example.com:443/img/logo.png image/png 200 C 1
com,example)/old 20170101000000 http://example.com/old text/html 404 D 1
";

const EXAMPLE_ORG: &str = "\
org,example)/foo/bar 20150101000000 http://example.org/foo/bar text/html 200 E 1
org,example)/zeta 20150101000000 http://api.example.org/zeta text/html 301 F 1
";

async fn mock_index() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cdx"))
        .and(query_param("url", "*.example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_string(EXAMPLE_COM))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cdx"))
        .and(query_param("url", "*.example.org"))
        .respond_with(ResponseTemplate::new(200).set_body_string(EXAMPLE_ORG))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cdx"))
        .and(query_param("url", "*.broken.net"))
        .respond_with(ResponseTemplate::new(500).set_body_string(EXAMPLE_COM))
        .mount(&server)
        .await;

    server
}

fn options_for(server: &MockServer, filter: FilterConfig, concurrency: usize) -> HarvestOptions {
    let client = ArchiveClient::new()
        .unwrap()
        .with_endpoint(&format!("{}/cdx", server.uri()))
        .unwrap();
    let mut options = HarvestOptions::new(client);
    options.filter = filter;
    options.concurrency = concurrency;
    options
}

fn input(lines: &str) -> Cursor<Vec<u8>> {
    Cursor::new(lines.as_bytes().to_vec())
}

#[tokio::test]
async fn test_single_domain_normalized_and_sorted() {
    let server = mock_index().await;
    let options = options_for(&server, FilterConfig::new(), 2);

    let report = execute_harvest(input("example.com\n"), options, None, None)
        .await
        .unwrap();

    assert_eq!(report.entries, vec!["/", "/foo/bar", "/img/logo.png", "/old"]);
    assert_eq!(report.domains_total, 1);
    assert_eq!(report.domains_failed, 0);
}

#[tokio::test]
async fn test_duplicates_across_domains_collapse() {
    let server = mock_index().await;
    let options = options_for(&server, FilterConfig::new(), 4);

    let report = execute_harvest(input("example.com\nexample.org\n"), options, None, None)
        .await
        .unwrap();

    let occurrences = report.entries.iter().filter(|e| *e == "/foo/bar").count();
    assert_eq!(occurrences, 1);
    assert_eq!(
        report.entries,
        vec!["/", "/foo/bar", "/img/logo.png", "/old", "/zeta"]
    );
}

#[tokio::test]
async fn test_failed_domain_is_isolated() {
    let server = mock_index().await;
    let options = options_for(&server, FilterConfig::new(), 3);

    let errors: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let errors_clone = errors.clone();
    let error_callback: DomainErrorCallback = Arc::new(move |domain: &str, error: &ArchiveError| {
        errors_clone
            .lock()
            .unwrap()
            .push(format!("{}: {}", domain, error));
    });

    let report = execute_harvest(
        input("broken.net\nexample.org\n"),
        options,
        None,
        Some(error_callback),
    )
    .await
    .unwrap();

    // broken.net served the same body as example.com with a 500; none of it may leak.
    assert_eq!(report.entries, vec!["/foo/bar", "/zeta"]);
    assert_eq!(report.domains_total, 2);
    assert_eq!(report.domains_failed, 1);

    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("broken.net: "));
    assert!(errors[0].contains("500"));
}

#[tokio::test]
async fn test_status_and_exclude_filters() {
    let server = mock_index().await;
    let filter = FilterConfig::new()
        .with_exclude_pattern(r"\.png$")
        .unwrap()
        .with_status_codes(StatusCodes::new([200]).unwrap());
    let options = options_for(&server, filter, 2);

    let report = execute_harvest(input("example.com\nexample.org\n"), options, None, None)
        .await
        .unwrap();

    assert_eq!(report.entries, vec!["/", "/foo/bar"]);
}

#[tokio::test]
async fn test_separate_slash_segments() {
    let server = mock_index().await;
    let options = options_for(&server, FilterConfig::new().with_separate_slash(true), 2);

    let report = execute_harvest(input("example.com\n"), options, None, None)
        .await
        .unwrap();

    assert_eq!(report.entries, vec!["bar", "foo", "img", "logo.png", "old"]);
}

#[tokio::test]
async fn test_output_is_deterministic_across_runs_and_pool_sizes() {
    let server = mock_index().await;
    let domains = "example.org\nexample.com\nbroken.net\nexample.com\n";

    let mut outputs = Vec::new();
    let silent: DomainErrorCallback = Arc::new(|_: &str, _: &ArchiveError| {});
    for concurrency in [1, 2, 8] {
        let options = options_for(&server, FilterConfig::new(), concurrency);
        let report = execute_harvest(
            input(domains),
            options,
            None,
            Some(silent.clone()),
        )
        .await
        .unwrap();
        outputs.push(report.entries);
    }

    assert_eq!(outputs[0], outputs[1]);
    assert_eq!(outputs[1], outputs[2]);

    let mut sorted = outputs[0].clone();
    sorted.sort();
    assert_eq!(outputs[0], sorted);
}

#[tokio::test]
async fn test_blank_lines_are_not_fetched() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("url", "*.example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_string(EXAMPLE_COM))
        .expect(1)
        .mount(&server)
        .await;

    let options = options_for(&server, FilterConfig::new(), 2);
    let report = execute_harvest(input("\n  \nexample.com\n\n"), options, None, None)
        .await
        .unwrap();

    assert_eq!(report.domains_total, 1);
    assert_eq!(report.entries.len(), 4);
}

#[tokio::test]
async fn test_progress_callback_sees_every_domain() {
    let server = mock_index().await;
    let options = options_for(&server, FilterConfig::new(), 3);

    let seen: Arc<Mutex<HashMap<String, usize>>> = Arc::new(Mutex::new(HashMap::new()));
    let seen_clone = seen.clone();
    let progress_callback: HarvestProgressCallback = Arc::new(move |worker_id: usize, domain: String| {
        assert!(worker_id < 3);
        *seen_clone.lock().unwrap().entry(domain).or_insert(0) += 1;
    });

    execute_harvest(
        input("example.com\nexample.org\n"),
        options,
        Some(progress_callback),
        None,
    )
    .await
    .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.get("example.com"), Some(&1));
    assert_eq!(seen.get("example.org"), Some(&1));
}

/// Input source that fails every read.
struct FailingReader;

impl AsyncRead for FailingReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::other("input device went away")))
    }
}

async fn per_domain_index() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("url", "*.example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "com,example)/a 20150101000000 http://example.com/a text/html 200 A 1\n",
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(query_param("url", "*.example.org"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "org,example)/b 20150101000000 http://www.example.org/b text/html 200 B 1\n",
        ))
        .mount(&server)
        .await;

    server
}

#[tokio::test]
async fn test_invalid_utf8_domain_fails_alone() {
    let server = per_domain_index().await;
    let options = options_for(&server, FilterConfig::new(), 2);

    let errors: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let errors_clone = errors.clone();
    let error_callback: DomainErrorCallback = Arc::new(move |domain: &str, _: &ArchiveError| {
        errors_clone.lock().unwrap().push(domain.to_string());
    });

    let raw = b"example.com\nbad\xff\xfe.com\nexample.org\n".to_vec();
    let report = execute_harvest(Cursor::new(raw), options, None, Some(error_callback))
        .await
        .unwrap();

    assert_eq!(report.entries, vec!["/a", "/b"]);
    assert_eq!(report.domains_total, 3);
    assert_eq!(report.domains_failed, 1);
    assert_eq!(*errors.lock().unwrap(), vec!["bad\u{FFFD}\u{FFFD}.com"]);
}

#[tokio::test]
async fn test_input_read_error_keeps_collected_results() {
    let server = per_domain_index().await;
    let options = options_for(&server, FilterConfig::new(), 2);

    let reader = BufReader::new(Cursor::new(b"example.com\n".to_vec()).chain(FailingReader));
    let report = execute_harvest(reader, options, None, None).await.unwrap();

    assert_eq!(report.entries, vec!["/a"]);
    assert_eq!(report.domains_total, 1);
    assert_eq!(report.domains_failed, 0);
}
