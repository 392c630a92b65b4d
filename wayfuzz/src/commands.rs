use clap::arg;
use url::Url;
use wayfuzz_scanner::DEFAULT_ENDPOINT;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("wayfuzz")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("wayfuzz")
        .styles(CLAP_STYLING)
        .about(
            "Reads domains (one per line) and prints the deduplicated, sorted paths the web \
            archive has seen for them.",
        )
        .arg(
            arg!(-c --"concurrency" <NUM_WORKERS>)
                .required(false)
                .help("Number of domains fetched concurrently")
                .value_parser(clap::value_parser!(usize))
                .default_value("10"),
        )
        .arg(
            arg!(-x --"exclude" <REGEX>)
                .required(false)
                .help("Drop entries matching this regex (e.g. '\\.(jpg|png)$')"),
        )
        .arg(
            arg!(--"separate-slash")
                .required(false)
                .visible_alias("sed")
                .help("Split surviving paths on '/' and emit each segment separately")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(-s --"status" <CODES>)
                .required(false)
                .help("Only keep snapshots with these HTTP status codes (comma separated, e.g. 200,301)"),
        )
        .arg(
            arg!(-i --"input" <PATH>)
                .required(false)
                .help("Read domains from this file instead of stdin")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            arg!(-o --"output" <PATH>)
                .required(false)
                .help("Write results to this file instead of stdout")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            arg!(-f --"format" <FORMAT>)
                .required(false)
                .help("Output format: text, json")
                .value_parser(["text", "json"])
                .default_value("text"),
        )
        .arg(
            arg!(--"timeout" <SECONDS>)
                .required(false)
                .help("Per-domain fetch deadline in seconds (0 disables it)")
                .value_parser(clap::value_parser!(u64))
                .default_value("120"),
        )
        .arg(
            arg!(--"endpoint" <URL>)
                .required(false)
                .help("Archive CDX index endpoint")
                .value_parser(clap::value_parser!(Url))
                .default_value(DEFAULT_ENDPOINT),
        )
        .arg(
            arg!(-p --"progress")
                .required(false)
                .help("Show a progress spinner on stderr")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(-q --"quiet")
                .required(false)
                .help("Suppress the summary line on stderr")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(-v --"verbose")
                .required(false)
                .help("Enable debug logging on stderr")
                .action(clap::ArgAction::SetTrue),
        )
}
