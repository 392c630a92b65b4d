pub mod collect;
pub mod filter;
pub mod harvest;
pub mod report;

pub use collect::Collector;
pub use filter::FilterConfig;
pub use harvest::{
    DEFAULT_CONCURRENCY, DomainErrorCallback, HarvestOptions, HarvestProgressCallback,
    HarvestReport, execute_harvest, harvest_domain,
};
pub use report::{OutputFormat, write_entries};
