pub mod archive;
pub mod error;
pub mod normalize;
pub mod record;
pub mod status;

pub use archive::{ArchiveClient, DEFAULT_ENDPOINT};
pub use error::ArchiveError;
pub use normalize::{DomainNormalizer, normalize};
pub use record::ArchiveRecord;
pub use status::StatusCodes;
