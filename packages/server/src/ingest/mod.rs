mod error;
mod policy;
mod query;
mod service;

pub use error::{UploadError, UploadRejection};
pub use policy::UploadPolicy;
pub use query::{ListParams, SortField, SortOrder};
pub use service::{FilePage, UploadOutcome, UploadService};
