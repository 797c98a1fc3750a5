mod error;
mod hash;
mod traits;

pub mod filesystem;

pub use error::StorageError;
pub use hash::ContentHash;
pub use traits::{BoxReader, FileStore, SNIFF_LEN, SourceReader, StagedFile, StoredKey};
