pub mod files;
pub mod shared;
