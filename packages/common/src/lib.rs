pub mod sniff;
pub mod storage;
