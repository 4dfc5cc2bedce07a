pub mod storage;

pub use storage::TaskStorage;
