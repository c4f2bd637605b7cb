pub mod json_store;
pub mod local;

pub use json_store::JsonStore;
pub use local::DataDirStorage;
