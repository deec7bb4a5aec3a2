pub mod store;

pub use store::KeywordStore;
