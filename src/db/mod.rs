mod repository;
mod schema;
mod store;

pub use repository::Repository;
pub use store::{HeadlineStore, StoreError};

#[cfg(test)]
pub use store::MemoryStore;
