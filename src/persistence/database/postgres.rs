mod repository;
mod statements_cache;

pub use repository::Repository;
