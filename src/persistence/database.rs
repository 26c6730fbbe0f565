mod postgres;

pub use postgres::Repository;
