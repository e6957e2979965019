//! Persistence layer: one `TableStore` trait, a local libSQL backend and a
//! hosted REST backend.

pub mod libsql_backend;
pub mod migrations;
pub mod query;
pub mod rest;
pub mod schema;
pub mod traits;

pub use libsql_backend::LibSqlStore;
pub use query::{Filter, Order, Query};
pub use rest::RestStore;
pub use traits::{Row, TableStore};
