//! Homebase: personal dashboard for todos, bills, income, accounts and jobs.

pub mod api;
pub mod collection;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod filter;
pub mod model;
pub mod recurrence;
pub mod repo;
pub mod session;
pub mod stats;
pub mod store;
pub mod views;

pub use error::{Error, Result};
