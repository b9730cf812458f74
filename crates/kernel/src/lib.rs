//! Tuskfish CMS Kernel Library
//!
//! Criteria composition, content handlers, and the HTTP surface over them.
//! The main entry point for running the server is the `tuskfish` binary.

pub mod config;
pub mod content;
pub mod criteria;
pub mod db;
pub mod error;
pub mod routes;
pub mod state;

pub use config::Config;
pub use state::AppState;
