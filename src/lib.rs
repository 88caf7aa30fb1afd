pub mod access;
pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod scoring;

pub use db::Database;
pub use error::{TrackerError, TrackerResult};
