//! Task Calendar library
//!
//! Task store, calendar aggregation, image uploads and the web surface,
//! exported for the binary and the integration tests.

pub mod calendar;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod types;
pub mod uploads;
pub mod web;
