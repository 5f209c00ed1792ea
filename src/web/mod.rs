//! Web surface: HTML pages, form posts that redirect with a notice, and JSON endpoints.

mod calendar;
pub mod render;
pub mod response;
mod server;
mod subtasks;
mod tasks;
pub mod templates;

pub use response::{Notice, NoticeLevel};
pub use server::{AppState, build_router, start_server};
