//! HTTP request handlers for the web server.

mod api;
mod helpers;
mod jobs;

pub use api::{api_sources, api_status, health};
pub use jobs::list_jobs;
