//! jobfeed - remote job postings aggregator.
//!
//! Pulls postings from job boards (JSON APIs, RSS/Atom feeds, ATS boards)
//! into a SQLite store and serves a filtered query API over it.

pub mod cli;
pub mod config;
pub mod ingest;
pub mod models;
pub mod repository;
pub mod schema;
pub mod server;
pub mod sources;
