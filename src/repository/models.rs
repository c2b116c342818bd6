//! Diesel ORM models for database tables.

use diesel::prelude::*;

use crate::models::JobPosting;
use crate::schema;

/// Job record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::jobs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct JobRecord {
    pub id: i32,
    pub title: String,
    pub company: String,
    pub url: String,
    pub source: String,
    pub category: String,
    pub location: String,
    pub salary: Option<String>,
    pub posted_at: Option<String>,
    pub created_at: String,
    pub hash: String,
}

impl From<JobRecord> for JobPosting {
    fn from(record: JobRecord) -> Self {
        JobPosting {
            id: record.id,
            title: record.title,
            company: record.company,
            url: record.url,
            source: record.source,
            category: record.category,
            location: record.location,
            salary: record.salary,
            posted_at: record.posted_at,
            created_at: record.created_at,
            hash: record.hash,
        }
    }
}

/// New job for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::jobs)]
pub struct NewJob<'a> {
    pub title: &'a str,
    pub company: &'a str,
    pub url: &'a str,
    pub source: &'a str,
    pub category: &'a str,
    pub location: &'a str,
    pub salary: Option<&'a str>,
    pub posted_at: Option<&'a str>,
    pub created_at: &'a str,
    pub hash: &'a str,
}
