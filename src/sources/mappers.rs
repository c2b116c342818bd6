//! Per-source mappers from native payloads to [`NormalizedJob`].
//!
//! Every mapper is a pure function of the upstream record plus the source
//! context (source key, board token, company handle). Missing fields fall
//! back to the defaults applied by [`RawJob::normalize`].

use serde_json::{Number, Value};

use super::dates::{normalize_timestamp, normalize_value};
use super::feed::FeedItem;
use crate::models::{JsonBoard, NormalizedJob, RawJob, SourceDescriptor, SourceKind};

/// Map a decoded JSON payload for the given source into normalized jobs.
///
/// Entries that are not JSON objects are skipped.
pub fn map_json_payload(source: &SourceDescriptor, payload: &Value) -> Vec<NormalizedJob> {
    let key = source.source_key();
    let records = records_for(&source.kind, payload);

    records
        .into_iter()
        .filter(|r| r.is_object())
        .filter_map(|r| match &source.kind {
            SourceKind::Json { board, .. } => Some(match board {
                JsonBoard::Jobicy => map_jobicy(r, &key),
                JsonBoard::Remotive => map_remotive(r, &key),
                JsonBoard::RemoteOk => map_remote_ok(r, &key),
                JsonBoard::Arbeitnow => map_arbeitnow(r, &key),
                JsonBoard::WorkingNomads => map_working_nomads(r, &key),
            }),
            SourceKind::Greenhouse { board } => Some(map_greenhouse(r, &key, board)),
            SourceKind::Lever { company } => Some(map_lever(r, &key, company)),
            SourceKind::HackerNews { .. } => Some(map_hacker_news(r, &key)),
            SourceKind::Feed { .. } => None,
        })
        .collect()
}

/// Map parsed feed items for the given source.
pub fn map_feed_items(source: &SourceDescriptor, items: &[FeedItem]) -> Vec<NormalizedJob> {
    let key = source.source_key();
    items.iter().map(|item| map_feed_item(item, &key)).collect()
}

/// Locate the record list inside a payload.
fn records_for<'a>(kind: &SourceKind, payload: &'a Value) -> Vec<&'a Value> {
    let list = match kind {
        SourceKind::Json { board, .. } => match board {
            JsonBoard::Jobicy | JsonBoard::Remotive => payload.get("jobs"),
            JsonBoard::Arbeitnow => payload.get("data"),
            JsonBoard::RemoteOk => {
                // First element is the API's legal notice.
                return payload
                    .as_array()
                    .map(|a| a.iter().skip(1).collect())
                    .unwrap_or_default();
            }
            JsonBoard::WorkingNomads => Some(payload),
        },
        SourceKind::Greenhouse { .. } => payload.get("jobs"),
        SourceKind::Lever { .. } => Some(payload),
        SourceKind::HackerNews { .. } => payload.get("hits"),
        SourceKind::Feed { .. } => None,
    };

    list.and_then(Value::as_array)
        .map(|a| a.iter().collect())
        .unwrap_or_default()
}

pub fn map_jobicy(record: &Value, source: &str) -> NormalizedJob {
    RawJob {
        title: text(record, "jobTitle"),
        company: text(record, "companyName"),
        url: text(record, "url"),
        category: joined(record, "jobIndustry"),
        location: text(record, "jobGeo"),
        salary: salary_range(record, "salaryMin", "salaryMax", "salaryCurrency"),
        posted_at: date(record, &["pubDate"]),
    }
    .normalize(source)
}

pub fn map_remote_ok(record: &Value, source: &str) -> NormalizedJob {
    RawJob {
        title: first_text(record, &["position", "title"]),
        company: text(record, "company"),
        url: text(record, "url"),
        category: joined(record, "tags"),
        location: text(record, "location"),
        salary: salary_range(record, "salary_min", "salary_max", "salary_currency")
            .or_else(|| text(record, "salary")),
        posted_at: date(record, &["date", "created_at"]),
    }
    .normalize(source)
}

pub fn map_remotive(record: &Value, source: &str) -> NormalizedJob {
    RawJob {
        title: text(record, "title"),
        company: text(record, "company_name"),
        url: text(record, "url"),
        category: text(record, "category"),
        location: text(record, "job_type"),
        salary: text(record, "salary"),
        posted_at: date(record, &["publication_date"]),
    }
    .normalize(source)
}

pub fn map_arbeitnow(record: &Value, source: &str) -> NormalizedJob {
    RawJob {
        title: text(record, "title"),
        company: text(record, "company_name"),
        url: text(record, "url"),
        category: joined(record, "tags"),
        location: text(record, "location"),
        salary: text(record, "salary"),
        posted_at: date(record, &["created_at"]),
    }
    .normalize(source)
}

pub fn map_working_nomads(record: &Value, source: &str) -> NormalizedJob {
    RawJob {
        title: text(record, "title"),
        company: first_text(record, &["company", "company_name"]),
        url: text(record, "url"),
        category: text(record, "category").or_else(|| joined(record, "tags")),
        location: text(record, "location"),
        salary: text(record, "salary"),
        posted_at: date(record, &["pub_date"]),
    }
    .normalize(source)
}

/// Feed entries carry no company field; the author stands in, then the
/// source itself.
pub fn map_feed_item(item: &FeedItem, source: &str) -> NormalizedJob {
    let company = Some(item.author.trim())
        .filter(|a| !a.is_empty())
        .unwrap_or(source);
    RawJob {
        title: Some(item.title.clone()),
        company: Some(company.to_string()),
        url: Some(item.link.clone()),
        category: Some(item.categories.join(", ")),
        location: None,
        salary: None,
        posted_at: item.published_at.as_deref().and_then(normalize_timestamp),
    }
    .normalize(source)
}

pub fn map_greenhouse(record: &Value, source: &str, board: &str) -> NormalizedJob {
    let departments = record
        .get("departments")
        .and_then(Value::as_array)
        .map(|deps| {
            deps.iter()
                .filter_map(|d| d.get("name").and_then(scalar_text))
                .collect::<Vec<_>>()
                .join(", ")
        });

    RawJob {
        title: text(record, "title"),
        company: record
            .pointer("/company/name")
            .and_then(scalar_text)
            .or_else(|| Some(board.to_string())),
        url: first_text(record, &["absolute_url", "hosted_url"]),
        category: departments,
        location: record.pointer("/location/name").and_then(scalar_text),
        salary: None,
        posted_at: date(record, &["updated_at", "created_at"]),
    }
    .normalize(source)
}

pub fn map_lever(record: &Value, source: &str, company: &str) -> NormalizedJob {
    let team = record.pointer("/categories/team").and_then(scalar_text);
    let department = record.pointer("/categories/department").and_then(scalar_text);
    let category = [team, department.clone()]
        .into_iter()
        .flatten()
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    RawJob {
        title: text(record, "text"),
        company: department.or_else(|| Some(company.to_string())),
        url: text(record, "hostedUrl"),
        category: Some(category),
        location: record.pointer("/categories/location").and_then(scalar_text),
        salary: None,
        posted_at: date(record, &["createdAt"]),
    }
    .normalize(source)
}

pub fn map_hacker_news(record: &Value, source: &str) -> NormalizedJob {
    let url = first_text(record, &["url", "story_url"]).or_else(|| {
        Some(format!(
            "https://news.ycombinator.com/item?id={}",
            text(record, "objectID").unwrap_or_default()
        ))
    });

    RawJob {
        title: text(record, "title").or_else(|| Some("HN Job".to_string())),
        company: Some("Hacker News".to_string()),
        url,
        category: Some("Discussion".to_string()),
        location: Some("Remote (varies)".to_string()),
        salary: None,
        posted_at: date(record, &["created_at"]),
    }
    .normalize(source)
}

/// Render a scalar JSON value as text; objects, arrays and null yield `None`.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(format_number(n)),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Integral floats print without a fractional part (`50000.0` -> `50000`).
fn format_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

fn text(record: &Value, key: &str) -> Option<String> {
    record.get(key).and_then(scalar_text)
}

fn first_text(record: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| text(record, k))
}

/// Join an array of scalars with `, `; a plain string passes through.
fn joined(record: &Value, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(scalar_text).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        other => scalar_text(other),
    }
}

/// `"{min}-{max} {currency}"` when both bounds are present.
fn salary_range(
    record: &Value,
    min_key: &str,
    max_key: &str,
    currency_key: &str,
) -> Option<String> {
    let min = text(record, min_key)?;
    let max = text(record, max_key)?;
    let currency = text(record, currency_key).unwrap_or_default();
    Some(format!("{}-{} {}", min, max, currency).trim().to_string())
}

/// Normalize the first non-null date field.
fn date(record: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| record.get(*k))
        .find(|v| !v.is_null())
        .and_then(normalize_value)
}
