//! Data models for jobfeed.

mod job;
mod source;

pub use job::{JobPosting, NormalizedJob, RawJob};
pub use source::{JsonBoard, SourceDescriptor, SourceKind, HN_SOURCE_KEY};
