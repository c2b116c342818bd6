//! Job sources: the registry, HTTP fetching, feed parsing and payload mapping.

pub mod dates;
pub mod feed;
pub mod http_client;
pub mod mappers;
pub mod registry;

pub use feed::{parse_feed, FeedItem};
pub use http_client::{Fetch, FetchError, HttpClient, HttpConfig};
pub use registry::{builtin_sources, RegistryError, SourceRegistry};
