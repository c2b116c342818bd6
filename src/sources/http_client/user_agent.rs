//! User agent handling for HTTP requests.

/// Identifying client header sent with every request.
pub const USER_AGENT: &str = "Mozilla/5.0 (JobsAggregator/1.0)";

/// Resolve user agent from config value.
/// - None or blank => default jobfeed user agent
/// - other => custom user agent string
pub fn resolve_user_agent(config: Option<&str>) -> String {
    match config.map(str::trim) {
        None | Some("") => USER_AGENT.to_string(),
        Some(custom) => custom.to_string(),
    }
}
