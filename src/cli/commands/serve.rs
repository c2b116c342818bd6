//! Web server command.

use console::style;

use crate::config::{Config, Settings};

use super::helpers::load_registry;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3030;

/// Start the web server.
pub async fn cmd_serve(settings: &Settings, config: &Config, bind: &str) -> anyhow::Result<()> {
    let (host, port) = parse_bind_address(bind)?;
    let registry = load_registry(config)?;

    settings.ensure_directories()?;

    println!(
        "{} Starting jobfeed API at http://{}:{}",
        style("→").cyan(),
        host,
        port
    );
    println!("  Database: {}", settings.database_url());
    println!("  Press Ctrl+C to stop");

    crate::server::serve(settings, registry, &host, port).await
}

/// Parse a bind address that can be:
/// - Just a port: "3030" -> 127.0.0.1:3030
/// - Just a host: "0.0.0.0" -> 0.0.0.0:3030
/// - Host and port: "0.0.0.0:3030" -> 0.0.0.0:3030
fn parse_bind_address(bind: &str) -> anyhow::Result<(String, u16)> {
    let bind = bind.trim();
    if bind.is_empty() {
        return Ok((DEFAULT_HOST.to_string(), DEFAULT_PORT));
    }

    if let Ok(port) = bind.parse::<u16>() {
        return Ok((DEFAULT_HOST.to_string(), port));
    }

    if let Some((host, port_str)) = bind.rsplit_once(':') {
        let port = port_str
            .parse::<u16>()
            .map_err(|_| anyhow::anyhow!("invalid port in bind address: {}", bind))?;
        let host = if host.is_empty() { DEFAULT_HOST } else { host };
        return Ok((host.to_string(), port));
    }

    Ok((bind.to_string(), DEFAULT_PORT))
}
