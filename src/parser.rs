//! resolv.conf parsing.

use crate::error::{ResolvConfError, Result};
use std::path::Path;

/// Configuration found in a resolv.conf file before we took it over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreexistingConfig {
    /// `nameserver` values in file order.
    pub name_servers: Vec<String>,

    /// Domains of the effective `search` line.
    pub search_domains: Vec<String>,

    /// Every other directive, verbatim, in file order.
    pub other_lines: Vec<String>,
}

/// Parses resolv.conf content.
///
/// Blank lines and comments are dropped. When several `search` lines are
/// present the last one wins, matching the system resolver.
#[must_use]
pub fn parse(content: &str) -> PreexistingConfig {
    let mut cfg = PreexistingConfig::default();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("search") => {
                let domains: Vec<String> = fields.map(str::to_string).collect();
                if !domains.is_empty() {
                    cfg.search_domains = domains;
                }
            }
            Some("nameserver") => match (fields.next(), fields.next()) {
                (Some(ip), None) => cfg.name_servers.push(ip.to_string()),
                _ => tracing::debug!(line = %line, "Ignoring malformed nameserver line"),
            },
            _ => cfg.other_lines.push(line.to_string()),
        }
    }

    cfg
}

/// Reads and parses the resolv.conf at `path`.
///
/// # Errors
///
/// Returns [`ResolvConfError::Read`] if the file cannot be read, or
/// [`ResolvConfError::Parse`] if it is not valid UTF-8.
pub fn parse_file(path: &Path) -> Result<PreexistingConfig> {
    let bytes = std::fs::read(path).map_err(|source| ResolvConfError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let content = String::from_utf8(bytes).map_err(|e| ResolvConfError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(parse(&content))
}
