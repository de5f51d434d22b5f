//! Desired DNS policy handed over by the client.

/// A domain attached to the desired policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainEntry {
    /// Domain name (e.g., `"corp.example"`).
    pub domain: String,

    /// The domain is configured but currently switched off.
    pub disabled: bool,

    /// The domain is only used to match queries, never as a search suffix.
    pub match_only: bool,
}

impl DomainEntry {
    /// Creates an enabled search domain.
    #[must_use]
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            disabled: false,
            match_only: false,
        }
    }

    /// Marks the entry as disabled.
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Marks the entry as match-only.
    #[must_use]
    pub const fn match_only(mut self) -> Self {
        self.match_only = true;
        self
    }

    /// Returns `true` if the entry belongs in the `search` line.
    #[must_use]
    pub const fn is_search_domain(&self) -> bool {
        !self.disabled && !self.match_only
    }
}

/// DNS configuration the client wants installed on the host.
///
/// # Example
///
/// ```
/// use resolvconf_manager::{DesiredDnsConfig, DomainEntry};
///
/// let config = DesiredDnsConfig::new("100.64.0.1")
///     .with_domain(DomainEntry::new("corp.example"))
///     .with_domain(DomainEntry::new("internal.example").match_only());
///
/// assert!(config.route_all);
/// assert_eq!(config.search_domains(), vec!["corp.example"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredDnsConfig {
    /// Whether this policy owns all resolution on the host.
    /// Only such a policy may rewrite resolv.conf.
    pub route_all: bool,

    /// Nameserver to install first.
    pub server_ip: String,

    /// Domains in policy order.
    pub domains: Vec<DomainEntry>,
}

impl DesiredDnsConfig {
    /// Creates a route-all policy with no domains.
    #[must_use]
    pub fn new(server_ip: impl Into<String>) -> Self {
        Self {
            route_all: true,
            server_ip: server_ip.into(),
            domains: Vec::new(),
        }
    }

    /// Overrides the route-all flag.
    #[must_use]
    pub const fn with_route_all(mut self, route_all: bool) -> Self {
        self.route_all = route_all;
        self
    }

    /// Appends a domain.
    #[must_use]
    pub fn with_domain(mut self, entry: DomainEntry) -> Self {
        self.domains.push(entry);
        self
    }

    /// Domains that should appear in the `search` line, in policy order.
    #[must_use]
    pub fn search_domains(&self) -> Vec<String> {
        self.domains
            .iter()
            .filter(|d| d.is_search_domain())
            .map(|d| d.domain.clone())
            .collect()
    }
}
