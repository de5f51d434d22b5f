//! Merging the desired policy with the pre-existing resolv.conf.
//!
//! Desired values always come first. Search domains share two limits
//! imposed by the system resolver across both sources: at most
//! [`MAX_SEARCH_DOMAINS`] entries and a `search` line of at most
//! [`MAX_LINE_CHARS`] characters.

use crate::parser::PreexistingConfig;

/// Maximum number of domains on the `search` line.
pub const MAX_SEARCH_DOMAINS: usize = 6;

/// Maximum length of the rendered `search` line.
pub const MAX_LINE_CHARS: usize = 256;

/// Why a search domain was left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Appending it would push the line past [`MAX_LINE_CHARS`].
    LineTooLong,
    /// [`MAX_SEARCH_DOMAINS`] entries were already present.
    TooManyDomains,
}

/// A search domain that did not make it into the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDomain {
    pub domain: String,
    pub reason: SkipReason,
}

/// Result of merging search domains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchDomainMerge {
    pub domains: Vec<String>,
    pub skipped: Vec<SkippedDomain>,
}

/// Final lists to write into the managed file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedOutput {
    pub search_domains: Vec<String>,
    pub name_servers: Vec<String>,
    pub other_lines: Vec<String>,
    /// Search domains dropped because of the resolver limits.
    pub skipped: Vec<SkippedDomain>,
}

/// Merges the desired search domain and nameserver with `existing`.
#[must_use]
pub fn merge(
    search_domains: &[String],
    name_server: &str,
    existing: &PreexistingConfig,
) -> MergedOutput {
    let search = merge_search_domains(search_domains, &existing.search_domains);
    MergedOutput {
        search_domains: search.domains,
        name_servers: merge_name_servers(name_server, &existing.name_servers),
        other_lines: existing.other_lines.clone(),
        skipped: search.skipped,
    }
}

/// Combines `desired` and `existing` search domains within the resolver limits.
///
/// Duplicates are dropped silently, keeping the first occurrence.
#[must_use]
pub fn merge_search_domains(desired: &[String], existing: &[String]) -> SearchDomainMerge {
    let mut merged = SearchDomainMerge {
        domains: Vec::with_capacity(desired.len() + existing.len()),
        skipped: Vec::new(),
    };
    let mut line_chars = "search".len();

    for domain in desired.iter().chain(existing) {
        if merged.domains.contains(domain) {
            continue;
        }

        let next_chars = line_chars + 1 + domain.len();
        if next_chars > MAX_LINE_CHARS {
            tracing::info!(
                domain = %domain,
                limit = MAX_LINE_CHARS,
                "Search list line too long, skipping domain"
            );
            merged.skipped.push(SkippedDomain {
                domain: domain.clone(),
                reason: SkipReason::LineTooLong,
            });
            continue;
        }

        if merged.domains.len() >= MAX_SEARCH_DOMAINS {
            tracing::info!(
                domain = %domain,
                limit = MAX_SEARCH_DOMAINS,
                "Search list already full, skipping domain"
            );
            merged.skipped.push(SkippedDomain {
                domain: domain.clone(),
                reason: SkipReason::TooManyDomains,
            });
            continue;
        }

        line_chars = next_chars;
        merged.domains.push(domain.clone());
    }

    merged
}

/// Puts `name_server` first, followed by the other entries of `existing`.
#[must_use]
pub fn merge_name_servers(name_server: &str, existing: &[String]) -> Vec<String> {
    std::iter::once(name_server)
        .chain(
            existing
                .iter()
                .map(String::as_str)
                .filter(|ns| *ns != name_server),
        )
        .map(str::to_string)
        .collect()
}
