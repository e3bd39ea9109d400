use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Host of the local dashboard page; it only listens for updates.
pub const DASHBOARD_HOST: &str = "localhost";

/// Lowercases a page host and strips a leading `www.`.
pub fn normalize_domain(host: &str) -> Option<String> {
    let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
    let domain = host.strip_prefix("www.").unwrap_or(&host);
    if domain.is_empty() {
        None
    } else {
        Some(domain.to_string())
    }
}

/// Domains whose pages are tracked. An empty list tracks every domain except
/// the dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackedDomains {
    domains: BTreeSet<String>,
}

impl TrackedDomains {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn only<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            domains: domains
                .into_iter()
                .filter_map(|domain| normalize_domain(domain.as_ref()))
                .collect(),
        }
    }

    /// Resolves a page host to the domain to report under, or `None` if the
    /// page should not be tracked at all.
    pub fn resolve(&self, host: &str) -> Option<String> {
        let domain = normalize_domain(host)?;
        if domain == DASHBOARD_HOST {
            return None;
        }
        if self.domains.is_empty() || self.matches(&domain) {
            Some(domain)
        } else {
            None
        }
    }

    fn matches(&self, domain: &str) -> bool {
        self.domains.iter().any(|tracked| {
            domain == tracked
                || domain
                    .strip_suffix(tracked.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_www_and_case() {
        assert_eq!(normalize_domain("WWW.YouTube.com"), Some("youtube.com".into()));
        assert_eq!(normalize_domain("m.youtube.com"), Some("m.youtube.com".into()));
        assert_eq!(normalize_domain("  "), None);
    }

    #[test]
    fn dashboard_is_never_tracked() {
        assert_eq!(TrackedDomains::any().resolve("localhost"), None);
        assert_eq!(
            TrackedDomains::any().resolve("www.tiktok.com"),
            Some("tiktok.com".into())
        );
    }

    #[test]
    fn allow_list_includes_subdomains() {
        let tracked = TrackedDomains::only(["youtube.com", "www.twitch.tv"]);
        assert_eq!(tracked.resolve("m.youtube.com"), Some("m.youtube.com".into()));
        assert_eq!(tracked.resolve("twitch.tv"), Some("twitch.tv".into()));
        assert_eq!(tracked.resolve("notyoutube.com"), None);
        assert_eq!(tracked.resolve("example.org"), None);
    }
}
