//! Domain novelty tracking

use std::collections::HashSet;

use crate::utils::{DENYLISTED_DOMAIN_LABELS, domain_of};

/// Registrable domains already seen during this run
///
/// Seeded with the denylisted widget domains. Those are matched on the first
/// label of the registrable domain, so every public suffix of a denylisted
/// brand counts as already visited.
#[derive(Debug, Clone)]
pub struct VisitedDomainSet {
    domains: HashSet<String>,
    denied_labels: HashSet<String>,
}

impl Default for VisitedDomainSet {
    fn default() -> Self {
        Self::new()
    }
}

impl VisitedDomainSet {
    #[must_use]
    pub fn new() -> Self {
        Self::with_denylist(DENYLISTED_DOMAIN_LABELS.iter().copied())
    }

    pub fn with_denylist<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            domains: HashSet::new(),
            denied_labels: labels.into_iter().map(str::to_ascii_lowercase).collect(),
        }
    }

    /// Record the domain of `url` as visited. Returns false if it has no domain.
    pub fn add(&mut self, url: &str) -> bool {
        match domain_of(url) {
            Some(domain) => {
                self.domains.insert(domain);
                true
            }
            None => false,
        }
    }

    /// True if `url` has a registrable domain that is neither visited nor denylisted
    #[must_use]
    pub fn is_new(&self, url: &str) -> bool {
        let Some(domain) = domain_of(url) else {
            return false;
        };
        if self.domains.contains(&domain) {
            return false;
        }
        let label = domain.split('.').next().unwrap_or_default();
        !self.denied_labels.contains(label)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}
