//! Occupant filtering

use crate::config::TrapConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Decides which entities count as occupants of a trap zone
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrapFilter {
    /// Entity must have all of these
    pub required_tags: HashSet<String>,
    /// Entity must have none of these
    pub excluded_tags: HashSet<String>,
}

impl TrapFilter {
    /// Create a filter that accepts everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter requiring `tag`, or accepting everything for an empty tag
    pub fn for_tag(tag: &str) -> Self {
        if tag.is_empty() {
            Self::new()
        } else {
            Self::new().with_tag(tag)
        }
    }

    /// Filter built from the occupant and ignored tags of `config`
    pub fn from_config(config: &TrapConfig) -> Self {
        config
            .ignored_tags
            .iter()
            .fold(Self::for_tag(&config.occupant_tag), |filter, tag| {
                filter.without_tag(tag.as_str())
            })
    }

    /// Require a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.required_tags.insert(tag.into());
        self
    }

    /// Exclude a tag
    pub fn without_tag(mut self, tag: impl Into<String>) -> Self {
        self.excluded_tags.insert(tag.into());
        self
    }

    /// Check if an entity with `tags` passes this filter
    pub fn passes(&self, tags: &HashSet<String>) -> bool {
        self.required_tags.iter().all(|tag| tags.contains(tag))
            && !self.excluded_tags.iter().any(|tag| tags.contains(tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> HashSet<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_filter_tags() {
        let filter = TrapFilter::new().with_tag("player").without_tag("ghost");

        assert!(filter.passes(&tags(&["player"])));
        assert!(!filter.passes(&tags(&["enemy"])));
        assert!(!filter.passes(&tags(&["player", "ghost"])));
    }

    #[test]
    fn test_filter_from_config() {
        let filter = TrapFilter::from_config(&TrapConfig::default().ignoring("ghost"));
        assert!(filter.passes(&tags(&["player"])));
        assert!(!filter.passes(&tags(&["player", "ghost"])));

        let mut open = TrapConfig::default();
        open.occupant_tag.clear();
        assert!(TrapFilter::from_config(&open).passes(&HashSet::new()));
    }

    #[test]
    fn test_empty_tag_accepts_anything() {
        assert!(TrapFilter::for_tag("").passes(&HashSet::new()));
        assert!(!TrapFilter::for_tag("player").passes(&HashSet::new()));
    }
}
