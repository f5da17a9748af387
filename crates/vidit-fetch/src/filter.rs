//! Entertainment/gossip content filter applied after every strategy.

use std::collections::HashSet;

/// Title substrings that mark an item as gossip. Matched against the
/// lowercased title.
const BLOCKED_KEYWORDS: &[&str] = &[
    "gran hermano",
    "reality",
    "influencer",
    "tiktoker",
    "escándalo",
    "romance",
    "separación",
    "viral",
    "redes explotan",
    "farándula",
    "chisme",
    "ex de",
    "novio de",
    "novia de",
    "gh 202",
    "bomba",
    "infiel",
    "cuernos",
    "wandanara",
    "china suarez",
    "pampita",
    "shakira",
    "piqué",
    "miley cyrus",
];

/// Category tags that mark an item as gossip. Matched exactly against the
/// lowercased tag.
const BLOCKED_CATEGORIES: &[&str] = &[
    "gente",
    "farándula",
    "espectáculos",
    "celebrities",
    "tiktok",
    "viral",
    "corazón",
    "famosos",
    "entretenimiento",
    "tv",
];

#[derive(Debug, Clone)]
pub struct ContentFilter {
    keywords: Vec<String>,
    categories: HashSet<String>,
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self::new(BLOCKED_KEYWORDS, BLOCKED_CATEGORIES)
    }
}

impl ContentFilter {
    #[must_use]
    pub fn new(keywords: &[&str], categories: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            categories: categories.iter().map(|c| c.to_lowercase()).collect(),
        }
    }

    /// A filter that lets everything through.
    #[must_use]
    pub fn permissive() -> Self {
        Self::new(&[], &[])
    }

    /// True when the title contains a blocked keyword or any category tag is blocked.
    #[must_use]
    pub fn is_blocked<S: AsRef<str>>(&self, title: &str, categories: &[S]) -> bool {
        let blocked_category = categories
            .iter()
            .any(|c| self.categories.contains(&c.as_ref().trim().to_lowercase()));
        if blocked_category {
            return true;
        }
        let title = title.to_lowercase();
        self.keywords.iter().any(|k| title.contains(k.as_str()))
    }
}
