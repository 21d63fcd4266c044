//! Title matching against a game catalog
//!
//! Rules are tried in a fixed order, each over the whole catalog:
//! 1. exact title (case-insensitive)
//! 2. any `|`-separated alias of the title
//! 3. any `-`-separated segment of the title
//! 4. equality after [`normalize_game_name`]
//!
//! The first rule with a hit wins. Within a rule the catalog order (title
//! descending) decides, so "foo" against `["Foo: Part 2", "Foo"]` selects "Foo".

use crate::catalog::{CatalogGameEntry, GameCatalog};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameRule {
    Exact,
    PipeAlias,
    HyphenSegment,
    Normalized,
}

impl NameRule {
    pub const ORDER: [NameRule; 4] = [
        NameRule::Exact,
        NameRule::PipeAlias,
        NameRule::HyphenSegment,
        NameRule::Normalized,
    ];

    pub fn label(self) -> &'static str {
        match self {
            NameRule::Exact => "exact",
            NameRule::PipeAlias => "pipe_alias",
            NameRule::HyphenSegment => "hyphen_segment",
            NameRule::Normalized => "normalized",
        }
    }

    fn matches(self, query: &Query, title: &str) -> bool {
        let title = title.trim().to_lowercase();
        match self {
            NameRule::Exact => title == query.lower,
            NameRule::PipeAlias => segment_matches(&title, '|', &query.lower),
            NameRule::HyphenSegment => segment_matches(&title, '-', &query.lower),
            NameRule::Normalized => {
                !query.normalized.is_empty() && normalize_game_name(&title) == query.normalized
            }
        }
    }
}

impl std::fmt::Display for NameRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

struct Query {
    lower: String,
    normalized: String,
}

fn segment_matches(title: &str, separator: char, query: &str) -> bool {
    title.contains(separator) && title.split(separator).any(|segment| segment.trim() == query)
}

/// Find the catalog entry for a game name
pub fn find_game<'a>(catalog: &'a GameCatalog, name: &str) -> Option<(&'a CatalogGameEntry, NameRule)> {
    let lower = name.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }
    let query = Query {
        normalized: normalize_game_name(&lower),
        lower,
    };

    NameRule::ORDER.into_iter().find_map(|rule| {
        catalog
            .entries()
            .iter()
            .find(|entry| rule.matches(&query, &entry.title))
            .map(|entry| (entry, rule))
    })
}

/// Trailing words that only name an edition
const EDITION_SUFFIXES: &[&str] = &[
    "game of the year edition",
    "game of the year",
    "goty edition",
    "goty",
    "definitive edition",
    "complete edition",
    "deluxe edition",
    "special edition",
    "collectors edition",
    "enhanced edition",
    "remastered",
    "hd",
];

/// Fold a title down to its comparable words
///
/// Lowercases, drops trademark symbols and bracketed text, moves a trailing
/// ", the" to the front, removes apostrophes, turns other punctuation into
/// spaces, strips edition suffixes and collapses whitespace.
pub fn normalize_game_name(name: &str) -> String {
    let mut text = name.to_lowercase();
    text.retain(|c| !matches!(c, '™' | '©' | '®'));
    text = strip_bracketed(&text);

    let trimmed = text.trim_end();
    if let Some(head) = trimmed.strip_suffix(", the") {
        text = format!("the {}", head);
    }

    let spaced: String = text
        .chars()
        .filter(|c| !matches!(c, '\'' | '’'))
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();
    let mut words: Vec<&str> = spaced.split_whitespace().collect();

    loop {
        let joined = words.join(" ");
        let Some(suffix) = EDITION_SUFFIXES
            .iter()
            .find(|s| joined.ends_with(*s) && joined.len() > s.len() && joined[..joined.len() - s.len()].ends_with(' '))
        else {
            break;
        };
        let drop = suffix.split_whitespace().count();
        words.truncate(words.len() - drop);
    }

    words.join(" ")
}

fn strip_bracketed(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}
