//! Core domain types for release note entries.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Headline
// ---------------------------------------------------------------------------

/// One titled sub-topic within an entry, with its bullet points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Headline {
    /// Headline text (never blank; blank-titled headlines are dropped during extraction).
    pub title: String,
    /// Bullet texts in document order.
    pub key_points: Vec<String>,
}

impl Headline {
    pub fn new(title: impl Into<String>, key_points: Vec<String>) -> Self {
        Self {
            title: title.into(),
            key_points,
        }
    }
}

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// One changelog announcement, tied to a unique URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Combined header text as it appears in the source link,
    /// e.g. `"2025-04-15: New Event Hide n Hype"`.
    pub raw_header: String,
    /// Portion of the header before the first `:`.
    pub date: String,
    /// Portion of the header after the first `:` (empty if there is none).
    pub title: String,
    /// Link target. The sole uniqueness key of an entry.
    pub url: String,
    /// Optional illustrative image.
    pub image_url: Option<String>,
    /// Sub-topics in document order.
    pub headlines: Vec<Headline>,
}

impl Entry {
    /// Build an entry, splitting `raw_header` into date and title.
    pub fn new(
        raw_header: impl Into<String>,
        url: impl Into<String>,
        image_url: Option<String>,
        headlines: Vec<Headline>,
    ) -> Self {
        let raw_header = raw_header.into();
        let (date, title) = split_date_title(&raw_header);
        Self {
            raw_header,
            date,
            title,
            url: url.into(),
            image_url,
            headlines,
        }
    }

    /// Dedupe key of this entry. Depends on `url` only.
    pub fn key(&self) -> EntryKey {
        EntryKey::from_url(&self.url)
    }

    /// Title to publish under: the entry title, or the date when the title is empty.
    pub fn post_title(&self) -> &str {
        if self.title.is_empty() {
            &self.date
        } else {
            &self.title
        }
    }
}

/// Split `"date: title"` at the first `:`, trimming both halves.
///
/// Without a `:` the whole trimmed string is the date and the title is empty.
pub fn split_date_title(raw: &str) -> (String, String) {
    match raw.split_once(':') {
        Some((date, title)) => (date.trim().to_string(), title.trim().to_string()),
        None => (raw.trim().to_string(), String::new()),
    }
}

// ---------------------------------------------------------------------------
// EntryKey
// ---------------------------------------------------------------------------

/// Stable identifier of an entry, stored in the ledger as signed decimal text.
///
/// Computed with the 31-polynomial hash over the UTF-16 code units of the URL,
/// wrapping at 32 bits. Ledger files written by earlier versions of the bot use
/// the same hash, so they remain valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntryKey(pub i32);

impl EntryKey {
    pub fn from_url(url: &str) -> Self {
        let hash = url
            .encode_utf16()
            .fold(0i32, |acc, unit| acc.wrapping_mul(31).wrapping_add(i32::from(unit)));
        Self(hash)
    }
}

impl std::fmt::Display for EntryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for EntryKey {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_with_separator() {
        let (date, title) = split_date_title("2025-04-15: New Event Hide n Hype");
        assert_eq!(date, "2025-04-15");
        assert_eq!(title, "New Event Hide n Hype");
    }

    #[test]
    fn split_at_first_colon_only() {
        let (date, title) = split_date_title(" 2025-03-07 :  Patch: part 2 ");
        assert_eq!(date, "2025-03-07");
        assert_eq!(title, "Patch: part 2");
    }

    #[test]
    fn split_without_separator() {
        let (date, title) = split_date_title("  2025-01-02  ");
        assert_eq!(date, "2025-01-02");
        assert_eq!(title, "");
    }

    #[test]
    fn split_leading_colon_gives_empty_date() {
        let (date, title) = split_date_title(": Only Title");
        assert_eq!(date, "");
        assert_eq!(title, "Only Title");
    }

    #[test]
    fn entry_new_splits_header() {
        let entry = Entry::new("2025-04-15: Spring Patch", "https://example/1", None, vec![]);
        assert_eq!(entry.raw_header, "2025-04-15: Spring Patch");
        assert_eq!(entry.date, "2025-04-15");
        assert_eq!(entry.title, "Spring Patch");
    }

    #[test]
    fn post_title_falls_back_to_date() {
        let titled = Entry::new("2025-04-15: Spring Patch", "u", None, vec![]);
        assert_eq!(titled.post_title(), "Spring Patch");

        let untitled = Entry::new("2025-04-15", "u", None, vec![]);
        assert_eq!(untitled.post_title(), "2025-04-15");

        let empty_title = Entry::new("2025-04-15:   ", "u", None, vec![]);
        assert_eq!(empty_title.post_title(), "2025-04-15");
    }

    #[test]
    fn key_matches_known_hashes() {
        assert_eq!(EntryKey::from_url(""), EntryKey(0));
        assert_eq!(EntryKey::from_url("abc"), EntryKey(96354));
        assert_eq!(EntryKey::from_url("hello"), EntryKey(99_162_322));
        assert_eq!(
            EntryKey::from_url("https://example/1"),
            EntryKey(-1_840_680_227)
        );
        // Non-ASCII is hashed per UTF-16 unit.
        assert_eq!(EntryKey::from_url("é✪"), EntryKey(17249));
    }

    #[test]
    fn key_depends_on_url_only() {
        let a = Entry::new("2025-04-15: A", "https://example/1", None, vec![]);
        let b = Entry::new(
            "2024-01-01: Something else",
            "https://example/1",
            Some("https://example/img.png".into()),
            vec![Headline::new("H", vec!["p".into()])],
        );
        assert_eq!(a.key(), b.key());

        let c = Entry::new("2025-04-15: A", "https://example/2", None, vec![]);
        assert_ne!(a.key(), c.key());
    }

    #[test]
    fn key_display_and_parse() {
        let key = EntryKey(-1_840_680_227);
        assert_eq!(key.to_string(), "-1840680227");
        assert_eq!("-1840680227".parse::<EntryKey>().unwrap(), key);
        assert_eq!(" 42 ".parse::<EntryKey>().unwrap(), EntryKey(42));
        assert!("badline".parse::<EntryKey>().is_err());
        assert!("99999999999".parse::<EntryKey>().is_err());
    }

    #[test]
    fn entry_serializes_to_json() {
        let entry = Entry::new(
            "2025-04-15: Spring Patch",
            "https://example/1",
            None,
            vec![Headline::new("Combat Update", vec!["Fixed X".into()])],
        );
        let json = serde_json::to_value(&entry).expect("serialize");
        assert_eq!(json["date"], "2025-04-15");
        assert!(json["image_url"].is_null());
        assert_eq!(json["headlines"][0]["key_points"][0], "Fixed X");
    }
}
