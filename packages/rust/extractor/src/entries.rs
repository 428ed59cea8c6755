//! Entry extraction from the release notes page.
//!
//! Entries are delimited positionally: a header row carrying the entry link,
//! then the body row holding the image and the nested news table.

use scraper::{ElementRef, Html};
use tracing::{debug, instrument};

use releasebot_shared::Entry;

use crate::dom::{self, BLANK_TARGET_LINK, IMAGE, MAIN_TABLE, TABLE};
use crate::headlines::extract_headlines;

/// Link text of the administrative row that looks like a header but is not one.
const SENTINEL_LINK_TEXT: &str = "Release-Information";

/// Extract all entries from the page, newest first (source order).
///
/// Never fails: a page without the main table yields no entries, and rows
/// that do not fit the header/body pattern are skipped.
#[instrument(skip_all, fields(len = html.len()))]
pub fn extract_entries(html: &str) -> Vec<Entry> {
    let doc = Html::parse_document(html);

    let Some(main_table) = doc.select(&MAIN_TABLE).next() else {
        debug!("main table not found");
        return Vec::new();
    };

    let rows = dom::direct_rows(main_table);
    let mut entries = Vec::new();
    let mut cursor = 0;

    while cursor < rows.len() {
        let Some((raw_header, url)) = header_link(rows[cursor]) else {
            cursor += 1;
            continue;
        };

        // The row after a header always belongs to it, whatever it contains.
        let body = rows.get(cursor + 1).copied();
        cursor += 2;

        if url.is_empty() {
            debug!(%raw_header, "header link without target, entry skipped");
            continue;
        }

        entries.push(build_entry(raw_header, url, body));
    }

    debug!(rows = rows.len(), entries = entries.len(), "page scanned");
    entries
}

/// Header text and link target if `row` is a header row.
fn header_link(row: ElementRef<'_>) -> Option<(String, String)> {
    let link = row.select(&BLANK_TARGET_LINK).next()?;
    let text = dom::normalized_text(link);

    if text.eq_ignore_ascii_case(SENTINEL_LINK_TEXT) {
        return None;
    }

    let href = link.value().attr("href").unwrap_or_default().trim().to_string();
    Some((text, href))
}

fn build_entry(raw_header: String, url: String, body: Option<ElementRef<'_>>) -> Entry {
    let Some(body) = body else {
        return Entry::new(raw_header, url, None, Vec::new());
    };

    let image_url = body
        .select(&IMAGE)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .map(String::from);

    let headlines = body
        .select(&TABLE)
        .next()
        .map(extract_headlines)
        .unwrap_or_default();

    Entry::new(raw_header, url, image_url, headlines)
}
