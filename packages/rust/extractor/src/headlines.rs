//! Headline extraction from an entry's nested table.
//!
//! Each row is either a headline row (a bold title, or a bordered title cell
//! in a further nested table) or a detail row whose second cell holds bullet
//! points separated by a colored `✪` span.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};
use tracing::debug;

use releasebot_shared::Headline;

use crate::dom::{self, BOLD, BORDER_BOTTOM_CELL, TABLE};

/// Bullet delimiter: a span styled with the `#08c` accent color wrapping `✪`.
static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<span[^>]*\bstyle="[^"]*color:\s*#(?:08c|0088cc)\b[^"]*"[^>]*>\s*✪\s*</span>"#)
        .expect("valid regex")
});

/// Extract headlines and their key points from a nested news table.
pub fn extract_headlines(table: ElementRef<'_>) -> Vec<Headline> {
    dom::direct_rows(table)
        .into_iter()
        .fold(HeadlineScan::default(), HeadlineScan::step)
        .finish()
}

/// Parse `markup` as a fragment and extract headlines from its first table.
///
/// Returns an empty list when the markup contains no table.
pub fn extract_headlines_from_html(markup: &str) -> Vec<Headline> {
    let fragment = Html::parse_fragment(markup);
    fragment
        .select(&TABLE)
        .next()
        .map(extract_headlines)
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Row scan
// ---------------------------------------------------------------------------

/// Fold accumulator: headlines already closed, plus the one still collecting points.
#[derive(Debug, Default)]
struct HeadlineScan {
    closed: Vec<Headline>,
    open: Option<Headline>,
}

impl HeadlineScan {
    fn step(self, row: ElementRef<'_>) -> Self {
        let cells = dom::direct_cells(row);
        let Some(&first_cell) = cells.first() else {
            return self;
        };

        match headline_title(first_cell) {
            Some(title) => self.open_headline(title),
            None => match cells.get(1) {
                Some(&points_cell) => self.add_points(points_cell),
                None => self,
            },
        }
    }

    fn open_headline(mut self, title: String) -> Self {
        self.close_open();
        self.open = Some(Headline::new(title, Vec::new()));
        self
    }

    fn add_points(mut self, cell: ElementRef<'_>) -> Self {
        match self.open.as_mut() {
            Some(headline) => headline.key_points.extend(split_key_points(&cell.inner_html())),
            None => debug!("detail row before any headline, points dropped"),
        }
        self
    }

    fn close_open(&mut self) {
        let Some(headline) = self.open.take() else {
            return;
        };
        if headline.title.is_empty() {
            debug!(
                points = headline.key_points.len(),
                "headline with blank title dropped"
            );
        } else {
            self.closed.push(headline);
        }
    }

    fn finish(mut self) -> Vec<Headline> {
        self.close_open();
        self.closed
    }
}

/// Title of a headline row, or `None` for a detail row.
///
/// A `Some("")` result is still a headline row; its headline is dropped on close.
fn headline_title(first_cell: ElementRef<'_>) -> Option<String> {
    if let Some(inner) = first_cell.select(&TABLE).next() {
        return inner
            .select(&BOLD)
            .next()
            .or_else(|| inner.select(&BORDER_BOTTOM_CELL).next())
            .map(dom::normalized_text);
    }

    first_cell.select(&BOLD).next().map(dom::normalized_text)
}

/// Split a detail cell's inner HTML into bullet texts.
///
/// Text before the first marker is not a bullet. Empty bullets are skipped.
pub(crate) fn split_key_points(cell_html: &str) -> Vec<String> {
    MARKER_RE
        .split(cell_html)
        .skip(1)
        .filter_map(|part| {
            let fragment = Html::parse_fragment(part);
            let text = dom::normalized_text(fragment.root_element());
            (!text.is_empty()).then_some(text)
        })
        .collect()
}
