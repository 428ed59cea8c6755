//! Release notes page fetching and structure extraction.
//!
//! This crate provides:
//! - [`extract_entries`]: walks the page's main table and pairs header/body rows into entries
//! - [`extract_headlines`]: turns an entry's nested table into headlines with key points
//! - [`PageFetcher`]: downloads the page

mod dom;
mod entries;
pub mod fetch;
mod headlines;

pub use entries::extract_entries;
pub use fetch::PageFetcher;
pub use headlines::{extract_headlines, extract_headlines_from_html};
