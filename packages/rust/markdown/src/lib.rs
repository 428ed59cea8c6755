//! Markdown rendering of release note entries.
//!
//! The output is the body of the published post: one section per headline,
//! then the original publication date and the links back to the source.

use std::fmt::Write;

use releasebot_shared::{Entry, Headline};

/// Render `entry` as a Markdown post body.
///
/// Layout:
/// 1. `## {title}` per headline, its points as `- ` bullets, a blank line after the bullets
/// 2. `Originally published on {date}` between blank lines, if the date is known
/// 3. `[View news image]({image_url})`, if there is an image
/// 4. `[Read more here]({url})`
pub fn render(entry: &Entry) -> String {
    let mut md = String::new();

    for headline in &entry.headlines {
        push_headline(&mut md, headline);
    }

    if !entry.date.is_empty() {
        ensure_blank_line(&mut md);
        let _ = writeln!(md, "Originally published on {}", entry.date);
        md.push('\n');
    }

    if let Some(image_url) = entry.image_url.as_deref().map(str::trim) {
        if !image_url.is_empty() {
            let _ = writeln!(md, "[View news image]({image_url})");
        }
    }

    let _ = writeln!(md, "[Read more here]({})", entry.url);
    md
}

fn push_headline(md: &mut String, headline: &Headline) {
    let _ = writeln!(md, "## {}", headline.title);

    if headline.key_points.is_empty() {
        return;
    }
    for point in &headline.key_points {
        let _ = writeln!(md, "- {point}");
    }
    md.push('\n');
}

/// Start a blank line before the next block, unless one already ends `md`.
/// An empty `md` gets a leading blank line too.
fn ensure_blank_line(md: &mut String) {
    if !md.ends_with("\n\n") {
        md.push('\n');
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
