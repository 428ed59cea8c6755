//! Small query helpers over `scraper` element trees.
//!
//! The release notes page is table soup: rows are found by walking children
//! rather than with descendant selectors, so a nested table's rows never leak
//! into its parent's scan.

use std::sync::LazyLock;

use scraper::{ElementRef, Node, Selector};

pub(crate) static MAIN_TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"table[style*="margin: 0 auto"]"#).expect("valid selector"));

pub(crate) static BLANK_TARGET_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[target="_blank"]"#).expect("valid selector"));

pub(crate) static TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("valid selector"));

pub(crate) static IMAGE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("valid selector"));

pub(crate) static BOLD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("b").expect("valid selector"));

pub(crate) static BORDER_BOTTOM_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"td[style*="border-bottom"]"#).expect("valid selector"));

/// Rows owned by `table`: `tr` children of the table itself or of its
/// `thead`/`tbody`/`tfoot` sections, in document order.
pub(crate) fn direct_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();
    for child in table.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => rows.extend(
                child
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|el| el.value().name() == "tr"),
            ),
            _ => {}
        }
    }
    rows
}

/// `td` children of a row.
pub(crate) fn direct_cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "td")
        .collect()
}

/// Visible text of an element with whitespace runs collapsed to one space and
/// both ends trimmed. `<br>` counts as whitespace.
pub(crate) fn normalized_text(el: ElementRef<'_>) -> String {
    let mut raw = String::new();
    for node in el.descendants() {
        match node.value() {
            Node::Text(text) => raw.push_str(text),
            Node::Element(element) if element.name() == "br" => raw.push(' '),
            _ => {}
        }
    }
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
