//! Small helpers over `scraper`

use scraper::{ElementRef, Selector};

pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("CSS selector should be valid")
}

/// Text of an element, its fragments trimmed and joined by single spaces
pub(crate) fn cell_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Texts of the `td`/`th` cells of a row, in order
pub(crate) fn row_cells(row: ElementRef<'_>) -> Vec<String> {
    let cells = selector("td, th");
    row.select(&cells).map(cell_text).collect()
}
