//! Anchor extraction from fetched documents.

use scraper::{Html, Selector};

use crate::error::{AppError, Result};

const ANCHOR_SELECTOR: &str = "a[href]";

/// Every anchor href in document order that satisfies `predicate`.
pub fn find_links(body: &str, predicate: impl Fn(&str) -> bool) -> Result<Vec<String>> {
    let selector = anchor_selector()?;
    let document = Html::parse_document(body);

    Ok(document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| predicate(*href))
        .map(str::to_string)
        .collect())
}

/// The first anchor href that satisfies `predicate`.
pub fn find_first_link(body: &str, predicate: impl Fn(&str) -> bool) -> Result<Option<String>> {
    let selector = anchor_selector()?;
    let document = Html::parse_document(body);

    Ok(document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| predicate(*href))
        .map(str::to_string))
}

fn anchor_selector() -> Result<Selector> {
    Selector::parse(ANCHOR_SELECTOR).map_err(|e| AppError::selector(ANCHOR_SELECTOR, format!("{e:?}")))
}
