//! HTML to plain text conversion and link extraction.

use crate::types::{AppError, Result};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

/// Elements whose content never reaches the extracted text
const SKIPPED_ELEMENTS: [&str; 6] = ["script", "style", "noscript", "iframe", "svg", "head"];

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| AppError::Ingest(format!("Invalid CSS selector: {:?}", e)))
}

/// Extracts visible body text, one text node per line.
///
/// ```
/// use ragcheck::ingest::parser::extract_text;
///
/// let html = r#"<html><body><h1>Hello</h1><script>x()</script><p>World</p></body></html>"#;
/// assert_eq!(extract_text(html).unwrap(), "Hello\nWorld");
/// ```
pub fn extract_text(html: &str) -> Result<String> {
    let document = Html::parse_document(html);

    let mut text_parts = Vec::new();
    if let Some(body) = document.select(&selector("body")?).next() {
        collect_text(body, &mut text_parts);
    } else if let Some(root) = document.select(&selector("html")?).next() {
        collect_text(root, &mut text_parts);
    }

    Ok(text_parts.join("\n"))
}

fn collect_text(element: ElementRef<'_>, text_parts: &mut Vec<String>) {
    if SKIPPED_ELEMENTS.contains(&element.value().name()) {
        return;
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    text_parts.push(trimmed.to_string());
                }
            }
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, text_parts);
                }
            }
            _ => {}
        }
    }
}

/// Text of the `<title>` element, if present and non-empty
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let title_selector = Selector::parse("title").ok()?;
    document
        .select(&title_selector)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// All `<a href>` targets resolved against `base_url`, http(s) only, first occurrence kept.
pub fn extract_links(html: &str, base_url: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(html);

    let base = url::Url::parse(base_url)
        .map_err(|e| AppError::Ingest(format!("Invalid base URL {}: {}", base_url, e)))?;

    let mut links = Vec::new();
    for element in document.select(&selector("a[href]")?) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
        {
            continue;
        }

        if let Ok(mut absolute_url) = base.join(href) {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                absolute_url.set_fragment(None);
                links.push(absolute_url.to_string());
            }
        }
    }

    let mut seen = HashSet::new();
    links.retain(|link| seen.insert(link.clone()));

    Ok(links)
}
