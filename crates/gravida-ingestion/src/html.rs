//! HTML helpers built on `scraper`.
//!
//! `scraper::Html` is not `Send`, so every helper here takes raw markup or a
//! parsed document and returns owned data. Adapters never hold a parsed
//! document across an `.await`.

use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

/// Elements whose content is never visible text.
const SKIPPED: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Elements that start a new line in rendered text.
const BLOCK: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "tr", "td", "th", "table", "section", "article",
    "header", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "dt", "dd", "blockquote", "pre",
];

/// Visible text of an HTML document, one block per line.
pub fn visible_text(html: &str) -> String {
    document_text(&Html::parse_document(html))
}

/// Visible text of an already-parsed document.
pub fn document_text(doc: &Html) -> String {
    let mut raw = String::new();
    collect_text(doc.root_element(), &mut raw);
    tidy_lines(&raw)
}

/// Visible text of a single element.
pub fn element_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);
    tidy_lines(&raw)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED.contains(&name) {
                    continue;
                }
                let block = BLOCK.contains(&name);
                if block {
                    out.push('\n');
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out);
                }
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

fn tidy_lines(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Absolute hrefs of every anchor whose raw href satisfies `keep`,
/// resolved against `base`, in document order, duplicates dropped.
pub fn extract_links(doc: &Html, base: &Url, keep: impl Fn(&str) -> bool) -> Vec<String> {
    select_links(doc, anchor_selector(), base, keep)
}

/// Like [`extract_links`] but restricted to anchors matched by `selector`.
pub fn select_links(
    doc: &Html,
    selector: &Selector,
    base: &Url,
    keep: impl Fn(&str) -> bool,
) -> Vec<String> {
    let mut links: Vec<String> = Vec::new();
    for anchor in doc.select(selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !keep(href) {
            continue;
        }
        let Ok(resolved) = base.join(href) else {
            continue;
        };
        let resolved = resolved.to_string();
        if !links.contains(&resolved) {
            links.push(resolved);
        }
    }
    links
}

fn anchor_selector() -> &'static Selector {
    use std::sync::OnceLock;
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("a[href]").expect("valid anchor selector"))
}
