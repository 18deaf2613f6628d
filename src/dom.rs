//! HTML tree capability for the conversion pipeline.
//!
//! `PageDocument` wraps the parsed tree and exposes exactly what the
//! extractor needs: selector queries in document order, element
//! detachment, and residual head/body markup capture. The tree is owned
//! exclusively by one conversion for its whole lifetime.

use std::sync::OnceLock;

use scraper::{Html, Selector};

use crate::ConvertError;

// Selector::parse is moderately expensive; the query set is fixed, so the
// parsed selectors are cached for the process lifetime.
static HEAD_SELECTOR: OnceLock<Selector> = OnceLock::new();
static BODY_SELECTOR: OnceLock<Selector> = OnceLock::new();

fn head_selector() -> &'static Selector {
    HEAD_SELECTOR.get_or_init(|| Selector::parse("head").expect("head selector"))
}

fn body_selector() -> &'static Selector {
    BODY_SELECTOR.get_or_init(|| Selector::parse("body").expect("body selector"))
}

/// A removed element, reduced to the fields the extractor classifies on.
#[derive(Debug, Clone)]
pub struct DetachedElement {
    tag: String,
    text: String,
    attrs: Vec<(String, String)>,
}

impl DetachedElement {
    /// Lowercased tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Concatenated text content of the element.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Attribute value by name, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Mutable parsed-document handle. Parsing is error-recovering; only an
/// empty input is rejected outright.
pub struct PageDocument {
    html: Html,
}

impl PageDocument {
    pub fn parse(text: &str) -> Result<Self, ConvertError> {
        if text.trim().is_empty() {
            return Err(ConvertError::Parse("document is empty".into()));
        }
        Ok(Self {
            html: Html::parse_document(text),
        })
    }

    /// Select every element matching `css`, in document order, and detach
    /// those accepted by `keep`. Returns the accepted elements, still in
    /// document order. Elements rejected by `keep` stay in the tree.
    pub fn take_matching<F>(&mut self, css: &str, keep: F) -> Vec<DetachedElement>
    where
        F: Fn(&DetachedElement) -> bool,
    {
        let selector = match Selector::parse(css) {
            Ok(s) => s,
            Err(_) => return Vec::new(),
        };

        let mut accepted = Vec::new();
        let mut ids = Vec::new();
        for element in self.html.select(&selector) {
            let detached = DetachedElement {
                tag: element.value().name().to_ascii_lowercase(),
                text: element.text().collect::<String>(),
                attrs: element
                    .value()
                    .attrs()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            };
            if keep(&detached) {
                ids.push(element.id());
                accepted.push(detached);
            }
        }

        for id in ids {
            if let Some(mut node) = self.html.tree.get_mut(id) {
                node.detach();
            }
        }

        accepted
    }

    /// Serialized inner markup of `<head>`, as the tree currently stands.
    pub fn head_markup(&self) -> String {
        self.html
            .select(head_selector())
            .next()
            .map(|e| e.inner_html())
            .unwrap_or_default()
    }

    /// Serialized inner markup of `<body>`, as the tree currently stands.
    pub fn body_markup(&self) -> String {
        self.html
            .select(body_selector())
            .next()
            .map(|e| e.inner_html())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_empty_input() {
        assert!(PageDocument::parse("").is_err());
        assert!(PageDocument::parse("   \n\t ").is_err());
    }

    #[test]
    fn take_matching_detaches_in_document_order() {
        let mut doc = PageDocument::parse(
            "<html><head><style>a{}</style><style>b{}</style></head><body></body></html>",
        )
        .unwrap();

        let styles = doc.take_matching("head style", |_| true);
        assert_eq!(styles.len(), 2);
        assert_eq!(styles[0].text(), "a{}");
        assert_eq!(styles[1].text(), "b{}");
        assert!(!doc.head_markup().contains("<style>"));
    }

    #[test]
    fn take_matching_keeps_rejected_elements() {
        let mut doc = PageDocument::parse(
            r#"<html><head><link rel="stylesheet" href="a.css"><link rel="stylesheet" href="p.css" media="print"></head><body></body></html>"#,
        )
        .unwrap();

        let links = doc.take_matching("head > link", |el| el.attr("media") != Some("print"));
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].attr("href"), Some("a.css"));

        let residual = doc.head_markup();
        assert!(residual.contains("p.css"));
        assert!(!residual.contains("a.css"));
    }

    #[test]
    fn detached_element_exposes_tag_and_attrs() {
        let mut doc = PageDocument::parse(
            r#"<html><body><script src="app.js" defer></script></body></html>"#,
        )
        .unwrap();

        let scripts = doc.take_matching("script", |_| true);
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0].tag(), "script");
        assert_eq!(scripts[0].attr("src"), Some("app.js"));
        assert!(scripts[0].attr("defer").is_some());
        assert_eq!(scripts[0].attr("missing"), None);
    }

    #[test]
    fn body_markup_survives_script_removal() {
        let mut doc = PageDocument::parse(
            "<html><body><div id=\"app\">hi</div><script>go()</script></body></html>",
        )
        .unwrap();

        let _ = doc.take_matching("script", |_| true);
        let body = doc.body_markup();
        assert!(body.contains("<div id=\"app\">hi</div>"));
        assert!(!body.contains("<script>"));
    }
}
