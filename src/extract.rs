//! Resource extraction and residual content capture.
//!
//! Styles and scripts are pulled out of the parsed tree in document
//! order, classified inline/external, and resolved to their content.
//! External content is fetched concurrently within one resource class,
//! but the returned sequences always follow source position, never
//! completion order. Head/body markup is captured only after both
//! extraction passes, so residual markup never contains an extracted
//! element.

use futures::future::try_join_all;

use crate::dom::{DetachedElement, PageDocument};
use crate::fetch::Fetcher;
use crate::ConvertError;

// ---------------------------------------------------------------------------
// Resource Records
// ---------------------------------------------------------------------------

/// One stylesheet source, in document order. Immutable once extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleResource {
    Inline { content: String },
    External { href: String, content: String },
}

impl StyleResource {
    pub fn content(&self) -> &str {
        match self {
            StyleResource::Inline { content } => content,
            StyleResource::External { content, .. } => content,
        }
    }
}

/// One script source, in document order. Immutable once extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptResource {
    Inline { content: String },
    External { src: String, content: String },
}

impl ScriptResource {
    pub fn content(&self) -> &str {
        match self {
            ScriptResource::Inline { content } => content,
            ScriptResource::External { content, .. } => content,
        }
    }
}

/// Everything rendering consumes: residual markup plus the ordered
/// resource sequences. Built once per conversion.
#[derive(Debug, Clone)]
pub struct RenderInput {
    pub head_markup: String,
    pub body_markup: String,
    pub styles: Vec<StyleResource>,
    pub scripts: Vec<ScriptResource>,
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

fn is_style_element(el: &DetachedElement) -> bool {
    match el.tag() {
        "style" => true,
        "link" => {
            let rel_stylesheet = el
                .attr("rel")
                .map(|r| r.eq_ignore_ascii_case("stylesheet"))
                .unwrap_or(false);
            let print_only = el
                .attr("media")
                .map(|m| m.eq_ignore_ascii_case("print"))
                .unwrap_or(false);
            rel_stylesheet && el.attr("href").is_some() && !print_only
        }
        _ => false,
    }
}

/// Extract every stylesheet source: `<style>` anywhere under `<head>`,
/// plus non-print `<link rel=stylesheet>` directly under `<head>`.
/// Matched elements are detached; linked content is fetched after
/// detachment (hrefs were captured before).
pub async fn extract_styles(
    doc: &mut PageDocument,
    fetcher: &Fetcher,
) -> Result<Vec<StyleResource>, ConvertError> {
    // One selector list keeps the relative document order of <style> and
    // <link> elements intact.
    let elements = doc.take_matching("head style, head > link", is_style_element);

    let hrefs: Vec<String> = elements
        .iter()
        .filter(|el| el.tag() == "link")
        .filter_map(|el| el.attr("href").map(str::to_string))
        .collect();
    let mut contents = try_join_all(hrefs.iter().map(|href| fetcher.fetch(href)))
        .await?
        .into_iter();

    let styles = elements
        .into_iter()
        .map(|el| {
            if el.tag() == "link" {
                StyleResource::External {
                    href: el.attr("href").unwrap_or_default().to_string(),
                    content: contents.next().unwrap_or_default(),
                }
            } else {
                StyleResource::Inline {
                    content: el.text().to_string(),
                }
            }
        })
        .collect();

    Ok(styles)
}

/// Extract every `<script>` element in the document. Elements are
/// detached first, then classified: a non-empty `src` attribute makes the
/// script external.
pub async fn extract_scripts(
    doc: &mut PageDocument,
    fetcher: &Fetcher,
) -> Result<Vec<ScriptResource>, ConvertError> {
    let elements = doc.take_matching("script", |_| true);

    let srcs: Vec<String> = elements
        .iter()
        .filter_map(|el| el.attr("src"))
        .filter(|src| !src.is_empty())
        .map(str::to_string)
        .collect();
    let mut contents = try_join_all(srcs.iter().map(|src| fetcher.fetch(src)))
        .await?
        .into_iter();

    let scripts = elements
        .into_iter()
        .map(|el| match el.attr("src") {
            Some(src) if !src.is_empty() => ScriptResource::External {
                src: src.to_string(),
                content: contents.next().unwrap_or_default(),
            },
            _ => ScriptResource::Inline {
                content: el.text().to_string(),
            },
        })
        .collect();

    Ok(scripts)
}

/// Capture the residual head/body markup. Must run after both extraction
/// passes.
pub fn split_content(doc: &PageDocument) -> (String, String) {
    (doc.head_markup(), doc.body_markup())
}

/// Run the full extraction phase: styles first (so later script execution
/// sees the final DOM), then scripts, then residual markup capture.
pub async fn gather_render_input(
    doc: &mut PageDocument,
    fetcher: &Fetcher,
) -> Result<RenderInput, ConvertError> {
    let styles = extract_styles(doc, fetcher).await?;
    let scripts = extract_scripts(doc, fetcher).await?;
    let (head_markup, body_markup) = split_content(doc);

    Ok(RenderInput {
        head_markup,
        body_markup,
        styles,
        scripts,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
