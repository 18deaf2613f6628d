//! CSS scoping for the virtual document.
//!
//! Original stylesheets are authored against the page's real `html` and
//! `body` elements. Inside the sandbox those elements are stand-in divs
//! (see `render`), so every standalone `html` token is retargeted to
//! `:root` and every standalone `body` token to the `[data-vbody]`
//! attribute selector.
//!
//! The rewrite is a token-level text substitution with word-boundary
//! matching, applied to the whole stylesheet — including occurrences
//! inside string values and comments. Identifiers merely containing the
//! tokens (`bodysection`, `embodyment`) are never touched.

use std::sync::OnceLock;

use regex::Regex;

/// Attribute selector the bootstrap tags the virtual body with.
pub const VBODY_SELECTOR: &str = "[data-vbody]";

static HTML_TOKEN: OnceLock<Regex> = OnceLock::new();
static BODY_TOKEN: OnceLock<Regex> = OnceLock::new();

fn html_token() -> &'static Regex {
    HTML_TOKEN.get_or_init(|| Regex::new(r"\bhtml\b").expect("html token pattern"))
}

fn body_token() -> &'static Regex {
    BODY_TOKEN.get_or_init(|| Regex::new(r"\bbody\b").expect("body token pattern"))
}

/// Rewrite a stylesheet so root/body selectors target the virtual
/// document. Applied at render time to every style resource, inline and
/// external alike.
pub fn scope_css(css: &str) -> String {
    let rooted = html_token().replace_all(css, ":root");
    body_token().replace_all(&rooted, VBODY_SELECTOR).into_owned()
}
