//! Sandbox script rendering.
//!
//! Produces the single output script: a fixed worker preamble (history
//! shim, location/window shim, marker-prefixed message handler), the
//! virtual document reconstruction (vhead/vbody divs, scoped styles),
//! and finally every extracted script wrapped in traceable markers.
//!
//! All page-derived content passes through one escaping helper before it
//! is embedded in a template literal; labels and URLs are embedded as
//! JSON string literals. Nothing in the inputs can terminate the
//! generated source early.

use crate::extract::{RenderInput, ScriptResource};
use crate::scope;
use crate::utils;

/// Standalone UMD build of the history package, loaded by the preamble.
/// Exposes the `HistoryLibrary` global inside the worker.
pub const DEFAULT_HISTORY_SRC: &str =
    "https://unpkg.com/history@5.3.0/umd/history.production.min.js";

/// Recursion bound for the generated deep key search. Host messages are
/// untrusted, so nesting beyond this depth is not walked.
const HAS_KEY_DEPTH_LIMIT: u32 = 64;

/// Render the complete sandbox-executable script for one conversion.
pub fn render_sandbox_script(input: &RenderInput, history_src: &str) -> String {
    let mut out = render_preamble(history_src);
    out.push_str(&render_document_setup(input));

    let scripts = render_scripts(&input.scripts);
    if !scripts.is_empty() {
        out.push('\n');
        out.push_str(&scripts);
        out.push('\n');
    }
    out
}

// ---------------------------------------------------------------------------
// Bootstrap Generator
// ---------------------------------------------------------------------------

/// The fixed part of the bootstrap: history library load, window/location
/// shim, inbound message handling, history binding, customclick
/// acknowledgment.
fn render_preamble(history_src: &str) -> String {
    format!(
        r#"// Sandbox bootstrap. Fabricates the main-thread environment the
// original page scripts expect: location, history, and the inbound
// message protocol.
importScripts({history_src});

const MESSAGE_MARKER = {marker};

const __location = {{
  hash: '',
  host: '',
  hostname: '',
  href: 'http://localhost/',
  origin: 'http://localhost',
  pathname: '/',
  port: '',
  protocol: 'http:',
  search: '',
  assign(path) {{
    const next = new URL(path, this.href);
    this.hash = next.hash;
    this.host = next.host;
    this.hostname = next.hostname;
    this.href = next.href;
    this.origin = next.origin;
    this.pathname = next.pathname;
    this.port = next.port;
    this.protocol = next.protocol;
    this.search = next.search;
  }},
}};

const __window = {{ location: __location }};

// Bounded deep search over an untrusted payload. Depth is capped; JSON
// input cannot be cyclic, so the cap also bounds total work.
function __hasKey(value, key, depth) {{
  if (depth <= 0 || value === null || typeof value !== 'object') return false;
  if (Object.prototype.hasOwnProperty.call(value, key)) return true;
  for (const nested of Object.values(value)) {{
    if (__hasKey(nested, key, depth - 1)) return true;
  }}
  return false;
}}

self.addEventListener('message', (event) => {{
  const data = event.data;
  if (typeof data !== 'string' || !data.startsWith(MESSAGE_MARKER)) return;
  let payload;
  try {{
    payload = JSON.parse(data.slice(MESSAGE_MARKER.length));
  }} catch (e) {{
    return;
  }}
  if (__hasKey(payload, 'button', {depth})) {{
    document.dispatchEvent(new CustomEvent('customclick', {{ detail: payload }}));
  }}
}});

const __history = HistoryLibrary.createMemoryHistory();
// Replace-navigation still produces a history entry inside the sandbox.
__history.replaceState = (...args) => __history.push(...args);
__window.history = __history;
document.defaultView = __window;

document.addEventListener('customclick', () => {{}});
"#,
        history_src = utils::js_string(history_src),
        marker = utils::js_string(utils::MESSAGE_MARKER),
        depth = HAS_KEY_DEPTH_LIMIT,
    )
}

/// Virtual document reconstruction: the detached root fragment, the
/// vhead/vbody divs carrying the residual markup, one tagged style
/// element per extracted stylesheet, and the final head/body
/// reassignment.
fn render_document_setup(input: &RenderInput) -> String {
    let mut out = format!(
        r#"
const __root = document.createDocumentFragment();
const __vhead = document.createElement('div');
__vhead.setAttribute('data-vhead', '');
__vhead.innerHTML = `{head}`;
const __vbody = document.createElement('div');
__vbody.setAttribute('data-vbody', '');
__vbody.innerHTML = `{body}`;
__root.appendChild(__vhead);
__root.appendChild(__vbody);
"#,
        head = utils::escape_template_literal(&input.head_markup),
        body = utils::escape_template_literal(&input.body_markup),
    );

    for (index, style) in input.styles.iter().enumerate() {
        let scoped = scope::scope_css(style.content());
        out.push_str(&format!(
            r#"
const __style{index} = document.createElement('style');
__style{index}.setAttribute('data-vstyle', '{index}');
__style{index}.textContent = `{css}`;
__vhead.appendChild(__style{index});
"#,
            index = index,
            css = utils::escape_template_literal(&scoped),
        ));
    }

    out.push_str(
        r#"
document.head = __vhead;
document.body = __vbody;
document.documentElement.appendChild(__root);
"#,
    );
    out
}

// ---------------------------------------------------------------------------
// Script Assembler
// ---------------------------------------------------------------------------

/// Emit every extracted script in document order, trimmed, wrapped in
/// begin/end markers. External scripts are labeled with their original
/// `src`; inline scripts with a zero-based counter that skips externals.
fn render_scripts(scripts: &[ScriptResource]) -> String {
    let mut inline_counter = 0usize;
    let mut blocks = Vec::with_capacity(scripts.len());

    for script in scripts {
        let (label, content) = match script {
            ScriptResource::External { src, content } => (src.clone(), content),
            ScriptResource::Inline { content } => {
                let label = inline_counter.to_string();
                inline_counter += 1;
                (label, content)
            }
        };
        blocks.push(format!(
            "{}\n{}\n{}",
            utils::script_begin_marker(&label),
            content.trim(),
            utils::script_end_marker(&label),
        ));
    }

    blocks.join("\n\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
