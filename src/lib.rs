//! # Page Sandbox
//!
//! Converts a static HTML document into a single self-contained script
//! that runs inside an isolated worker context, simulating enough of a
//! browser main-thread environment (virtual DOM root, `window.location`,
//! in-memory history, message-based click dispatch) for the page's own
//! scripts to run unmodified.
//!
//! The pipeline extracts styles and scripts from the parsed document,
//! captures the residual head/body markup, and renders a bootstrap plus
//! the re-assembled scripts into one output string. Everything else —
//! file reading, fetching, HTML parsing — is a thin capability around
//! that core.

pub mod convert;
pub mod dom;
pub mod extract;
pub mod fetch;
pub mod render;
pub mod scope;
pub mod utils;

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use convert::convert_document;
pub use extract::{RenderInput, ScriptResource, StyleResource};
pub use fetch::Fetcher;

// ---------------------------------------------------------------------------
// Diagnostic
// ---------------------------------------------------------------------------

/// A structured diagnostic emitted during conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    pub context: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticLevel {
    Error,
    Warning,
    Info,
}

// ---------------------------------------------------------------------------
// ConvertPlan
// ---------------------------------------------------------------------------

/// Describes WHAT to convert.
#[derive(Debug, Clone)]
pub struct ConvertPlan {
    /// Filesystem path or http(s) URL of the HTML document.
    pub page_path: String,
    /// Overrides the base used to resolve relative resource references.
    /// Defaults to the document's own location.
    pub base_url: Option<String>,
}

// ---------------------------------------------------------------------------
// ConvertOptions
// ---------------------------------------------------------------------------

/// Describes HOW to convert.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Pre-resolved resource contents keyed by reference. When set, no
    /// network or filesystem fetches happen for external resources.
    pub resources: Option<HashMap<String, String>>,
    /// Overrides the history library URL the bootstrap loads.
    pub history_src: Option<String>,
    /// Whether to write the generated script to disk.
    pub write_to_disk: bool,
    /// Output path when writing to disk. Defaults to `sandbox.js`.
    pub out_path: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// ConvertResult
// ---------------------------------------------------------------------------

/// The sealed output of a successful conversion. Callers treat `script`
/// as opaque text to be delivered to whatever hosts the sandbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertResult {
    /// The generated sandbox-executable script.
    pub script: String,
    /// Number of stylesheet resources embedded in the bootstrap.
    pub style_count: usize,
    /// Number of script blocks assembled after the bootstrap.
    pub script_count: usize,
    /// Diagnostics collected during the conversion.
    pub diagnostics: Vec<Diagnostic>,
}

// ---------------------------------------------------------------------------
// ConvertError
// ---------------------------------------------------------------------------

/// Errors that abort the conversion. There is no partial output: every
/// variant invalidates the whole run.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Invalid HTML document: {0}")]
    Parse(String),

    #[error("Failed to fetch resource '{url}': {reason}")]
    ResourceFetch { url: String, reason: String },

    #[error("Invalid resource URL '{0}'")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Public API — Single Conversion Pipeline
// ---------------------------------------------------------------------------

/// Convert one HTML page into a sandbox-executable script.
///
/// The conversion:
/// 1. Reads and parses the document named by the plan
/// 2. Extracts stylesheet resources (inline `<style>` under `<head>`,
///    non-print `<link rel=stylesheet>`), then every `<script>`
/// 3. Captures the residual head/body markup
/// 4. Renders the worker bootstrap and the marker-wrapped script blocks
///
/// External fetches within a phase run concurrently; result ordering
/// always follows document position. Any fetch failure aborts the whole
/// conversion.
pub async fn convert_page(
    plan: ConvertPlan,
    opts: ConvertOptions,
) -> Result<ConvertResult, ConvertError> {
    convert::execute_convert(plan, opts).await
}
