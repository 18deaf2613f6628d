//! Core conversion logic.
//!
//! This module orchestrates the full pipeline:
//! 1. Read the root document (filesystem path or http(s) URL)
//! 2. Parse it into an exclusively owned tree
//! 3. Extract styles, then scripts, then capture residual markup
//! 4. Render the bootstrap + assembled scripts into one output string
//!
//! One invocation, one result or one failure. A failed external fetch
//! invalidates the whole conversion; there is no partial output mode.

use std::path::Path;

use crate::dom::PageDocument;
use crate::extract;
use crate::fetch::{self, Fetcher};
use crate::render;
use crate::{
    ConvertError, ConvertOptions, ConvertPlan, ConvertResult, Diagnostic, DiagnosticLevel,
};

/// Execute the conversion pipeline.
///
/// The parsed tree is owned by this function for its entire lifetime and
/// is discarded afterwards — extraction mutates it, so it is never
/// reusable.
pub async fn execute_convert(
    plan: ConvertPlan,
    opts: ConvertOptions,
) -> Result<ConvertResult, ConvertError> {
    let mut diagnostics: Vec<Diagnostic> = Vec::new();

    let is_remote =
        plan.page_path.starts_with("http://") || plan.page_path.starts_with("https://");

    // Pre-flight: verify a local source file exists (clean Io error)
    if !is_remote && !Path::new(&plan.page_path).exists() {
        return Err(ConvertError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("source document not found: {}", plan.page_path),
        )));
    }

    diagnostics.push(Diagnostic {
        level: DiagnosticLevel::Info,
        message: format!("Conversion started for: {}", plan.page_path),
        context: None,
    });

    let text = fetch::read_document(&plan.page_path).await?;
    let base = fetch::document_base(&plan.page_path, plan.base_url.as_deref())?;

    let fetcher = match &opts.resources {
        Some(map) => {
            let fetcher = Fetcher::from_map(map.clone());
            match base {
                Some(base) => fetcher.with_base(base),
                None => fetcher,
            }
        }
        None => Fetcher::http(base)?,
    };

    let mut doc = PageDocument::parse(&text)?;
    let input = extract::gather_render_input(&mut doc, &fetcher).await?;
    drop(doc);

    diagnostics.push(Diagnostic {
        level: DiagnosticLevel::Info,
        message: format!(
            "Extracted {} style(s), {} script(s)",
            input.styles.len(),
            input.scripts.len()
        ),
        context: None,
    });

    let history_src = opts
        .history_src
        .as_deref()
        .unwrap_or(render::DEFAULT_HISTORY_SRC);
    let script = render::render_sandbox_script(&input, history_src);

    diagnostics.push(Diagnostic {
        level: DiagnosticLevel::Info,
        message: format!(
            "Conversion complete: {} style(s), {} script(s), {} bytes",
            input.styles.len(),
            input.scripts.len(),
            script.len()
        ),
        context: None,
    });

    if opts.write_to_disk {
        let out_path = opts
            .out_path
            .clone()
            .unwrap_or_else(|| Path::new("sandbox.js").to_path_buf());
        if let Some(parent) = out_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&out_path, &script).await?;

        diagnostics.push(Diagnostic {
            level: DiagnosticLevel::Info,
            message: format!("Written to {}", out_path.display()),
            context: None,
        });
    }

    Ok(ConvertResult {
        style_count: input.styles.len(),
        script_count: input.scripts.len(),
        script,
        diagnostics,
    })
}

/// Convert an in-memory document with an explicit fetch capability.
/// This is the operation `execute_convert` wraps; callers that already
/// hold the document text (or need a custom fetch backend) use it
/// directly.
pub async fn convert_document(
    html: &str,
    fetcher: &Fetcher,
    opts: &ConvertOptions,
) -> Result<String, ConvertError> {
    let mut doc = PageDocument::parse(html)?;
    let input = extract::gather_render_input(&mut doc, fetcher).await?;

    let history_src = opts
        .history_src
        .as_deref()
        .unwrap_or(render::DEFAULT_HISTORY_SRC);
    Ok(render::render_sandbox_script(&input, history_src))
}
