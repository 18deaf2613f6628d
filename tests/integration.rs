use std::collections::HashMap;
use std::io::Write;

use page_sandbox::{
    convert_document, convert_page, utils, ConvertError, ConvertOptions, ConvertPlan,
    ConvertResult, Fetcher,
};

/// Create a temp .html file with the given content.
fn create_temp_html(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".html")
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write temp file");
    file
}

/// Convert a temp page offline, with external contents served from a map.
async fn convert_offline(
    content: &str,
    resources: &[(&str, &str)],
) -> Result<ConvertResult, ConvertError> {
    let file = create_temp_html(content);
    let plan = ConvertPlan {
        page_path: file.path().to_string_lossy().to_string(),
        base_url: None,
    };
    let map: HashMap<String, String> = resources
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let opts = ConvertOptions {
        resources: Some(map),
        ..Default::default()
    };
    convert_page(plan, opts).await
}

// ============================================================================
// Smoke tests — convert_page returns a complete sandbox script
// ============================================================================

#[tokio::test]
async fn convert_simple_page() {
    let result = convert_offline(
        "<html><head><style>body{color:red}</style></head>\
         <body><script>console.log(1)</script></body></html>",
        &[],
    )
    .await
    .unwrap();

    assert_eq!(result.style_count, 1);
    assert_eq!(result.script_count, 1);

    // The style is scoped to the virtual body and indexed.
    assert!(result.script.contains("[data-vbody]{color:red}"));
    assert!(result.script.contains("data-vstyle"));

    // The inline script is labeled 0 and wrapped in markers.
    let expected = format!(
        "{}\nconsole.log(1)\n{}",
        utils::script_begin_marker("0"),
        utils::script_end_marker("0")
    );
    assert!(result.script.contains(&expected));
}

#[tokio::test]
async fn convert_page_without_resources() {
    let result = convert_offline("<html><body><p>static</p></body></html>", &[])
        .await
        .unwrap();

    assert_eq!(result.style_count, 0);
    assert_eq!(result.script_count, 0);
    assert!(result.script.contains("__vbody.innerHTML = `<p>static</p>`;"));
    // Bootstrap is present even for resource-free pages.
    assert!(result.script.contains("createMemoryHistory()"));
}

// ============================================================================
// Script assembly — marker counts, ordering, labels
// ============================================================================

#[tokio::test]
async fn one_marker_pair_per_script_in_document_order() {
    let result = convert_offline(
        "<html><body>\
         <script>a()</script>\
         <script src=\"x.js\"></script>\
         <script>b()</script>\
         </body></html>",
        &[("x.js", "x()")],
    )
    .await
    .unwrap();

    assert_eq!(result.script_count, 3);
    assert_eq!(result.script.matches("// ==== begin script [").count(), 3);
    assert_eq!(result.script.matches("// ==== end script [").count(), 3);

    let pos_a = result.script.find("a()").unwrap();
    let pos_x = result.script.find("x()").unwrap();
    let pos_b = result.script.find("b()").unwrap();
    assert!(pos_a < pos_x && pos_x < pos_b);
}

#[tokio::test]
async fn inline_labels_count_only_inline_scripts() {
    let result = convert_offline(
        "<html><body>\
         <script>first()</script>\
         <script src=\"vendor.js\"></script>\
         <script>second()</script>\
         </body></html>",
        &[("vendor.js", "vendor()")],
    )
    .await
    .unwrap();

    assert!(result.script.contains(&utils::script_begin_marker("0")));
    assert!(result.script.contains(&utils::script_begin_marker("1")));
    // No inline script is ever labeled 2: the external does not consume
    // a counter slot.
    assert!(!result.script.contains(&utils::script_begin_marker("2")));
}

#[tokio::test]
async fn external_label_is_the_literal_src() {
    let result = convert_offline(
        "<html><body><script src=\"./nested/../app.js?v=2\"></script></body></html>",
        &[("./nested/../app.js?v=2", "boot()")],
    )
    .await
    .unwrap();

    // The label is the src attribute value, unmodified — not resolved.
    assert!(result
        .script
        .contains(&utils::script_begin_marker("./nested/../app.js?v=2")));
}

// ============================================================================
// Extraction before capture — residual markup
// ============================================================================

#[tokio::test]
async fn extracted_elements_never_appear_in_residual_markup() {
    let result = convert_offline(
        "<html><head><title>t</title><style>h1{}</style>\
         <link rel=\"stylesheet\" href=\"s.css\"></head>\
         <body><div>kept</div><script>go()</script></body></html>",
        &[("s.css", ".x{}")],
    )
    .await
    .unwrap();

    let vhead_line = result
        .script
        .lines()
        .find(|l| l.starts_with("__vhead.innerHTML"))
        .unwrap()
        .to_string();
    assert!(vhead_line.contains("<title>t</title>"));
    assert!(!vhead_line.contains("<style>"));
    assert!(!vhead_line.contains("s.css"));

    let vbody_line = result
        .script
        .lines()
        .find(|l| l.starts_with("__vbody.innerHTML"))
        .unwrap()
        .to_string();
    assert!(vbody_line.contains("<div>kept</div>"));
    assert!(!vbody_line.contains("<script>"));
}

#[tokio::test]
async fn print_stylesheet_is_untouched() {
    let result = convert_offline(
        "<html><head>\
         <link rel=\"stylesheet\" href=\"screen.css\">\
         <link rel=\"stylesheet\" href=\"print.css\" media=\"print\">\
         </head><body></body></html>",
        &[("screen.css", ".s{}")],
    )
    .await
    .unwrap();

    assert_eq!(result.style_count, 1);
    // The print stylesheet stays in the captured head markup.
    let vhead_line = result
        .script
        .lines()
        .find(|l| l.starts_with("__vhead.innerHTML"))
        .unwrap()
        .to_string();
    assert!(vhead_line.contains("print.css"));
}

// ============================================================================
// Failure modes
// ============================================================================

#[tokio::test]
async fn failed_external_fetch_aborts_conversion() {
    let result = convert_offline(
        "<html><head><link rel=\"stylesheet\" href=\"missing.css\"></head>\
         <body></body></html>",
        &[],
    )
    .await;

    match result.unwrap_err() {
        ConvertError::ResourceFetch { url, .. } => assert_eq!(url, "missing.css"),
        e => panic!("expected ResourceFetch, got: {:?}", e),
    }
}

#[tokio::test]
async fn failed_script_fetch_aborts_conversion() {
    let result = convert_offline(
        "<html><body><script src=\"gone.js\"></script></body></html>",
        &[],
    )
    .await;

    assert!(matches!(
        result.unwrap_err(),
        ConvertError::ResourceFetch { .. }
    ));
}

#[tokio::test]
async fn nonexistent_input_fails() {
    let plan = ConvertPlan {
        page_path: "/nonexistent/path/page.html".into(),
        base_url: None,
    };
    let result = convert_page(plan, ConvertOptions::default()).await;

    match result.unwrap_err() {
        ConvertError::Io(_) => {}
        e => panic!("expected Io, got: {:?}", e),
    }
}

#[tokio::test]
async fn empty_document_is_a_parse_error() {
    let result = convert_offline("   \n  ", &[]).await;
    match result.unwrap_err() {
        ConvertError::Parse(_) => {}
        e => panic!("expected Parse, got: {:?}", e),
    }
}

// ============================================================================
// Diagnostics and disk output
// ============================================================================

#[tokio::test]
async fn conversion_emits_diagnostics() {
    let result = convert_offline("<html><body><p>x</p></body></html>", &[])
        .await
        .unwrap();

    assert!(result.diagnostics.len() >= 2);
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.message.contains("Conversion started")));
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.message.contains("Conversion complete")));
}

#[tokio::test]
async fn write_to_disk_produces_the_script_file() {
    let file = create_temp_html("<html><body><p>x</p></body></html>");
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("out").join("sandbox.js");

    let plan = ConvertPlan {
        page_path: file.path().to_string_lossy().to_string(),
        base_url: None,
    };
    let opts = ConvertOptions {
        resources: Some(HashMap::new()),
        write_to_disk: true,
        out_path: Some(out_path.clone()),
        ..Default::default()
    };

    let result = convert_page(plan, opts).await.unwrap();
    let written = std::fs::read_to_string(&out_path).unwrap();
    assert_eq!(written, result.script);
}

#[tokio::test]
async fn convert_document_accepts_in_memory_input() {
    let mut map = HashMap::new();
    map.insert("app.js".to_string(), "boot()".to_string());
    let fetcher = Fetcher::from_map(map);

    let script = convert_document(
        "<html><head><style>html{}</style></head>\
         <body><script src=\"app.js\"></script></body></html>",
        &fetcher,
        &ConvertOptions::default(),
    )
    .await
    .unwrap();

    assert!(script.contains(":root{}"));
    assert!(script.contains(&utils::script_begin_marker("app.js")));
    assert!(script.contains("boot()"));
}

#[tokio::test]
async fn history_src_override_lands_in_the_preamble() {
    let file = create_temp_html("<html><body></body></html>");
    let plan = ConvertPlan {
        page_path: file.path().to_string_lossy().to_string(),
        base_url: None,
    };
    let opts = ConvertOptions {
        resources: Some(HashMap::new()),
        history_src: Some("/vendor/history.js".into()),
        ..Default::default()
    };

    let result = convert_page(plan, opts).await.unwrap();
    assert!(result
        .script
        .contains("importScripts(\"/vendor/history.js\");"));
}
