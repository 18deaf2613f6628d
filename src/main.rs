use std::env;
use std::path::PathBuf;
use std::process;

use page_sandbox::{convert_page, ConvertOptions, ConvertPlan, DiagnosticLevel};

struct CliArgs {
    input: String,
    out: Option<PathBuf>,
    base_url: Option<String>,
    history_src: Option<String>,
    verbose: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("[page-sandbox] {}", err);
        process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = parse_args()?;

    let plan = ConvertPlan {
        page_path: args.input.clone(),
        base_url: args.base_url.clone(),
    };
    let opts = ConvertOptions {
        resources: None,
        history_src: args.history_src.clone(),
        write_to_disk: args.out.is_some(),
        out_path: args.out.clone(),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    let result = runtime
        .block_on(convert_page(plan, opts))
        .map_err(|e| e.to_string())?;

    if args.verbose {
        for diagnostic in &result.diagnostics {
            let tag = match diagnostic.level {
                DiagnosticLevel::Error => "error",
                DiagnosticLevel::Warning => "warn",
                DiagnosticLevel::Info => "info",
            };
            eprintln!("[page-sandbox] {}: {}", tag, diagnostic.message);
        }
    }

    if args.out.is_none() {
        print!("{}", result.script);
    }

    Ok(())
}

fn parse_args() -> Result<CliArgs, String> {
    let mut input: Option<String> = None;
    let mut out: Option<PathBuf> = None;
    let mut base_url: Option<String> = None;
    let mut history_src: Option<String> = None;
    let mut verbose = false;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--out" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --out".to_string())?;
                out = Some(PathBuf::from(value));
            }
            "--base-url" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --base-url".to_string())?;
                base_url = Some(value);
            }
            "--history-src" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --history-src".to_string())?;
                history_src = Some(value);
            }
            "--verbose" => {
                verbose = true;
            }
            other if other.starts_with("--") => {
                return Err(format!(
                    "unknown argument '{other}'. usage: page-sandbox <input> [--out <path>] [--base-url <url>] [--history-src <url>] [--verbose]"
                ));
            }
            positional => {
                if input.is_some() {
                    return Err(format!("unexpected extra argument '{positional}'"));
                }
                input = Some(positional.to_string());
            }
        }
    }

    let input = input.ok_or_else(|| {
        "required argument missing: <input> (path or URL of the HTML document)".to_string()
    })?;

    Ok(CliArgs {
        input,
        out,
        base_url,
        history_src,
        verbose,
    })
}
