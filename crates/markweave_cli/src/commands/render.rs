//! Render command implementation

use std::path::{Path, PathBuf};

use miette::{IntoDiagnostic, Result};
use tracing::{info, warn};

use markweave_core::{Markweave, RenderError, RenderOutput};

use crate::cli::OutputFormat;

/// Outcome of one input file.
struct FileResult<'a> {
    path: &'a Path,
    result: std::result::Result<RenderOutput, String>,
}

pub fn run_render(
    markweave: &Markweave,
    files: &[PathBuf],
    format: OutputFormat,
    spans: bool,
) -> Result<bool> {
    let sources: Vec<(&Path, std::result::Result<String, String>)> = files
        .iter()
        .map(|path| {
            let source = std::fs::read_to_string(path).map_err(|e| {
                warn!("Failed to read {}: {}", path.display(), e);
                e.to_string()
            });
            (path.as_path(), source)
        })
        .collect();

    let texts: Vec<&str> = sources
        .iter()
        .filter_map(|(_, source)| source.as_deref().ok())
        .collect();
    let mut rendered = markweave.render_all(&texts).into_iter();

    // Results keep the argument order; unreadable files take their slot.
    let results: Vec<FileResult<'_>> = sources
        .iter()
        .map(|(path, source)| FileResult {
            path: *path,
            result: match source {
                Ok(_) => match rendered.next() {
                    Some(result) => result.map_err(|e: RenderError| e.to_string()),
                    None => Err("not rendered".to_string()),
                },
                Err(message) => Err(message.clone()),
            },
        })
        .collect();

    let failures = results.iter().filter(|r| r.result.is_err()).count();
    match format {
        OutputFormat::Text => output_text(&results, spans),
        OutputFormat::Json => output_json(&results)?,
    }
    info!(
        "Rendered {} files ({} failed)",
        results.len() - failures,
        failures
    );

    Ok(failures > 0)
}

fn output_text(results: &[FileResult<'_>], spans: bool) {
    let with_headers = results.len() > 1;
    for (index, file) in results.iter().enumerate() {
        if with_headers {
            if index > 0 {
                println!();
            }
            println!("==> {} <==", file.path.display());
        }
        match &file.result {
            Ok(output) => {
                println!("{}", output.text);
                if spans {
                    for span in &output.spans {
                        println!(
                            "  {}..{} {} {:?}",
                            span.start,
                            span.end,
                            span.style.kind(),
                            output.slice(span).unwrap_or_default()
                        );
                    }
                }
            }
            Err(message) => eprintln!("{}: {}", file.path.display(), message),
        }
    }
}

fn output_json(results: &[FileResult<'_>]) -> Result<()> {
    let output: Vec<_> = results
        .iter()
        .map(|file| match &file.result {
            Ok(output) => serde_json::json!({
                "path": file.path.display().to_string(),
                "text": output.text,
                "spans": output.spans,
            }),
            Err(message) => serde_json::json!({
                "path": file.path.display().to_string(),
                "error": message,
            }),
        })
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&output).into_diagnostic()?
    );
    Ok(())
}
