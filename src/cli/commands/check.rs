//! Check command - run diagnostics generators against files

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::app::App;
use crate::models::diagnostic::Severity;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Files to check
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Filter by severity (error, warning, info, hint)
    #[arg(long, short = 's', value_delimiter = ',')]
    pub severity: Option<Vec<String>>,

    /// Exit non-zero when any error-severity diagnostic is found
    #[arg(long)]
    pub fail_on_error: bool,
}

#[derive(Serialize)]
struct CheckResponse {
    files_checked: usize,
    count: usize,
    diagnostics: Vec<DiagnosticOutput>,
}

#[derive(Serialize)]
struct DiagnosticOutput {
    file: String,
    line: u32,
    column: u32,
    severity: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

pub async fn execute(args: CheckArgs, app: &App) -> Result<()> {
    let ctx = &app.output;

    let severity_filter: Option<Vec<Severity>> = args.severity.as_ref().map(|sevs| {
        sevs.iter()
            .filter_map(|s| s.parse::<Severity>().ok())
            .collect()
    });

    let mut all = Vec::new();
    for file in &args.files {
        let doc = app.open_file(file).await?;
        let Some(merged) = app.engine.diagnostics(&doc).await?.into_inner() else {
            continue;
        };
        for (target, diagnostics) in merged {
            for d in diagnostics {
                if let Some(filter) = &severity_filter
                    && !filter.contains(&d.severity)
                {
                    continue;
                }
                all.push(DiagnosticOutput {
                    file: ctx.relative_path(target.path()),
                    line: d.display_line(),
                    column: d.display_column(),
                    severity: d.severity.to_string(),
                    message: d.message.clone(),
                    code: d.code.clone(),
                    source: d.source.clone(),
                });
            }
        }
    }
    all.sort_by(|a, b| (&a.file, a.line, a.column).cmp(&(&b.file, b.line, b.column)));

    let has_errors = all.iter().any(|d| d.severity == "error");

    if ctx.is_text() {
        for d in &all {
            let code = d.code.as_deref().map(|c| format!(" [{c}]")).unwrap_or_default();
            println!(
                "{}:{}:{}: {}: {}{}",
                d.file, d.line, d.column, d.severity, d.message, code
            );
        }
        println!("{} diagnostic(s) in {} file(s)", all.len(), args.files.len());
    } else {
        ctx.print_success_flat(CheckResponse {
            files_checked: args.files.len(),
            count: all.len(),
            diagnostics: all,
        });
    }

    if args.fail_on_error && has_errors {
        std::process::exit(1);
    }
    Ok(())
}
