//! Fmt command - run the formatting chain against files

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::app::App;

#[derive(Args, Debug)]
pub struct FmtArgs {
    /// Files to format
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Write the result back to disk instead of printing it
    #[arg(long, short = 'w')]
    pub write: bool,

    /// Exit non-zero when any file would change (implies no output)
    #[arg(long, conflicts_with = "write")]
    pub check: bool,
}

#[derive(Serialize)]
struct FmtResponse {
    files: Vec<FileResult>,
    changed: usize,
}

#[derive(Serialize)]
struct FileResult {
    file: String,
    changed: bool,
}

pub async fn execute(args: FmtArgs, app: &App) -> Result<()> {
    let ctx = &app.output;

    let mut results = Vec::new();
    let mut any_changed = false;

    for file in &args.files {
        let doc = app.open_file(file).await?;
        let formatted = app.engine.format(&doc).await?.into_inner().flatten();

        let changed = formatted.is_some();
        any_changed |= changed;

        if let Some(text) = formatted {
            if args.write {
                tokio::fs::write(doc.path(), &text).await?;
                tracing::info!("Rewrote {}", ctx.relative_path(doc.path()));
            } else if !args.check && args.files.len() == 1 && ctx.is_text() {
                // Single-file text mode prints the formatted content, like
                // the underlying tools do
                print!("{text}");
            }
        }
        results.push(FileResult {
            file: ctx.relative_path(doc.path()),
            changed,
        });
    }

    if ctx.is_text() {
        if args.check || args.write || args.files.len() > 1 {
            for r in &results {
                println!("{}: {}", r.file, if r.changed { "changed" } else { "unchanged" });
            }
        }
    } else {
        let changed = results.iter().filter(|r| r.changed).count();
        ctx.print_success_flat(FmtResponse {
            files: results,
            changed,
        });
    }

    if args.check && any_changed {
        std::process::exit(1);
    }
    Ok(())
}
