//! Doctor command - configured generator health check

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::app::App;
use crate::infra::resolver;
use crate::source::descriptor::GeneratorKind;

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Only list generators whose executable is missing
    #[arg(long)]
    pub missing_only: bool,
}

#[derive(Serialize)]
struct DoctorResponse {
    summary: DoctorSummary,
    generators: Vec<GeneratorEntry>,
}

#[derive(Serialize)]
struct DoctorSummary {
    configured: usize,
    resolved: usize,
    missing: usize,
}

#[derive(Serialize)]
struct GeneratorEntry {
    name: String,
    capability: String,
    kind: &'static str,
    live: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    filetypes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved_path: Option<String>,
}

pub async fn execute(args: DoctorArgs, app: &App) -> Result<()> {
    let ctx = &app.output;

    let mut entries = Vec::new();
    let mut resolved = 0usize;
    let mut missing = 0usize;

    let sources = app.engine.registry().sources().await;
    let configured = sources.len();

    for source in sources {
        let descriptor = &source.descriptor;
        let entry = match &descriptor.kind {
            GeneratorKind::Process(spec) => {
                let found = resolver::resolve(
                    &spec.command,
                    descriptor.resolution,
                    app.root(),
                    &app.engine_config,
                );
                match &found {
                    Some(_) => resolved += 1,
                    None => missing += 1,
                }
                if args.missing_only && found.is_some() {
                    continue;
                }
                GeneratorEntry {
                    name: descriptor.name.clone(),
                    capability: descriptor.capability.to_string(),
                    kind: "process",
                    live: source.live,
                    filetypes: descriptor.filetypes.clone(),
                    command: Some(spec.command.clone()),
                    resolution: Some(descriptor.resolution.to_string()),
                    resolved_path: found.map(|r| r.program.display().to_string()),
                }
            }
            GeneratorKind::Function(_) => {
                if args.missing_only {
                    continue;
                }
                GeneratorEntry {
                    name: descriptor.name.clone(),
                    capability: descriptor.capability.to_string(),
                    kind: "function",
                    live: source.live,
                    filetypes: descriptor.filetypes.clone(),
                    command: None,
                    resolution: None,
                    resolved_path: None,
                }
            }
        };
        entries.push(entry);
    }

    if ctx.is_text() {
        for e in &entries {
            let status = match (&e.command, &e.resolved_path, e.live) {
                (_, _, false) => "disabled",
                (Some(_), None, _) => "MISSING",
                _ => "ok",
            };
            let target = e
                .resolved_path
                .as_deref()
                .or(e.command.as_deref())
                .unwrap_or("<in-process>");
            println!("{:<10} {:<24} {:<16} {}", status, e.name, e.capability, target);
        }
        println!(
            "{} generator(s): {} resolved, {} missing",
            configured, resolved, missing
        );
    } else {
        ctx.print_success_flat(DoctorResponse {
            summary: DoctorSummary {
                configured,
                resolved,
                missing,
            },
            generators: entries,
        });
    }
    Ok(())
}
