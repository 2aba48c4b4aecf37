use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use trawl_core::entities::ScrapeResult;
use trawl_engine::export::{ExportFormat, write_results};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ExportArgs;
use crate::commands::shared;
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
struct ExportResponse {
    path: String,
    format: &'static str,
    rows: usize,
}

/// Export the filtered result view. The global `--limit` does not apply:
/// an export always carries every matching row.
pub async fn handle(args: &ExportArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let results = shared::load_results(ctx, &args.filter).await?;
    let format = resolve_format(args.export_format, args.output.as_deref());

    let Some(path) = args.output.as_deref() else {
        let stdout = std::io::stdout();
        let mut writer = stdout.lock();
        write_results(&mut writer, format, &results)?;
        writer.flush()?;
        return Ok(());
    };

    write_file(path, format, &results)?;
    tracing::info!(path = %path.display(), rows = results.len(), "results exported");
    output(
        &ExportResponse {
            path: path.display().to_string(),
            format: format.extension(),
            rows: results.len(),
        },
        flags.format,
    )
}

/// Explicit `--as` wins, then the file extension, then CSV.
fn resolve_format(explicit: Option<ExportFormat>, path: Option<&Path>) -> ExportFormat {
    explicit
        .or_else(|| {
            path.and_then(Path::extension)
                .and_then(|ext| ext.to_str())
                .and_then(|ext| ext.parse().ok())
        })
        .unwrap_or(ExportFormat::Csv)
}

fn write_file(path: &Path, format: ExportFormat, results: &[ScrapeResult]) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create export file at {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_results(&mut writer, format, results)
        .with_context(|| format!("failed to write export file at {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("failed to write export file at {}", path.display()))?;
    Ok(())
}
