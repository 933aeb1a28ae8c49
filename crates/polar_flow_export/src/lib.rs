//! Command line driver for the Polar Flow TCX exporter.

use anyhow::Context;
use polar_flow_client::{Exporter, FailedDownload};
use std::io::Write;
use std::path::PathBuf;

pub mod cli;
pub mod logging;
pub mod writer;

use cli::Cli;
use writer::TcxDirectoryWriter;

/// Outcome of a completed export run.
#[derive(Debug)]
pub struct ExportSummary {
    pub written: Vec<PathBuf>,
    pub failures: Vec<FailedDownload>,
}

/// Create the output directory, export the requested range and write every
/// activity as it arrives.
pub async fn run(cli: &Cli) -> anyhow::Result<ExportSummary> {
    let mut writer = TcxDirectoryWriter::create(&cli.output_dir)
        .await
        .with_context(|| format!("creating output directory {}", cli.output_dir.display()))?;

    let mut exporter =
        Exporter::new(&cli.config(), cli.credentials()).context("invalid exporter options")?;
    let records = exporter
        .export_range(&cli.from_date, &cli.to_date, &mut writer)
        .await
        .with_context(|| format!("exporting {} to {}", cli.from_date, cli.to_date))?;

    tracing::info!(
        downloaded = records.len(),
        failed = exporter.failures().len(),
        dir = %writer.output_dir().display(),
        "export finished"
    );
    Ok(ExportSummary {
        written: writer.written().to_vec(),
        failures: exporter.failures().to_vec(),
    })
}

/// Print the end-of-run report. The header is printed even when nothing failed.
pub fn print_summary<W: Write>(out: &mut W, failures: &[FailedDownload]) -> std::io::Result<()> {
    writeln!(out, "Export complete")?;
    writeln!(out, "These activities were not downloaded:")?;
    for failure in failures {
        writeln!(out, "{}", failure.url)?;
    }
    Ok(())
}
