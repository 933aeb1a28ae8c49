use clap::Parser;
use polar_flow_export::cli::Cli;
use polar_flow_export::{logging, print_summary, run};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level);
    tracing::info!(
        from = %cli.from_date,
        to = %cli.to_date,
        output = %cli.output_dir.display(),
        "polar-flow-export starting"
    );

    let summary = run(&cli).await?;

    let stdout = std::io::stdout();
    print_summary(&mut stdout.lock(), &summary.failures)?;
    Ok(())
}
