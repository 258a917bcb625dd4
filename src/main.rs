use clap::Parser;
use iq_slurper::{args::*, batch, CsvSink};
use tracing::{info, warn};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Get the CLI options
    let cli = Args::parse();
    // Setup logging
    tracing_subscriber::fmt()
        .with_max_level(convert_filter(cli.verbose.log_level_filter()))
        .init();
    let config = cli.batch_config();
    info!(data_dir = %config.data_dir.display(), "Starting IQ capture inspection");
    // Plots land as CSV for whatever plotting tool is at hand
    let mut sink = CsvSink::new(&cli.output_dir)?;
    let report = batch::run(&config, &mut sink);
    let failures = report.failed().count();
    info!(
        inspected = report.entries.len() - failures,
        plots = %cli.output_dir.display(),
        "Done"
    );
    if failures > 0 {
        warn!("{failures} capture(s) could not be inspected");
    }
    Ok(())
}
