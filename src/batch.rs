//! Batch inspection of every node/modulation capture in a data directory

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::{
    capture::{Capture, SampleFormat, Summary},
    error::{CaptureError, CaptureResult},
    plot::PlotSink,
    DEFAULT_SAMPLE_RATE, DEFAULT_WINDOW, PACKET_SIZE,
};

/// Testbed nodes whose receive flows dumped captures
pub const DEFAULT_NODES: [&str; 2] = ["friendship", "behavioral"];

/// Modulations the transmit flow cycles through, one capture file each
pub const DEFAULT_MODULATIONS: [&str; 11] = [
    "8PSK", "16QAM", "64QAM", "B-FM", "BPSK", "CPFSK", "DSB-AM", "GFSK", "PAM4", "QPSK", "SSB-AM",
];

#[derive(Clone, Debug)]
pub struct BatchConfig {
    pub data_dir: PathBuf,
    pub nodes: Vec<String>,
    pub modulations: Vec<String>,
    /// Samples per plot
    pub window: usize,
    pub sample_rate: f64,
    pub sample_format: SampleFormat,
    pub packet_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            nodes: DEFAULT_NODES.iter().map(|s| s.to_string()).collect(),
            modulations: DEFAULT_MODULATIONS.iter().map(|s| s.to_string()).collect(),
            window: DEFAULT_WINDOW,
            sample_rate: DEFAULT_SAMPLE_RATE,
            sample_format: SampleFormat::default(),
            packet_size: PACKET_SIZE,
        }
    }
}

/// Where a node's receive flow leaves the capture for one modulation
pub fn capture_path(data_dir: &Path, node: &str, modulation: &str) -> PathBuf {
    data_dir
        .join(node)
        .join("tmp")
        .join(format!("{modulation}.iq"))
}

pub fn plot_title(node: &str, modulation: &str) -> String {
    format!("{node} node {modulation} IQ samples graph")
}

#[derive(Debug)]
pub struct BatchEntry {
    pub node: String,
    pub modulation: String,
    pub outcome: CaptureResult<Summary>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &Summary> {
        self.entries.iter().filter_map(|e| e.outcome.as_ref().ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&BatchEntry, &CaptureError)> {
        self.entries
            .iter()
            .filter_map(|e| e.outcome.as_ref().err().map(|err| (e, err)))
    }
}

fn inspect(
    config: &BatchConfig,
    node: &str,
    modulation: &str,
    sink: &mut dyn PlotSink,
) -> CaptureResult<Summary> {
    let path = capture_path(&config.data_dir, node, modulation);
    let mut capture = Capture::new(path, config.sample_rate, config.sample_format)?
        .with_packet_size(config.packet_size);
    capture.load()?;
    let summary = capture.summary()?;
    info!("\n{summary}");
    let plot = capture.render(Some(config.window), &plot_title(node, modulation))?;
    sink.draw(&format!("{node}_{modulation}"), &plot)?;
    Ok(summary)
}

/// Load, summarize and plot each capture in turn.
///
/// A capture that fails doesn't stop the batch; it is logged and kept in the report.
pub fn run(config: &BatchConfig, sink: &mut dyn PlotSink) -> BatchReport {
    let mut report = BatchReport::default();
    for node in &config.nodes {
        info!(node = %node, "Inspecting node");
        for modulation in &config.modulations {
            let outcome = inspect(config, node, modulation, sink);
            if let Err(e) = &outcome {
                warn!(node = %node, modulation = %modulation, "Skipping capture - {e}");
            }
            report.entries.push(BatchEntry {
                node: node.clone(),
                modulation: modulation.clone(),
                outcome,
            });
        }
    }
    report
}
