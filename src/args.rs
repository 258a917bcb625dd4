//! Argument parsing for running from the command line

use std::path::PathBuf;

use clap::Parser;

use crate::{
    batch::{BatchConfig, DEFAULT_MODULATIONS, DEFAULT_NODES},
    capture::SampleFormat,
    DEFAULT_SAMPLE_RATE, DEFAULT_WINDOW, PACKET_SIZE,
};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Directory holding `<node>/tmp/<modulation>.iq` captures
    #[clap(short, long, default_value = ".")]
    pub data_dir: PathBuf,
    /// Directory to write the per-capture I/Q plot CSVs into
    #[clap(short, long, default_value = "plots")]
    pub output_dir: PathBuf,
    /// Comma separated node names (defaults to the testbed pair)
    #[clap(short, long, value_delimiter = ',', value_parser = valid_name)]
    pub nodes: Vec<String>,
    /// Comma separated modulation names (defaults to all eleven)
    #[clap(short, long, value_delimiter = ',', value_parser = valid_name)]
    pub modulations: Vec<String>,
    /// Samples to plot per capture, 0 plots the whole file
    #[clap(short, long, default_value_t = DEFAULT_WINDOW)]
    pub window: usize,
    /// Sample rate of the captures in Hz
    #[clap(short, long, default_value_t = DEFAULT_SAMPLE_RATE, value_parser = valid_sample_rate)]
    pub sample_rate: f64,
    /// Sample encoding of the capture files
    #[clap(short, long, default_value = "complex64", value_parser = valid_format)]
    pub format: SampleFormat,
    /// Assumed packet length in samples for the packet count estimate
    #[clap(short, long, default_value_t = PACKET_SIZE as u64)]
    #[clap(value_parser = clap::value_parser!(u64).range(1..))]
    pub packet_size: u64,
    #[clap(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity,
}

impl Args {
    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            data_dir: self.data_dir.clone(),
            nodes: names_or(&self.nodes, &DEFAULT_NODES),
            modulations: names_or(&self.modulations, &DEFAULT_MODULATIONS),
            window: self.window,
            sample_rate: self.sample_rate,
            sample_format: self.format,
            packet_size: self.packet_size as usize,
        }
    }
}

fn names_or(given: &[String], default: &[&str]) -> Vec<String> {
    if given.is_empty() {
        default.iter().map(|s| s.to_string()).collect()
    } else {
        given.to_vec()
    }
}

/// Match verbosity filter with tracing subscriber log levels
pub fn convert_filter(filter: log::LevelFilter) -> tracing_subscriber::filter::LevelFilter {
    match filter {
        log::LevelFilter::Off => tracing_subscriber::filter::LevelFilter::OFF,
        log::LevelFilter::Error => tracing_subscriber::filter::LevelFilter::ERROR,
        log::LevelFilter::Warn => tracing_subscriber::filter::LevelFilter::WARN,
        log::LevelFilter::Info => tracing_subscriber::filter::LevelFilter::INFO,
        log::LevelFilter::Debug => tracing_subscriber::filter::LevelFilter::DEBUG,
        log::LevelFilter::Trace => tracing_subscriber::filter::LevelFilter::TRACE,
    }
}

fn valid_sample_rate(s: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(rate) if rate > 0.0 && rate.is_finite() => Ok(rate),
        Ok(_) => Err("Sample rate must be positive".to_string()),
        Err(_) => Err("Invalid sample rate".to_string()),
    }
}

/// Node and modulation names become path components and plot file names
fn valid_name(s: &str) -> Result<String, String> {
    if s.is_empty() || s == "." || s == ".." || s.contains(&['/', '\\'][..]) {
        Err(format!("{s:?} is not a plain name"))
    } else {
        Ok(s.to_owned())
    }
}

fn valid_format(s: &str) -> Result<SampleFormat, String> {
    s.parse().map_err(|e: crate::error::CaptureError| e.to_string())
}
