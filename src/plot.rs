//! Time-domain I/Q plots and the sinks that draw them

use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::error::CaptureResult;

pub const X_LABEL: &str = "Time (s)";
pub const Y_LABEL: &str = "Amplitude";
/// Header of the time column in CSV output
pub const TIME_COLUMN: &str = "time_s";

/// Two aligned series (I and Q) over a shared time axis
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Plot {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Seconds since the first sample in the window
    pub time: Vec<f64>,
    pub in_phase: Vec<f32>,
    pub quadrature: Vec<f32>,
}

impl Plot {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Labeled series in legend order
    pub fn series(&self) -> [(&'static str, &[f32]); 2] {
        [("I", self.in_phase.as_slice()), ("Q", self.quadrature.as_slice())]
    }
}

/// Somewhere to put a rendered plot
pub trait PlotSink {
    fn draw(&mut self, name: &str, plot: &Plot) -> CaptureResult<()>;
}

/// Writes each plot as `<dir>/<name>.csv`, one row per sample
#[derive(Debug)]
pub struct CsvSink {
    dir: PathBuf,
}

impl CsvSink {
    pub fn new<P: AsRef<Path>>(dir: P) -> CaptureResult<Self> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
        })
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.csv"))
    }
}

impl PlotSink for CsvSink {
    fn draw(&mut self, name: &str, plot: &Plot) -> CaptureResult<()> {
        if name.is_empty() || name.contains(&['/', '\\'][..]) || name == ".." {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("plot name {name:?} is not a plain file name"),
            )
            .into());
        }
        let path = self.path_for(name);
        let mut out = BufWriter::new(File::create(&path)?);
        writeln!(out, "# {}", plot.title)?;
        writeln!(out, "# x: {}, y: {}", plot.x_label, plot.y_label)?;
        let mut wtr = csv::Writer::from_writer(out);
        let [(i_label, i), (q_label, q)] = plot.series();
        wtr.write_record([TIME_COLUMN, i_label, q_label])?;
        for ((t, i), q) in plot.time.iter().zip(i).zip(q) {
            wtr.write_record(&[t.to_string(), i.to_string(), q.to_string()])?;
        }
        wtr.flush()?;
        debug!(path = %path.display(), rows = plot.len(), "Wrote plot");
        Ok(())
    }
}

/// Keeps plots around in memory, keyed by name
#[derive(Debug, Default)]
pub struct MemorySink {
    pub plots: Vec<(String, Plot)>,
}

impl PlotSink for MemorySink {
    fn draw(&mut self, name: &str, plot: &Plot) -> CaptureResult<()> {
        self.plots.push((name.to_owned(), plot.clone()));
        Ok(())
    }
}
