//! Loading and describing IQ capture files
//!
//! A capture file is a flat run of native-endian `fc32` samples (I then Q, 8 bytes a
//! sample) with no header, as dumped by the receive flow's file sink. The sink doesn't
//! promise a whole number of samples, so any trailing partial sample is dropped on load
//! without complaint. Existing captures depend on that leniency.

use std::{
    fmt,
    fs::File,
    io::{self, BufWriter, Read, Write},
    path::{Path, PathBuf},
    str::FromStr,
};

use byte_slice_cast::{AsByteSlice, AsMutByteSlice};
use tracing::{debug, info};

use crate::{
    complex::ComplexFloat,
    error::{CaptureError, CaptureResult},
    plot::{Plot, X_LABEL, Y_LABEL},
    DEFAULT_SAMPLE_RATE, PACKET_SIZE,
};

/// Fixed-width complex encodings a capture file can hold
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub enum SampleFormat {
    /// Two `f32`s, real then imaginary
    #[default]
    Complex64,
}

impl SampleFormat {
    /// Bytes per complex sample
    pub fn width(&self) -> usize {
        match self {
            SampleFormat::Complex64 => 2 * std::mem::size_of::<f32>(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SampleFormat::Complex64 => "complex64",
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SampleFormat {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "complex64" | "cf32" | "cf32_le" | "fc32" => Ok(SampleFormat::Complex64),
            _ => Err(CaptureError::UnsupportedFormat(s.to_owned())),
        }
    }
}

/// Descriptive record for a loaded capture
#[derive(Clone, PartialEq, Debug)]
pub struct Summary {
    pub source_path: PathBuf,
    pub sample_rate: f64,
    pub sample_format: SampleFormat,
    pub sample_count: usize,
    /// `sample_count / packet_size`, deliberately not rounded
    pub packet_count: f64,
    pub duration_secs: f64,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "File Path: {}", self.source_path.display())?;
        writeln!(f, "Sample Rate: {}", self.sample_rate)?;
        writeln!(f, "Data Type: {}", self.sample_format)?;
        writeln!(f, "Number of Samples: {}", self.sample_count)?;
        writeln!(f, "Duration (s): {}", self.duration_secs)?;
        write!(f, "Number of packets: {}", self.packet_count)
    }
}

/// A single IQ recording on disk, and its samples once loaded
#[derive(Debug)]
pub struct Capture {
    path: PathBuf,
    sample_rate: f64,
    format: SampleFormat,
    packet_size: usize,
    samples: Option<Vec<ComplexFloat>>,
}

impl Capture {
    /// Describe a capture. Nothing touches the disk until [`Capture::load`].
    ///
    /// The sample rate must be positive and finite.
    pub fn new<P: AsRef<Path>>(
        path: P,
        sample_rate: f64,
        format: SampleFormat,
    ) -> CaptureResult<Self> {
        if !(sample_rate > 0.0 && sample_rate.is_finite()) {
            return Err(CaptureError::InvalidSampleRate(sample_rate));
        }
        Ok(Self::unchecked(path, sample_rate, format))
    }

    /// Capture at the default 1 Msps in `complex64`
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self::unchecked(path, DEFAULT_SAMPLE_RATE, SampleFormat::default())
    }

    fn unchecked<P: AsRef<Path>>(path: P, sample_rate: f64, format: SampleFormat) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            sample_rate,
            format,
            packet_size: PACKET_SIZE,
            samples: None,
        }
    }

    /// Override the packet length used for the packet-count estimate
    pub fn with_packet_size(mut self, packet_size: usize) -> Self {
        self.packet_size = packet_size.max(1);
        self
    }

    pub fn source_path(&self) -> &Path {
        &self.path
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn sample_format(&self) -> SampleFormat {
        self.format
    }

    pub fn packet_size(&self) -> usize {
        self.packet_size
    }

    pub fn is_loaded(&self) -> bool {
        self.samples.is_some()
    }

    /// Read the whole file into memory, replacing anything loaded before.
    /// On failure the previous samples (if any) are left as they were.
    pub fn load(&mut self) -> CaptureResult<()> {
        let samples = self.read_samples()?;
        info!(
            path = %self.path.display(),
            samples = samples.len(),
            "Loaded capture"
        );
        self.samples = Some(samples);
        Ok(())
    }

    fn read_samples(&self) -> CaptureResult<Vec<ComplexFloat>> {
        // The handle drops (closes) on every path out of here
        File::open(&self.path)
            .and_then(|file| decode_samples(file, self.format))
            .map_err(|e| CaptureError::from_read(self.path.clone(), e))
    }

    fn loaded(&self) -> CaptureResult<&[ComplexFloat]> {
        self.samples
            .as_deref()
            .ok_or_else(|| CaptureError::NotLoaded {
                path: self.path.clone(),
            })
    }

    /// Read-only view of the loaded samples
    pub fn samples(&self) -> CaptureResult<&[ComplexFloat]> {
        self.loaded()
    }

    pub fn summary(&self) -> CaptureResult<Summary> {
        let sample_count = self.loaded()?.len();
        Ok(Summary {
            source_path: self.path.clone(),
            sample_rate: self.sample_rate,
            sample_format: self.format,
            sample_count,
            packet_count: sample_count as f64 / self.packet_size as f64,
            duration_secs: sample_count as f64 / self.sample_rate,
        })
    }

    /// Time-domain I/Q plot of the first `window` samples.
    ///
    /// `None` or `Some(0)` plots everything; a window past the end is clamped.
    pub fn render(&self, window: Option<usize>, title: &str) -> CaptureResult<Plot> {
        let samples = self.loaded()?;
        let n = match window {
            Some(w) if w > 0 => w.min(samples.len()),
            _ => samples.len(),
        };
        let samples = &samples[..n];
        Ok(Plot {
            title: title.to_owned(),
            x_label: X_LABEL.to_owned(),
            y_label: Y_LABEL.to_owned(),
            time: (0..n).map(|i| i as f64 / self.sample_rate).collect(),
            in_phase: samples.iter().map(|s| s.re).collect(),
            quadrature: samples.iter().map(|s| s.im).collect(),
        })
    }
}

/// Read `reader` to EOF and decode every whole sample in it.
///
/// A trailing partial sample is dropped, not reported.
pub fn decode_samples<R: Read>(
    mut reader: R,
    format: SampleFormat,
) -> io::Result<Vec<ComplexFloat>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let width = format.width();
    let whole = bytes.len() / width * width;
    if whole != bytes.len() {
        debug!(
            trailing = bytes.len() - whole,
            "Dropping partial sample at end of capture"
        );
    }
    match format {
        SampleFormat::Complex64 => {
            // Copy into a float buffer so the cast never depends on byte alignment
            let mut raw = vec![0f32; whole / std::mem::size_of::<f32>()];
            raw.as_mut_byte_slice().copy_from_slice(&bytes[..whole]);
            Ok(ComplexFloat::from_interleaved(&raw))
        }
    }
}

/// Write samples in the same layout the receive flow's file sink produces
pub fn write_samples<P: AsRef<Path>>(path: P, samples: &[ComplexFloat]) -> CaptureResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(ComplexFloat::to_interleaved(samples).as_byte_slice())?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::complex::Complex;
    use rand::prelude::*;
    use std::fs::OpenOptions;
    use tempfile::TempDir;

    fn random_samples(n: usize) -> Vec<ComplexFloat> {
        let mut rng = rand::thread_rng();
        (0..n)
            .map(|_| Complex::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
            .collect()
    }

    fn capture_with(dir: &TempDir, samples: &[ComplexFloat]) -> Capture {
        let path = dir.path().join("test.iq");
        write_samples(&path, samples).unwrap();
        Capture::open(path)
    }

    #[test]
    fn test_load_exact_multiple() {
        let dir = TempDir::new().unwrap();
        let written = random_samples(1000);
        let mut cap = capture_with(&dir, &written);
        cap.load().unwrap();
        let read = cap.samples().unwrap();
        assert_eq!(read.len(), 1000);
        for (orig, got) in written.iter().zip(read) {
            assert!((orig.re - got.re).abs() < 1e-6);
            assert!((orig.im - got.im).abs() < 1e-6);
        }
    }

    #[test]
    fn test_partial_trailing_sample_dropped() {
        let dir = TempDir::new().unwrap();
        let written = random_samples(64);
        for extra in 1..8u8 {
            let mut cap = capture_with(&dir, &written);
            let mut file = OpenOptions::new()
                .append(true)
                .open(cap.source_path())
                .unwrap();
            file.write_all(&vec![0xAB; extra as usize]).unwrap();
            drop(file);
            cap.load().unwrap();
            assert_eq!(cap.samples().unwrap(), &written[..]);
        }
    }

    #[test]
    fn test_reload_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut cap = capture_with(&dir, &random_samples(300));
        cap.load().unwrap();
        let first = cap.samples().unwrap().to_vec();
        cap.load().unwrap();
        assert_eq!(first, cap.samples().unwrap());
    }

    #[test]
    fn test_not_loaded() {
        let cap = Capture::open("never-read.iq");
        assert!(!cap.is_loaded());
        assert!(matches!(cap.summary(), Err(CaptureError::NotLoaded { .. })));
        assert!(matches!(cap.samples(), Err(CaptureError::NotLoaded { .. })));
        assert!(matches!(
            cap.render(Some(10), "nope"),
            Err(CaptureError::NotLoaded { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let mut cap = Capture::open(dir.path().join("missing.iq"));
        assert!(matches!(cap.load(), Err(CaptureError::FileNotFound { .. })));
        assert!(!cap.is_loaded());
    }

    #[test]
    fn test_failed_reload_keeps_samples() {
        let dir = TempDir::new().unwrap();
        let mut cap = capture_with(&dir, &random_samples(16));
        cap.load().unwrap();
        std::fs::remove_file(cap.source_path()).unwrap();
        assert!(cap.load().is_err());
        assert_eq!(cap.samples().unwrap().len(), 16);
    }

    #[test]
    fn test_packet_count_not_truncated() {
        let dir = TempDir::new().unwrap();
        let mut cap = capture_with(&dir, &vec![ComplexFloat::default(); 20000]);
        cap.load().unwrap();
        let summary = cap.summary().unwrap();
        assert_eq!(summary.sample_count, 20000);
        assert_eq!(summary.packet_count, 2.44140625);
        assert_eq!(summary.duration_secs, 0.02);
        assert_eq!(summary.sample_format, SampleFormat::Complex64);
    }

    #[test]
    fn test_custom_packet_size() {
        let dir = TempDir::new().unwrap();
        let mut cap = capture_with(&dir, &vec![ComplexFloat::default(); 300]).with_packet_size(200);
        cap.load().unwrap();
        assert_eq!(cap.summary().unwrap().packet_count, 1.5);
    }

    #[test]
    fn test_render_clamps_window() {
        let dir = TempDir::new().unwrap();
        let mut cap = capture_with(&dir, &random_samples(500));
        cap.load().unwrap();
        let plot = cap.render(Some(1500), "clamped").unwrap();
        assert_eq!(plot.time.len(), 500);
        assert_eq!(plot.in_phase.len(), 500);
        assert_eq!(plot.quadrature.len(), 500);
    }

    #[test]
    fn test_render_axis_and_channels() {
        let dir = TempDir::new().unwrap();
        let written = vec![
            Complex::new(1.0, -1.0),
            Complex::new(2.0, -2.0),
            Complex::new(3.0, -3.0),
        ];
        let mut cap = capture_with(&dir, &written);
        cap.load().unwrap();

        let plot = cap.render(Some(2), "two").unwrap();
        assert_eq!(plot.title, "two");
        assert_eq!(plot.x_label, "Time (s)");
        assert_eq!(plot.y_label, "Amplitude");
        assert_eq!(plot.time, vec![0.0, 1e-6]);
        assert_eq!(plot.in_phase, vec![1.0, 2.0]);
        assert_eq!(plot.quadrature, vec![-1.0, -2.0]);

        assert_eq!(cap.render(None, "").unwrap().len(), 3);
        assert_eq!(cap.render(Some(0), "").unwrap().len(), 3);
    }

    /// Hands out a few bytes per read and has no length up front, like a pipe
    struct Trickle {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(3).min(self.bytes.len() - self.pos);
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn test_decode_reads_to_eof() {
        let written = vec![Complex::new(1.0f32, 2.0); 100];
        let mut bytes = ComplexFloat::to_interleaved(&written).as_byte_slice().to_vec();
        bytes.extend_from_slice(&[0xFF; 5]);
        let reader = Trickle { bytes, pos: 0 };
        let read = decode_samples(reader, SampleFormat::Complex64).unwrap();
        assert_eq!(read, written);
    }

    #[cfg(unix)]
    #[test]
    fn test_load_from_fifo() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pipe.iq");
        let made = std::process::Command::new("mkfifo").arg(&path).status();
        if !matches!(made, Ok(status) if status.success()) {
            // No mkfifo on this host
            return;
        }
        let written = vec![Complex::new(1.0f32, 2.0); 100];
        let writer = {
            let (path, written) = (path.clone(), written.clone());
            std::thread::spawn(move || write_samples(path, &written))
        };
        let mut cap = Capture::open(&path);
        cap.load().unwrap();
        writer.join().unwrap().unwrap();
        assert_eq!(cap.samples().unwrap(), &written[..]);
    }

    #[test]
    fn test_rejects_bad_sample_rate() {
        for rate in [0.0, -1e6, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                Capture::new("x.iq", rate, SampleFormat::Complex64),
                Err(CaptureError::InvalidSampleRate(_))
            ));
        }
        let cap = Capture::new("x.iq", 2e6, SampleFormat::Complex64).unwrap();
        assert_eq!(cap.sample_rate(), 2e6);
    }

    #[test]
    fn test_format_names() {
        assert_eq!("cf32".parse::<SampleFormat>().unwrap(), SampleFormat::Complex64);
        assert_eq!("Complex64".parse::<SampleFormat>().unwrap().width(), 8);
        assert!(matches!(
            "ci16".parse::<SampleFormat>(),
            Err(CaptureError::UnsupportedFormat(name)) if name == "ci16"
        ));
    }
}
