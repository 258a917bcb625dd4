pub mod args;
pub mod batch;
pub mod capture;
pub mod complex;
pub mod error;
pub mod plot;

pub use capture::{decode_samples, write_samples, Capture, SampleFormat, Summary};
pub use complex::{Complex, ComplexFloat};
pub use error::{CaptureError, CaptureResult};
pub use plot::{CsvSink, MemorySink, Plot, PlotSink};

/// Assumed packet length in samples, only used for the packet-count estimate
pub const PACKET_SIZE: usize = 8192;
/// Sample rate of the receive flow that writes the capture files (Hz)
pub const DEFAULT_SAMPLE_RATE: f64 = 1_000_000.0;
/// Samples drawn per plot by the batch driver (four packets)
pub const DEFAULT_WINDOW: usize = 4 * PACKET_SIZE;
