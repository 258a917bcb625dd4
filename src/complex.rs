#[derive(Clone, Copy, Default, PartialEq, PartialOrd, Debug)]
#[repr(C)]
pub struct Complex<T> {
    pub re: T,
    pub im: T,
}

impl<T> Complex<T> {
    pub fn new(re: T, im: T) -> Self {
        Self { re, im }
    }
}

/// One IQ sample as written by the receive flow (fc32)
pub type ComplexFloat = Complex<f32>;

impl ComplexFloat {
    /// Pair up an interleaved `[I, Q, I, Q, ...]` buffer, dropping a dangling I
    pub fn from_interleaved(raw: &[f32]) -> Vec<Self> {
        raw.chunks_exact(2)
            .map(|pair| Self::new(pair[0], pair[1]))
            .collect()
    }

    /// Flatten back to interleaved `[I, Q, ...]` order
    pub fn to_interleaved(samples: &[Self]) -> Vec<f32> {
        samples.iter().flat_map(|s| [s.re, s.im]).collect()
    }
}
