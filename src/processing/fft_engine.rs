use std::sync::Arc;

use log::warn;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::data::WindowType;

/// Power assigned to empty bins and to frames that could not be computed.
pub const SILENT_DB: f32 = -200.0;

/// Windowed forward FFT producing one line of power values in dB.
///
/// Output bins are FFT-shifted: bin 0 is -Fs/2, bin `fft_size / 2` is DC and
/// the last bin is just below +Fs/2, matching normalised frequency
/// `bin / fft_size - 0.5`.
pub struct SpectralTransform {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    window_type: WindowType,
    fft_size: usize,
}

impl SpectralTransform {
    pub fn new(fft_size: usize, window_type: WindowType) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(fft_size);
        // Fold the 1/N normalisation into the window once
        let norm = 1.0 / fft_size as f32;
        let window = window_type
            .generate(fft_size)
            .into_iter()
            .map(|w| w * norm)
            .collect();
        Self {
            fft,
            window,
            window_type,
            fft_size,
        }
    }

    #[inline]
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn window_type(&self) -> WindowType {
        self.window_type
    }

    /// Transform up to `fft_size` samples. Shorter input is zero-padded,
    /// longer input is cut to the first `fft_size` samples.
    pub fn transform(&self, samples: &[Complex<f32>]) -> Vec<f32> {
        let n = self.fft_size;
        let mut buffer = vec![Complex::new(0.0f32, 0.0); n];
        for ((dst, &src), &w) in buffer.iter_mut().zip(samples.iter()).zip(self.window.iter()) {
            *dst = src * w;
        }

        self.fft.process(&mut buffer);

        if buffer.iter().any(|c| !c.re.is_finite() || !c.im.is_finite()) {
            warn!("Non-finite samples in FFT frame, rendering it silent");
            return vec![SILENT_DB; n];
        }

        let half = n / 2;
        (0..n)
            .map(|k| power_db(buffer[(k + half) % n]))
            .collect()
    }
}

#[inline]
fn power_db(c: Complex<f32>) -> f32 {
    let power = c.norm_sqr();
    if power > 0.0 {
        (10.0 * power.log10()).max(SILENT_DB)
    } else {
        SILENT_DB
    }
}
