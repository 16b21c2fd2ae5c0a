//! Synthetic I/Q captures for trying out the viewer and for tests.
//!
//! The generated signal is a steady carrier, a linear chirp sweeping across
//! the band and a little white noise, so every part of the waterfall has
//! something to look at.

use std::f64::consts::PI;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use rand::Rng;
use rustfft::num_complex::Complex;

use crate::data::{ByteOrder, SampleFormat};

#[derive(Debug, Clone)]
pub struct TestSignal {
    pub sample_rate: u64,
    pub samples: u64,
    /// Carrier offset from the centre frequency, in Hz
    pub tone_hz: f64,
    pub tone_amplitude: f32,
    pub chirp_amplitude: f32,
    pub noise_amplitude: f32,
}

impl Default for TestSignal {
    fn default() -> Self {
        Self {
            sample_rate: 1_000_000,
            samples: 1_000_000,
            tone_hz: 125_000.0,
            tone_amplitude: 0.5,
            chirp_amplitude: 0.25,
            noise_amplitude: 0.01,
        }
    }
}

impl TestSignal {
    /// Sample `i` of the signal, with noise drawn from `rng`.
    pub fn sample<R: Rng>(&self, i: u64, rng: &mut R) -> Complex<f32> {
        let rate = self.sample_rate as f64;
        let t = i as f64 / rate;
        let duration = self.samples.max(1) as f64 / rate;

        let tone_phase = 2.0 * PI * self.tone_hz * t;

        // Sweep -Fs/2 .. +Fs/2 over the capture
        let f0 = -rate / 2.0;
        let k = rate / duration;
        let chirp_phase = 2.0 * PI * (f0 * t + 0.5 * k * t * t);

        let mut s = Complex::new(tone_phase.cos() as f32, tone_phase.sin() as f32) * self.tone_amplitude
            + Complex::new(chirp_phase.cos() as f32, chirp_phase.sin() as f32) * self.chirp_amplitude;
        if self.noise_amplitude > 0.0 {
            s += Complex::new(
                rng.random_range(-1.0f32..1.0),
                rng.random_range(-1.0f32..1.0),
            ) * self.noise_amplitude;
        }
        s
    }

    pub fn write_to<W: Write>(&self, writer: &mut W, format: SampleFormat, order: ByteOrder) -> Result<()> {
        let mut rng = rand::rng();
        let mut bytes = Vec::with_capacity(format.bytes_per_sample() * 4096);
        for i in 0..self.samples {
            format.encode(self.sample(i, &mut rng), order, &mut bytes);
            if bytes.len() >= format.bytes_per_sample() * 4096 {
                writer.write_all(&bytes)?;
                bytes.clear();
            }
        }
        writer.write_all(&bytes)?;
        Ok(())
    }

    pub fn write_file<P: AsRef<Path>>(&self, path: P, format: SampleFormat, order: ByteOrder) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create capture file: {:?}", path))?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer, format, order)?;
        writer.flush().context("Failed to flush capture file")?;
        info!(
            "Wrote {} {} samples at {} Hz to {}",
            self.samples,
            format.short_name(),
            self.sample_rate,
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_written_size() {
        let sig = TestSignal {
            samples: 1000,
            ..Default::default()
        };
        for &fmt in SampleFormat::ALL {
            let mut out = Vec::new();
            sig.write_to(&mut out, fmt, ByteOrder::Little).unwrap();
            assert_eq!(out.len(), 1000 * fmt.bytes_per_sample());
        }
    }

    #[test]
    fn test_noise_free_is_bounded() {
        let sig = TestSignal {
            noise_amplitude: 0.0,
            ..Default::default()
        };
        let mut rng = rand::rng();
        for i in (0..sig.samples).step_by(997) {
            let s = sig.sample(i, &mut rng);
            assert!(s.norm() <= sig.tone_amplitude + sig.chirp_amplitude + 1e-5);
        }
    }
}
