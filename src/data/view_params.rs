use std::f32::consts::PI;

use crate::error::ParamError;

pub const MIN_FFT_SIZE: usize = 2;
pub const MAX_FFT_SIZE: usize = 1 << 20;
pub const MIN_ZOOM_LEVEL: i32 = -16;
pub const MAX_ZOOM_LEVEL: i32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowType {
    #[default]
    Hann,
    Hamming,
    Blackman,
    Rectangular,
}

impl WindowType {
    pub fn name(&self) -> &'static str {
        match self {
            WindowType::Hann => "Hann",
            WindowType::Hamming => "Hamming",
            WindowType::Blackman => "Blackman",
            WindowType::Rectangular => "Rectangular",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "hann" | "hanning" => Some(WindowType::Hann),
            "hamming" => Some(WindowType::Hamming),
            "blackman" => Some(WindowType::Blackman),
            "rectangular" | "rect" | "none" => Some(WindowType::Rectangular),
            _ => None,
        }
    }

    /// Window coefficients of length `n`.
    pub fn generate(&self, n: usize) -> Vec<f32> {
        if n <= 1 {
            return vec![1.0; n];
        }
        let denom = (n - 1) as f32;
        (0..n)
            .map(|i| {
                let x = 2.0 * PI * i as f32 / denom;
                match self {
                    WindowType::Hann => 0.5 * (1.0 - x.cos()),
                    WindowType::Hamming => 0.54 - 0.46 * x.cos(),
                    WindowType::Blackman => 0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos(),
                    WindowType::Rectangular => 1.0,
                }
            })
            .collect()
    }
}

/// Samples each display line advances.
///
/// Zooming in by one level halves the stride, zooming out doubles it. At zoom 0
/// consecutive lines tile the capture without overlap.
pub fn derive_stride(fft_size: usize, zoom_level: i32) -> usize {
    if zoom_level >= 0 {
        let shift = zoom_level.min(usize::BITS as i32 - 1) as u32;
        (fft_size >> shift).max(1)
    } else {
        let shift = zoom_level.unsigned_abs().min(usize::BITS - 1);
        fft_size.checked_shl(shift).unwrap_or(usize::MAX).max(1)
    }
}

pub fn validate_fft_size(size: usize) -> Result<(), ParamError> {
    if !(MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&size) {
        return Err(ParamError::FftSizeOutOfRange {
            size,
            min: MIN_FFT_SIZE,
            max: MAX_FFT_SIZE,
        });
    }
    if !size.is_power_of_two() {
        return Err(ParamError::FftSizeNotPowerOfTwo(size));
    }
    Ok(())
}

pub fn validate_zoom_level(level: i32) -> Result<(), ParamError> {
    if !(MIN_ZOOM_LEVEL..=MAX_ZOOM_LEVEL).contains(&level) {
        return Err(ParamError::ZoomOutOfRange {
            level,
            min: MIN_ZOOM_LEVEL,
            max: MAX_ZOOM_LEVEL,
        });
    }
    Ok(())
}

pub fn validate_sample_rate(rate: i64) -> Result<u64, ParamError> {
    if rate <= 0 {
        return Err(ParamError::SampleRate(rate));
    }
    Ok(rate as u64)
}

/// The engine's view configuration. Fields are private so the cached stride
/// can never disagree with `fft_size` and `zoom_level`.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewParameters {
    fft_size: usize,
    zoom_level: i32,
    sample_rate: u64,
    window: WindowType,
    stride: usize,
}

impl Default for ViewParameters {
    fn default() -> Self {
        Self {
            fft_size: 1024,
            zoom_level: 0,
            sample_rate: 8_000_000,
            window: WindowType::Hann,
            stride: 1024,
        }
    }
}

impl ViewParameters {
    pub fn new(fft_size: usize, zoom_level: i32, sample_rate: u64) -> Result<Self, ParamError> {
        validate_fft_size(fft_size)?;
        validate_zoom_level(zoom_level)?;
        validate_sample_rate(sample_rate.min(i64::MAX as u64) as i64)?;
        Ok(Self {
            fft_size,
            zoom_level,
            sample_rate,
            window: WindowType::Hann,
            stride: derive_stride(fft_size, zoom_level),
        })
    }

    pub fn with_window(mut self, window: WindowType) -> Self {
        self.window = window;
        self
    }

    #[inline]
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    #[inline]
    pub fn zoom_level(&self) -> i32 {
        self.zoom_level
    }

    #[inline]
    pub fn sample_rate(&self) -> u64 {
        self.sample_rate
    }

    #[inline]
    pub fn window(&self) -> WindowType {
        self.window
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn set_fft_size(&mut self, size: usize) -> Result<(), ParamError> {
        validate_fft_size(size)?;
        self.fft_size = size;
        self.stride = derive_stride(self.fft_size, self.zoom_level);
        Ok(())
    }

    pub fn set_zoom_level(&mut self, level: i32) -> Result<(), ParamError> {
        validate_zoom_level(level)?;
        self.zoom_level = level;
        self.stride = derive_stride(self.fft_size, self.zoom_level);
        Ok(())
    }

    pub fn set_sample_rate(&mut self, rate: i64) -> Result<(), ParamError> {
        self.sample_rate = validate_sample_rate(rate)?;
        Ok(())
    }

    pub fn set_window(&mut self, window: WindowType) {
        self.window = window;
    }

    /// Width of one FFT bin in Hz.
    pub fn bin_width_hz(&self) -> f64 {
        self.sample_rate as f64 / self.fft_size as f64
    }

    /// Duration covered by one display line's stride, in seconds.
    pub fn line_duration_seconds(&self) -> f64 {
        self.stride as f64 / self.sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stride_follows_zoom() {
        assert_eq!(derive_stride(1024, 0), 1024);
        assert_eq!(derive_stride(1024, 1), 512);
        assert_eq!(derive_stride(1024, 3), 128);
        assert_eq!(derive_stride(1024, -2), 4096);
        // Deep zoom on a small FFT never drops below one sample per line
        assert_eq!(derive_stride(4, 5), 1);
        assert_eq!(derive_stride(2, MAX_ZOOM_LEVEL), 1);
    }

    #[test]
    fn test_stride_positive_for_all_valid_params() {
        let mut size = MIN_FFT_SIZE;
        while size <= MAX_FFT_SIZE {
            for zoom in MIN_ZOOM_LEVEL..=MAX_ZOOM_LEVEL {
                assert!(derive_stride(size, zoom) >= 1);
            }
            size <<= 1;
        }
    }

    #[test]
    fn test_fft_size_validation() {
        assert!(validate_fft_size(1024).is_ok());
        assert!(validate_fft_size(2).is_ok());
        assert_eq!(validate_fft_size(1023), Err(ParamError::FftSizeNotPowerOfTwo(1023)));
        assert!(matches!(validate_fft_size(1), Err(ParamError::FftSizeOutOfRange { .. })));
        assert!(matches!(
            validate_fft_size(MAX_FFT_SIZE * 2),
            Err(ParamError::FftSizeOutOfRange { .. })
        ));
    }

    #[test]
    fn test_rejected_setters_keep_previous_values() {
        let mut p = ViewParameters::new(2048, 1, 1_000_000).unwrap();
        assert!(p.set_fft_size(1000).is_err());
        assert!(p.set_zoom_level(40).is_err());
        assert!(p.set_sample_rate(0).is_err());
        assert!(p.set_sample_rate(-5).is_err());
        assert_eq!(p.fft_size(), 2048);
        assert_eq!(p.zoom_level(), 1);
        assert_eq!(p.sample_rate(), 1_000_000);
        assert_eq!(p.stride(), 1024);
    }

    #[test]
    fn test_stride_recomputed_on_change() {
        let mut p = ViewParameters::default();
        p.set_zoom_level(2).unwrap();
        assert_eq!(p.stride(), 256);
        p.set_fft_size(4096).unwrap();
        assert_eq!(p.stride(), 1024);
        p.set_sample_rate(48_000).unwrap();
        assert_eq!(p.stride(), 1024);
    }

    #[test]
    fn test_windows() {
        let hann = WindowType::Hann.generate(8);
        assert_eq!(hann.len(), 8);
        assert!(hann[0].abs() < 1e-6);
        assert!(hann[7].abs() < 1e-6);
        assert!(WindowType::Rectangular.generate(4).iter().all(|&w| w == 1.0));
        assert_eq!(WindowType::from_name("HANNING"), Some(WindowType::Hann));
    }
}
