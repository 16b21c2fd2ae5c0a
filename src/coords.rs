//! Pure conversions between display space and capture space.
//!
//! Vertical: display line <-> sample offset <-> seconds, governed by the
//! stride. Horizontal: pixel column <-> normalised frequency in [-0.5, 0.5)
//! <-> Hz. Nothing here touches the file.

use crate::data::{DragGesture, Selection, SelectionEvent, ViewParameters};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    stride: u64,
    fft_size: usize,
    sample_rate: u64,
    total_samples: u64,
}

impl CoordinateMapper {
    pub fn new(params: &ViewParameters, total_samples: u64) -> Self {
        Self {
            stride: params.stride() as u64,
            fft_size: params.fft_size(),
            sample_rate: params.sample_rate(),
            total_samples,
        }
    }

    #[inline]
    pub fn stride(&self) -> u64 {
        self.stride
    }

    #[inline]
    pub fn line_to_sample(&self, line: u64) -> u64 {
        line.saturating_mul(self.stride)
    }

    #[inline]
    pub fn sample_to_line(&self, sample: u64) -> u64 {
        sample / self.stride
    }

    /// Clamp a sample offset into [0, total_samples). An empty capture maps
    /// everything to 0.
    pub fn clamp_sample(&self, sample: u64) -> u64 {
        sample.min(self.total_samples.saturating_sub(1))
    }

    /// Lines needed to cover the whole capture; the last one may run past the
    /// end and is zero-padded.
    pub fn line_count(&self) -> u64 {
        self.total_samples.div_ceil(self.stride)
    }

    pub fn sample_to_seconds(&self, sample: u64) -> f64 {
        sample as f64 / self.sample_rate as f64
    }

    pub fn line_to_seconds(&self, line: u64) -> f64 {
        self.sample_to_seconds(self.line_to_sample(line))
    }

    /// Normalised frequency of pixel column `x` in a display `width` pixels
    /// wide, scrolled horizontally by `offset` pixels.
    ///
    /// The column is clamped to the display so the result stays in
    /// [-0.5, 0.5). A zero-width display yields 0.
    pub fn normalized_freq(&self, x: i32, width: u32, offset: i32) -> f32 {
        if width == 0 {
            return 0.0;
        }
        let col = (offset as i64 + x as i64).clamp(0, width as i64 - 1);
        (col as f64 / width as f64 - 0.5) as f32
    }

    /// Pixel column (before horizontal scroll) showing a normalised frequency.
    pub fn freq_to_column(&self, normalized: f32, width: u32) -> u32 {
        if width == 0 {
            return 0;
        }
        let col = ((normalized as f64 + 0.5) * width as f64).floor();
        col.clamp(0.0, (width - 1) as f64) as u32
    }

    pub fn absolute_freq_hz(&self, normalized: f32) -> f64 {
        normalized as f64 * self.sample_rate as f64
    }

    /// Normalised centre frequency of an FFT-shifted output bin.
    pub fn bin_to_normalized_freq(&self, bin: usize) -> f32 {
        (bin as f64 / self.fft_size as f64 - 0.5) as f32
    }

    /// Sample at the vertical centre of a viewport whose first visible line is
    /// `scroll_line`.
    pub fn center_sample(&self, scroll_line: u64, viewport_height: u32) -> u64 {
        self.line_to_sample(scroll_line + viewport_height as u64 / 2)
    }

    /// Scroll position that puts `sample` back at the viewport centre. Use
    /// with `center_sample` across a stride change to keep the view anchored.
    pub fn scroll_line_for(&self, sample: u64, viewport_height: u32) -> u64 {
        self.sample_to_line(sample)
            .saturating_sub(viewport_height as u64 / 2)
    }

    /// Turn a finished drag into a selection event.
    ///
    /// `scroll` is (horizontal pixel offset, first visible line) and `width`
    /// the full display width in pixels. Drags no larger than `min_extent`
    /// pixels on either axis clear the selection.
    pub fn selection_from_drag(
        &self,
        gesture: &DragGesture,
        scroll: (i32, u64),
        width: u32,
        min_extent: u32,
    ) -> SelectionEvent {
        if !gesture.qualifies(min_extent) {
            return SelectionEvent::Cleared;
        }
        let (left, top, right, bottom) = gesture.normalized();

        let to_line = |y: i32| (scroll.1 as i64 + y as i64).max(0) as u64;
        let start = self.line_to_sample(to_line(top)).min(self.total_samples);
        let end = self.line_to_sample(to_line(bottom)).min(self.total_samples);

        SelectionEvent::Changed(Selection {
            time: (start, end),
            freq: (
                self.normalized_freq(left, width, scroll.0),
                self.normalized_freq(right, width, scroll.0),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{MAX_FFT_SIZE, MAX_ZOOM_LEVEL, MIN_FFT_SIZE, MIN_ZOOM_LEVEL};

    fn mapper(fft_size: usize, zoom: i32, total: u64) -> CoordinateMapper {
        let params = ViewParameters::new(fft_size, zoom, 1_000_000).unwrap();
        CoordinateMapper::new(&params, total)
    }

    #[test]
    fn test_line_sample_round_trip() {
        let mut size = MIN_FFT_SIZE;
        while size <= MAX_FFT_SIZE {
            for zoom in MIN_ZOOM_LEVEL..=MAX_ZOOM_LEVEL {
                let m = mapper(size, zoom, 1 << 40);
                assert!(m.stride() >= 1);
                for line in [0u64, 1, 7, 1000, 123_457] {
                    assert_eq!(m.sample_to_line(m.line_to_sample(line)), line);
                }
            }
            size <<= 4;
        }
    }

    #[test]
    fn test_line_count_and_clamp() {
        let m = mapper(1024, 0, 1_000_000);
        assert_eq!(m.line_count(), 977);
        assert_eq!(m.clamp_sample(2_000_000), 999_999);
        assert_eq!(m.clamp_sample(5), 5);
        assert_eq!(mapper(1024, 0, 0).clamp_sample(10), 0);
        assert_eq!(mapper(1024, 0, 0).line_count(), 0);
    }

    #[test]
    fn test_frequency_mapping() {
        let m = mapper(1024, 0, 1_000_000);
        assert_eq!(m.normalized_freq(0, 1024, 0), -0.5);
        assert_eq!(m.normalized_freq(512, 1024, 0), 0.0);
        assert_eq!(m.normalized_freq(256, 1024, 256), 0.0);
        assert!(m.normalized_freq(5000, 1024, 0) < 0.5);
        assert_eq!(m.normalized_freq(-40, 1024, 0), -0.5);
        assert_eq!(m.normalized_freq(10, 0, 0), 0.0);
        assert_eq!(m.absolute_freq_hz(0.25), 250_000.0);
        assert_eq!(m.freq_to_column(0.0, 1024), 512);
        assert_eq!(m.freq_to_column(0.49999, 1024), 1023);
        assert_eq!(m.bin_to_normalized_freq(512), 0.0);
    }

    #[test]
    fn test_center_anchor_survives_zoom() {
        let before = mapper(1024, 0, 100_000_000);
        let sample = before.center_sample(5000, 600);
        assert_eq!(sample, 5300 * 1024);

        let after = mapper(1024, 2, 100_000_000);
        let scroll = after.scroll_line_for(sample, 600);
        assert_eq!(after.center_sample(scroll, 600), sample);
    }

    #[test]
    fn test_small_drag_clears() {
        let m = mapper(1024, 0, 1_000_000);
        let g = DragGesture::new((100, 100), (108, 105));
        assert_eq!(m.selection_from_drag(&g, (0, 0), 1024, 10), SelectionEvent::Cleared);
    }

    #[test]
    fn test_drag_selects_region() {
        let m = mapper(1024, 0, 1_000_000);
        let g = DragGesture::new((768, 60), (256, 20));
        match m.selection_from_drag(&g, (0, 100), 1024, 10) {
            SelectionEvent::Changed(sel) => {
                assert_eq!(sel.time, (120 * 1024, 160 * 1024));
                assert_eq!(sel.freq, (-0.25, 0.25));
            }
            other => panic!("expected a selection, got {other:?}"),
        }
    }

    #[test]
    fn test_drag_past_end_is_clamped() {
        let m = mapper(1024, 0, 50_000);
        let g = DragGesture::new((0, 0), (2000, 500));
        match m.selection_from_drag(&g, (0, 0), 1024, 10) {
            SelectionEvent::Changed(sel) => {
                assert!(sel.time.0 <= sel.time.1);
                assert_eq!(sel.time.1, 50_000);
                assert!(sel.freq.0 >= -0.5 && sel.freq.1 < 0.5);
            }
            other => panic!("expected a selection, got {other:?}"),
        }
    }
}
