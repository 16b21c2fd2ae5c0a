use std::fmt;

/// A finished pointer drag in viewport pixels. Start and end may be in any
/// order; the rectangle is normalised before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragGesture {
    pub start: (i32, i32),
    pub end: (i32, i32),
}

impl DragGesture {
    pub fn new(start: (i32, i32), end: (i32, i32)) -> Self {
        Self { start, end }
    }

    /// (left, top, right, bottom) with left <= right and top <= bottom.
    pub fn normalized(&self) -> (i32, i32, i32, i32) {
        (
            self.start.0.min(self.end.0),
            self.start.1.min(self.end.1),
            self.start.0.max(self.end.0),
            self.start.1.max(self.end.1),
        )
    }

    pub fn width(&self) -> u32 {
        self.start.0.abs_diff(self.end.0)
    }

    pub fn height(&self) -> u32 {
        self.start.1.abs_diff(self.end.1)
    }

    /// A drag only selects when it is larger than `min_extent` on both axes.
    pub fn qualifies(&self, min_extent: u32) -> bool {
        self.width() > min_extent && self.height() > min_extent
    }
}

/// A time/frequency region. `time` is a half-open sample range, `freq` is
/// normalised frequency in [-0.5, 0.5).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub time: (u64, u64),
    pub freq: (f32, f32),
}

impl Selection {
    pub fn sample_count(&self) -> u64 {
        self.time.1 - self.time.0
    }

    pub fn summary(&self, sample_rate: u64) -> SelectionSummary {
        let rate = sample_rate as f64;
        let (left, right) = (self.freq.0 as f64, self.freq.1 as f64);
        let samples = self.sample_count();
        SelectionSummary {
            freq_start_hz: left * rate,
            freq_end_hz: right * rate,
            bandwidth_hz: (right - left) * rate,
            time_start_sec: self.time.0 as f64 / rate,
            time_end_sec: self.time.1 as f64 / rate,
            duration_sec: samples as f64 / rate,
            rate_hz: if samples == 0 { None } else { Some(rate / samples as f64) },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionEvent {
    Changed(Selection),
    Cleared,
}

/// Human-facing numbers derived from a selection and the sample rate.
/// `rate_hz` is the reciprocal of the selected duration, handy for reading
/// off symbol rates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionSummary {
    pub freq_start_hz: f64,
    pub freq_end_hz: f64,
    pub bandwidth_hz: f64,
    pub time_start_sec: f64,
    pub time_end_sec: f64,
    pub duration_sec: f64,
    pub rate_hz: Option<f64>,
}

impl fmt::Display for SelectionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Freq: {:.4}Hz to {:.4}Hz ({:.4}Hz) Time: {:.4}s to {:.4}s ({:.4}s",
            self.freq_start_hz,
            self.freq_end_hz,
            self.bandwidth_hz,
            self.time_start_sec,
            self.time_end_sec,
            self.duration_sec,
        )?;
        match self.rate_hz {
            Some(rate) => write!(f, " / {:.4}Hz)", rate),
            None => write!(f, ")"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gesture_normalisation() {
        let g = DragGesture::new((50, 80), (10, 20));
        assert_eq!(g.normalized(), (10, 20, 50, 80));
        assert_eq!(g.width(), 40);
        assert_eq!(g.height(), 60);
    }

    #[test]
    fn test_gesture_threshold() {
        assert!(!DragGesture::new((0, 0), (10, 10)).qualifies(10));
        assert!(!DragGesture::new((0, 0), (200, 5)).qualifies(10));
        assert!(DragGesture::new((0, 0), (11, 11)).qualifies(10));
        assert!(DragGesture::new((30, 30), (0, 0)).qualifies(10));
    }

    #[test]
    fn test_summary() {
        let sel = Selection {
            time: (1_000, 3_000),
            freq: (-0.25, 0.25),
        };
        let s = sel.summary(1_000_000);
        assert_eq!(s.freq_start_hz, -250_000.0);
        assert_eq!(s.bandwidth_hz, 500_000.0);
        assert_eq!(s.time_start_sec, 0.001);
        assert_eq!(s.duration_sec, 0.002);
        assert_eq!(s.rate_hz, Some(500.0));
        assert!(s.to_string().starts_with("Freq: -250000.0000Hz"));
    }

    #[test]
    fn test_summary_zero_length() {
        let sel = Selection {
            time: (5, 5),
            freq: (0.0, 0.1),
        };
        assert_eq!(sel.summary(48_000).rate_hz, None);
    }
}
