//! The spectrogram engine: owns the open capture, the view parameters and
//! the line cache, and answers the display's row and coordinate queries.
//!
//! All public methods are meant to be called from a single (UI) thread.
//! Expensive line computation either happens inline (`get_line`) or on the
//! worker pool (`request_line` + `poll_completed`).

use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::coords::CoordinateMapper;
use crate::data::{
    derive_stride, ByteOrder, DragGesture, PowerRange, SampleFormat, Selection, SelectionEvent,
    SelectionSummary, ViewParameters, WindowType, MAX_FFT_SIZE, MAX_ZOOM_LEVEL, MIN_FFT_SIZE,
    MIN_ZOOM_LEVEL,
};
use crate::error::{EngineError, EngineResult};
use crate::processing::{
    compute_line, silent_line, Capture, Line, LineCache, LineKey, LineWorker, SpectralTransform,
    WorkerMessage,
};
use crate::settings::Settings;

/// Keyboard modifier held during a wheel event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelModifier {
    None,
    /// Step the zoom level
    Control,
    /// Step the FFT size by a power of two
    Shift,
}

/// Answer to a non-blocking row request.
#[derive(Debug, Clone, PartialEq)]
pub enum LineRequest {
    Ready(Vec<f32>),
    /// All-zero placeholder; the real row turns up in `poll_completed`.
    Pending(Vec<f32>),
}

pub struct SpectrogramEngine {
    settings: Settings,
    defaults: ViewParameters,
    capture: Option<Arc<Capture>>,
    params: ViewParameters,
    power: PowerRange,
    transform: Arc<SpectralTransform>,
    cache: LineCache,
    worker: LineWorker,
    subscribers: Vec<Sender<SelectionEvent>>,
    selection: Option<Selection>,
}

impl SpectrogramEngine {
    pub fn new(settings: Settings) -> Result<Self> {
        let defaults = settings
            .view_parameters()
            .context("Invalid view defaults in settings")?;
        let power = settings
            .power_range()
            .context("Invalid power range in settings")?;
        let worker = LineWorker::new(settings.worker_threads)
            .context("Failed to start line worker pool")?;
        let transform = Arc::new(SpectralTransform::new(defaults.fft_size(), defaults.window()));
        debug!("Line worker pool running {} threads", worker.threads());

        Ok(Self {
            cache: LineCache::new(settings.cache_lines),
            settings,
            params: defaults.clone(),
            defaults,
            capture: None,
            power,
            transform,
            worker,
            subscribers: Vec::new(),
            selection: None,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ─── Capture ───────────────────────────────────────────────────────────────

    /// Open a capture using the sample layout from the settings.
    pub fn open_file<P: AsRef<Path>>(&mut self, path: P) -> EngineResult<()> {
        let (format, order) = (self.settings.sample_format, self.settings.byte_order);
        self.open_file_as(path, format, order)
    }

    /// Open a capture with an explicit sample layout. On failure the engine
    /// is left exactly as it was.
    pub fn open_file_as<P: AsRef<Path>>(
        &mut self,
        path: P,
        format: SampleFormat,
        byte_order: ByteOrder,
    ) -> EngineResult<()> {
        let capture = Capture::open(path, format, byte_order)?;

        self.capture = Some(Arc::new(capture));
        self.params = self.defaults.clone();
        self.rebuild_transform();
        self.invalidate("new capture");
        if self.selection.is_some() {
            self.publish(SelectionEvent::Cleared);
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.capture.is_some()
    }

    pub fn capture(&self) -> Option<&Capture> {
        self.capture.as_deref()
    }

    pub fn total_samples(&self) -> u64 {
        self.capture.as_ref().map_or(0, |c| c.total_samples())
    }

    // ─── View parameters ───────────────────────────────────────────────────────

    pub fn view(&self) -> &ViewParameters {
        &self.params
    }

    /// Only changes frequency labelling; cached lines stay valid.
    pub fn set_sample_rate(&mut self, rate: i64) -> EngineResult<()> {
        let mut next = self.params.clone();
        next.set_sample_rate(rate)?;
        self.require_capture()?;
        self.params = next;
        info!("Sample rate set to {} Hz", rate);
        Ok(())
    }

    pub fn set_fft_size(&mut self, size: usize) -> EngineResult<()> {
        let mut next = self.params.clone();
        next.set_fft_size(size)?;
        self.require_capture()?;
        if next == self.params {
            return Ok(());
        }
        self.params = next;
        self.rebuild_transform();
        self.invalidate("FFT size change");
        info!("FFT size {} (stride {})", size, self.params.stride());
        Ok(())
    }

    pub fn set_zoom_level(&mut self, level: i32) -> EngineResult<()> {
        let mut next = self.params.clone();
        next.set_zoom_level(level)?;
        self.require_capture()?;
        if next == self.params {
            return Ok(());
        }
        self.params = next;
        self.invalidate("zoom change");
        info!("Zoom level {} (stride {})", level, self.params.stride());
        Ok(())
    }

    pub fn set_window(&mut self, window: WindowType) -> EngineResult<()> {
        self.require_capture()?;
        if window == self.params.window() {
            return Ok(());
        }
        self.params.set_window(window);
        self.rebuild_transform();
        self.invalidate("window change");
        Ok(())
    }

    // ─── Power range ───────────────────────────────────────────────────────────

    pub fn power_range(&self) -> PowerRange {
        self.power
    }

    /// Display-only: cached power values are kept.
    pub fn set_power_min(&mut self, db: f32) -> EngineResult<()> {
        self.power.set_min(db)?;
        Ok(())
    }

    /// Display-only: cached power values are kept.
    pub fn set_power_max(&mut self, db: f32) -> EngineResult<()> {
        self.power.set_max(db)?;
        Ok(())
    }

    // ─── Coordinates ───────────────────────────────────────────────────────────

    /// Samples per display line.
    pub fn stride(&self) -> usize {
        self.params.stride()
    }

    pub fn mapper(&self) -> CoordinateMapper {
        CoordinateMapper::new(&self.params, self.total_samples())
    }

    pub fn line_to_sample(&self, line: u64) -> u64 {
        self.mapper().line_to_sample(line)
    }

    pub fn sample_to_line(&self, sample: u64) -> u64 {
        self.mapper().sample_to_line(sample)
    }

    pub fn line_count(&self) -> u64 {
        self.mapper().line_count()
    }

    /// Sample at the centre of a viewport starting at `scroll_line`.
    pub fn center_sample(&self, scroll_line: u64, viewport_height: u32) -> u64 {
        self.mapper().center_sample(scroll_line, viewport_height)
    }

    /// Scroll position that centres `sample` under the current stride.
    pub fn scroll_line_for(&self, sample: u64, viewport_height: u32) -> u64 {
        self.mapper().scroll_line_for(sample, viewport_height)
    }

    /// Apply a wheel step. Returns whether anything changed; steps past the
    /// zoom or FFT size limits are ignored.
    pub fn wheel(&mut self, modifier: WheelModifier, delta_y: i32) -> EngineResult<bool> {
        if delta_y == 0 {
            return Ok(false);
        }
        let up = delta_y > 0;
        match modifier {
            WheelModifier::None => Ok(false),
            WheelModifier::Control => {
                let level = self.params.zoom_level() + if up { 1 } else { -1 };
                if !(MIN_ZOOM_LEVEL..=MAX_ZOOM_LEVEL).contains(&level) {
                    return Ok(false);
                }
                self.set_zoom_level(level)?;
                Ok(true)
            }
            WheelModifier::Shift => {
                let size = if up {
                    self.params.fft_size() << 1
                } else {
                    self.params.fft_size() >> 1
                };
                if !(MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&size) {
                    return Ok(false);
                }
                self.set_fft_size(size)?;
                Ok(true)
            }
        }
    }

    // ─── Lines ─────────────────────────────────────────────────────────────────

    /// Raw power line (dB, `fft_size` bins) for a display line, computing it
    /// on the calling thread on a cache miss.
    pub fn line_power(&mut self, line: u64) -> EngineResult<Arc<Line>> {
        let capture = self.require_capture()?.clone();
        let key = self.key_for(line);

        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }

        let offset = self.line_to_sample(line);
        if self.worker.is_in_flight(&key) {
            let finished = self.worker.wait_for(&key);
            self.merge(finished);
            if let Some(cached) = self.cache.get(&key) {
                return Ok(cached);
            }
        }

        let computed = Arc::new(compute_line(&capture, &self.transform, key, offset));
        self.cache.insert(computed.clone());
        Ok(computed)
    }

    /// Display intensities in [0, 1] for a line, after power scaling.
    pub fn get_line(&mut self, line: u64) -> EngineResult<Vec<f32>> {
        let power = self.power;
        Ok(power.scale_line(&self.line_power(line)?.power_db))
    }

    /// Non-blocking variant of `get_line`: a cache miss is handed to the
    /// worker pool and a placeholder row is returned.
    pub fn request_line(&mut self, line: u64) -> EngineResult<LineRequest> {
        let capture = self.require_capture()?.clone();
        let key = self.key_for(line);

        if let Some(cached) = self.cache.get(&key) {
            return Ok(LineRequest::Ready(self.power.scale_line(&cached.power_db)));
        }

        let offset = self.line_to_sample(line);
        self.worker
            .submit(capture, self.transform.clone(), key, offset);
        Ok(LineRequest::Pending(vec![0.0; self.params.fft_size()]))
    }

    /// Queue every line in `first..first + count` that is not cached yet.
    pub fn prefetch(&mut self, first: u64, count: u64) -> EngineResult<()> {
        let capture = self.require_capture()?.clone();
        let end = first.saturating_add(count).min(self.line_count());
        for line in first..end {
            let key = self.key_for(line);
            if !self.cache.contains(&key) {
                let offset = self.line_to_sample(line);
                self.worker
                    .submit(capture.clone(), self.transform.clone(), key, offset);
            }
        }
        Ok(())
    }

    /// Merge finished worker results. Returns the current-generation lines
    /// that became available and should be redrawn.
    pub fn poll_completed(&mut self) -> Vec<u64> {
        let finished = self.worker.drain();
        self.merge(finished)
    }

    /// Lines still being computed by the worker pool, stale ones included.
    pub fn pending_lines(&self) -> usize {
        self.worker.in_flight_count()
    }

    /// Drop cached lines far from the visible area.
    pub fn retain_near(&mut self, center_line: u64) {
        self.cache
            .retain_near(center_line, self.settings.keep_radius_lines);
    }

    pub fn cached_lines(&self) -> usize {
        self.cache.len()
    }

    pub fn generation(&self) -> u64 {
        self.cache.generation()
    }

    // ─── Selection ─────────────────────────────────────────────────────────────

    /// Register for selection events.
    pub fn subscribe(&mut self) -> Receiver<SelectionEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Turn a finished drag into a selection (or a clear) and notify
    /// subscribers. `scroll` is (horizontal pixel offset, first visible
    /// line) and `width` the full display width.
    pub fn finish_drag(
        &mut self,
        gesture: &DragGesture,
        scroll: (i32, u64),
        width: u32,
    ) -> EngineResult<SelectionEvent> {
        self.require_capture()?;
        let event =
            self.mapper()
                .selection_from_drag(gesture, scroll, width, self.settings.min_drag_px);
        self.publish(event);
        Ok(event)
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn selection_summary(&self) -> Option<SelectionSummary> {
        self.selection
            .map(|s| s.summary(self.params.sample_rate()))
    }

    // ─── Internals ─────────────────────────────────────────────────────────────

    fn require_capture(&self) -> EngineResult<&Arc<Capture>> {
        self.capture.as_ref().ok_or(EngineError::NoCapture)
    }

    fn key_for(&self, line: u64) -> LineKey {
        LineKey {
            generation: self.cache.generation(),
            fft_size: self.params.fft_size(),
            zoom_level: self.params.zoom_level(),
            line,
        }
    }

    fn rebuild_transform(&mut self) {
        if self.transform.fft_size() != self.params.fft_size()
            || self.transform.window_type() != self.params.window()
        {
            self.transform = Arc::new(SpectralTransform::new(
                self.params.fft_size(),
                self.params.window(),
            ));
        }
    }

    fn invalidate(&mut self, reason: &str) {
        let generation = self.cache.invalidate();
        debug!(
            "{}: now at generation {} ({} lines still in flight)",
            reason,
            generation,
            self.worker.in_flight_count()
        );
    }

    fn merge(&mut self, finished: Vec<WorkerMessage>) -> Vec<u64> {
        let mut ready = Vec::new();
        for msg in finished {
            let line = match msg {
                WorkerMessage::LineComplete(line) => line,
                WorkerMessage::LineFailed(key) => {
                    let stride = derive_stride(key.fft_size, key.zoom_level) as u64;
                    silent_line(key, key.line.saturating_mul(stride))
                }
            };
            let key = line.key;
            if self.cache.insert(Arc::new(line)) {
                ready.push(key.line);
            } else {
                debug!("Discarded stale line {} from generation {}", key.line, key.generation);
            }
        }
        ready
    }

    fn publish(&mut self, event: SelectionEvent) {
        self.selection = match event {
            SelectionEvent::Changed(sel) => Some(sel),
            SelectionEvent::Cleared => None,
        };
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }
}
