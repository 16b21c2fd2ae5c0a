use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use log::{debug, warn};
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use rustfft::num_complex::Complex;

use super::fft_engine::{SpectralTransform, SILENT_DB};
use super::line_cache::{Line, LineKey};
use super::sample_source::Capture;

// ─── Messages ──────────────────────────────────────────────────────────────────

pub enum WorkerMessage {
    LineComplete(Line),
    LineFailed(LineKey),
}

/// Compute one line: read `fft_size` samples at `sample_offset` (zero-padded
/// past the end of the capture) and transform them.
pub fn compute_line(
    capture: &Capture,
    transform: &SpectralTransform,
    key: LineKey,
    sample_offset: u64,
) -> Line {
    let mut samples = vec![Complex::new(0.0f32, 0.0); transform.fft_size()];
    capture.read_padded(sample_offset, &mut samples);
    Line {
        key,
        sample_offset,
        power_db: transform.transform(&samples),
    }
}

/// A line standing in for one that could not be computed.
pub fn silent_line(key: LineKey, sample_offset: u64) -> Line {
    Line {
        key,
        sample_offset,
        power_db: vec![SILENT_DB; key.fft_size],
    }
}

/// Bounded pool computing cache misses off the calling thread.
///
/// Results come back over a channel and are only merged when the caller
/// drains it, so the caller decides whether a result is still current.
pub struct LineWorker {
    pool: ThreadPool,
    tx: Sender<WorkerMessage>,
    rx: Receiver<WorkerMessage>,
    in_flight: HashSet<LineKey>,
}

impl LineWorker {
    /// `threads == 0` lets rayon pick one thread per core.
    pub fn new(threads: usize) -> Result<Self, ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("line-worker-{i}"))
            .build()?;
        let (tx, rx) = mpsc::channel();
        Ok(Self {
            pool,
            tx,
            rx,
            in_flight: HashSet::new(),
        })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    #[inline]
    pub fn is_in_flight(&self, key: &LineKey) -> bool {
        self.in_flight.contains(key)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Queue a line. Returns `false` without queuing anything when the same
    /// key is already being computed.
    pub fn submit(
        &mut self,
        capture: Arc<Capture>,
        transform: Arc<SpectralTransform>,
        key: LineKey,
        sample_offset: u64,
    ) -> bool {
        if !self.in_flight.insert(key) {
            return false;
        }
        let tx = self.tx.clone();
        self.pool.spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                compute_line(&capture, &transform, key, sample_offset)
            }));
            let msg = match result {
                Ok(line) => WorkerMessage::LineComplete(line),
                Err(_) => WorkerMessage::LineFailed(key),
            };
            tx.send(msg).ok();
        });
        true
    }

    /// Everything finished so far, without blocking.
    pub fn drain(&mut self) -> Vec<WorkerMessage> {
        let mut done = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            self.settle(&msg);
            done.push(msg);
        }
        done
    }

    /// Block until `key` has finished, returning it together with anything
    /// else that completed in the meantime.
    pub fn wait_for(&mut self, key: &LineKey) -> Vec<WorkerMessage> {
        let mut done = Vec::new();
        while self.in_flight.contains(key) {
            match self.rx.recv() {
                Ok(msg) => {
                    self.settle(&msg);
                    done.push(msg);
                }
                // We hold a sender ourselves, so this only happens if the
                // channel is torn down underneath us.
                Err(_) => {
                    warn!("Line worker channel closed while waiting for line {}", key.line);
                    self.in_flight.remove(key);
                }
            }
        }
        done
    }

    fn settle(&mut self, msg: &WorkerMessage) {
        let key = match msg {
            WorkerMessage::LineComplete(line) => line.key,
            WorkerMessage::LineFailed(key) => {
                warn!("Computing line {} failed, rendering it silent", key.line);
                *key
            }
        };
        self.in_flight.remove(&key);
        debug!("Line {} (generation {}) finished", key.line, key.generation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ByteOrder, SampleFormat, WindowType};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn capture(samples: usize) -> (NamedTempFile, Arc<Capture>) {
        let mut bytes = Vec::new();
        for i in 0..samples {
            let phase = i as f32 * 0.3;
            SampleFormat::Cf32.encode(Complex::new(phase.cos(), phase.sin()), ByteOrder::Little, &mut bytes);
        }
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();
        file.flush().unwrap();
        let cap = Capture::open(file.path(), SampleFormat::Cf32, ByteOrder::Little).unwrap();
        (file, Arc::new(cap))
    }

    fn key(line: u64) -> LineKey {
        LineKey {
            generation: 0,
            fft_size: 64,
            zoom_level: 0,
            line,
        }
    }

    #[test]
    fn test_duplicate_submissions_are_refused() {
        let (_file, cap) = capture(1024);
        let transform = Arc::new(SpectralTransform::new(64, WindowType::Hann));
        let mut worker = LineWorker::new(2).unwrap();

        assert!(worker.submit(cap.clone(), transform.clone(), key(1), 64));
        assert!(!worker.submit(cap.clone(), transform.clone(), key(1), 64));
        assert_eq!(worker.in_flight_count(), 1);

        let done = worker.wait_for(&key(1));
        assert_eq!(done.len(), 1);
        assert!(!worker.is_in_flight(&key(1)));

        // Once finished the key may be submitted again
        assert!(worker.submit(cap, transform, key(1), 64));
        worker.wait_for(&key(1));
    }

    #[test]
    fn test_worker_matches_inline_computation() {
        let (_file, cap) = capture(1000);
        let transform = Arc::new(SpectralTransform::new(64, WindowType::Hann));
        let mut worker = LineWorker::new(1).unwrap();

        worker.submit(cap.clone(), transform.clone(), key(15), 960);
        let done = worker.wait_for(&key(15));
        let inline = compute_line(&cap, &transform, key(15), 960);
        match &done[0] {
            WorkerMessage::LineComplete(line) => assert_eq!(line, &inline),
            WorkerMessage::LineFailed(_) => panic!("line failed"),
        }
        assert_eq!(inline.bins(), 64);
    }

    #[test]
    fn test_drain_collects_everything() {
        let (_file, cap) = capture(4096);
        let transform = Arc::new(SpectralTransform::new(64, WindowType::Hann));
        let mut worker = LineWorker::new(2).unwrap();
        for i in 0..8 {
            worker.submit(cap.clone(), transform.clone(), key(i), i * 64);
        }
        let mut finished = 0;
        while let Some(pending) = worker.in_flight.iter().next().copied() {
            finished += worker.wait_for(&pending).len();
        }
        finished += worker.drain().len();
        assert_eq!(finished, 8);
    }

    #[test]
    fn test_silent_line() {
        let line = silent_line(key(2), 128);
        assert_eq!(line.bins(), 64);
        assert!(line.power_db.iter().all(|&p| p == SILENT_DB));
    }
}
