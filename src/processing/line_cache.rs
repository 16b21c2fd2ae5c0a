//! Bounded store of computed spectrogram lines.
//!
//! Every entry is keyed by the generation it was computed under together with
//! the FFT size, zoom level and line index. Any change to the view bumps the
//! generation and empties the store, and inserts tagged with an older
//! generation are refused, so a stale line can never be handed out.
//!
//! Eviction is LRU, capped at `capacity` lines.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineKey {
    pub generation: u64,
    pub fft_size: usize,
    pub zoom_level: i32,
    pub line: u64,
}

/// One computed spectrogram row: `fft_size` power values in dB, FFT-shifted.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub key: LineKey,
    pub sample_offset: u64,
    pub power_db: Vec<f32>,
}

impl Line {
    #[inline]
    pub fn bins(&self) -> usize {
        self.power_db.len()
    }
}

pub struct LineCache {
    lines: HashMap<LineKey, Arc<Line>>,
    /// front = oldest, back = most recently used
    lru: VecDeque<LineKey>,
    capacity: usize,
    generation: u64,
}

impl LineCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: HashMap::new(),
            lru: VecDeque::new(),
            capacity: capacity.max(1),
            generation: 0,
        }
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Drop everything and move to a new generation. Returns the new one.
    pub fn invalidate(&mut self) -> u64 {
        debug!(
            "Invalidating line cache generation {} ({} lines)",
            self.generation,
            self.lines.len()
        );
        self.lines.clear();
        self.lru.clear();
        self.generation += 1;
        self.generation
    }

    /// Look up a line and mark it most recently used.
    pub fn get(&mut self, key: &LineKey) -> Option<Arc<Line>> {
        let line = self.lines.get(key)?.clone();
        self.touch(*key);
        Some(line)
    }

    pub fn contains(&self, key: &LineKey) -> bool {
        self.lines.contains_key(key)
    }

    /// Store a line. Lines from another generation are refused and `false`
    /// is returned.
    pub fn insert(&mut self, line: Arc<Line>) -> bool {
        let key = line.key;
        if key.generation != self.generation {
            debug!(
                "Refusing line {} from generation {} (current {})",
                key.line, key.generation, self.generation
            );
            return false;
        }
        if self.lines.insert(key, line).is_some() {
            self.lru.retain(|k| k != &key);
        }
        self.lru.push_back(key);
        self.evict_to(self.capacity);
        true
    }

    /// Drop lines more than `radius` lines away from `center`.
    pub fn retain_near(&mut self, center: u64, radius: u64) {
        let before = self.lines.len();
        self.lines.retain(|k, _| k.line.abs_diff(center) <= radius);
        let lines = &self.lines;
        self.lru.retain(|k| lines.contains_key(k));
        let dropped = before - self.lines.len();
        if dropped > 0 {
            debug!("Dropped {} lines outside {}±{}", dropped, center, radius);
        }
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.evict_to(self.capacity);
    }

    fn touch(&mut self, key: LineKey) {
        if self.lru.back() == Some(&key) {
            return;
        }
        self.lru.retain(|k| k != &key);
        self.lru.push_back(key);
    }

    fn evict_to(&mut self, limit: usize) {
        while self.lines.len() > limit {
            match self.lru.pop_front() {
                Some(oldest) => {
                    self.lines.remove(&oldest);
                }
                None => break,
            }
        }
    }
}
