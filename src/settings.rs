use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::data::{ByteOrder, PowerRange, SampleFormat, ViewParameters, WindowType};
use crate::error::ParamError;

pub const DEFAULT_FILE_NAME: &str = "waterfall.ini";

/// Engine and display defaults, loaded from an INI file or built in.
/// Every field here is saveable/loadable.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    // ── View ──
    pub fft_size: usize,
    pub zoom_level: i32,
    pub sample_rate: u64,
    pub window_type: WindowType,

    // ── Display ──
    pub power_min_db: f32,
    pub power_max_db: f32,
    pub colormap: String, // "Classic", "Greyscale", "Viridis"

    // ── Capture ──
    pub sample_format: SampleFormat,
    pub byte_order: ByteOrder,

    // ── Engine ──
    pub cache_lines: usize,
    pub worker_threads: usize, // 0 = one per core
    pub keep_radius_lines: u64,

    // ── Selection ──
    pub min_drag_px: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fft_size: 1024,
            zoom_level: 0,
            sample_rate: 8_000_000,
            window_type: WindowType::Hann,

            power_min_db: -100.0,
            power_max_db: 0.0,
            colormap: "Classic".to_string(),

            sample_format: SampleFormat::Cf32,
            byte_order: ByteOrder::Little,

            cache_lines: 4096,
            worker_threads: 0,
            keep_radius_lines: 2048,

            min_drag_px: 10,
        }
    }
}

impl Settings {
    /// Load settings from an INI file. Keys that are missing or unparsable
    /// keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {:?}", path))?;
        let mut settings = Self::default();
        settings.parse_ini(&content);
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Like `load`, but a missing or unreadable file just yields defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("{:#}. Using defaults.", e);
                Self::default()
            }
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_ini())
            .with_context(|| format!("Failed to write settings file: {:?}", path))
    }

    /// View parameters a freshly opened capture starts with.
    pub fn view_parameters(&self) -> Result<ViewParameters, ParamError> {
        Ok(ViewParameters::new(self.fft_size, self.zoom_level, self.sample_rate)?
            .with_window(self.window_type))
    }

    pub fn power_range(&self) -> Result<PowerRange, ParamError> {
        PowerRange::new(self.power_min_db, self.power_max_db)
    }

    fn to_ini(&self) -> String {
        let mut s = String::new();
        s.push_str("# iqwaterfall settings\n");
        s.push_str("# Edit values below. Delete this file to reset to defaults.\n\n");

        s.push_str("[View]\n");
        s.push_str("# fft_size must be a power of two\n");
        s.push_str(&format!("fft_size = {}\n", self.fft_size));
        s.push_str("# zoom_level: positive = more lines per second, negative = fewer\n");
        s.push_str(&format!("zoom_level = {}\n", self.zoom_level));
        s.push_str(&format!("sample_rate = {}\n", self.sample_rate));
        s.push_str(&format!("window_type = {}\n", self.window_type.name()));
        s.push('\n');

        s.push_str("[Display]\n");
        s.push_str(&format!("power_min_db = {}\n", self.power_min_db));
        s.push_str(&format!("power_max_db = {}\n", self.power_max_db));
        s.push_str("# Colormaps: Classic, Greyscale, Viridis\n");
        s.push_str(&format!("colormap = {}\n", self.colormap));
        s.push('\n');

        s.push_str("[Capture]\n");
        s.push_str("# sample_format: cf32, cf64, ci16, ci8, cu8\n");
        s.push_str(&format!("sample_format = {}\n", self.sample_format.short_name()));
        s.push_str(&format!("byte_order = {}\n", self.byte_order.name()));
        s.push('\n');

        s.push_str("[Engine]\n");
        s.push_str(&format!("cache_lines = {}\n", self.cache_lines));
        s.push_str("# worker_threads: 0 = one per core\n");
        s.push_str(&format!("worker_threads = {}\n", self.worker_threads));
        s.push_str(&format!("keep_radius_lines = {}\n", self.keep_radius_lines));
        s.push('\n');

        s.push_str("[Selection]\n");
        s.push_str(&format!("min_drag_px = {}\n", self.min_drag_px));

        s
    }

    fn parse_ini(&mut self, content: &str) {
        let map = parse_ini_to_map(content);

        // View
        parse_field(&map, "fft_size", &mut self.fft_size);
        parse_field(&map, "zoom_level", &mut self.zoom_level);
        parse_field(&map, "sample_rate", &mut self.sample_rate);
        parse_with(&map, "window_type", &mut self.window_type, WindowType::from_name);

        // Display
        parse_field(&map, "power_min_db", &mut self.power_min_db);
        parse_field(&map, "power_max_db", &mut self.power_max_db);
        if let Some(v) = map.get("colormap") {
            self.colormap = v.clone();
        }

        // Capture
        parse_with(&map, "sample_format", &mut self.sample_format, SampleFormat::from_str);
        parse_with(&map, "byte_order", &mut self.byte_order, ByteOrder::from_str);

        // Engine
        parse_field(&map, "cache_lines", &mut self.cache_lines);
        parse_field(&map, "worker_threads", &mut self.worker_threads);
        parse_field(&map, "keep_radius_lines", &mut self.keep_radius_lines);

        // Selection
        parse_field(&map, "min_drag_px", &mut self.min_drag_px);
    }
}

fn parse_ini_to_map(content: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') || line.starts_with('[') {
            continue;
        }
        if let Some((key, val)) = line.split_once('=') {
            map.insert(key.trim().to_string(), val.trim().to_string());
        }
    }
    map
}

fn parse_field<T: FromStr>(map: &HashMap<String, String>, key: &str, slot: &mut T) {
    parse_with(map, key, slot, |v| v.parse().ok());
}

fn parse_with<T>(
    map: &HashMap<String, String>,
    key: &str,
    slot: &mut T,
    parse: impl Fn(&str) -> Option<T>,
) {
    if let Some(v) = map.get(key) {
        match parse(v.as_str()) {
            Some(parsed) => *slot = parsed,
            None => warn!("[Settings] Ignoring invalid value for {}: {:?}", key, v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_ini() {
        let mut settings = Settings::default();
        settings.fft_size = 4096;
        settings.zoom_level = -3;
        settings.sample_rate = 2_400_000;
        settings.window_type = WindowType::Blackman;
        settings.power_min_db = -72.5;
        settings.sample_format = SampleFormat::Cu8;
        settings.byte_order = ByteOrder::Big;
        settings.worker_threads = 3;

        let mut parsed = Settings::default();
        parsed.parse_ini(&settings.to_ini());
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let mut settings = Settings::default();
        settings.parse_ini(
            "[View]\nfft_size = lots\nzoom_level = 2\n[Capture]\nsample_format = mp3\n; comment\nunknown = 1\n",
        );
        assert_eq!(settings.fft_size, 1024);
        assert_eq!(settings.zoom_level, 2);
        assert_eq!(settings.sample_format, SampleFormat::Cf32);
    }

    #[test]
    fn test_view_parameters_validated() {
        let mut settings = Settings::default();
        assert_eq!(settings.view_parameters().unwrap().stride(), 1024);
        settings.fft_size = 1000;
        assert!(settings.view_parameters().is_err());
        settings.power_min_db = 5.0;
        assert!(settings.power_range().is_err());
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_FILE_NAME);
        let mut settings = Settings::default();
        settings.cache_lines = 77;
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);

        assert_eq!(Settings::load_or_default(dir.path().join("missing.ini")), Settings::default());
        assert!(Settings::load(dir.path().join("missing.ini")).is_err());
    }
}
