use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::info;
use memmap2::Mmap;
use rustfft::num_complex::Complex;

use crate::data::{ByteOrder, SampleFormat};
use crate::error::{EngineError, EngineResult, FileErrorKind};

/// An open raw I/Q capture.
///
/// The file is memory-mapped read-only, so any number of threads can read
/// from a shared `Arc<Capture>` without a cursor or lock.
#[derive(Debug)]
pub struct Capture {
    path: PathBuf,
    map: Mmap,
    format: SampleFormat,
    byte_order: ByteOrder,
    total_samples: u64,
}

impl Capture {
    pub fn open<P: AsRef<Path>>(
        path: P,
        format: SampleFormat,
        byte_order: ByteOrder,
    ) -> EngineResult<Self> {
        let path = path.as_ref();
        let meta = fs::metadata(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => EngineError::file(path, FileErrorKind::Missing),
            _ => EngineError::file(path, e),
        })?;
        if !meta.is_file() {
            return Err(EngineError::file(
                path,
                std::io::Error::new(ErrorKind::InvalidInput, "not a regular file"),
            ));
        }

        let len = meta.len();
        if len == 0 {
            return Err(EngineError::file(path, FileErrorKind::Empty));
        }
        let bps = format.bytes_per_sample() as u64;
        let trailing_bytes = len % bps;
        if trailing_bytes != 0 {
            return Err(EngineError::file(path, FileErrorKind::Truncated { trailing_bytes }));
        }

        let file = File::open(path).map_err(|e| EngineError::file(path, e))?;
        // SAFETY: the mapping is read-only; captures are not expected to be
        // rewritten while they are being viewed.
        let map = unsafe { Mmap::map(&file) }.map_err(|e| EngineError::file(path, e))?;

        let total_samples = len / bps;
        info!(
            "Opened {} ({} samples, {}, {} endian)",
            path.display(),
            total_samples,
            format.short_name(),
            byte_order.name()
        );

        Ok(Self {
            path: path.to_path_buf(),
            map,
            format,
            byte_order,
            total_samples,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    pub fn format(&self) -> SampleFormat {
        self.format
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Read exactly `count` samples starting at `offset`. The whole range must
    /// lie inside the capture.
    pub fn read(&self, offset: u64, count: usize) -> EngineResult<Vec<Complex<f32>>> {
        let end = offset.checked_add(count as u64);
        if end.is_none_or(|end| end > self.total_samples) {
            return Err(EngineError::ReadOutOfRange {
                offset,
                count,
                total: self.total_samples,
            });
        }
        let mut out = vec![Complex::new(0.0, 0.0); count];
        self.decode_range(offset, &mut out);
        Ok(out)
    }

    /// Fill `out` with samples starting at `offset`; anything past the end of
    /// the capture is zero. Returns how many real samples were copied.
    pub fn read_padded(&self, offset: u64, out: &mut [Complex<f32>]) -> usize {
        let available = self.total_samples.saturating_sub(offset).min(out.len() as u64) as usize;
        let (head, tail) = out.split_at_mut(available);
        if available > 0 {
            self.decode_range(offset, head);
        }
        tail.fill(Complex::new(0.0, 0.0));
        available
    }

    fn decode_range(&self, offset: u64, out: &mut [Complex<f32>]) {
        let bps = self.format.bytes_per_sample();
        let start = offset as usize * bps;
        let bytes = &self.map[start..start + out.len() * bps];
        self.format.decode_into(bytes, self.byte_order, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_capture(samples: &[Complex<f32>], format: SampleFormat) -> NamedTempFile {
        let mut bytes = Vec::new();
        for &s in samples {
            format.encode(s, ByteOrder::Little, &mut bytes);
        }
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();
        file.flush().unwrap();
        file
    }

    fn ramp(n: usize) -> Vec<Complex<f32>> {
        (0..n).map(|i| Complex::new(i as f32, -(i as f32))).collect()
    }

    #[test]
    fn test_open_and_read() {
        let file = write_capture(&ramp(100), SampleFormat::Cf32);
        let cap = Capture::open(file.path(), SampleFormat::Cf32, ByteOrder::Little).unwrap();
        assert_eq!(cap.total_samples(), 100);

        let s = cap.read(10, 5).unwrap();
        assert_eq!(s.len(), 5);
        assert_eq!(s[0], Complex::new(10.0, -10.0));
        assert_eq!(s[4], Complex::new(14.0, -14.0));

        assert!(cap.read(0, 100).is_ok());
        assert!(matches!(cap.read(96, 5), Err(EngineError::ReadOutOfRange { .. })));
        assert!(matches!(cap.read(u64::MAX, 2), Err(EngineError::ReadOutOfRange { .. })));
    }

    #[test]
    fn test_read_padded_tail() {
        let file = write_capture(&ramp(10), SampleFormat::Cf32);
        let cap = Capture::open(file.path(), SampleFormat::Cf32, ByteOrder::Little).unwrap();

        let mut buf = vec![Complex::new(9.0, 9.0); 8];
        assert_eq!(cap.read_padded(6, &mut buf), 4);
        assert_eq!(buf[3], Complex::new(9.0, -9.0));
        assert!(buf[4..].iter().all(|s| *s == Complex::new(0.0, 0.0)));

        let mut buf = vec![Complex::new(1.0, 1.0); 4];
        assert_eq!(cap.read_padded(50, &mut buf), 0);
        assert!(buf.iter().all(|s| *s == Complex::new(0.0, 0.0)));
    }

    #[test]
    fn test_open_errors() {
        let err = Capture::open("/definitely/not/here.cf32", SampleFormat::Cf32, ByteOrder::Little)
            .unwrap_err();
        assert!(matches!(err, EngineError::File { reason: FileErrorKind::Missing, .. }));

        let empty = NamedTempFile::new().unwrap();
        let err = Capture::open(empty.path(), SampleFormat::Cf32, ByteOrder::Little).unwrap_err();
        assert!(matches!(err, EngineError::File { reason: FileErrorKind::Empty, .. }));

        let mut partial = NamedTempFile::new().unwrap();
        partial.write_all(&[0u8; 13]).unwrap();
        partial.flush().unwrap();
        let err = Capture::open(partial.path(), SampleFormat::Cf32, ByteOrder::Little).unwrap_err();
        assert!(matches!(
            err,
            EngineError::File { reason: FileErrorKind::Truncated { trailing_bytes: 5 }, .. }
        ));
    }

    #[test]
    fn test_shared_reads_across_threads() {
        let file = write_capture(&ramp(4096), SampleFormat::Ci16);
        let cap = std::sync::Arc::new(
            Capture::open(file.path(), SampleFormat::Ci16, ByteOrder::Little).unwrap(),
        );
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cap = cap.clone();
                std::thread::spawn(move || cap.read(t * 1000, 16).unwrap())
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results[0], cap.read(0, 16).unwrap());
        assert_eq!(results[3], cap.read(3000, 16).unwrap());
    }
}
