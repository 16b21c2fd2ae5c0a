//! Fixed-width interleaved I/Q sample layouts.
//!
//! | Format | Bytes/Sample | Scaling                       |
//! |--------|--------------|-------------------------------|
//! | Cf64   | 16           | as stored                     |
//! | Cf32   | 8            | as stored                     |
//! | Ci16   | 4            | divide by 32768               |
//! | Ci8    | 2            | divide by 128                 |
//! | Cu8    | 2            | subtract 127.5, divide by 128 |
//!
//! Sample width and byte order are configuration inputs; nothing is sniffed
//! from the file itself.

use rustfft::num_complex::Complex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SampleFormat {
    Cf64,
    #[default]
    Cf32,
    Ci16,
    Ci8,
    Cu8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

impl ByteOrder {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "le" | "little" | "little_endian" => Some(ByteOrder::Little),
            "be" | "big" | "big_endian" => Some(ByteOrder::Big),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ByteOrder::Little => "little",
            ByteOrder::Big => "big",
        }
    }
}

impl SampleFormat {
    pub const ALL: &'static [SampleFormat] = &[
        SampleFormat::Cf64,
        SampleFormat::Cf32,
        SampleFormat::Ci16,
        SampleFormat::Ci8,
        SampleFormat::Cu8,
    ];

    /// Size of one complex sample (I and Q together) in bytes.
    #[inline]
    pub const fn bytes_per_sample(&self) -> usize {
        match self {
            SampleFormat::Cf64 => 16,
            SampleFormat::Cf32 => 8,
            SampleFormat::Ci16 => 4,
            SampleFormat::Ci8 | SampleFormat::Cu8 => 2,
        }
    }

    pub const fn short_name(&self) -> &'static str {
        match self {
            SampleFormat::Cf64 => "cf64",
            SampleFormat::Cf32 => "cf32",
            SampleFormat::Ci16 => "ci16",
            SampleFormat::Ci8 => "ci8",
            SampleFormat::Cu8 => "cu8",
        }
    }

    /// Parse a format name, accepting the usual SDR tool aliases.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cf64" | "f64" | "complex64" | "double" => Some(SampleFormat::Cf64),
            "cf32" | "f32" | "float32" | "float" | "fc32" => Some(SampleFormat::Cf32),
            "ci16" | "i16" | "sc16" | "int16" | "short" => Some(SampleFormat::Ci16),
            "ci8" | "i8" | "sc8" | "int8" => Some(SampleFormat::Ci8),
            "cu8" | "u8" | "uint8" | "rtlsdr" => Some(SampleFormat::Cu8),
            _ => None,
        }
    }

    /// Decode a single sample from exactly `bytes_per_sample()` bytes.
    pub fn decode(&self, bytes: &[u8], order: ByteOrder) -> Complex<f32> {
        let half = self.bytes_per_sample() / 2;
        let (i, q) = bytes.split_at(half);
        Complex::new(self.component(i, order), self.component(q, order))
    }

    /// Decode a run of samples into `out`. `bytes.len()` must equal
    /// `out.len() * bytes_per_sample()`.
    pub fn decode_into(&self, bytes: &[u8], order: ByteOrder, out: &mut [Complex<f32>]) {
        debug_assert_eq!(bytes.len(), out.len() * self.bytes_per_sample());
        for (chunk, sample) in bytes.chunks_exact(self.bytes_per_sample()).zip(out.iter_mut()) {
            *sample = self.decode(chunk, order);
        }
    }

    /// Encode one sample, the inverse of `decode` up to quantisation.
    pub fn encode(&self, sample: Complex<f32>, order: ByteOrder, out: &mut Vec<u8>) {
        for v in [sample.re, sample.im] {
            match self {
                SampleFormat::Cf64 => push_ordered(out, (v as f64).to_le_bytes(), order),
                SampleFormat::Cf32 => push_ordered(out, v.to_le_bytes(), order),
                SampleFormat::Ci16 => {
                    let q = (v * 32767.0).round().clamp(-32768.0, 32767.0) as i16;
                    push_ordered(out, q.to_le_bytes(), order);
                }
                SampleFormat::Ci8 => {
                    out.push((v * 127.0).round().clamp(-128.0, 127.0) as i8 as u8);
                }
                SampleFormat::Cu8 => {
                    out.push((v * 128.0 + 127.5).round().clamp(0.0, 255.0) as u8);
                }
            }
        }
    }

    fn component(&self, b: &[u8], order: ByteOrder) -> f32 {
        match self {
            SampleFormat::Cf64 => {
                let raw: [u8; 8] = [b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]];
                (match order {
                    ByteOrder::Little => f64::from_le_bytes(raw),
                    ByteOrder::Big => f64::from_be_bytes(raw),
                }) as f32
            }
            SampleFormat::Cf32 => {
                let raw = [b[0], b[1], b[2], b[3]];
                match order {
                    ByteOrder::Little => f32::from_le_bytes(raw),
                    ByteOrder::Big => f32::from_be_bytes(raw),
                }
            }
            SampleFormat::Ci16 => {
                let raw = [b[0], b[1]];
                let v = match order {
                    ByteOrder::Little => i16::from_le_bytes(raw),
                    ByteOrder::Big => i16::from_be_bytes(raw),
                };
                v as f32 / 32768.0
            }
            SampleFormat::Ci8 => b[0] as i8 as f32 / 128.0,
            SampleFormat::Cu8 => (b[0] as f32 - 127.5) / 128.0,
        }
    }
}

// Byte order only matters for multi-byte components.
fn push_ordered<const N: usize>(out: &mut Vec<u8>, mut le: [u8; N], order: ByteOrder) {
    if order == ByteOrder::Big {
        le.reverse();
    }
    out.extend_from_slice(&le);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        assert_eq!(SampleFormat::from_str("float"), Some(SampleFormat::Cf32));
        assert_eq!(SampleFormat::from_str("SC16"), Some(SampleFormat::Ci16));
        assert_eq!(SampleFormat::from_str("rtlsdr"), Some(SampleFormat::Cu8));
        assert_eq!(SampleFormat::from_str("wav"), None);
        assert_eq!(ByteOrder::from_str("BE"), Some(ByteOrder::Big));
    }

    #[test]
    fn test_decode_cf32_big_endian() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0.25f32.to_be_bytes());
        bytes.extend_from_slice(&(-1.5f32).to_be_bytes());
        let s = SampleFormat::Cf32.decode(&bytes, ByteOrder::Big);
        assert_eq!(s, Complex::new(0.25, -1.5));
    }

    #[test]
    fn test_integer_scaling() {
        let s = SampleFormat::Ci16.decode(&[0x00, 0x80, 0x00, 0x40], ByteOrder::Little);
        assert_eq!(s.re, -1.0);
        assert_eq!(s.im, 0.5);

        let s = SampleFormat::Ci8.decode(&[0x80, 0x40], ByteOrder::Little);
        assert_eq!(s.re, -1.0);
        assert_eq!(s.im, 0.5);

        let s = SampleFormat::Cu8.decode(&[255, 0], ByteOrder::Little);
        assert!((s.re - 0.99609375).abs() < 1e-6);
        assert!((s.im + 0.99609375).abs() < 1e-6);
    }

    #[test]
    fn test_encode_matches_width() {
        for &fmt in SampleFormat::ALL {
            let mut out = Vec::new();
            fmt.encode(Complex::new(0.5, -0.25), ByteOrder::Big, &mut out);
            assert_eq!(out.len(), fmt.bytes_per_sample(), "{}", fmt.short_name());
            let back = fmt.decode(&out, ByteOrder::Big);
            assert!((back.re - 0.5).abs() < 0.01);
            assert!((back.im + 0.25).abs() < 0.01);
        }
    }
}
