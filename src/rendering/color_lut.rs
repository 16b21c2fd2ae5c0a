const LUT_SIZE: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColormapId {
    Classic,
    Greyscale,
    Viridis,
}

impl ColormapId {
    pub const ALL: &'static [ColormapId] = &[
        ColormapId::Classic,
        ColormapId::Greyscale,
        ColormapId::Viridis,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ColormapId::Classic => "Classic",
            ColormapId::Greyscale => "Greyscale",
            ColormapId::Viridis => "Viridis",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(name.trim()))
    }
}

/// Intensity -> colour table. Intensities come out of the power scaler
/// already normalised to [0, 1], so the table never needs rebuilding when the
/// dB range changes.
#[derive(Clone)]
pub struct ColorLUT {
    table: Vec<(u8, u8, u8)>,
    colormap: ColormapId,
}

impl ColorLUT {
    pub fn new(colormap: ColormapId) -> Self {
        let table = (0..LUT_SIZE)
            .map(|i| Self::map_color(colormap, i as f32 / (LUT_SIZE - 1) as f32))
            .collect();
        Self { table, colormap }
    }

    pub fn colormap(&self) -> ColormapId {
        self.colormap
    }

    #[inline(always)]
    pub fn lookup(&self, intensity: f32) -> (u8, u8, u8) {
        let index = (intensity * (LUT_SIZE - 1) as f32).clamp(0.0, (LUT_SIZE - 1) as f32) as usize;
        self.table[index]
    }

    /// Colour a whole row of intensities into packed RGB bytes.
    pub fn colorize_row(&self, intensities: &[f32], out: &mut Vec<u8>) {
        out.reserve(intensities.len() * 3);
        for &t in intensities {
            let (r, g, b) = self.lookup(t);
            out.extend_from_slice(&[r, g, b]);
        }
    }

    fn map_color(colormap: ColormapId, t: f32) -> (u8, u8, u8) {
        match colormap {
            ColormapId::Classic => Self::colormap_classic(t),
            ColormapId::Greyscale => Self::colormap_greyscale(t),
            ColormapId::Viridis => Self::colormap_viridis(t),
        }
    }

    /// Black → Dark Blue → Cyan → Yellow → Red → White, the usual waterfall
    /// heat ramp.
    fn colormap_classic(t: f32) -> (u8, u8, u8) {
        const STOPS: [(f32, f32, f32, f32); 6] = [
            (0.00, 0.00, 0.00, 0.00), // Black
            (0.20, 0.00, 0.00, 0.55), // Dark Blue
            (0.45, 0.00, 0.75, 0.85), // Cyan
            (0.70, 0.95, 0.90, 0.10), // Yellow
            (0.90, 1.00, 0.15, 0.05), // Red
            (1.00, 1.00, 1.00, 1.00), // White
        ];

        let t = t.clamp(0.0, 1.0);
        let idx = STOPS
            .iter()
            .rposition(|s| s.0 <= t)
            .unwrap_or(0)
            .min(STOPS.len() - 2);

        let (pos0, r0, g0, b0) = STOPS[idx];
        let (pos1, r1, g1, b1) = STOPS[idx + 1];
        let seg_t = ((t - pos0) / (pos1 - pos0)).clamp(0.0, 1.0);

        (
            to_byte(r0 + (r1 - r0) * seg_t),
            to_byte(g0 + (g1 - g0) * seg_t),
            to_byte(b0 + (b1 - b0) * seg_t),
        )
    }

    fn colormap_greyscale(t: f32) -> (u8, u8, u8) {
        let v = to_byte(t);
        (v, v, v)
    }

    fn colormap_viridis(t: f32) -> (u8, u8, u8) {
        // Approximate viridis: dark purple -> blue -> teal -> green -> yellow
        let t = t.clamp(0.0, 1.0);
        let r = ((-1.33 * t + 1.62) * t + 0.27) * t + 0.04;
        let g = ((0.57 * t - 1.30) * t + 1.42) * t + 0.01;
        let b = ((-2.40 * t + 2.26) * t - 0.15) * t + 0.33;
        (to_byte(r), to_byte(g), to_byte(b))
    }
}

#[inline]
fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0) as u8
}

impl Default for ColorLUT {
    fn default() -> Self {
        Self::new(ColormapId::Classic)
    }
}
