use crate::error::ParamError;

/// Display dynamic range in dB. Only affects the final intensity mapping,
/// never the cached power values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerRange {
    min_db: f32,
    max_db: f32,
}

impl Default for PowerRange {
    fn default() -> Self {
        Self {
            min_db: -100.0,
            max_db: 0.0,
        }
    }
}

impl PowerRange {
    pub fn new(min_db: f32, max_db: f32) -> Result<Self, ParamError> {
        if !(min_db.is_finite() && max_db.is_finite() && min_db < max_db) {
            return Err(ParamError::PowerRange {
                min: min_db,
                max: max_db,
            });
        }
        Ok(Self { min_db, max_db })
    }

    #[inline]
    pub fn min_db(&self) -> f32 {
        self.min_db
    }

    #[inline]
    pub fn max_db(&self) -> f32 {
        self.max_db
    }

    pub fn set_min(&mut self, min_db: f32) -> Result<(), ParamError> {
        *self = Self::new(min_db, self.max_db)?;
        Ok(())
    }

    pub fn set_max(&mut self, max_db: f32) -> Result<(), ParamError> {
        *self = Self::new(self.min_db, max_db)?;
        Ok(())
    }

    /// Map a power value to an intensity in [0, 1].
    #[inline(always)]
    pub fn scale(&self, power_db: f32) -> f32 {
        // NaN maps to the floor so the result stays inside [0, 1]
        if power_db.is_nan() {
            return 0.0;
        }
        let t = (power_db - self.min_db) / (self.max_db - self.min_db);
        t.clamp(0.0, 1.0)
    }

    pub fn scale_line(&self, power_db: &[f32]) -> Vec<f32> {
        power_db.iter().map(|&p| self.scale(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midpoint() {
        let range = PowerRange::new(-80.0, 0.0).unwrap();
        assert_eq!(range.scale(-40.0), 0.5);
        assert_eq!(range.scale(-80.0), 0.0);
        assert_eq!(range.scale(0.0), 1.0);
    }

    #[test]
    fn test_bounded_and_monotonic() {
        let range = PowerRange::new(-73.5, -12.25).unwrap();
        let mut last = 0.0f32;
        let mut db = -400.0f32;
        while db < 200.0 {
            let v = range.scale(db);
            assert!((0.0..=1.0).contains(&v));
            assert!(v >= last, "not monotonic at {db}");
            last = v;
            db += 0.37;
        }
        assert_eq!(range.scale(f32::NEG_INFINITY), 0.0);
        assert_eq!(range.scale(f32::INFINITY), 1.0);
        assert_eq!(range.scale(f32::NAN), 0.0);
    }

    #[test]
    fn test_rejects_inverted_range() {
        let mut range = PowerRange::new(-80.0, 0.0).unwrap();
        assert!(range.set_min(0.0).is_err());
        assert!(range.set_max(-90.0).is_err());
        assert!(range.set_min(f32::NAN).is_err());
        assert_eq!(range, PowerRange::new(-80.0, 0.0).unwrap());

        range.set_max(-20.0).unwrap();
        range.set_min(-60.0).unwrap();
        assert_eq!(range.min_db(), -60.0);
        assert_eq!(range.max_db(), -20.0);
    }
}
