use crate::catalog::Catalog;
use crate::error::GeometryError;

/// Minimum number of whole turns before the wheel settles.
pub const FULL_ROTATIONS: u32 = 4;

/// Maps a reward to the absolute rotation that puts its segment under the
/// pointer. Angles are never wrapped, so the wheel always turns forward by
/// at least `full_rotations` turns from rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelGeometry {
    pub full_rotations: u32,
}

impl Default for WheelGeometry {
    fn default() -> Self {
        Self {
            full_rotations: FULL_ROTATIONS,
        }
    }
}

impl WheelGeometry {
    pub fn new(full_rotations: u32) -> Self {
        Self { full_rotations }
    }

    pub fn segment_angle(catalog: &Catalog) -> f64 {
        360.0 / catalog.len() as f64
    }

    /// Rotation applied to each segment label when drawing the wheel face.
    pub fn segment_offsets(catalog: &Catalog) -> Vec<f64> {
        let segment = Self::segment_angle(catalog);
        (0..catalog.len()).map(|i| i as f64 * segment).collect()
    }

    pub fn angle_for(&self, reward_code: &str, catalog: &Catalog) -> Result<f64, GeometryError> {
        let index = catalog
            .position(reward_code)
            .ok_or_else(|| GeometryError::UnknownRewardCode(reward_code.to_string()))?;
        Ok(self.angle_for_index(index, catalog))
    }

    /// Landing angle for a segment index; also the degraded target when a
    /// code cannot be located.
    pub fn angle_for_index(&self, index: usize, catalog: &Catalog) -> f64 {
        360.0 * f64::from(self.full_rotations) - index as f64 * Self::segment_angle(catalog)
    }
}
