use crate::error::AliquotError;
use crate::geometry::{self, LowVolumePolicy, MIN_INSERTION_HEIGHT_MM};
use aliquot_schemas::labware::{ContainerDef, Fill, TubeShape};

/// Fallback insertion depth when a computed height is not usable.
pub const FALLBACK_INSERTION_HEIGHT_MM: f64 = 1.0;

/// Liquid state for one named source container. The plan engine owns one
/// per container and is the only writer of its volume counter.
#[derive(Debug, Clone)]
pub struct TrackedContainer {
    pub container_id: String,
    pub labware_id: String,
    pub well: String,
    pub shape: TubeShape,
    volume_ul: f64,
}

impl TrackedContainer {
    pub fn new(
        container_id: &str,
        labware_id: &str,
        well: &str,
        shape: TubeShape,
        volume_ul: f64,
    ) -> Self {
        Self {
            container_id: container_id.to_string(),
            labware_id: labware_id.to_string(),
            well: well.to_string(),
            shape,
            volume_ul,
        }
    }

    /// Builds the tracked state from a declared container, converting a
    /// measured liquid level into a volume where the shape is calibrated.
    pub fn from_def(def: &ContainerDef) -> Result<Self, AliquotError> {
        let volume_ul = match def.fill {
            Fill::VolumeUl(volume_ul) => volume_ul,
            Fill::LevelMm(level_mm) => geometry::volume_from_height(def.shape, level_mm)
                .ok_or_else(|| AliquotError::LevelNotCalibrated(def.container_id.clone()))?,
        };
        Ok(Self::new(
            &def.container_id,
            &def.labware_id,
            &def.well,
            def.shape,
            volume_ul,
        ))
    }

    pub fn volume_ul(&self) -> f64 {
        self.volume_ul
    }

    /// Removes `volume_ul` from the tracked volume and returns the new
    /// value. The counter never goes below zero.
    pub fn debit(&mut self, volume_ul: f64) -> f64 {
        self.volume_ul = (self.volume_ul - volume_ul).max(0.0);
        self.volume_ul
    }

    /// Insertion depth for the next aspiration at the current tracked
    /// volume. A computed height that is not finite or sits under the
    /// clamp floor falls back to a fixed safe depth.
    pub fn aspirate_height(&self, policy: LowVolumePolicy) -> f64 {
        let height_mm = geometry::height_from_volume(self.shape, self.volume_ul, policy);
        if height_mm.is_finite() && height_mm >= MIN_INSERTION_HEIGHT_MM {
            height_mm
        } else {
            FALLBACK_INSERTION_HEIGHT_MM
        }
    }
}
