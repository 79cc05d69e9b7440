use aliquot_schemas::labware::TubeShape;
use serde::{Deserialize, Serialize};

/// Floor applied to every computed insertion height so the tip never
/// touches the tube bottom.
pub const MIN_INSERTION_HEIGHT_MM: f64 = 0.1;

/// Fixed insertion depth for reservoir wells, which have no level
/// calibration.
pub const RESERVOIR_INSERTION_HEIGHT_MM: f64 = 1.0;

/// Volume boundary between the frustum and cylinder sections of the 15 mL
/// conical tube.
pub const CONE_REGION_MAX_VOLUME_UL: f64 = 1000.0;

/// Height boundary used when converting a measured level back to a volume
/// for the 15 mL conical tube. This is the calibrated quadratic's value at
/// the 1000 µL boundary; the cylinder formula meets 1000 µL lower, so
/// levels between the two boundaries resolve through the cone inverse.
pub const CONE_REGION_MAX_HEIGHT_MM: f64 = 20.62;

/// Insertion strategy for the frustum section of the 15 mL conical tube.
///
/// The calibrated quadratic misbehaves at low volumes, so the default pins
/// the tip just above the tube bottom instead. Neither variant has been
/// confirmed against all labware lots; the choice is run configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LowVolumePolicy {
    #[default]
    ConstantFallback,
    QuadraticFormula,
}

/// Height in mm from the container bottom at which a tip should aspirate,
/// given the tracked volume. Clamped to [`MIN_INSERTION_HEIGHT_MM`];
/// volumes outside the calibrated range are a caller error and are not
/// validated here.
pub fn height_from_volume(shape: TubeShape, volume_ul: f64, policy: LowVolumePolicy) -> f64 {
    let volume_ml = volume_ul / 1000.0;
    let height_mm = match shape {
        TubeShape::Conical15Ml => {
            if volume_ul <= CONE_REGION_MAX_VOLUME_UL {
                // cone part
                match policy {
                    LowVolumePolicy::ConstantFallback => MIN_INSERTION_HEIGHT_MM,
                    LowVolumePolicy::QuadraticFormula => {
                        -3.33 * volume_ml * volume_ml + 15.45 * volume_ml + 9.50 - 1.0
                    }
                }
            } else {
                6.41667 * volume_ml + 15.1667 - 5.0
            }
        }
        TubeShape::Cylindrical50Ml => 1.8 * volume_ml + 9.0,
        TubeShape::Reservoir => RESERVOIR_INSERTION_HEIGHT_MM,
    };
    height_mm.max(MIN_INSERTION_HEIGHT_MM)
}

/// Volume in µL corresponding to a measured liquid level. Returns `None`
/// for reservoir wells, whose tracked volume is authoritative.
pub fn volume_from_height(shape: TubeShape, height_mm: f64) -> Option<f64> {
    match shape {
        TubeShape::Conical15Ml => {
            if height_mm <= CONE_REGION_MAX_HEIGHT_MM {
                // cone part; inverse of the calibrated quadratic
                Some(((15.45 + (351.9225 - 13.32 * height_mm).sqrt()) / 6.66) * 1000.0)
            } else {
                Some(((height_mm - 10.1667) / 6.41667) * 1000.0)
            }
        }
        TubeShape::Cylindrical50Ml => Some(1000.0 * (height_mm - 9.0) / 1.8),
        TubeShape::Reservoir => None,
    }
}
