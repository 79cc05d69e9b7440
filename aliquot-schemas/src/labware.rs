use serde::{Deserialize, Serialize};

/// Shape class of a liquid container, selecting the height/volume
/// calibration used when computing aspirate insertion depths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TubeShape {
    /// 15 mL conical tube: frustum lower section, cylindrical upper section.
    Conical15Ml,
    /// 50 mL tube, treated as a single cylinder over its whole range.
    Cylindrical50Ml,
    /// Generic reservoir well with no level calibration; tracked volume is
    /// authoritative and tips insert at a fixed shallow depth.
    Reservoir,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Labware {
    pub labware_id: String,
    pub load_name: String,
    pub slot: String,
}

/// Initial liquid content of a container, given either as a volume or as a
/// measured liquid level from the container bottom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fill {
    VolumeUl(f64),
    LevelMm(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ContainerDef {
    pub container_id: String,
    pub labware_id: String,
    pub well: String,
    pub shape: TubeShape,
    pub liquid_id: String,
    pub fill: Fill,
}
