use serde::{Deserialize, Serialize};

/// A single operation for the external robot-control layer, executed
/// verbatim and in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Instruction {
    PickUpTip,
    DropTip,
    Aspirate {
        labware_id: String,
        well: String,
        volume_ul: f64,
        height_mm: f64,
        rate: f64,
    },
    Dispense {
        labware_id: String,
        well: String,
        volume_ul: f64,
        height_mm: f64,
        rate: f64,
    },
    Mix {
        labware_id: String,
        well: String,
        repetitions: u32,
        volume_ul: f64,
        rate: f64,
    },
    BlowOut {
        labware_id: String,
        well: String,
    },
    TouchTip {
        labware_id: String,
        well: String,
    },
    MoveLabware {
        labware_id: String,
        new_slot: String,
    },
    SetShakerTemperature {
        celsius: f64,
    },
    Shake {
        speed_rpm: u32,
        seconds: u64,
    },
    DeactivateShaker,
    DeactivateHeater,
    Delay {
        seconds: u64,
        message: String,
    },
}
