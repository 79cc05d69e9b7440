use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssayKind {
    Bradford,
    Bca,
}

/// Capacity model for a single pipette tip cycle.
///
/// `tip_capacity_ul - safety_margin_ul` is the effective ceiling for one
/// aspiration; `overdraw_ul` is drawn on top of the planned amount and kept
/// back for blow-out, and `min_pipettable_ul` is the smallest volume the
/// hardware dispenses reliably.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PipetteConfig {
    pub tip_capacity_ul: f64,
    pub safety_margin_ul: f64,
    pub min_pipettable_ul: f64,
    pub overdraw_ul: f64,
}

impl Default for PipetteConfig {
    fn default() -> Self {
        Self {
            tip_capacity_ul: 200.0,
            safety_margin_ul: 5.0,
            min_pipettable_ul: 5.0,
            overdraw_ul: 5.0,
        }
    }
}

impl PipetteConfig {
    pub fn effective_capacity_ul(&self) -> f64 {
        self.tip_capacity_ul - self.safety_margin_ul
    }
}

/// Named roles binding the plan stages to declared containers and labware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DeckLocations {
    pub diluent_container: String,
    pub chromogen_container: String,
    pub working_reagent_container: String,
    pub working_plate: String,
    pub working_plate_slot: String,
    pub sample_plate: String,
    pub standard_rack: String,
    /// Tube-rack wells holding the standard series, stock tube first.
    pub standard_tube_wells: Vec<String>,
    pub shaker_slot: String,
}

/// Scalar run configuration consumed by the plan engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RunParameters {
    pub assay: AssayKind,
    pub number_samples: u32,
    /// Replicates per sample and standard: 2 (duplicate) or 3 (triplicate).
    pub replication: u32,
    /// Dilution factor for incoming samples. 0 means no dilution.
    pub dilution_factor: u32,
    pub working_sample_vol_ul: f64,
    pub incubation_minutes: u64,
    pub dry_run: bool,
    #[serde(default)]
    pub pipette: PipetteConfig,
}
