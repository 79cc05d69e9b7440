use super::{
    engine::{AssayProfile, PlanEngine},
    layout,
    state::PlanState,
};
use crate::{
    container::TrackedContainer,
    error::AliquotError,
    geometry::LowVolumePolicy,
    logger::InstructionLogger,
};
use aliquot_schemas::{
    labware::ContainerDef,
    protocol::{DeckLocations, RunParameters},
};
use std::collections::HashMap;

/// A fluent builder for constructing a `PlanEngine`.
///
/// All required parts are validated once at `build` time so the engine can
/// assume a consistent deck while generating instructions.
#[derive(Default)]
pub struct PlanBuilder {
    parameters: Option<RunParameters>,
    locations: Option<DeckLocations>,
    containers: Vec<ContainerDef>,
    policy: LowVolumePolicy,
    log_path: Option<String>,
}

impl PlanBuilder {
    /// Creates a new, empty `PlanBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the scalar run parameters.
    pub fn with_parameters(mut self, parameters: RunParameters) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Binds the plan stages to named containers and labware.
    pub fn with_locations(mut self, locations: DeckLocations) -> Self {
        self.locations = Some(locations);
        self
    }

    /// Declares the tracked source containers for this run.
    pub fn with_containers(mut self, containers: Vec<ContainerDef>) -> Self {
        self.containers = containers;
        self
    }

    /// Selects the low-volume insertion policy for conical tubes.
    pub fn with_low_volume_policy(mut self, policy: LowVolumePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Writes every planned instruction to the given CSV file.
    pub fn with_instruction_logging_to_file(mut self, path: &str) -> Self {
        self.log_path = Some(path.to_string());
        self
    }

    /// Consumes the builder and returns a fully configured `PlanEngine`.
    ///
    /// # Errors
    ///
    /// Returns an `AliquotError` when required parts are missing, the run
    /// does not fit the plate, or a named container is not declared.
    pub fn build(self) -> Result<PlanEngine, AliquotError> {
        let parameters = self
            .parameters
            .ok_or_else(|| AliquotError::ConfigError("run parameters are missing".to_string()))?;
        let locations = self
            .locations
            .ok_or_else(|| AliquotError::ConfigError("deck locations are missing".to_string()))?;
        if self.containers.is_empty() {
            return Err(AliquotError::ConfigError(
                "at least one container must be declared".to_string(),
            ));
        }
        if !(2..=3).contains(&parameters.replication) {
            return Err(AliquotError::ConfigError(format!(
                "replication must be 2 or 3, got {}",
                parameters.replication
            )));
        }

        let profile = AssayProfile::for_assay(&parameters);
        if layout::required_columns(&parameters) > layout::PLATE_COLUMNS {
            return Err(AliquotError::ConfigError(format!(
                "{} samples in {}-fold replication do not fit the plate",
                parameters.number_samples, parameters.replication
            )));
        }
        if profile.standard_concentrations.len() + 1 > layout::PLATE_ROWS.len() {
            return Err(AliquotError::ConfigError(
                "standard curve does not fit the plate rows".to_string(),
            ));
        }
        if locations.standard_tube_wells.len() < profile.standard_concentrations.len() {
            return Err(AliquotError::ConfigError(format!(
                "{} standard tubes declared, {} needed",
                locations.standard_tube_wells.len(),
                profile.standard_concentrations.len()
            )));
        }
        if parameters.dilution_factor > 0
            && (parameters.number_samples as usize).div_ceil(8) > 6
        {
            return Err(AliquotError::ConfigError(
                "diluted samples do not fit the spare sample-plate columns".to_string(),
            ));
        }

        let mut containers = HashMap::new();
        for def in &self.containers {
            containers.insert(def.container_id.clone(), TrackedContainer::from_def(def)?);
        }
        for role in [
            &locations.diluent_container,
            &locations.chromogen_container,
            &locations.working_reagent_container,
        ] {
            if !containers.contains_key(role) {
                return Err(AliquotError::ContainerNotFound(role.clone()));
            }
        }

        let logger = match self.log_path {
            Some(path) => Some(InstructionLogger::new(&path)?),
            None => None,
        };

        Ok(PlanEngine {
            state: PlanState {
                step: 0,
                tip_loaded: false,
                instructions: Vec::new(),
                containers,
            },
            parameters,
            profile,
            locations,
            policy: self.policy,
            logger,
        })
    }
}
