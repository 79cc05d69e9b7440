use super::{layout, state::PlanState};
use crate::{
    allocator,
    error::AliquotError,
    geometry::LowVolumePolicy,
    logger::InstructionLogger,
};
use aliquot_schemas::{
    instruction::Instruction,
    protocol::{AssayKind, DeckLocations, RunParameters},
};

/// Columns between a sample column and the well it is diluted into on the
/// sample plate.
const DILUTED_SAMPLE_COLUMN_OFFSET: usize = 6;

/// Delay substituted for every timed wait when `dry_run` is set.
const DRY_RUN_DELAY_SECONDS: u64 = 10;

/// Fixed aspirate depth inside the 1.5 mL standard tubes.
const STANDARD_TUBE_ASPIRATE_HEIGHT_MM: f64 = 1.5;

/// Dispense depth just above the well bottom of the working plate.
const PLATE_DISPENSE_HEIGHT_MM: f64 = 0.2;

/// Dispense depth just under the rim of the 360 µL flat well, used for the
/// working reagent so the tip never contacts the assay mixture.
const PLATE_RIM_DISPENSE_HEIGHT_MM: f64 = 9.7;

/// Default dispense depth inside small tubes and sample-plate wells.
const TUBE_DISPENSE_HEIGHT_MM: f64 = 1.0;

/// Fixed per-assay quantities of the supported colorimetric protocols.
#[derive(Debug, Clone)]
pub struct AssayProfile {
    pub standard_concentrations: Vec<f64>,
    pub standard_volume_ul: f64,
    pub chromogen_per_well_ul: f64,
    pub working_reagent_per_well_ul: f64,
    pub shake_speed_rpm: u32,
    pub shake_seconds: u64,
    pub shaker_temperature_c: Option<f64>,
    pub reservoir_well_capacity_ul: f64,
}

impl AssayProfile {
    pub fn for_assay(parameters: &RunParameters) -> Self {
        match parameters.assay {
            AssayKind::Bradford => Self {
                standard_concentrations: vec![1.5, 1.0, 0.75, 0.5, 0.25],
                standard_volume_ul: 200.0,
                chromogen_per_well_ul: 25.0,
                working_reagent_per_well_ul: 200.0,
                shake_speed_rpm: 400,
                shake_seconds: 30,
                shaker_temperature_c: None,
                reservoir_well_capacity_ul: 10_500.0,
            },
            AssayKind::Bca => Self {
                // 1.5 mg/mL stock stepped down to 1/60.
                standard_concentrations: vec![1.5, 1.0, 0.75, 0.5, 0.25, 0.125, 0.025],
                standard_volume_ul: parameters.working_sample_vol_ul
                    * parameters.replication as f64
                    + 60.0,
                chromogen_per_well_ul: 25.0,
                working_reagent_per_well_ul: 200.0,
                shake_speed_rpm: 400,
                shake_seconds: 30,
                shaker_temperature_c: Some(37.0),
                reservoir_well_capacity_ul: 10_500.0,
            },
        }
    }
}

/// Generates the ordered instruction list for one assay run, debiting the
/// tracked source containers as transfers are planned.
pub struct PlanEngine {
    pub(super) state: PlanState,
    pub(super) parameters: RunParameters,
    pub(super) profile: AssayProfile,
    pub(super) locations: DeckLocations,
    pub(super) policy: LowVolumePolicy,
    pub(super) logger: Option<InstructionLogger>,
}

impl PlanEngine {
    /// Generates the whole plan in protocol order.
    pub fn run(&mut self) -> Result<(), AliquotError> {
        self.distribute_chromogen()?;
        self.load_samples()?;
        self.prepare_standards()?;
        self.add_working_reagent()?;
        self.shake_and_incubate()?;
        Ok(())
    }

    /// Distributes the chromogenic reagent into every occupied well,
    /// re-filling the tip with as many per-well shots as fit under the
    /// effective capacity.
    pub fn distribute_chromogen(&mut self) -> Result<(), AliquotError> {
        let wells = layout::occupied_wells(
            self.parameters.number_samples,
            self.parameters.replication,
            self.profile.standard_concentrations.len(),
        );
        let per_well_ul = self.profile.chromogen_per_well_ul;
        let pipette = self.parameters.pipette;
        let shots_per_tip = (pipette.effective_capacity_ul() / per_well_ul).floor();
        if shots_per_tip < 1.0 {
            return Err(AliquotError::InfeasibleTransfer {
                required_ul: per_well_ul,
                capacity_ul: pipette.effective_capacity_ul(),
            });
        }
        let batches = allocator::plan_transfers(
            wells.len() as f64 * per_well_ul,
            shots_per_tip * per_well_ul,
            0.0,
        )?;

        let source = self.locations.chromogen_container.clone();
        let mut well_iter = wells.into_iter();
        for batch_ul in batches {
            self.ensure_tip()?;
            self.blow_out_at_source(&source)?;
            self.aspirate_tracked(&source, batch_ul + pipette.overdraw_ul, 0.5)?;
            let shots = (batch_ul / per_well_ul).round() as usize;
            for _ in 0..shots {
                let well = well_iter
                    .next()
                    .ok_or_else(|| AliquotError::ConfigError("ran out of wells mid-batch".to_string()))?;
                self.emit(Instruction::Dispense {
                    labware_id: self.locations.working_plate.clone(),
                    well,
                    volume_ul: per_well_ul,
                    height_mm: PLATE_DISPENSE_HEIGHT_MM,
                    rate: 0.1,
                })?;
            }
            self.drop_tip()?;
        }
        Ok(())
    }

    /// Transfers samples into their replicate wells, diluting them on the
    /// sample plate first when a dilution factor is configured.
    pub fn load_samples(&mut self) -> Result<(), AliquotError> {
        if self.parameters.number_samples == 0 {
            return Ok(());
        }
        if self.parameters.dilution_factor == 0 {
            self.load_samples_direct()
        } else {
            self.dilute_and_load_samples()
        }
    }

    fn load_samples_direct(&mut self) -> Result<(), AliquotError> {
        let replication = self.parameters.replication as usize;
        let working_ul = self.parameters.working_sample_vol_ul;
        let num_blocks = (self.parameters.number_samples as usize).div_ceil(8);
        let mut plate_column = replication + 1;
        for block in 0..num_blocks {
            self.pick_up_tip()?;
            self.emit(Instruction::Aspirate {
                labware_id: self.locations.sample_plate.clone(),
                well: format!("A{}", block + 1),
                volume_ul: working_ul * 3.0 + 5.0,
                height_mm: TUBE_DISPENSE_HEIGHT_MM,
                rate: 0.1,
            })?;
            for _ in 0..replication {
                self.emit(Instruction::Dispense {
                    labware_id: self.locations.working_plate.clone(),
                    well: format!("A{plate_column}"),
                    volume_ul: working_ul,
                    height_mm: PLATE_DISPENSE_HEIGHT_MM,
                    rate: 0.1,
                })?;
                plate_column += 1;
            }
            self.drop_tip()?;
        }
        Ok(())
    }

    fn dilute_and_load_samples(&mut self) -> Result<(), AliquotError> {
        let parameters = self.parameters.clone();
        let pipette = parameters.pipette;
        let factor = parameters.dilution_factor as f64;
        let replication = parameters.replication as usize;
        let working_ul = parameters.working_sample_vol_ul;
        let number_samples = parameters.number_samples as usize;

        let sample_ul =
            ((working_ul * 3.0 + 5.0) / factor).max(pipette.min_pipettable_ul);
        let buffer_ul = sample_ul * factor - sample_ul;
        let shots_per_tip = (pipette.effective_capacity_ul() / buffer_ul).floor();
        if shots_per_tip < 1.0 {
            return Err(AliquotError::InfeasibleTransfer {
                required_ul: buffer_ul,
                capacity_ul: pipette.effective_capacity_ul(),
            });
        }

        // Buffer goes into the spare columns of the sample plate.
        let diluent = self.locations.diluent_container.clone();
        let batches = allocator::plan_transfers(
            number_samples as f64 * buffer_ul,
            shots_per_tip * buffer_ul,
            0.0,
        )?;
        let mut sample_index = 0usize;
        for batch_ul in batches {
            self.ensure_tip()?;
            self.blow_out_at_source(&diluent)?;
            self.aspirate_tracked(&diluent, batch_ul + pipette.overdraw_ul, 1.0)?;
            let shots = (batch_ul / buffer_ul).round() as usize;
            for _ in 0..shots {
                let row = sample_index % 8;
                let column = sample_index / 8 + 1 + DILUTED_SAMPLE_COLUMN_OFFSET;
                self.emit(Instruction::Dispense {
                    labware_id: self.locations.sample_plate.clone(),
                    well: layout::well_name(row, column),
                    volume_ul: buffer_ul,
                    height_mm: TUBE_DISPENSE_HEIGHT_MM,
                    rate: 0.75,
                })?;
                sample_index += 1;
            }
            self.drop_tip()?;
        }

        // Per-column dilution and transfer into the working plate.
        let num_blocks = number_samples.div_ceil(8);
        let mut plate_column = replication + 1;
        for block in 0..num_blocks {
            let source_well = format!("A{}", block + 1);
            let diluted_well = format!("A{}", block + 1 + DILUTED_SAMPLE_COLUMN_OFFSET);
            self.pick_up_tip()?;
            self.emit(Instruction::Aspirate {
                labware_id: self.locations.sample_plate.clone(),
                well: source_well,
                volume_ul: sample_ul,
                height_mm: PLATE_DISPENSE_HEIGHT_MM,
                rate: 0.1,
            })?;
            self.emit(Instruction::Dispense {
                labware_id: self.locations.sample_plate.clone(),
                well: diluted_well.clone(),
                volume_ul: sample_ul,
                height_mm: TUBE_DISPENSE_HEIGHT_MM,
                rate: 0.1,
            })?;
            self.emit(Instruction::Mix {
                labware_id: self.locations.sample_plate.clone(),
                well: diluted_well.clone(),
                repetitions: 3,
                volume_ul: sample_ul + buffer_ul - 5.0,
                rate: 0.1,
            })?;
            self.emit(Instruction::BlowOut {
                labware_id: self.locations.sample_plate.clone(),
                well: diluted_well.clone(),
            })?;
            self.emit(Instruction::TouchTip {
                labware_id: self.locations.sample_plate.clone(),
                well: diluted_well.clone(),
            })?;
            self.emit(Instruction::Aspirate {
                labware_id: self.locations.sample_plate.clone(),
                well: diluted_well,
                volume_ul: working_ul * replication as f64 + 10.0,
                height_mm: TUBE_DISPENSE_HEIGHT_MM,
                rate: 0.1,
            })?;
            for _ in 0..replication {
                self.emit(Instruction::Dispense {
                    labware_id: self.locations.working_plate.clone(),
                    well: format!("A{plate_column}"),
                    volume_ul: working_ul,
                    height_mm: PLATE_DISPENSE_HEIGHT_MM,
                    rate: 0.1,
                })?;
                plate_column += 1;
            }
            self.drop_tip()?;
        }
        Ok(())
    }

    /// Prepares the standard curve: buffer pre-distribution, the serial
    /// dilution chain, plate loading per concentration point, and the
    /// diluent-only blank row.
    pub fn prepare_standards(&mut self) -> Result<(), AliquotError> {
        let pipette = self.parameters.pipette;
        let steps = allocator::serial_dilution_plan(
            &self.profile.standard_concentrations,
            self.profile.standard_volume_ul,
            pipette.min_pipettable_ul,
        )?;

        // Buffer first, packed so the dispense order walks the tube rack.
        let items: Vec<(String, f64)> = steps
            .iter()
            .enumerate()
            .filter(|(_, step)| step.buffer_ul > 0.0)
            .map(|(i, step)| (self.locations.standard_tube_wells[i].clone(), step.buffer_ul))
            .collect();
        let batches = allocator::pack_heterogeneous(
            &items,
            pipette.effective_capacity_ul() - pipette.overdraw_ul,
        )?;
        let diluent = self.locations.diluent_container.clone();
        self.ensure_tip()?;
        for batch in batches {
            let batch_ul: f64 = batch.iter().map(|(_, v)| v).sum();
            self.blow_out_at_source(&diluent)?;
            self.aspirate_tracked(&diluent, batch_ul + pipette.overdraw_ul, 0.1)?;
            for (tube_well, volume_ul) in batch {
                self.emit(Instruction::Dispense {
                    labware_id: self.locations.standard_rack.clone(),
                    well: tube_well,
                    volume_ul,
                    height_mm: TUBE_DISPENSE_HEIGHT_MM,
                    rate: 0.1,
                })?;
            }
        }
        self.drop_tip()?;

        // Serial chain: each tube draws from the one before it, mixes, and
        // is loaded onto the plate before the next dilution.
        for (i, step) in steps.iter().enumerate() {
            let tube_well = self.locations.standard_tube_wells[i].clone();
            if i > 0 {
                let previous_well = self.locations.standard_tube_wells[i - 1].clone();
                self.ensure_tip()?;
                self.emit(Instruction::Aspirate {
                    labware_id: self.locations.standard_rack.clone(),
                    well: previous_well,
                    volume_ul: step.stock_ul,
                    height_mm: STANDARD_TUBE_ASPIRATE_HEIGHT_MM,
                    rate: 0.1,
                })?;
                self.emit(Instruction::Dispense {
                    labware_id: self.locations.standard_rack.clone(),
                    well: tube_well.clone(),
                    volume_ul: step.stock_ul,
                    height_mm: TUBE_DISPENSE_HEIGHT_MM,
                    rate: 0.1,
                })?;
                self.emit(Instruction::Mix {
                    labware_id: self.locations.standard_rack.clone(),
                    well: tube_well.clone(),
                    repetitions: 3,
                    volume_ul: step.total_ul - 5.0,
                    rate: 0.3,
                })?;
                self.emit(Instruction::BlowOut {
                    labware_id: self.locations.standard_rack.clone(),
                    well: tube_well.clone(),
                })?;
            }
            self.load_standard_row(i, &tube_well)?;
        }

        // Blank row: diluent only.
        let blank_row = self.profile.standard_concentrations.len();
        let replication = self.parameters.replication as usize;
        let working_ul = self.parameters.working_sample_vol_ul;
        self.drop_tip()?;
        self.pick_up_tip()?;
        self.aspirate_tracked(
            &diluent,
            working_ul * replication as f64 + pipette.overdraw_ul,
            0.25,
        )?;
        for replicate in 1..=replication {
            self.emit(Instruction::Dispense {
                labware_id: self.locations.working_plate.clone(),
                well: layout::well_name(blank_row, replicate),
                volume_ul: working_ul,
                height_mm: PLATE_DISPENSE_HEIGHT_MM,
                rate: 0.1,
            })?;
        }
        self.drop_tip()?;
        Ok(())
    }

    fn load_standard_row(&mut self, row: usize, tube_well: &str) -> Result<(), AliquotError> {
        // Fresh tip per concentration point.
        self.drop_tip()?;
        self.pick_up_tip()?;
        let replication = self.parameters.replication as usize;
        let working_ul = self.parameters.working_sample_vol_ul;
        for replicate in 1..=replication {
            self.emit(Instruction::Aspirate {
                labware_id: self.locations.standard_rack.clone(),
                well: tube_well.to_string(),
                volume_ul: working_ul,
                height_mm: STANDARD_TUBE_ASPIRATE_HEIGHT_MM,
                rate: 0.1,
            })?;
            let plate_well = layout::well_name(row, replicate);
            self.emit(Instruction::Dispense {
                labware_id: self.locations.working_plate.clone(),
                well: plate_well.clone(),
                volume_ul: working_ul,
                height_mm: PLATE_DISPENSE_HEIGHT_MM,
                rate: 0.1,
            })?;
            self.emit(Instruction::BlowOut {
                labware_id: self.locations.working_plate.clone(),
                well: plate_well.clone(),
            })?;
            self.emit(Instruction::TouchTip {
                labware_id: self.locations.working_plate.clone(),
                well: plate_well,
            })?;
        }
        Ok(())
    }

    /// Adds the working reagent column by column, picking the reservoir
    /// well from the running remaining-volume counter.
    pub fn add_working_reagent(&mut self) -> Result<(), AliquotError> {
        let per_well_ul = self.profile.working_reagent_per_well_ul;
        let num_columns = layout::required_columns(&self.parameters);
        let mut remaining_ul = num_columns as f64 * per_well_ul * 8.0 + 1000.0;
        let reservoir = self.locations.working_reagent_container.clone();

        self.pick_up_tip()?;
        for column in 1..=num_columns {
            remaining_ul -= per_well_ul * 8.0;
            let reservoir_well = (remaining_ul / self.profile.reservoir_well_capacity_ul)
                .ceil()
                .max(1.0) as usize;
            self.aspirate_from_reservoir_well(
                &reservoir,
                &format!("A{reservoir_well}"),
                per_well_ul,
                0.5,
            )?;
            let plate_well = format!("A{column}");
            self.emit(Instruction::Dispense {
                labware_id: self.locations.working_plate.clone(),
                well: plate_well.clone(),
                volume_ul: per_well_ul,
                height_mm: PLATE_RIM_DISPENSE_HEIGHT_MM,
                rate: 0.3,
            })?;
            self.emit(Instruction::BlowOut {
                labware_id: self.locations.working_plate.clone(),
                well: plate_well.clone(),
            })?;
            self.emit(Instruction::BlowOut {
                labware_id: self.locations.working_plate.clone(),
                well: plate_well,
            })?;
        }
        self.drop_tip()?;
        Ok(())
    }

    /// Moves the plate to the shaker, shakes, incubates, and brings it
    /// back. Dry runs substitute short delays without changing the flow.
    pub fn shake_and_incubate(&mut self) -> Result<(), AliquotError> {
        self.emit(Instruction::MoveLabware {
            labware_id: self.locations.working_plate.clone(),
            new_slot: self.locations.shaker_slot.clone(),
        })?;
        if let Some(celsius) = self.profile.shaker_temperature_c {
            self.emit(Instruction::SetShakerTemperature { celsius })?;
        }
        let shake_seconds = if self.parameters.dry_run {
            DRY_RUN_DELAY_SECONDS
        } else {
            self.profile.shake_seconds
        };
        self.emit(Instruction::Shake {
            speed_rpm: self.profile.shake_speed_rpm,
            seconds: shake_seconds,
        })?;
        self.emit(Instruction::DeactivateShaker)?;

        let incubation_seconds = if self.parameters.dry_run {
            DRY_RUN_DELAY_SECONDS
        } else {
            self.parameters.incubation_minutes * 60
        };
        self.emit(Instruction::Delay {
            seconds: incubation_seconds,
            message: format!(
                "{} minute incubation",
                self.parameters.incubation_minutes
            ),
        })?;
        self.emit(Instruction::DeactivateHeater)?;
        self.emit(Instruction::MoveLabware {
            labware_id: self.locations.working_plate.clone(),
            new_slot: self.locations.working_plate_slot.clone(),
        })?;
        Ok(())
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.state.instructions
    }

    pub fn containers(&self) -> &std::collections::HashMap<String, crate::container::TrackedContainer> {
        &self.state.containers
    }

    pub fn step_count(&self) -> u64 {
        self.state.step
    }

    pub fn profile(&self) -> &AssayProfile {
        &self.profile
    }

    fn emit(&mut self, instruction: Instruction) -> Result<(), AliquotError> {
        self.state.step += 1;
        if let Some(logger) = &mut self.logger {
            logger.log_instruction(self.state.step, &instruction)?;
        }
        self.state.instructions.push(instruction);
        Ok(())
    }

    fn pick_up_tip(&mut self) -> Result<(), AliquotError> {
        self.state.tip_loaded = true;
        self.emit(Instruction::PickUpTip)
    }

    fn drop_tip(&mut self) -> Result<(), AliquotError> {
        if self.state.tip_loaded {
            self.state.tip_loaded = false;
            self.emit(Instruction::DropTip)?;
        }
        Ok(())
    }

    fn ensure_tip(&mut self) -> Result<(), AliquotError> {
        if !self.state.tip_loaded {
            self.pick_up_tip()?;
        }
        Ok(())
    }

    fn blow_out_at_source(&mut self, container_id: &str) -> Result<(), AliquotError> {
        let container = self
            .state
            .containers
            .get(container_id)
            .ok_or_else(|| AliquotError::ContainerNotFound(container_id.to_string()))?;
        let labware_id = container.labware_id.clone();
        let well = container.well.clone();
        self.emit(Instruction::BlowOut { labware_id, well })
    }

    /// Aspirates from a tracked container at its current insertion depth
    /// and debits the tracked volume.
    fn aspirate_tracked(
        &mut self,
        container_id: &str,
        volume_ul: f64,
        rate: f64,
    ) -> Result<(), AliquotError> {
        let container = self
            .state
            .containers
            .get_mut(container_id)
            .ok_or_else(|| AliquotError::ContainerNotFound(container_id.to_string()))?;
        let height_mm = container.aspirate_height(self.policy);
        let labware_id = container.labware_id.clone();
        let well = container.well.clone();
        container.debit(volume_ul);
        self.emit(Instruction::Aspirate {
            labware_id,
            well,
            volume_ul,
            height_mm,
            rate,
        })
    }

    /// Reservoir aspirations address a specific well; the tracked volume
    /// spans the whole reservoir.
    fn aspirate_from_reservoir_well(
        &mut self,
        container_id: &str,
        well: &str,
        volume_ul: f64,
        rate: f64,
    ) -> Result<(), AliquotError> {
        let container = self
            .state
            .containers
            .get_mut(container_id)
            .ok_or_else(|| AliquotError::ContainerNotFound(container_id.to_string()))?;
        let height_mm = container.aspirate_height(self.policy);
        let labware_id = container.labware_id.clone();
        container.debit(volume_ul);
        self.emit(Instruction::Aspirate {
            labware_id,
            well: well.to_string(),
            volume_ul,
            height_mm,
            rate,
        })
    }
}
