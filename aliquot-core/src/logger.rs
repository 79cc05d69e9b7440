use crate::error::AliquotError;
use aliquot_schemas::instruction::Instruction;
use csv::Writer;
use serde::Serialize;
use std::fs;

#[derive(Debug, Serialize)]
struct LogRow {
    step: u64,
    kind: String,
    labware_id: String,
    well: String,
    volume_ul: f64,
    height_mm: f64,
    detail_json: String,
}

/// Writes one CSV row per planned instruction, in plan order.
pub struct InstructionLogger {
    path: String,
    writer: Writer<fs::File>,
}

impl InstructionLogger {
    pub fn new(path: &str) -> Result<Self, AliquotError> {
        let writer = Writer::from_path(path)
            .map_err(|e| AliquotError::CsvError(path.to_string(), e))?;
        Ok(Self {
            path: path.to_string(),
            writer,
        })
    }

    pub fn log_instruction(
        &mut self,
        step: u64,
        instruction: &Instruction,
    ) -> Result<(), AliquotError> {
        let (kind, labware_id, well, volume_ul, height_mm) = summarize(instruction);
        let row = LogRow {
            step,
            kind: kind.to_string(),
            labware_id,
            well,
            volume_ul,
            height_mm,
            detail_json: serde_json::to_string(instruction)?,
        };
        self.writer
            .serialize(row)
            .map_err(|e| AliquotError::CsvError(self.path.clone(), e))?;
        self.writer
            .flush()
            .map_err(|e| AliquotError::FileIO(self.path.clone(), e))?;
        Ok(())
    }
}

fn summarize(instruction: &Instruction) -> (&'static str, String, String, f64, f64) {
    match instruction {
        Instruction::PickUpTip => ("pick_up_tip", String::new(), String::new(), 0.0, 0.0),
        Instruction::DropTip => ("drop_tip", String::new(), String::new(), 0.0, 0.0),
        Instruction::Aspirate {
            labware_id,
            well,
            volume_ul,
            height_mm,
            ..
        } => ("aspirate", labware_id.clone(), well.clone(), *volume_ul, *height_mm),
        Instruction::Dispense {
            labware_id,
            well,
            volume_ul,
            height_mm,
            ..
        } => ("dispense", labware_id.clone(), well.clone(), *volume_ul, *height_mm),
        Instruction::Mix {
            labware_id,
            well,
            volume_ul,
            ..
        } => ("mix", labware_id.clone(), well.clone(), *volume_ul, 0.0),
        Instruction::BlowOut { labware_id, well } => {
            ("blow_out", labware_id.clone(), well.clone(), 0.0, 0.0)
        }
        Instruction::TouchTip { labware_id, well } => {
            ("touch_tip", labware_id.clone(), well.clone(), 0.0, 0.0)
        }
        Instruction::MoveLabware { labware_id, .. } => {
            ("move_labware", labware_id.clone(), String::new(), 0.0, 0.0)
        }
        Instruction::SetShakerTemperature { .. } => {
            ("set_shaker_temperature", String::new(), String::new(), 0.0, 0.0)
        }
        Instruction::Shake { .. } => ("shake", String::new(), String::new(), 0.0, 0.0),
        Instruction::DeactivateShaker => {
            ("deactivate_shaker", String::new(), String::new(), 0.0, 0.0)
        }
        Instruction::DeactivateHeater => {
            ("deactivate_heater", String::new(), String::new(), 0.0, 0.0)
        }
        Instruction::Delay { .. } => ("delay", String::new(), String::new(), 0.0, 0.0),
    }
}
