use crate::container::TrackedContainer;
use aliquot_schemas::instruction::Instruction;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct PlanState {
    pub step: u64,
    pub tip_loaded: bool,
    pub instructions: Vec<Instruction>,
    pub containers: HashMap<String, TrackedContainer>,
}
