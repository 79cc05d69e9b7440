use crate::{
    labware::{ContainerDef, Labware},
    liquid::Liquid,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LabwareFile {
    pub schema_version: String,
    pub labware: Vec<Labware>,
}

#[derive(Debug, Deserialize)]
pub struct LiquidFile {
    pub schema_version: String,
    pub liquids: Vec<Liquid>,
}

#[derive(Debug, Deserialize)]
pub struct ContainerFile {
    pub schema_version: String,
    pub containers: Vec<ContainerDef>,
}
