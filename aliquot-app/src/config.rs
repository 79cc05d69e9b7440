use anyhow::{bail, Context, Result};
use aliquot_core::geometry::LowVolumePolicy;
use aliquot_schemas::{
    file_formats::{ContainerFile, LabwareFile, LiquidFile},
    labware::{ContainerDef, Labware},
    liquid::Liquid,
    protocol::{DeckLocations, RunParameters},
};
use serde::Deserialize;
use std::{collections::HashMap, fs, path::Path};

/// A single run request: scalar parameters plus the deck role bindings.
#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub parameters: RunParameters,
    pub locations: DeckLocations,
    #[serde(default)]
    pub low_volume_policy: LowVolumePolicy,
}

/// All static deck data loaded from YAML files: the declared labware, the
/// registered liquids, and the tracked source containers.
pub struct Workbench {
    pub labware: HashMap<String, Labware>,
    pub liquids: HashMap<String, Liquid>,
    pub containers: HashMap<String, ContainerDef>,
}

impl Workbench {
    /// Loads all deck data from the specified base directory.
    pub fn load(base_path: &str) -> Result<Self> {
        println!("Loading deck definitions from '{}'...", base_path);

        let labware = load_yaml_files_into_map(
            Path::new(base_path).join("labware"),
            |file: LabwareFile| file.labware,
            |item: &Labware| item.labware_id.clone(),
        )?;
        let liquids = load_yaml_files_into_map(
            Path::new(base_path).join("liquids"),
            |file: LiquidFile| file.liquids,
            |item: &Liquid| item.liquid_id.clone(),
        )?;
        let containers = load_yaml_files_into_map(
            Path::new(base_path).join("containers"),
            |file: ContainerFile| file.containers,
            |item: &ContainerDef| item.container_id.clone(),
        )?;

        println!("Deck definitions loaded successfully.");
        Ok(Self {
            labware,
            liquids,
            containers,
        })
    }

    /// Checks that every container and role binding points at declared
    /// labware before any planning starts.
    pub fn validate(&self, locations: &DeckLocations) -> Result<()> {
        for container in self.containers.values() {
            if !self.labware.contains_key(&container.labware_id) {
                bail!(
                    "container '{}' references undeclared labware '{}'",
                    container.container_id,
                    container.labware_id
                );
            }
            if !self.liquids.contains_key(&container.liquid_id) {
                bail!(
                    "container '{}' references unregistered liquid '{}'",
                    container.container_id,
                    container.liquid_id
                );
            }
        }
        for labware_id in [
            &locations.working_plate,
            &locations.sample_plate,
            &locations.standard_rack,
        ] {
            if !self.labware.contains_key(labware_id) {
                bail!("run request references undeclared labware '{}'", labware_id);
            }
        }
        Ok(())
    }
}

/// Generic helper to load all YAML files in a directory into a HashMap.
fn load_yaml_files_into_map<P, F, E, T, K>(
    dir_path: P,
    extract_vec: E,
    get_key: K,
) -> Result<HashMap<String, T>>
where
    P: AsRef<Path>,
    F: for<'de> serde::Deserialize<'de>, // The file wrapper struct (e.g., LabwareFile)
    E: Fn(F) -> Vec<T>,                  // A closure to extract the Vec<T> from the wrapper
    K: Fn(&T) -> String,                 // A closure to get the key for the map from an item T
{
    let mut map = HashMap::new();
    for entry in fs::read_dir(dir_path.as_ref())
        .with_context(|| format!("Failed to read directory: {:?}", dir_path.as_ref()))?
    {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().map_or(false, |s| s == "yaml" || s == "yml") {
            let content = fs::read_to_string(&path)?;
            let file_wrapper: F = serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML from {:?}", path))?;

            for item in extract_vec(file_wrapper) {
                map.insert(get_key(&item), item);
            }
        }
    }
    Ok(map)
}
