use crate::config::{RunRequest, Workbench};
use aliquot_core::planner::builder::PlanBuilder;
use anyhow::{Context, Result};
use std::path::Path;

/// Builds the plan engine from the loaded deck and walks the protocol
/// stages in order, logging every instruction to the run output directory.
pub fn generate_plan(
    request: &RunRequest,
    workbench: &Workbench,
    output_dir: &str,
) -> Result<()> {
    println!("\n--- [Workflow] Planning {} samples ---", request.parameters.number_samples);
    for liquid in workbench.liquids.values() {
        println!("Liquid '{}' ({}): {}", liquid.name, liquid.display_color, liquid.description);
    }

    let log_path = Path::new(output_dir).join("plan.csv");
    let log_path = log_path
        .to_str()
        .context("output path is not valid UTF-8")?;

    let mut engine = PlanBuilder::new()
        .with_parameters(request.parameters.clone())
        .with_locations(request.locations.clone())
        .with_containers(workbench.containers.values().cloned().collect())
        .with_low_volume_policy(request.low_volume_policy)
        .with_instruction_logging_to_file(log_path)
        .build()?;

    println!("\n--- [Plan] Distributing chromogenic reagent ---");
    engine.distribute_chromogen()?;

    println!("--- [Plan] Loading samples ---");
    engine.load_samples()?;

    println!("--- [Plan] Preparing the standard curve ---");
    engine.prepare_standards()?;

    println!("--- [Plan] Adding working reagent ---");
    engine.add_working_reagent()?;

    println!("--- [Plan] Shake and incubation ---");
    engine.shake_and_incubate()?;

    println!("\nPlanned {} instructions into '{}'.", engine.instructions().len(), log_path);
    println!("Remaining tracked volumes:");
    let mut container_ids: Vec<&String> = engine.containers().keys().collect();
    container_ids.sort();
    for container_id in container_ids {
        let container = &engine.containers()[container_id];
        println!("  {}: {:.1} µL", container_id, container.volume_ul());
    }

    Ok(())
}
