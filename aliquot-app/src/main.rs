use anyhow::{Context, Result};
use aliquot_schemas::protocol::AssayKind;
use clap::Parser;
use std::fs;
use std::path::Path;

mod config;
mod workflow;

#[derive(Parser)]
#[command(name = "aliquot", about = "Generates liquid-handler assay run plans")]
struct Args {
    /// Run request YAML file.
    #[arg(long, default_value = "aliquot-app/request.yaml")]
    request: String,

    /// Directory of deck definition YAML files.
    #[arg(long, default_value = "aliquot-app/deck")]
    deck: String,

    /// Root directory for run outputs.
    #[arg(long, default_value = "./data/runs")]
    output_root: String,

    /// Force a dry run regardless of the request file.
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    println!("--- Aliquot Planner ---");

    let request_str = fs::read_to_string(&args.request)
        .with_context(|| format!("Failed to read {}", args.request))?;
    let mut request: config::RunRequest = serde_yaml::from_str(&request_str)
        .with_context(|| format!("Failed to parse {}", args.request))?;
    if args.dry_run {
        request.parameters.dry_run = true;
    }

    let workbench = config::Workbench::load(&args.deck)?;
    workbench.validate(&request.locations)?;

    let assay_name = match request.parameters.assay {
        AssayKind::Bradford => "bradford",
        AssayKind::Bca => "bca",
    };
    let output_dir = format!(
        "{}/{}_{}",
        args.output_root,
        assay_name,
        chrono::Utc::now().format("%Y%m%d_%H%M%S")
    );
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir))?;

    // Copy the request file to the output directory for traceability
    fs::copy(&args.request, Path::new(&output_dir).join("request.yaml"))?;

    workflow::generate_plan(&request, &workbench, &output_dir)?;

    println!("\nPlan generation complete. Results are in '{}'", output_dir);

    Ok(())
}
