// Full-plan generation tests for the Bradford protocol shape.

use aliquot_core::planner::builder::PlanBuilder;
use aliquot_core::planner::engine::PlanEngine;
use aliquot_schemas::instruction::Instruction;
use aliquot_schemas::labware::{ContainerDef, Fill, TubeShape};
use aliquot_schemas::protocol::{AssayKind, DeckLocations, PipetteConfig, RunParameters};

fn bradford_parameters() -> RunParameters {
    RunParameters {
        assay: AssayKind::Bradford,
        number_samples: 16,
        replication: 3,
        dilution_factor: 0,
        working_sample_vol_ul: 5.0,
        incubation_minutes: 15,
        dry_run: true,
        pipette: PipetteConfig::default(),
    }
}

fn deck_locations() -> DeckLocations {
    DeckLocations {
        diluent_container: "diluent".to_string(),
        chromogen_container: "chromogen".to_string(),
        working_reagent_container: "dye".to_string(),
        working_plate: "working_plate".to_string(),
        working_plate_slot: "C2".to_string(),
        sample_plate: "sample_plate".to_string(),
        standard_rack: "standard_rack".to_string(),
        standard_tube_wells: vec![
            "B1".to_string(),
            "B2".to_string(),
            "B3".to_string(),
            "B4".to_string(),
            "B5".to_string(),
            "B6".to_string(),
            "C1".to_string(),
        ],
        shaker_slot: "D1".to_string(),
    }
}

fn containers() -> Vec<ContainerDef> {
    vec![
        ContainerDef {
            container_id: "diluent".to_string(),
            labware_id: "tube_rack".to_string(),
            well: "A1".to_string(),
            shape: TubeShape::Conical15Ml,
            liquid_id: "diluent".to_string(),
            fill: Fill::VolumeUl(9000.0),
        },
        ContainerDef {
            container_id: "chromogen".to_string(),
            labware_id: "tube_rack".to_string(),
            well: "A2".to_string(),
            shape: TubeShape::Conical15Ml,
            liquid_id: "reagent_a".to_string(),
            fill: Fill::VolumeUl(9000.0),
        },
        ContainerDef {
            container_id: "dye".to_string(),
            labware_id: "reagent_reservoir".to_string(),
            well: "A1".to_string(),
            shape: TubeShape::Reservoir,
            liquid_id: "dye".to_string(),
            fill: Fill::VolumeUl(50_000.0),
        },
    ]
}

fn build_engine(parameters: RunParameters) -> PlanEngine {
    PlanBuilder::new()
        .with_parameters(parameters)
        .with_locations(deck_locations())
        .with_containers(containers())
        .build()
        .unwrap()
}

#[test]
fn chromogen_reaches_every_occupied_well() {
    let mut engine = build_engine(bradford_parameters());
    engine.run().unwrap();

    let chromogen_dispenses = engine
        .instructions()
        .iter()
        .filter(|i| {
            matches!(
                i,
                Instruction::Dispense { labware_id, volume_ul, .. }
                    if labware_id == "working_plate" && *volume_ul == 25.0
            )
        })
        .count();
    // 16 samples in triplicate plus 6 standard rows in triplicate.
    assert_eq!(chromogen_dispenses, 16 * 3 + 6 * 3);
}

#[test]
fn no_aspiration_exceeds_the_tip() {
    let mut engine = build_engine(bradford_parameters());
    engine.run().unwrap();

    for instruction in engine.instructions() {
        if let Instruction::Aspirate { volume_ul, .. } = instruction {
            assert!(*volume_ul <= 200.0, "aspirated {} µL", volume_ul);
        }
    }
}

#[test]
fn tracked_sources_are_debited_in_plan_order() {
    let mut engine = build_engine(bradford_parameters());
    engine.run().unwrap();

    // Chromogen: 66 wells at 25 µL in 175 µL batches, 5 µL overdraw each.
    let chromogen = engine.containers().get("chromogen").unwrap();
    assert!((chromogen.volume_ul() - (9000.0 - 1650.0 - 10.0 * 5.0)).abs() < 0.01);

    // Diluent: standards buffer in two packed batches plus the blank row.
    let diluent = engine.containers().get("diluent").unwrap();
    assert!((diluent.volume_ul() - (9000.0 - 188.3333 - 105.0 - 20.0)).abs() < 0.01);

    // Dye: one 200 µL column shot per occupied column.
    let dye = engine.containers().get("dye").unwrap();
    assert!((dye.volume_ul() - (50_000.0 - 9.0 * 200.0)).abs() < 0.01);
}

#[test]
fn standards_are_diluted_serially_and_loaded() {
    let mut engine = build_engine(bradford_parameters());
    engine.run().unwrap();

    let mixes: Vec<&Instruction> = engine
        .instructions()
        .iter()
        .filter(|i| matches!(i, Instruction::Mix { labware_id, .. } if labware_id == "standard_rack"))
        .collect();
    // Every tube after the stock tube gets mixed once.
    assert_eq!(mixes.len(), 4);

    // The 1.0 point draws 200 * (1.0 / 1.5) from the stock tube; the only
    // other aspirations from that tube are the 5 µL plate loads.
    let chain_transfer = engine.instructions().iter().find(|i| {
        matches!(
            i,
            Instruction::Aspirate { labware_id, well, volume_ul, .. }
                if labware_id == "standard_rack" && well == "B1" && *volume_ul > 50.0
        )
    });
    match chain_transfer {
        Some(Instruction::Aspirate { volume_ul, .. }) => {
            assert!((volume_ul - 200.0 * (1.0 / 1.5)).abs() < 0.01);
        }
        _ => panic!("missing serial transfer out of the stock tube"),
    }

    // Blank row sits under the lowest standard, one well per replicate.
    for well in ["F1", "F2", "F3"] {
        assert!(engine.instructions().iter().any(|i| {
            matches!(
                i,
                Instruction::Dispense { labware_id, well: w, volume_ul, .. }
                    if labware_id == "working_plate" && w == well && *volume_ul == 5.0
            )
        }));
    }
}

#[test]
fn working_reagent_walks_the_reservoir_down() {
    let mut engine = build_engine(bradford_parameters());
    engine.run().unwrap();

    let reservoir_wells: Vec<String> = engine
        .instructions()
        .iter()
        .filter_map(|i| match i {
            Instruction::Aspirate { labware_id, well, .. }
                if labware_id == "reagent_reservoir" =>
            {
                Some(well.clone())
            }
            _ => None,
        })
        .collect();
    assert_eq!(reservoir_wells.len(), 9);
    assert_eq!(reservoir_wells.first().map(String::as_str), Some("A2"));
    assert_eq!(reservoir_wells.last().map(String::as_str), Some("A1"));
}

#[test]
fn dry_run_substitutes_short_delays() {
    let mut engine = build_engine(bradford_parameters());
    engine.run().unwrap();

    for instruction in engine.instructions() {
        match instruction {
            Instruction::Delay { seconds, .. } => assert_eq!(*seconds, 10),
            Instruction::Shake { seconds, .. } => assert_eq!(*seconds, 10),
            _ => {}
        }
    }

    let mut live = bradford_parameters();
    live.dry_run = false;
    let mut engine = build_engine(live);
    engine.run().unwrap();
    assert!(engine.instructions().iter().any(|i| {
        matches!(i, Instruction::Delay { seconds, .. } if *seconds == 15 * 60)
    }));
}

#[test]
fn plate_returns_home_after_incubation() {
    let mut engine = build_engine(bradford_parameters());
    engine.run().unwrap();

    let last = engine.instructions().last().unwrap();
    assert_eq!(
        last,
        &Instruction::MoveLabware {
            labware_id: "working_plate".to_string(),
            new_slot: "C2".to_string(),
        }
    );
    assert_eq!(engine.step_count(), engine.instructions().len() as u64);
}

#[test]
fn instruction_log_has_one_row_per_instruction() {
    let log_path = std::env::temp_dir().join("aliquot_bradford_plan_log.csv");
    let log_path = log_path.to_str().unwrap();
    let mut engine = PlanBuilder::new()
        .with_parameters(bradford_parameters())
        .with_locations(deck_locations())
        .with_containers(containers())
        .with_instruction_logging_to_file(log_path)
        .build()
        .unwrap();
    engine.run().unwrap();

    let contents = std::fs::read_to_string(log_path).unwrap();
    // Header plus one row per instruction.
    assert_eq!(
        contents.lines().count(),
        engine.instructions().len() + 1
    );
    assert!(contents.lines().nth(1).unwrap().contains("pick_up_tip"));
}
