use aliquot_schemas::protocol::RunParameters;

pub const PLATE_ROWS: [char; 8] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H'];
pub const PLATE_COLUMNS: usize = 12;

pub fn well_name(row: usize, column: usize) -> String {
    format!("{}{}", PLATE_ROWS[row], column)
}

/// Wells taken by the standard curve: one row per concentration point plus
/// a blank row, `replication` columns each.
pub fn standard_wells(num_points: usize, replication: u32) -> Vec<String> {
    let mut wells = Vec::new();
    for row in 0..=num_points {
        for column in 1..=replication as usize {
            wells.push(well_name(row, column));
        }
    }
    wells
}

/// Wells taken by samples: each block of up to 8 samples fills
/// `replication` consecutive columns, starting after the standards.
pub fn sample_wells(number_samples: u32, replication: u32) -> Vec<String> {
    let mut wells = Vec::new();
    let mut current_column = replication as usize + 1;
    let num_blocks = (number_samples as usize).div_ceil(8);
    for block in 0..num_blocks {
        let rows_in_block = if block == num_blocks - 1 {
            let remainder = number_samples as usize % 8;
            if remainder == 0 {
                8
            } else {
                remainder
            }
        } else {
            8
        };
        for row in 0..rows_in_block {
            for replicate in 0..replication as usize {
                wells.push(well_name(row, current_column + replicate));
            }
        }
        current_column += replication as usize;
    }
    wells
}

/// All occupied wells, sorted row-major to match the physical dispense
/// order of the plate.
pub fn occupied_wells(
    number_samples: u32,
    replication: u32,
    num_standard_points: usize,
) -> Vec<String> {
    let mut wells = standard_wells(num_standard_points, replication);
    wells.extend(sample_wells(number_samples, replication));
    wells.sort_by_key(|well| {
        let row = well.chars().next().unwrap_or('A');
        let column: u32 = well[1..].parse().unwrap_or(0);
        (row, column)
    });
    wells
}

/// Plate columns the run occupies: standards plus one replicate column per
/// sample block.
pub fn required_columns(parameters: &RunParameters) -> usize {
    let sample_blocks = (parameters.number_samples as usize).div_ceil(8);
    parameters.replication as usize * (sample_blocks + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occupied_wells_counts_standards_and_samples() {
        // 16 samples in triplicate, 5-point curve plus blank.
        let wells = occupied_wells(16, 3, 5);
        assert_eq!(wells.len(), 16 * 3 + 3 * 6);
        assert_eq!(wells[0], "A1");
        assert!(wells.contains(&"F3".to_string()));
        assert!(wells.contains(&"H9".to_string()));
        assert!(!wells.contains(&"G1".to_string()));
    }

    #[test]
    fn sample_wells_start_after_the_standard_columns() {
        let wells = sample_wells(9, 3);
        assert_eq!(wells[0], "A4");
        // The ninth sample wraps into the next column block.
        assert!(wells.contains(&"A7".to_string()));
        assert_eq!(wells.len(), 27);
    }
}
