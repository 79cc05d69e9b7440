use crate::error::AliquotError;

/// One point of a standard curve: the volume made in its tube and the
/// stock/buffer split that produces its concentration.
///
/// `stock_ul` is drawn from the preceding tube of the series (the first
/// tube holds undiluted stock); `buffer_ul` comes from the diluent source.
/// `stock_ul + buffer_ul == total_ul` for every tube.
#[derive(Debug, Clone, PartialEq)]
pub struct DilutionStep {
    pub concentration: f64,
    pub total_ul: f64,
    pub stock_ul: f64,
    pub buffer_ul: f64,
}

/// Decomposes a total volume into a sequence of aspirations, each at most
/// `max_capacity_ul - margin_ul`, filling every batch before starting the
/// next. The batches sum exactly to `total_volume_ul`.
pub fn plan_transfers(
    total_volume_ul: f64,
    max_capacity_ul: f64,
    margin_ul: f64,
) -> Result<Vec<f64>, AliquotError> {
    let effective_ul = max_capacity_ul - margin_ul;
    if effective_ul <= 0.0 {
        return Err(AliquotError::InfeasibleTransfer {
            required_ul: total_volume_ul,
            capacity_ul: effective_ul,
        });
    }
    if total_volume_ul <= 0.0 {
        return Ok(Vec::new());
    }

    let num_batches = (total_volume_ul / effective_ul).ceil() as usize;
    let mut batches = vec![effective_ul; num_batches - 1];
    batches.push(total_volume_ul - effective_ul * (num_batches as f64 - 1.0));
    Ok(batches)
}

/// Packs per-destination volumes into batches whose running sum stays
/// within `max_capacity_ul`, preserving the dispense order. First-fit on
/// consecutive items, not optimal packing: the order matches the physical
/// well layout.
pub fn pack_heterogeneous<D: Clone>(
    items: &[(D, f64)],
    max_capacity_ul: f64,
) -> Result<Vec<Vec<(D, f64)>>, AliquotError> {
    if max_capacity_ul <= 0.0 {
        return Err(AliquotError::InfeasibleTransfer {
            required_ul: items.iter().map(|(_, v)| v).sum(),
            capacity_ul: max_capacity_ul,
        });
    }

    let mut batches = Vec::new();
    let mut current: Vec<(D, f64)> = Vec::new();
    let mut running_ul = 0.0;
    for (destination, volume_ul) in items {
        if *volume_ul > max_capacity_ul {
            return Err(AliquotError::InfeasibleTransfer {
                required_ul: *volume_ul,
                capacity_ul: max_capacity_ul,
            });
        }
        if running_ul + volume_ul > max_capacity_ul {
            batches.push(std::mem::take(&mut current));
            running_ul = 0.0;
        }
        running_ul += volume_ul;
        current.push((destination.clone(), *volume_ul));
    }
    if !current.is_empty() {
        batches.push(current);
    }
    Ok(batches)
}

/// Stock and buffer contributions for a serial dilution series, highest
/// concentration first.
///
/// The first tube is pure stock. Every later tube draws
/// `total × (cᵢ / cᵢ₋₁)` from the tube before it and tops up with buffer.
/// When that draw would fall under `floor_ul`, the draw is clamped to the
/// floor, the tube's total grows to keep its concentration exact, and the
/// preceding tube is made larger by the volume carried forward.
pub fn serial_dilution_plan(
    concentrations: &[f64],
    tube_total_ul: f64,
    floor_ul: f64,
) -> Result<Vec<DilutionStep>, AliquotError> {
    if concentrations.is_empty() || tube_total_ul <= 0.0 {
        return Err(AliquotError::InvalidDilutionSeries);
    }
    if concentrations.iter().any(|c| *c <= 0.0)
        || concentrations.windows(2).any(|pair| pair[1] >= pair[0])
    {
        return Err(AliquotError::InvalidDilutionSeries);
    }

    let mut steps = vec![DilutionStep {
        concentration: concentrations[0],
        total_ul: tube_total_ul,
        stock_ul: tube_total_ul,
        buffer_ul: 0.0,
    }];
    for i in 1..concentrations.len() {
        let ratio = concentrations[i] / concentrations[i - 1];
        let mut stock_ul = tube_total_ul * ratio;
        let mut total_ul = tube_total_ul;
        if stock_ul < floor_ul {
            stock_ul = floor_ul;
            total_ul = floor_ul / ratio;
            let previous = &mut steps[i - 1];
            let scale = (previous.total_ul + floor_ul) / previous.total_ul;
            previous.total_ul *= scale;
            previous.stock_ul *= scale;
            previous.buffer_ul = previous.total_ul - previous.stock_ul;
        }
        steps.push(DilutionStep {
            concentration: concentrations[i],
            total_ul,
            stock_ul,
            buffer_ul: total_ul - stock_ul,
        });
    }
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_transfers_fills_batches_and_carries_the_remainder() {
        let batches = plan_transfers(437.0, 195.0, 0.0).unwrap();
        assert_eq!(batches, vec![195.0, 195.0, 47.0]);
        assert!((batches.iter().sum::<f64>() - 437.0).abs() < 1e-9);
    }

    #[test]
    fn plan_transfers_even_division_uses_full_batches() {
        let batches = plan_transfers(390.0, 200.0, 5.0).unwrap();
        assert_eq!(batches, vec![195.0, 195.0]);
    }

    #[test]
    fn plan_transfers_rejects_nonpositive_capacity() {
        let result = plan_transfers(500.0, 5.0, 10.0);
        assert!(matches!(
            result,
            Err(AliquotError::InfeasibleTransfer { .. })
        ));
    }

    #[test]
    fn plan_transfers_zero_volume_is_an_empty_plan() {
        assert!(plan_transfers(0.0, 195.0, 0.0).unwrap().is_empty());
    }

    #[test]
    fn pack_heterogeneous_closes_a_batch_before_overflowing() {
        let items = vec![("B1", 80.0), ("B2", 80.0), ("B3", 80.0)];
        let batches = pack_heterogeneous(&items, 195.0).unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0], vec![("B1", 80.0), ("B2", 80.0)]);
        assert_eq!(batches[1], vec![("B3", 80.0)]);
    }

    #[test]
    fn pack_heterogeneous_rejects_oversized_items() {
        let items = vec![("B1", 250.0)];
        assert!(matches!(
            pack_heterogeneous(&items, 195.0),
            Err(AliquotError::InfeasibleTransfer { .. })
        ));
    }

    #[test]
    fn serial_dilution_matches_the_bradford_series() {
        let steps = serial_dilution_plan(&[1.5, 1.0, 0.75, 0.5, 0.25], 200.0, 5.0).unwrap();
        assert_eq!(steps.len(), 5);
        assert_eq!(steps[0].stock_ul, 200.0);
        assert_eq!(steps[0].buffer_ul, 0.0);
        assert!((steps[1].stock_ul - 200.0 * (1.0 / 1.5)).abs() < 0.01);
        assert!((steps[1].buffer_ul - (200.0 - 200.0 * (1.0 / 1.5))).abs() < 0.01);
        assert!((steps[2].stock_ul - 150.0).abs() < 1e-9);
        assert!((steps[2].buffer_ul - 50.0).abs() < 1e-9);
        for step in &steps {
            assert!((step.stock_ul + step.buffer_ul - step.total_ul).abs() < 1e-9);
            assert!((step.total_ul - 200.0).abs() < 1e-9);
        }
    }

    #[test]
    fn serial_dilution_borrows_through_the_previous_tube_under_the_floor() {
        // 1.5 -> 0.025 needs a 1/60 draw: 3.33 µL at 200 µL per tube.
        let steps = serial_dilution_plan(&[1.5, 0.025], 200.0, 5.0).unwrap();
        let last = &steps[1];
        assert_eq!(last.stock_ul, 5.0);
        assert!((last.total_ul - 5.0 * (1.5 / 0.025)).abs() < 1e-9);
        assert!((last.stock_ul + last.buffer_ul - last.total_ul).abs() < 1e-9);
        // The stock tube is made larger by the volume carried forward.
        assert!((steps[0].total_ul - 205.0).abs() < 1e-9);
        assert!((steps[0].stock_ul + steps[0].buffer_ul - steps[0].total_ul).abs() < 1e-9);
        // Concentration stays exact: drawn stock carries c_prev into total at c_i.
        assert!((last.stock_ul * 1.5 - last.total_ul * 0.025).abs() < 1e-9);
    }

    #[test]
    fn serial_dilution_rejects_invalid_series() {
        assert!(matches!(
            serial_dilution_plan(&[], 200.0, 5.0),
            Err(AliquotError::InvalidDilutionSeries)
        ));
        assert!(matches!(
            serial_dilution_plan(&[1.0, 1.5], 200.0, 5.0),
            Err(AliquotError::InvalidDilutionSeries)
        ));
        assert!(matches!(
            serial_dilution_plan(&[1.5, -1.0], 200.0, 5.0),
            Err(AliquotError::InvalidDilutionSeries)
        ));
    }
}
