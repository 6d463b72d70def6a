//! Distribution of lump totals across integer-indexed periods.

use tracing::debug;

use super::domain::Phase;

/// `amount / periods` in every slot. Empty when there are no periods.
pub fn allocate_even(amount: f64, periods: usize) -> Vec<f64> {
    if periods == 0 {
        return Vec::new();
    }
    vec![amount / periods as f64; periods]
}

/// Spreads `amount` over `min(window, periods - trigger)` slots beginning at
/// `trigger`. A trigger past the end or an empty window places nothing.
pub fn allocate_delayed(amount: f64, periods: usize, trigger: usize, window: usize) -> Vec<f64> {
    let mut slots = vec![0.0; periods];
    if trigger >= periods || window == 0 {
        return slots;
    }

    let span = window.min(periods - trigger);
    let per_period = amount / span as f64;
    for slot in &mut slots[trigger..trigger + span] {
        *slot = per_period;
    }
    slots
}

/// Places each phase's share of `total` evenly over its own window, clipped
/// to the timeline. Overlapping phases stack.
pub fn allocate_phased(total: f64, phases: &[Phase], periods: usize) -> Vec<f64> {
    let mut slots = vec![0.0; periods];

    let weight: f64 = phases.iter().map(|phase| phase.cost_percent_of_total).sum();
    if (weight - 100.0).abs() > 1e-6 {
        debug!(weight, "phase weights do not sum to 100; allocating as given");
    }

    for phase in phases {
        if phase.duration_periods == 0 {
            continue;
        }
        let phase_total = total * phase.cost_percent_of_total / 100.0;
        let per_period = phase_total / phase.duration_periods as f64;
        let end = phase
            .start_period
            .saturating_add(phase.duration_periods)
            .min(periods);
        for index in phase.start_period.min(end)..end {
            slots[index] += per_period;
        }
    }

    slots
}

/// Splits `target` across periods in proportion to each period's cost.
pub fn allocate_equity_phased(target: f64, costs_per_period: &[f64]) -> Vec<f64> {
    let total_cost: f64 = costs_per_period.iter().sum();
    if total_cost == 0.0 {
        return vec![0.0; costs_per_period.len()];
    }

    costs_per_period
        .iter()
        .map(|cost| target * cost / total_cost)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase(name: &str, start: usize, duration: usize, percent: f64) -> Phase {
        Phase {
            name: name.to_string(),
            start_period: start,
            duration_periods: duration,
            cost_percent_of_total: percent,
        }
    }

    #[test]
    fn even_allocation_is_exact() {
        let slots = allocate_even(1_000_000.0, 10);
        assert_eq!(slots.len(), 10);
        assert!(slots.iter().all(|slot| (*slot - 100_000.0).abs() < 1e-9));
        let sum: f64 = slots.iter().sum();
        assert!((sum - 1_000_000.0).abs() <= 1_000_000.0 * 1e-6);
    }

    #[test]
    fn even_allocation_over_no_periods_is_empty() {
        assert!(allocate_even(500.0, 0).is_empty());
    }

    #[test]
    fn delayed_allocation_starts_at_trigger() {
        let slots = allocate_delayed(600.0, 10, 4, 3);
        assert_eq!(slots, vec![0.0, 0.0, 0.0, 0.0, 200.0, 200.0, 200.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn delayed_allocation_shrinks_window_near_the_end() {
        let slots = allocate_delayed(900.0, 10, 7, 6);
        assert_eq!(&slots[7..], &[300.0, 300.0, 300.0]);
        assert!(slots[..7].iter().all(|slot| *slot == 0.0));
    }

    #[test]
    fn delayed_allocation_past_the_end_places_nothing() {
        assert_eq!(allocate_delayed(900.0, 4, 4, 2), vec![0.0; 4]);
        assert_eq!(allocate_delayed(900.0, 4, 1, 0), vec![0.0; 4]);
    }

    #[test]
    fn phased_allocation_stacks_overlaps_and_clips() {
        let phases = vec![
            phase("Substructure", 0, 4, 40.0),
            phase("Superstructure", 2, 4, 60.0),
        ];
        let slots = allocate_phased(1_000.0, &phases, 5);
        assert_eq!(slots, vec![100.0, 100.0, 250.0, 250.0, 150.0]);
    }

    #[test]
    fn phased_allocation_does_not_rescale_bad_weights() {
        let phases = vec![phase("Only", 0, 2, 50.0)];
        let slots = allocate_phased(1_000.0, &phases, 2);
        assert_eq!(slots, vec![250.0, 250.0]);
    }

    #[test]
    fn phased_allocation_skips_zero_length_and_out_of_range_phases() {
        let phases = vec![phase("Empty", 0, 0, 50.0), phase("Late", 9, 3, 50.0)];
        assert_eq!(allocate_phased(1_000.0, &phases, 4), vec![0.0; 4]);
    }

    #[test]
    fn equity_follows_cost_profile() {
        let slots = allocate_equity_phased(500.0, &[100.0, 0.0, 300.0, 600.0]);
        assert_eq!(slots, vec![50.0, 0.0, 150.0, 300.0]);
    }

    #[test]
    fn equity_is_zero_without_costs() {
        assert_eq!(allocate_equity_phased(500.0, &[0.0, 0.0]), vec![0.0, 0.0]);
    }
}
