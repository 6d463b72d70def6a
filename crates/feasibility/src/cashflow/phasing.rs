use super::domain::Phase;

/// Phase expressed relative to the build window so it fits any timeline.
#[derive(Debug, Clone, Copy)]
pub struct PhaseTemplate {
    pub name: &'static str,
    pub start_fraction: f64,
    pub duration_fraction: f64,
    pub cost_percent: f64,
}

#[derive(Debug)]
pub struct PhaseBlueprint {
    phases: Vec<PhaseTemplate>,
}

impl PhaseBlueprint {
    pub fn standard() -> Self {
        Self {
            phases: standard_phase_templates(),
        }
    }

    pub fn templates(&self) -> &[PhaseTemplate] {
        &self.phases
    }

    /// Concrete phases over `build_periods`; every phase spans at least one
    /// period and none runs past the window.
    pub fn resolve(&self, build_periods: usize) -> Vec<Phase> {
        if build_periods == 0 {
            return Vec::new();
        }

        self.phases
            .iter()
            .map(|template| {
                let start = ((template.start_fraction * build_periods as f64).floor() as usize)
                    .min(build_periods - 1);
                let duration = ((template.duration_fraction * build_periods as f64).round()
                    as usize)
                    .max(1)
                    .min(build_periods - start);
                Phase {
                    name: template.name.to_string(),
                    start_period: start,
                    duration_periods: duration,
                    cost_percent_of_total: template.cost_percent,
                }
            })
            .collect()
    }
}

fn standard_phase_templates() -> Vec<PhaseTemplate> {
    vec![
        PhaseTemplate {
            name: "Design & Permitting",
            start_fraction: 0.0,
            duration_fraction: 0.15,
            cost_percent: 10.0,
        },
        PhaseTemplate {
            name: "Substructure",
            start_fraction: 0.10,
            duration_fraction: 0.25,
            cost_percent: 20.0,
        },
        PhaseTemplate {
            name: "Superstructure",
            start_fraction: 0.30,
            duration_fraction: 0.40,
            cost_percent: 40.0,
        },
        PhaseTemplate {
            name: "MEP & Fit-out",
            start_fraction: 0.55,
            duration_fraction: 0.35,
            cost_percent: 25.0,
        },
        PhaseTemplate {
            name: "Handover",
            start_fraction: 0.85,
            duration_fraction: 0.15,
            cost_percent: 5.0,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cashflow::allocation::allocate_phased;

    #[test]
    fn standard_weights_total_one_hundred() {
        let total: f64 = PhaseBlueprint::standard()
            .templates()
            .iter()
            .map(|template| template.cost_percent)
            .sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn resolved_phases_fit_inside_the_window() {
        for build_periods in [1usize, 2, 5, 13, 18, 60] {
            let phases = PhaseBlueprint::standard().resolve(build_periods);
            assert_eq!(phases.len(), 5);
            for phase in &phases {
                assert!(phase.duration_periods >= 1);
                assert!(phase.start_period + phase.duration_periods <= build_periods);
            }
        }
    }

    #[test]
    fn resolved_phases_conserve_the_cost_total() {
        let phases = PhaseBlueprint::standard().resolve(18);
        let slots = allocate_phased(10_000_000.0, &phases, 24);
        let allocated: f64 = slots.iter().sum();
        assert!((allocated - 10_000_000.0).abs() < 1e-3);
        assert!(slots[18..].iter().all(|slot| *slot == 0.0));
    }

    #[test]
    fn empty_window_resolves_to_no_phases() {
        assert!(PhaseBlueprint::standard().resolve(0).is_empty());
    }
}
