use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::lenient;

pub const BASE: &str = "base";
pub const OPTIMISTIC: &str = "optimistic";
pub const PESSIMISTIC: &str = "pessimistic";
pub const CUSTOM: &str = "custom";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioMultipliers {
    #[serde(default = "unit", deserialize_with = "lenient::number")]
    pub construction_cost_multiplier: f64,
    #[serde(default = "unit", deserialize_with = "lenient::number")]
    pub sale_price_multiplier: f64,
    #[serde(default = "unit", deserialize_with = "lenient::number")]
    pub irr_multiplier: f64,
}

fn unit() -> f64 {
    1.0
}

impl ScenarioMultipliers {
    pub const IDENTITY: Self = Self::new(1.0, 1.0, 1.0);

    pub const fn new(construction_cost: f64, sale_price: f64, irr: f64) -> Self {
        Self {
            construction_cost_multiplier: construction_cost,
            sale_price_multiplier: sale_price,
            irr_multiplier: irr,
        }
    }
}

impl Default for ScenarioMultipliers {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioEntry {
    pub name: String,
    pub multipliers: ScenarioMultipliers,
}

/// Named multiplier sets, built in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioTable {
    entries: Vec<ScenarioEntry>,
}

impl ScenarioTable {
    /// Base, optimistic, pessimistic and a caller-tuned custom scenario
    /// (identity when no custom multipliers are supplied).
    pub fn standard(custom: Option<ScenarioMultipliers>) -> Self {
        let mut table = Self {
            entries: Vec::new(),
        };
        table.insert(BASE, ScenarioMultipliers::IDENTITY);
        table.insert(OPTIMISTIC, ScenarioMultipliers::new(0.95, 1.10, 1.15));
        table.insert(PESSIMISTIC, ScenarioMultipliers::new(1.10, 0.90, 0.85));
        table.insert(CUSTOM, custom.unwrap_or_default());
        table
    }

    pub fn with_scenario(mut self, name: &str, multipliers: ScenarioMultipliers) -> Self {
        self.insert(name, multipliers);
        self
    }

    /// Adds or replaces a scenario. The base scenario is pinned to identity.
    pub fn insert(&mut self, name: &str, multipliers: ScenarioMultipliers) {
        let multipliers = if name == BASE && multipliers != ScenarioMultipliers::IDENTITY {
            warn!(?multipliers, "ignoring non-identity multipliers for base scenario");
            ScenarioMultipliers::IDENTITY
        } else {
            multipliers
        };

        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => entry.multipliers = multipliers,
            None => self.entries.push(ScenarioEntry {
                name: name.to_string(),
                multipliers,
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<ScenarioMultipliers> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.multipliers)
    }

    pub fn entries(&self) -> &[ScenarioEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_lists_four_scenarios_in_order() {
        let table = ScenarioTable::standard(None);
        let names: Vec<&str> = table.entries().iter().map(|entry| entry.name.as_str()).collect();
        assert_eq!(names, vec![BASE, OPTIMISTIC, PESSIMISTIC, CUSTOM]);
        assert_eq!(table.get(BASE), Some(ScenarioMultipliers::IDENTITY));
        assert_eq!(table.get(CUSTOM), Some(ScenarioMultipliers::IDENTITY));
    }

    #[test]
    fn custom_multipliers_flow_into_the_table() {
        let custom = ScenarioMultipliers::new(1.2, 0.8, 1.0);
        let table = ScenarioTable::standard(Some(custom));
        assert_eq!(table.get(CUSTOM), Some(custom));
    }

    #[test]
    fn new_scenarios_extend_without_code_changes() {
        let stress = ScenarioMultipliers::new(1.25, 0.75, 0.7);
        let table = ScenarioTable::standard(None).with_scenario("stress", stress);
        assert_eq!(table.len(), 5);
        assert_eq!(table.get("stress"), Some(stress));
    }

    #[test]
    fn base_stays_identity() {
        let table = ScenarioTable::standard(None)
            .with_scenario(BASE, ScenarioMultipliers::new(2.0, 2.0, 2.0));
        assert_eq!(table.get(BASE), Some(ScenarioMultipliers::IDENTITY));
    }

    #[test]
    fn partial_multiplier_payloads_default_to_identity() {
        let multipliers: ScenarioMultipliers =
            serde_json::from_str(r#"{"salePriceMultiplier": 1.05}"#).expect("parses");
        assert_eq!(multipliers, ScenarioMultipliers::new(1.0, 1.05, 1.0));
    }
}
