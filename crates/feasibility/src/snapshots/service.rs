use serde::Deserialize;

use crate::cashflow::scenario::BASE;
use crate::cashflow::{FeasibilityInputs, ScenarioBuilder, ScenarioTable};

use super::backend::SnapshotBackend;
use super::capture::capture_scenario;
use super::domain::ScenarioSnapshot;
use super::store::{ScenarioSnapshotStore, SnapshotError};

/// Builds one scenario from inputs and stores its capture.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_scenario")]
    pub scenario: String,
    #[serde(default)]
    pub note: Option<String>,
    pub inputs: FeasibilityInputs,
}

fn default_scenario() -> String {
    BASE.to_string()
}

pub struct SnapshotService<B> {
    store: ScenarioSnapshotStore<B>,
    builder: ScenarioBuilder,
}

impl<B> SnapshotService<B>
where
    B: SnapshotBackend + 'static,
{
    pub fn new(store: ScenarioSnapshotStore<B>, builder: ScenarioBuilder) -> Self {
        Self { store, builder }
    }

    pub fn store(&self) -> &ScenarioSnapshotStore<B> {
        &self.store
    }

    pub fn capture(&self, request: CaptureRequest) -> Result<ScenarioSnapshot, SnapshotError> {
        let table = ScenarioTable::standard(request.inputs.custom_multipliers);
        let multipliers = table
            .get(&request.scenario)
            .ok_or_else(|| SnapshotError::UnknownScenario(request.scenario.clone()))?;

        let series = self.builder.build(&request.inputs, &multipliers);
        let mut draft = capture_scenario(request.name, &request.inputs, &series);
        draft.note = request.note;
        self.store.add(draft)
    }
}
