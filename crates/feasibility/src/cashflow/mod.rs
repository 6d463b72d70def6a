//! Month-by-month development cashflow across named scenarios.
//!
//! The [`ScenarioBuilder`] is the single pipeline: it lays out the
//! [`Timeline`], allocates costs and sales, schedules the loan, runs the
//! compliance overlay and folds everything into a running cash balance.

pub mod allocation;
mod builder;
pub mod compliance;
pub mod domain;
pub mod export;
pub mod loan;
mod phasing;
pub mod repository;
pub mod router;
pub mod scenario;
pub mod service;
pub mod summary;
pub mod timeline;

#[cfg(test)]
mod tests;

pub use builder::{build, AllocationMode, BuildSettings, ScenarioBuilder};
pub use domain::{
    CashflowGrid, EscrowTerms, FeasibilityInputs, LevyToggle, LoanTerms, MonthlyCashflow, Phase,
    RepaymentStyle, RevenueMix, SegmentRevenue,
};
pub use phasing::{PhaseBlueprint, PhaseTemplate};
pub use repository::{
    CashflowRepository, CashflowRow, InMemoryCashflowRepository, RepositoryError,
};
pub use router::cashflow_router;
pub use scenario::{ScenarioMultipliers, ScenarioTable};
pub use service::{FeasibilityService, FeasibilityServiceError, GridReport};
pub use summary::{summarize, summarize_grid, summarize_with, ScenarioSummary};
pub use timeline::{Period, Timeline};
