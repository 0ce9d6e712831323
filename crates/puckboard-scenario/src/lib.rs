// crates/puckboard-scenario/src/lib.rs
// ============================================================================
// Module: Puckboard Scenario
// Description: Roster/cap what-if simulation under league rule constraints.
// Purpose: Evaluate roster actions and acquisitions deterministically.
// Dependencies: puckboard-core, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The scenario engine applies tagged roster actions in order against a
//! roster snapshot and cap rules, computing before/after metrics, position
//! coverage, and compliance violations (cap ceiling with LTIR relief, cap
//! floor, 23-man roster, trade deadline). Acquisition evaluation searches
//! removal candidates greedy-then-knapsack, preferring waiver-exempt moves.
//! Evaluations are preemptable at combination-enumeration boundaries.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod acquisition;
pub mod actions;
pub mod engine;
pub mod waivers;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use acquisition::AcquisitionOutcome;
pub use acquisition::evaluate_acquisition;
pub use actions::Action;
pub use actions::ActionKind;
pub use engine::CancelFlag;
pub use engine::CapRules;
pub use engine::PlayerDirectory;
pub use engine::PlayerRecord;
pub use engine::RosterMetrics;
pub use engine::ScenarioError;
pub use engine::ScenarioOutcome;
pub use engine::simulate_roster_scenario;
pub use waivers::WaiverInputs;
pub use waivers::is_waiver_exempt;
