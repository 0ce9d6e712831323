// crates/puckboard-metrics/src/lib.rs
// ============================================================================
// Module: Puckboard Metrics
// Description: NaN-safe numeric pipelines over columnar game logs.
// Purpose: Compute PFI, team trends, RTI, and the fan sentiment proxy.
// Dependencies: puckboard-core, serde, serde_json
// ============================================================================

//! ## Overview
//! The metrics engine operates on player-game, team-game, and division-team
//! logs with a rolling window parameter (default 10). Every pipeline guards
//! divisions and aggregates so outputs are finite: percentages default to 50,
//! counts to 0, and missing time-on-ice to a documented 20-minute assumption.
//! Outputs are plain serde types ready for the response layer's sanitization
//! pass.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod fsp;
pub mod pfi;
pub mod rows;
pub mod rti;
pub mod stats;
pub mod toi;
pub mod trends;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use fsp::FanSentiment;
pub use fsp::SentimentBand;
pub use fsp::compute_fan_sentiment;
pub use pfi::FormBreakdown;
pub use pfi::PlayerForm;
pub use pfi::Trend;
pub use pfi::compute_player_form_index;
pub use rows::DivisionGameRow;
pub use rows::PlayerGameRow;
pub use rows::TeamGameRow;
pub use rti::RivalThreat;
pub use rti::compute_rival_threat_index;
pub use toi::DEFAULT_TOI_MINUTES;
pub use toi::parse_toi_minutes;
pub use trends::PdoStatus;
pub use trends::TeamTrends;
pub use trends::compute_team_trends;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default rolling window in games.
pub const DEFAULT_WINDOW: usize = 10;
/// Default number of players returned by the PFI ranking.
pub const DEFAULT_TOP_N: usize = 10;
