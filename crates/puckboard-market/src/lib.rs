// crates/puckboard-market/src/lib.rs
// ============================================================================
// Module: Puckboard Market
// Description: Contract, cap, and market-value analytics over snapshots.
// Purpose: Serve the market surface from columnar and CSV snapshot tables.
// Dependencies: puckboard-core, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Market analytics read columnar contract/cap/trade snapshots plus
//! per-player CSV contract summaries. The store resolves contracts by id or
//! case-insensitive partial name, computes team cap summaries with the
//! NHL/IR roster-status rule, ranks position-weighted contract efficiency,
//! and scores comparables similarity. The warehouse path can be disabled
//! (`MARKET_DISABLE_BIGQUERY`), in which case snapshots are the only source;
//! the store reads the same shapes either way.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod comparables;
pub mod csv_contracts;
pub mod efficiency;
pub mod tables;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use comparables::ComparableProfile;
pub use comparables::ComparableScore;
pub use comparables::find_comparables;
pub use comparables::similarity_score;
pub use csv_contracts::CsvContract;
pub use csv_contracts::find_latest_contract_csv;
pub use csv_contracts::parse_contract_csv;
pub use efficiency::ContractTerms;
pub use efficiency::EfficiencyReport;
pub use efficiency::PlayerStats;
pub use efficiency::PositionCategory;
pub use efficiency::compute_contract_efficiency;
pub use tables::CapSummary;
pub use tables::ContractRow;
pub use tables::MarketError;
pub use tables::MarketStore;
pub use tables::RosterRow;
pub use tables::TradeRow;
