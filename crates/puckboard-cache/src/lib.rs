// crates/puckboard-cache/src/lib.rs
// ============================================================================
// Module: Puckboard Cache
// Description: Keyed TTL caches and ETag conditional-GET helpers.
// Purpose: Front upstream APIs and expensive computations with bounded reuse.
// Dependencies: puckboard-core, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This crate ships the in-process TTL cache that fronts both upstream NHL
//! calls and expensive tabular computations, the per-surface TTL policy
//! table, and the conditional-GET helper that turns a payload plus an
//! `If-None-Match` header into a `200`-with-ETag or `304` decision.
//! Invariants:
//! - Entries are immutable until expiry or explicit invalidation.
//! - A validation predicate runs before every cached return; failures evict.
//! - Last-writer-wins on concurrent recompute (entries are idempotent).

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod conditional;
pub mod ttl;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use conditional::CacheHeaders;
pub use conditional::ConditionalOutcome;
pub use conditional::evaluate_conditional;
pub use ttl::CacheSurface;
pub use ttl::TtlCache;
