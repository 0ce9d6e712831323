// crates/puckboard-media/src/lib.rs
// ============================================================================
// Module: Puckboard Media
// Description: Clip metadata, access policy, signing, and byte serving.
// Purpose: Govern and deliver video clips from metadata to bytes.
// Dependencies: puckboard-core, rusqlite, aws-sdk-s3, tokio
// ============================================================================

//! ## Overview
//! The media crate owns the relational `media` schema (clips, clip_assets,
//! clip_tags) in SQLite, the single clip-access policy function shared by
//! both auth resolvers, presigned GET URLs for object-storage assets, and
//! HTTP range parsing plus chunked file streaming for the MP4 path.
//! Invariants:
//! - `duration_s = end_s − start_s` and 0 < duration ≤ 300.
//! - Processing status transitions are monotone; `failed` is terminal.
//! - `clip_id` is globally unique.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod policy;
pub mod range;
pub mod sign;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use policy::ClipAccess;
pub use policy::check_clip_access;
pub use range::ByteRange;
pub use range::content_type_for_path;
pub use range::parse_range_header;
pub use sign::S3UrlSigner;
pub use store::ClipAssetRecord;
pub use store::ClipRecord;
pub use store::ClipStore;
pub use store::ClipStoreError;
pub use store::ClipTagRecord;
pub use store::ListClipsFilter;
pub use store::ProcessingStatus;
