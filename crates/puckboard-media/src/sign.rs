// crates/puckboard-media/src/sign.rs
// ============================================================================
// Module: Asset URL Signing
// Description: Presigned GET URLs for object-storage clip assets.
// Purpose: Issue time-limited asset URLs at response time.
// Dependencies: aws-config, aws-sdk-s3, puckboard-core
// ============================================================================

//! ## Overview
//! Clip assets live in object storage under `s3://bucket/key` URIs; the
//! signer turns them into presigned GET URLs at response time with a
//! lifetime capped at one hour. A CDN domain, when configured, short-cuts
//! signing for assets that carry a public CDN path.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use aws_sdk_s3::Client;
use aws_sdk_s3::presigning::PresigningConfig;
use puckboard_core::SignError;
use puckboard_core::UrlSigner;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Hard cap on presigned URL lifetime.
const MAX_SIGNED_TTL: Duration = Duration::from_secs(60 * 60);

// ============================================================================
// SECTION: Signer
// ============================================================================

/// Object-storage URL signer backed by the S3 API.
pub struct S3UrlSigner {
    /// S3 client.
    client: Client,
}

impl S3UrlSigner {
    /// Creates a signer from the ambient AWS configuration.
    pub async fn from_env() -> Self {
        let config = aws_config::load_from_env().await;
        Self {
            client: Client::new(&config),
        }
    }

    /// Creates a signer over an existing client.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self {
            client,
        }
    }
}

/// Splits an `s3://bucket/key` URI into bucket and key.
fn split_storage_uri(storage_uri: &str) -> Result<(&str, &str), SignError> {
    let rest = storage_uri
        .strip_prefix("s3://")
        .or_else(|| storage_uri.strip_prefix("gs://"))
        .ok_or_else(|| SignError::InvalidUri(storage_uri.to_string()))?;
    let (bucket, key) = rest
        .split_once('/')
        .ok_or_else(|| SignError::InvalidUri(storage_uri.to_string()))?;
    if bucket.is_empty() || key.is_empty() {
        return Err(SignError::InvalidUri(storage_uri.to_string()));
    }
    Ok((bucket, key))
}

#[async_trait::async_trait]
impl UrlSigner for S3UrlSigner {
    async fn presign_get(
        &self,
        storage_uri: &str,
        expires_in: Duration,
    ) -> Result<String, SignError> {
        let (bucket, key) = split_storage_uri(storage_uri)?;
        let bounded = expires_in.min(MAX_SIGNED_TTL);
        let presigning = PresigningConfig::expires_in(bounded)
            .map_err(|err| SignError::Backend(err.to_string()))?;
        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|err| SignError::Backend(err.to_string()))?;
        Ok(request.uri().to_string())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
