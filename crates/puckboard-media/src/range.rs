// crates/puckboard-media/src/range.rs
// ============================================================================
// Module: Byte Range Serving
// Description: Range header parsing and chunked file streaming.
// Purpose: Serve MP4 bytes with 206 partial responses and a bounded buffer.
// Dependencies: bytes, tokio
// ============================================================================

//! ## Overview
//! [`parse_range_header`] accepts `bytes=start-end` specs, clipping to
//! `[0, file_size − 1]`. Malformed specs return `None` so the caller falls
//! back to a full-file 200 response (some clients emit odd Range values on
//! seek). Streaming reads the file in 1 MiB chunks bounded by the client's
//! consumption rate, reusing one file handle per response. Content types
//! resolve from an extension whitelist, defaulting to octet-stream.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use bytes::Bytes;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncSeekExt;
use tokio::sync::mpsc;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Streaming buffer size.
pub const STREAM_BUFFER_BYTES: usize = 1024 * 1024;
/// Channel depth between the reader task and the response body.
const STREAM_CHANNEL_DEPTH: usize = 4;

// ============================================================================
// SECTION: Range Parsing
// ============================================================================

/// One satisfiable byte range.
///
/// # Invariants
/// - `0 <= start <= end < file_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte offset, inclusive.
    pub start: u64,
    /// Last byte offset, inclusive.
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes in the range.
    #[must_use]
    pub const fn length(self) -> u64 {
        self.end - self.start + 1
    }

    /// Formats the `Content-Range` header value.
    #[must_use]
    pub fn content_range(self, file_size: u64) -> String {
        format!("bytes {}-{}/{file_size}", self.start, self.end)
    }
}

/// Parses a `Range` header against a file size.
///
/// Returns `None` for absent, malformed, or unsatisfiable specs; the caller
/// serves the full file with a 200 in that case. Open-ended specs
/// (`bytes=0-`) run to the final byte; offsets are clipped into the file.
#[must_use]
pub fn parse_range_header(header: Option<&str>, file_size: u64) -> Option<ByteRange> {
    if file_size == 0 {
        return None;
    }
    let spec = header?.trim().strip_prefix("bytes=")?;
    let (start_raw, end_raw) = spec.split_once('-')?;
    let start_raw = start_raw.trim();
    let end_raw = end_raw.trim();
    if start_raw.is_empty() {
        // Suffix form `bytes=-N`: final N bytes.
        let suffix: u64 = end_raw.parse().ok()?;
        if suffix == 0 {
            return None;
        }
        let start = file_size.saturating_sub(suffix);
        return Some(ByteRange {
            start,
            end: file_size - 1,
        });
    }
    let start: u64 = start_raw.parse().ok()?;
    let end: u64 = if end_raw.is_empty() {
        file_size - 1
    } else {
        end_raw.parse().ok()?
    };
    let start = start.min(file_size - 1);
    let end = end.min(file_size - 1);
    if start > end {
        return None;
    }
    Some(ByteRange {
        start,
        end,
    })
}

// ============================================================================
// SECTION: Content Types
// ============================================================================

/// Resolves a content type from the file extension whitelist.
#[must_use]
pub fn content_type_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "mp4" => "video/mp4",
        "m4v" => "video/x-m4v",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "m3u8" => "application/vnd.apple.mpegurl",
        "ts" => "video/mp2t",
        "mpd" => "application/dash+xml",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

// ============================================================================
// SECTION: Streaming
// ============================================================================

/// Opens `path` and streams `range.length()` bytes from `range.start` in
/// bounded chunks over the returned channel.
///
/// The reader task holds one file handle for the duration of the response
/// and stops early when the receiver is dropped (client disconnect).
///
/// # Errors
///
/// Returns an [`std::io::Error`] when the file cannot be opened or the seek
/// fails; read failures after that terminate the stream.
pub async fn stream_file_range(
    path: &Path,
    range: ByteRange,
) -> std::io::Result<mpsc::Receiver<std::io::Result<Bytes>>> {
    let mut file = tokio::fs::File::open(path).await?;
    file.seek(std::io::SeekFrom::Start(range.start)).await?;
    let (sender, receiver) = mpsc::channel(STREAM_CHANNEL_DEPTH);
    tokio::spawn(async move {
        let mut remaining = range.length();
        let mut buffer = vec![0_u8; STREAM_BUFFER_BYTES];
        while remaining > 0 {
            let want = usize::try_from(remaining.min(STREAM_BUFFER_BYTES as u64))
                .unwrap_or(STREAM_BUFFER_BYTES);
            match file.read(&mut buffer[..want]).await {
                Ok(0) => break,
                Ok(read) => {
                    remaining -= read as u64;
                    if sender.send(Ok(Bytes::copy_from_slice(&buffer[..read]))).await.is_err() {
                        break;
                    }
                }
                Err(error) => {
                    let _ = sender.send(Err(error)).await;
                    break;
                }
            }
        }
    });
    Ok(receiver)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
