//! Range-parsing properties for puckboard-media.
// crates/puckboard-media/tests/proptest_range.rs
// =============================================================================
// Module: Range Property Tests
// Description: Randomized Range headers against the satisfiability contract.
// Purpose: Every parsed range satisfies 0 <= start <= end < file_size.
// =============================================================================

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    reason = "Test assertions use expect/unwrap for clarity."
)]

use proptest::prelude::*;
use puckboard_media::parse_range_header;

proptest! {
    #[test]
    fn parsed_ranges_are_always_satisfiable(
        start in 0_u64..2_000_000,
        end in 0_u64..2_000_000,
        file_size in 1_u64..2_000_000,
    ) {
        let header = format!("bytes={start}-{end}");
        if let Some(range) = parse_range_header(Some(&header), file_size) {
            prop_assert!(range.start <= range.end);
            prop_assert!(range.end < file_size);
            prop_assert_eq!(range.length(), range.end - range.start + 1);
            prop_assert_eq!(
                range.content_range(file_size),
                format!("bytes {}-{}/{file_size}", range.start, range.end)
            );
        }
    }

    #[test]
    fn open_ended_ranges_cover_the_tail(
        start in 0_u64..2_000_000,
        file_size in 1_u64..2_000_000,
    ) {
        let header = format!("bytes={start}-");
        let range = parse_range_header(Some(&header), file_size).expect("satisfiable");
        prop_assert_eq!(range.end, file_size - 1);
        prop_assert!(range.start <= range.end);
    }

    #[test]
    fn garbage_headers_never_panic(header in ".{0,40}", file_size in 0_u64..1_000_000) {
        let _ = parse_range_header(Some(&header), file_size);
    }
}
