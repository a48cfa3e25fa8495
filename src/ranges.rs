use crate::model::PageRange;

/// Turns matched start pages into ranges running to the next match.
///
/// The last range ends on `total_pages`. Closely spaced matches may give
/// single-page or inverted ranges; the segmenter rejects the latter.
#[must_use]
pub fn build_ranges(matched_pages: &[u32], total_pages: u32) -> Vec<PageRange> {
    let Some(&last) = matched_pages.last() else {
        return Vec::new();
    };

    let mut ranges = matched_pages
        .windows(2)
        .map(|pair| PageRange::new(pair[0], pair[1].saturating_sub(1)))
        .collect::<Vec<_>>();
    ranges.push(PageRange::new(last, total_pages));

    tracing::info!(?ranges, "built page ranges");
    ranges
}

#[cfg(test)]
mod tests {
    use super::build_ranges;
    use crate::model::PageRange;

    #[test]
    fn no_matches_no_ranges() {
        assert!(build_ranges(&[], 10).is_empty());
    }

    #[test]
    fn single_match_runs_to_the_end() {
        assert_eq!(build_ranges(&[3], 9), vec![PageRange::new(3, 9)]);
    }

    #[test]
    fn ranges_are_contiguous_and_cover_to_the_end() {
        let ranges = build_ranges(&[2, 4, 5, 9], 12);
        assert_eq!(
            ranges,
            vec![
                PageRange::new(2, 3),
                PageRange::new(4, 4),
                PageRange::new(5, 8),
                PageRange::new(9, 12),
            ]
        );
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end + 1, pair[1].start);
        }
    }

    #[test]
    fn repeated_page_gives_inverted_range() {
        assert_eq!(
            build_ranges(&[5, 5], 8),
            vec![PageRange::new(5, 4), PageRange::new(5, 8)]
        );
    }
}
