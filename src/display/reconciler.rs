use crate::display::ResolutionRecord;
use std::cmp::Ordering;

/// Representative modes offered when the host cannot enumerate its own.
const FALLBACK_MODES: [ResolutionRecord; 3] = [
    ResolutionRecord { width: 3440, height: 1440 },
    ResolutionRecord { width: 1920, height: 1080 },
    ResolutionRecord { width: 1280, height: 720 },
];

/// Larger modes first: width descending, then height descending.
pub fn compare_resolutions(a: &ResolutionRecord, b: &ResolutionRecord) -> Ordering {
    b.width.cmp(&a.width).then_with(|| b.height.cmp(&a.height))
}

/// The fixed selection used when enumeration is unavailable: the current mode,
/// one ultra-wide mode and two standard modes.
pub fn fallback_resolutions(current: ResolutionRecord) -> Vec<ResolutionRecord> {
    let mut modes = Vec::with_capacity(FALLBACK_MODES.len() + 1);
    modes.push(current);
    modes.extend_from_slice(&FALLBACK_MODES);
    modes
}

/// Builds the canonical mode list.
///
/// `enumerated` is `None` when the host cannot enumerate modes, in which case
/// [`fallback_resolutions`] stands in for the tool output. The result never
/// holds a pair twice, always holds `current` and `saved`, and is ordered by
/// [`compare_resolutions`].
pub fn reconcile_resolutions(
    enumerated: Option<Vec<ResolutionRecord>>,
    current: ResolutionRecord,
    saved: Option<ResolutionRecord>,
) -> Vec<ResolutionRecord> {
    let mut modes = enumerated.unwrap_or_else(|| fallback_resolutions(current));

    push_unique(&mut modes, current);
    if let Some(saved) = saved {
        push_unique(&mut modes, saved);
    }

    modes.sort_by(compare_resolutions);
    modes.dedup();
    modes
}

fn push_unique(modes: &mut Vec<ResolutionRecord>, mode: ResolutionRecord) {
    if !modes.contains(&mode) {
        modes.push(mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn res(width: u32, height: u32) -> ResolutionRecord {
        ResolutionRecord { width, height }
    }

    #[test]
    fn test_sorts_larger_first() {
        let modes = reconcile_resolutions(
            Some(vec![res(1280, 720), res(3440, 1440), res(1920, 1080)]),
            res(1920, 1080),
            None,
        );
        assert_eq!(modes, vec![res(3440, 1440), res(1920, 1080), res(1280, 720)]);
    }

    #[test]
    fn test_height_breaks_width_ties() {
        let modes = reconcile_resolutions(
            Some(vec![res(1920, 1080), res(1920, 1200)]),
            res(1920, 1080),
            None,
        );
        assert_eq!(modes, vec![res(1920, 1200), res(1920, 1080)]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let modes = reconcile_resolutions(
            Some(vec![res(1920, 1080), res(1280, 720), res(1920, 1080), res(1920, 1080)]),
            res(1280, 720),
            Some(res(1920, 1080)),
        );
        assert_eq!(modes.iter().filter(|m| **m == res(1920, 1080)).count(), 1);
        assert_eq!(modes.len(), 2);
    }

    #[test]
    fn test_current_and_saved_are_always_included() {
        let modes = reconcile_resolutions(
            Some(vec![res(1920, 1080)]),
            res(2560, 1080),
            Some(res(1600, 900)),
        );
        assert_eq!(modes, vec![res(2560, 1080), res(1920, 1080), res(1600, 900)]);
    }

    #[test]
    fn test_empty_enumeration_still_has_current() {
        let modes = reconcile_resolutions(Some(vec![]), res(1366, 768), None);
        assert_eq!(modes, vec![res(1366, 768)]);
    }

    #[test]
    fn test_unsupported_host_uses_fallback() {
        let current = res(2560, 1600);
        let modes = reconcile_resolutions(None, current, None);

        assert!(modes.contains(&current));
        assert!(modes.iter().any(|m| m.is_ultra_wide()));
        assert!(modes.iter().filter(|m| !m.is_ultra_wide()).count() >= 2);
    }

    #[test]
    fn test_fallback_with_matching_current_has_no_duplicates() {
        let modes = reconcile_resolutions(None, res(1920, 1080), Some(res(1920, 1080)));
        assert_eq!(modes, vec![res(3440, 1440), res(1920, 1080), res(1280, 720)]);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let input = vec![res(800, 600), res(1920, 1080), res(800, 600)];
        let once = reconcile_resolutions(Some(input.clone()), res(1024, 768), Some(res(640, 480)));
        let twice = reconcile_resolutions(Some(input), res(1024, 768), Some(res(640, 480)));
        assert_eq!(once, twice);
    }
}
