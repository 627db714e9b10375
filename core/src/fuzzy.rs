//! Edit-distance helpers for fuzzy term expansion.

/// Maximum edits allowed for a query token of `len` characters
/// (0 up to 2 chars, 1 for 3..=5, 2 beyond).
pub fn auto_threshold(len: usize) -> usize {
    match len {
        0..=2 => 0,
        3..=5 => 1,
        _ => 2,
    }
}

/// Score multiplier for a match `distance` edits away: exact is 1.0, each edit halves it.
pub fn match_strength(distance: usize) -> f32 {
    0.5f32.powi(distance as i32)
}

/// Levenshtein distance over chars, using two rolling rows.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            cur[j + 1] = (prev[j + 1] + 1).min(cur[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

/// Distance between `a` and `b` if it is at most `max`.
pub fn bounded_distance(a: &str, b: &str, max: usize) -> Option<usize> {
    if a == b {
        return Some(0);
    }
    if max == 0 || a.chars().count().abs_diff(b.chars().count()) > max {
        return None;
    }
    let d = edit_distance(a, b);
    (d <= max).then_some(d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("abc", ""), 3);
        assert_eq!(edit_distance("jon", "jhn"), 1);
        assert_eq!(edit_distance("ali", "al"), 1);
        assert_eq!(edit_distance("café", "cafe"), 1);
    }

    #[test]
    fn thresholds_follow_length_bands() {
        assert_eq!(auto_threshold(1), 0);
        assert_eq!(auto_threshold(2), 0);
        assert_eq!(auto_threshold(3), 1);
        assert_eq!(auto_threshold(5), 1);
        assert_eq!(auto_threshold(6), 2);
        assert_eq!(auto_threshold(12), 2);
    }

    #[test]
    fn bounded_distance_respects_max() {
        assert_eq!(bounded_distance("ab", "ab", 0), Some(0));
        assert_eq!(bounded_distance("ab", "ac", 0), None);
        assert_eq!(bounded_distance("jon", "jhn", 1), Some(1));
        assert_eq!(bounded_distance("abc", "xyz", 1), None);
        assert_eq!(bounded_distance("abc", "a", 1), None);
    }

    #[test]
    fn strength_halves_per_edit() {
        assert_eq!(match_strength(0), 1.0);
        assert_eq!(match_strength(1), 0.5);
        assert_eq!(match_strength(2), 0.25);
    }
}
