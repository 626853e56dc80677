//! Lookalike detection by edit distance.

/// Levenshtein distance over chars, two rolling rows
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1)
                .min(curr[j] + 1)
                .min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Closest candidate within `max_distance` (exclusive of exact matches).
/// Candidates whose length differs by more than `max_distance` are skipped
/// before any distance is computed. Ties go to the earliest candidate.
pub fn closest_lookalike<'a, I>(host: &str, candidates: I, max_distance: usize) -> Option<(&'a str, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let host_len = host.chars().count();
    let mut best: Option<(&'a str, usize)> = None;

    for candidate in candidates {
        if host_len.abs_diff(candidate.chars().count()) > max_distance {
            continue;
        }
        let distance = levenshtein(host, candidate);
        if distance == 0 || distance > max_distance {
            continue;
        }
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((candidate, distance));
            if distance == 1 {
                break;
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("google.com", "google.com"), 0);
        assert_eq!(levenshtein("gogle.com", "google.com"), 1);
        assert_eq!(levenshtein("paypa1.com", "paypal.com"), 1);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_closest_lookalike_prefers_smallest_distance() {
        let candidates = ["amazon.com", "google.com", "gogle.co"];
        let hit = closest_lookalike("gogle.com", candidates.iter().copied(), 2);
        assert_eq!(hit, Some(("google.com", 1)));
    }

    #[test]
    fn test_exact_match_is_not_a_lookalike() {
        assert_eq!(closest_lookalike("google.com", ["google.com"].iter().copied(), 2), None);
    }

    #[test]
    fn test_length_filter() {
        assert_eq!(closest_lookalike("g.com", ["google.com"].iter().copied(), 2), None);
    }
}
