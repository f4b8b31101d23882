use std::collections::BTreeSet;

/// Minimum overlap score, in percent, for a candidate to be suggested when no
/// candidate shares a prefix with the input.
const MIN_OVERLAP_PERCENT: usize = 50;

/// Ranks `candidates` by similarity to `input` and returns at most `limit`
/// of them, best first.
///
/// Comparison is case-insensitive. Candidates that share a prefix with the
/// input (either one starting with the other) always win; they are ordered by
/// how close their length is to the input. If none do, candidates are scored
/// by character overlap and kept when the score reaches a threshold.
///
/// ## Example
/// ```
/// use computed_props::util::similarity::suggest;
///
/// let names = ["SUM", "SQRT", "COUNT", "UPPER"];
/// assert_eq!(suggest("SUMM", names, 3), vec!["SUM".to_string()]);
/// assert_eq!(suggest("cuont", names, 3), vec!["COUNT".to_string()]);
/// assert!(suggest("xyz", names, 3).is_empty());
/// ```
#[must_use]
pub fn suggest<'a>(input: &str,
                   candidates: impl IntoIterator<Item = &'a str>,
                   limit: usize)
                   -> Vec<String> {
    let needle = input.to_uppercase();
    if needle.is_empty() || limit == 0 {
        return Vec::new();
    }
    let candidates: BTreeSet<&str> = candidates.into_iter().collect();

    let mut prefixed: Vec<(usize, &str)> =
        candidates.iter()
                  .filter(|name| {
                      let upper = name.to_uppercase();
                      upper != needle
                      && !upper.is_empty()
                      && (upper.starts_with(&needle) || needle.starts_with(&upper))
                  })
                  .map(|name| (name.len().abs_diff(input.len()), *name))
                  .collect();
    if !prefixed.is_empty() {
        prefixed.sort_unstable();
        return prefixed.into_iter()
                       .take(limit)
                       .map(|(_, name)| name.to_string())
                       .collect();
    }

    let mut scored: Vec<(usize, &str)> =
        candidates.iter()
                  .map(|name| (overlap_percent(&needle, &name.to_uppercase()), *name))
                  .filter(|(score, _)| *score >= MIN_OVERLAP_PERCENT)
                  .collect();
    scored.sort_unstable_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored.into_iter()
          .take(limit)
          .map(|(_, name)| name.to_string())
          .collect()
}

/// Share of characters the two strings have in common, counted as a
/// multiset, relative to the longer string. Always within `0..=100`.
///
/// ## Example
/// ```
/// use computed_props::util::similarity::overlap_percent;
///
/// assert_eq!(overlap_percent("ABC", "ABC"), 100);
/// assert_eq!(overlap_percent("ABCD", "AB"), 50);
/// assert_eq!(overlap_percent("", "AB"), 0);
/// ```
#[must_use]
pub fn overlap_percent(a: &str, b: &str) -> usize {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 0;
    }
    let mut remaining: Vec<char> = b.chars().collect();
    let mut shared = 0;
    for c in a.chars() {
        if let Some(i) = remaining.iter().position(|&r| r == c) {
            remaining.swap_remove(i);
            shared += 1;
        }
    }
    shared * 100 / longest
}
