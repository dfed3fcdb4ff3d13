//! String similarity on a 0-100 scale.
//!
//! `ratio` is the indel similarity 2*LCS / (len(a) + len(b)); `partial_ratio`
//! slides the shorter string over the longer one and keeps the best window.

/// Longest common subsequence length, two-row DP over chars.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                cur[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

fn ratio_chars(a: &[char], b: &[char]) -> u8 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100;
    }
    let lcs = lcs_len(a, b);
    ((200 * lcs + total / 2) / total) as u8
}

pub fn ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return if long.is_empty() { 100 } else { 0 };
    }

    let mut best = 0;
    for window in long.windows(short.len()) {
        best = best.max(ratio_chars(&short, window));
        if best == 100 {
            break;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio() {
        assert_eq!(ratio("netflix", "netflix"), 100);
        assert_eq!(ratio("abc", "xyz"), 0);
        assert_eq!(ratio("", ""), 100);
        // LCS "netflx" = 6 of 13 chars
        assert_eq!(ratio("netflix", "netflx"), 92);
    }

    #[test]
    fn test_partial_ratio_finds_embedded_name() {
        assert_eq!(partial_ratio("spotify", "spotify stockholm se"), 100);
        assert_eq!(partial_ratio("netflx subscription", "netflix"), 86);
        assert_eq!(partial_ratio("", "abc"), 0);
    }

    #[test]
    fn test_partial_ratio_is_symmetric() {
        assert_eq!(partial_ratio("adobe", "adobe systems"), partial_ratio("adobe systems", "adobe"));
    }

    #[test]
    fn test_hebrew_against_latin_scores_zero() {
        assert_eq!(partial_ratio("שופרסל דיל", "netflix"), 0);
    }
}
