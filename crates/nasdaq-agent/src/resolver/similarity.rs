//! String similarity for company-name matching

/// Optimal string alignment distance over chars.
///
/// Like Levenshtein, but an adjacent transposition ("appel" / "apple")
/// costs one edit instead of two.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let width = b.len() + 1;
    let mut d = vec![0usize; (a.len() + 1) * width];
    for i in 0..=a.len() {
        d[i * width] = i;
    }
    for j in 0..=b.len() {
        d[j] = j;
    }

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            let mut best = (d[(i - 1) * width + j] + 1)
                .min(d[i * width + j - 1] + 1)
                .min(d[(i - 1) * width + j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                best = best.min(d[(i - 2) * width + j - 2] + 1);
            }
            d[i * width + j] = best;
        }
    }

    d[a.len() * width + b.len()]
}

/// Normalised similarity in `0.0..=1.0`, where 1.0 means identical
pub fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - edit_distance(a, b) as f64 / longest as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("", ""), 0);
        assert_eq!(edit_distance("apple", ""), 5);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("appel", "apple"), 1);
        assert_eq!(edit_distance("nvidea", "nvidia"), 1);
    }

    #[test]
    fn test_similarity_bounds() {
        assert!((similarity("tesla", "tesla") - 1.0).abs() < f64::EPSILON);
        assert!(similarity("tesla", "zzzzz") < 0.01);
        assert!(similarity("microsft", "microsoft") > 0.8);
        assert!((similarity("", "") - 1.0).abs() < f64::EPSILON);
    }
}
