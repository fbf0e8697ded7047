//! Merging of near-duplicate OCR outputs.
//!
//! Different candidates of the same chart usually OCR to heavily overlapping
//! text. Blocks are accepted greedily in candidate order; a block is dropped
//! when it is more similar than the threshold to any block already accepted.

use serde::Serialize;

/// Raw OCR output for one candidate image.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RawText {
    /// Index of the candidate this text came from
    pub candidate: usize,
    pub text: String,
}

/// Similarity ratio in [0, 1]: `2 * M / T`, where M is the number of
/// characters in the longest-matching-blocks alignment of the two strings and
/// T their combined length.
///
/// Two empty strings are identical (1.0). The pair is put in a fixed order
/// first, so the result does not depend on argument order.
pub fn similarity(a: &str, b: &str) -> f64 {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    let first: Vec<char> = first.chars().collect();
    let second: Vec<char> = second.chars().collect();

    let total = first.len() + second.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_characters(&first, &second) as f64 / total as f64
}

/// Total size of the matching blocks: take the longest common run, then
/// recurse on the pieces to its left and to its right.
fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_match(a, b, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }
        matched += size;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }

    matched
}

/// Longest common run of `a[alo..ahi]` and `b[blo..bhi]` as (start in a,
/// start in b, length). Ties go to the earliest start in `a`, then in `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let mut best = (alo, blo, 0);
    // run[k + 1]: length of the common run ending at a[i - 1], b[blo + k]
    let mut prev = vec![0usize; bhi - blo + 1];
    let mut curr = vec![0usize; bhi - blo + 1];

    for i in alo..ahi {
        for j in blo..bhi {
            let k = j - blo;
            curr[k + 1] = if a[i] == b[j] { prev[k] + 1 } else { 0 };
            let size = curr[k + 1];
            if size > best.2 {
                best = (i + 1 - size, j + 1 - size, size);
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    best
}

/// Keeps the first occurrence of each distinct text, in input order.
///
/// A block is a duplicate when its similarity to some accepted block is
/// strictly greater than `threshold`.
pub fn remove_duplicates(texts: &[RawText], threshold: f64) -> Vec<RawText> {
    let mut unique: Vec<RawText> = Vec::new();

    for raw in texts {
        let duplicate_of = unique
            .iter()
            .find(|existing| similarity(&raw.text, &existing.text) > threshold);

        match duplicate_of {
            Some(existing) => crate::log(&format!(
                "OCR text of candidate {} duplicates candidate {}, dropped",
                raw.candidate + 1,
                existing.candidate + 1
            )),
            None => unique.push(raw.clone()),
        }
    }

    crate::log(&format!(
        "{} of {} OCR text(s) are distinct",
        unique.len(),
        texts.len()
    ));
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(candidate: usize, text: &str) -> RawText {
        RawText {
            candidate,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_similarity_basics() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("abc", ""), 0.0);
        assert_eq!(similarity("abc", "abc"), 1.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);
        // "abcd" / "bcde": common run "bcd" -> 2 * 3 / 8
        assert_eq!(similarity("abcd", "bcde"), 0.75);
    }

    #[test]
    fn test_similarity_recurses_around_longest_block() {
        // Longest block "cd", then "a" on the left and "f" on the right
        assert_eq!(similarity("abcdef", "axcdyf"), 2.0 * 4.0 / 12.0);
    }

    #[test]
    fn test_similarity_is_symmetric() {
        let pairs = [
            ("abab", "baba"),
            ("Sales 2021\n12 14", "Sa1es 2O21\n12 14 16"),
            ("tie break aa", "aa tie break"),
            ("", "x"),
            ("qwerty", "ytrewq"),
        ];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), similarity(b, a), "{:?} vs {:?}", a, b);
        }
    }

    #[test]
    fn test_similarity_counts_characters_not_bytes() {
        assert_eq!(similarity("ステージ1", "ステージ1"), 1.0);
        assert_eq!(similarity("\u{e9}", "e"), 0.0);
    }

    #[test]
    fn test_remove_duplicates_keeps_first_seen() {
        let texts = vec![
            raw(0, "Revenue\n10 20 30\n40 50 60\n"),
            raw(1, "Revenue\n10 20 30\n40 50 6O\n"),
            raw(2, "completely different"),
        ];
        let unique = remove_duplicates(&texts, 0.85);

        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].candidate, 0);
        assert_eq!(unique[1].candidate, 2);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        // similarity is exactly 0.75
        let texts = vec![raw(0, "abcd"), raw(1, "bcde")];

        let at_threshold = remove_duplicates(&texts, 0.75);
        assert_eq!(at_threshold.len(), 2);

        let below_threshold = remove_duplicates(&texts, 0.74);
        assert_eq!(below_threshold.len(), 1);
    }

    #[test]
    fn test_empty_blocks() {
        let texts = vec![raw(0, ""), raw(1, "  \n"), raw(2, "")];
        let unique = remove_duplicates(&texts, 0.85);

        // Only the second empty block is a duplicate
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].candidate, 0);
        assert_eq!(unique[1].candidate, 1);
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let texts = vec![
            raw(0, "Sales Chart\n1 2 3"),
            raw(1, "Sales Chart\n1 2 3\n"),
            raw(2, "Month\n4 5 6"),
            raw(3, "abcd"),
            raw(4, "bcde"),
        ];
        let once = remove_duplicates(&texts, 0.7);
        let twice = remove_duplicates(&once, 0.7);
        assert_eq!(once, twice);
    }
}
