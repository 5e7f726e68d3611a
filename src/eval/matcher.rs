//! Pairwise record matching
//!
//! Compares two collections of records with a full cross product: every
//! generated record against every expected record, no early termination and
//! no deduplication. One generated record may therefore produce several
//! match pairs (and vice versa); all equivalent pairs are retained.

use super::normalize::{FieldError, NormalizedRecord};
use crate::records::Record;

/// An (expected, generated) pair satisfying the equivalence predicate
#[derive(Debug, Clone)]
pub struct MatchPair {
    pub expected: Record,
    pub generated: Record,
}

/// Find all equivalent (expected, generated) pairs.
///
/// Returns the pair list and the total count of **generated** records; the
/// caller divides matches by that count, so accuracy is not capped at 100%
/// when duplicate expected records each match the same generated record.
/// A failure normalizing one pair is logged and that pair skipped; the rest
/// of the cross product still runs.
pub fn find_matches(expected: &[Record], generated: &[Record]) -> (Vec<MatchPair>, usize) {
    let mut matches = Vec::new();

    for generated_record in generated {
        for expected_record in expected {
            match pair_matches(expected_record, generated_record) {
                Ok(true) => matches.push(MatchPair {
                    expected: expected_record.clone(),
                    generated: generated_record.clone(),
                }),
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!("skipping record pair: {}", e);
                }
            }
        }
    }

    (matches, generated.len())
}

fn pair_matches(expected: &Record, generated: &Record) -> Result<bool, FieldError> {
    let expected = NormalizedRecord::from_record(expected)?;
    let generated = NormalizedRecord::from_record(generated)?;
    Ok(expected.matches(&generated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn records(value: Value) -> Vec<Record> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    #[test]
    fn test_string_number_equivalence() {
        // Scenario A: "10" (string) matches 10 (number).
        let expected = records(json!([{"code": "E1", "value": "10"}]));
        let generated = records(json!([{"code": "E1", "value": 10}]));

        let (matches, total) = find_matches(&expected, &generated);
        assert_eq!(matches.len(), 1);
        assert_eq!(total, 1);
    }

    #[test]
    fn test_sentinel_matches_unparsable() {
        // Scenario B: -1 and "abc" both normalize to undefined, which the
        // predicate counts as equal.
        let expected = records(json!([{"code": "E1", "value": -1}]));
        let generated = records(json!([{"code": "E1", "value": "abc"}]));

        let (matches, total) = find_matches(&expected, &generated);
        assert_eq!(matches.len(), 1);
        assert_eq!(total, 1);
    }

    #[test]
    fn test_duplicate_expected_records_multiply_matches() {
        // Scenario D: one generated record, two equivalent expected records,
        // two pairs. The denominator stays at 1.
        let expected = records(json!([
            {"code": "E1", "value": 5},
            {"code": "E1", "value": 5}
        ]));
        let generated = records(json!([{"code": "E1", "value": 5}]));

        let (matches, total) = find_matches(&expected, &generated);
        assert_eq!(matches.len(), 2);
        assert_eq!(total, 1);
    }

    #[test]
    fn test_total_counts_generated_not_expected() {
        let expected = records(json!([{"code": "E1", "value": 1}]));
        let generated = records(json!([
            {"code": "E1", "value": 1},
            {"code": "E2", "value": 2},
            {"code": "E3", "value": 3}
        ]));

        let (forward, forward_total) = find_matches(&expected, &generated);
        let (swapped, swapped_total) = find_matches(&generated, &expected);

        // Pair membership is the same unordered equivalence either way...
        assert_eq!(forward.len(), 1);
        assert_eq!(swapped.len(), 1);
        // ...but the denominator follows the second argument.
        assert_eq!(forward_total, 3);
        assert_eq!(swapped_total, 1);
    }

    #[test]
    fn test_differing_codes_do_not_match() {
        let expected = records(json!([{"code": "E1", "value": 5}]));
        let generated = records(json!([{"code": "E2", "value": 5}]));

        let (matches, _) = find_matches(&expected, &generated);
        assert!(matches.is_empty());
    }

    #[test]
    fn test_unit_and_year_excluded_from_predicate() {
        let expected = records(json!([
            {"code": "E1", "value": 5, "unit": "GJ", "year": 2021}
        ]));
        let generated = records(json!([
            {"code": "E1", "value": 5, "unit": "kWh", "year": 2003}
        ]));

        let (matches, _) = find_matches(&expected, &generated);
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn test_bad_pair_is_skipped_not_fatal() {
        // The first generated record has a non-string unit; that pair fails
        // normalization and is skipped while the second still matches.
        let expected = records(json!([{"code": "E1", "value": 5}]));
        let generated = records(json!([
            {"code": "E1", "value": 5, "unit": 7},
            {"code": "E1", "value": 5}
        ]));

        let (matches, total) = find_matches(&expected, &generated);
        assert_eq!(matches.len(), 1);
        assert_eq!(total, 2);
    }

    #[test]
    fn test_empty_generated_collection() {
        let expected = records(json!([{"code": "E1", "value": 5}]));
        let (matches, total) = find_matches(&expected, &[]);
        assert!(matches.is_empty());
        assert_eq!(total, 0);
    }

    #[test]
    fn test_match_pair_carries_full_records() {
        let expected = records(json!([
            {"code": "E1", "value": 5, "page": 12, "snippet": "total energy"}
        ]));
        let generated = records(json!([{"code": "E1", "value": "5"}]));

        let (matches, _) = find_matches(&expected, &generated);
        assert_eq!(matches[0].expected["page"], json!(12));
        assert_eq!(matches[0].generated["value"], json!("5"));
    }
}
