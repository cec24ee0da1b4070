//! Quiz answer evaluation.
//!
//! Single- and multi-answer quizzes share one rule: the learner's selection,
//! taken as a set, must equal the answer key exactly.

use std::collections::BTreeSet;

/// Returns `true` when `submitted` and `correct` contain exactly the same
/// options.
///
/// Selection order and repeated clicks on the same option do not matter.
/// An empty submission is never correct.
pub fn evaluate<'a, 'b, S, C>(submitted: S, correct: C) -> bool
where
    S: IntoIterator<Item = &'a str>,
    C: IntoIterator<Item = &'b str>,
{
    let submitted: BTreeSet<&str> = submitted.into_iter().collect();
    if submitted.is_empty() {
        return false;
    }
    let correct: BTreeSet<&str> = correct.into_iter().collect();
    submitted == correct
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_answer_is_order_independent() {
        assert!(evaluate(
            ["scarcity", "efficiently"],
            ["efficiently", "scarcity"]
        ));
    }

    #[test]
    fn single_answer_is_the_one_element_case() {
        assert!(evaluate(["Paris"], ["Paris"]));
        assert!(!evaluate(["London"], ["Paris"]));
    }

    #[test]
    fn subset_and_superset_are_wrong() {
        let key = ["conservation", "treatment", "recycling"];
        assert!(!evaluate(["conservation", "treatment"], key));
        assert!(!evaluate(
            ["conservation", "treatment", "recycling", "scarcity"],
            key
        ));
    }

    #[test]
    fn empty_submission_is_always_wrong() {
        assert!(!evaluate([], ["Paris"]));
        assert!(!evaluate([], []));
    }

    #[test]
    fn duplicate_clicks_collapse() {
        assert!(evaluate(["Paris", "Paris"], ["Paris"]));
    }

    #[test]
    fn reflexive_for_every_non_empty_set() {
        let pool = ["a", "b", "c", "d"];
        for mask in 1u8..16 {
            let set: Vec<&str> = pool
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, o)| *o)
                .collect();
            assert!(evaluate(set.iter().copied(), set.iter().copied()));
            for other in 1u8..16 {
                if other == mask {
                    continue;
                }
                let other_set: Vec<&str> = pool
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| other & (1 << i) != 0)
                    .map(|(_, o)| *o)
                    .collect();
                assert!(!evaluate(set.iter().copied(), other_set.iter().copied()));
            }
        }
    }
}
