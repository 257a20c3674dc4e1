use std::cmp::Ordering;

use predbridge_protocol::Candidate;

/// Top `limit` candidates by descending score.
///
/// The sort is stable, so equal scores keep their input order. Candidates
/// with a NaN or infinite score are dropped: JSON has no encoding for them.
/// A `limit` of zero or less yields nothing.
pub fn rank(candidates: &[Candidate], limit: i64) -> Vec<Candidate> {
    let Ok(limit) = usize::try_from(limit) else {
        return Vec::new();
    };
    let mut ranked: Vec<Candidate> = candidates
        .iter()
        .filter(|candidate| candidate.score.is_finite())
        .cloned()
        .collect();
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(pairs: &[(&str, f64)]) -> Vec<Candidate> {
        pairs
            .iter()
            .map(|(text, score)| Candidate::new(*text, *score))
            .collect()
    }

    fn texts(ranked: &[Candidate]) -> Vec<&str> {
        ranked.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn orders_all_when_limit_covers_input() {
        let input = candidates(&[("a", 0.3), ("b", 0.1), ("c", 0.2)]);
        assert_eq!(
            rank(&input, 3),
            candidates(&[("a", 0.3), ("c", 0.2), ("b", 0.1)])
        );
    }

    #[test]
    fn truncates_to_highest_scores() {
        assert!(rank(&[], 5).is_empty());
        let input = candidates(&[("a", 0.1), ("b", 0.2), ("c", 0.3), ("d", 0.4), ("e", 0.5)]);
        assert_eq!(
            rank(&input, 3),
            candidates(&[("e", 0.5), ("d", 0.4), ("c", 0.3)])
        );
    }

    #[test]
    fn keeps_top_n_by_score() {
        let input = candidates(&[("a", 0.2), ("b", 0.9), ("c", 0.5)]);
        let ranked = rank(&input, 2);
        assert_eq!(texts(&ranked), ["b", "c"]);
    }

    #[test]
    fn ties_keep_input_order() {
        let input = candidates(&[("x", 1.0), ("y", 1.0), ("z", 0.0)]);
        assert_eq!(texts(&rank(&input, 5)), ["x", "y", "z"]);
    }

    #[test]
    fn empty_input_or_non_positive_limit_is_empty() {
        assert!(rank(&[], 3).is_empty());
        let input = candidates(&[("a", 0.1)]);
        assert!(rank(&input, 0).is_empty());
        assert!(rank(&input, -4).is_empty());
    }

    #[test]
    fn non_finite_scores_are_dropped() {
        let input = candidates(&[
            ("nan", f64::NAN),
            ("low", -1.0),
            ("inf", f64::INFINITY),
            ("high", 3.0),
        ]);
        assert_eq!(texts(&rank(&input, 5)), ["high", "low"]);
    }

    #[test]
    fn ranked_reply_decodes_on_the_host_side() {
        use predbridge_protocol::{
            decode_response, encode_response, CommandKind, PredictionContextKind, Response,
        };

        let input = candidates(&[("ok", 0.5), ("bad", f64::NAN)]);
        let response = Response::with_candidates(
            CommandKind::NextWordPrediction,
            PredictionContextKind::Normal,
            &rank(&input, 5),
        )
        .unwrap();
        let wire = encode_response(&response).unwrap();
        let decoded = decode_response(&wire).unwrap();
        assert_eq!(decoded.candidates().unwrap(), candidates(&[("ok", 0.5)]));
    }

    #[test]
    fn output_is_sorted_and_bounded() {
        let input: Vec<Candidate> = (0..20)
            .map(|i| Candidate::new(format!("w{i}"), f64::from((i * 7) % 11)))
            .collect();
        for limit in [1, 5, 20, 50] {
            let ranked = rank(&input, limit);
            assert_eq!(ranked.len(), input.len().min(limit as usize));
            assert!(ranked.windows(2).all(|pair| pair[0].score >= pair[1].score));
        }
    }
}
