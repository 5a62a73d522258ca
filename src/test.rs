use std::ops::Range;

use proptest::{prelude::prop, prop_assert, prop_assert_eq, prop_compose, proptest};
use rand::{rngs::SmallRng, seq::SliceRandom as _, SeedableRng as _};

use crate::{
    criteria::{
        topsis, CLIMATE_ADAPTATION, DISEASE_RESISTANCE, MANAGEMENT_EASE, MARKET_DESIRABILITY,
        QUALITY_ATTRIBUTES, RISK_TOLERANCE, YIELD_POTENTIAL,
    },
    CandidateInput, Engine, FarmerPreferences, Normalized, PrimaryFocus, RankRequest,
    RegionalContext, WeightMap,
};

#[track_caller]
pub fn assert_within(value: f64, expected: f64, tolerance: f64) {
    let diff = (value - expected).abs();
    assert!(
        diff <= tolerance,
        "Expected value of {expected} +- {tolerance} but got {value} which is off by {diff}",
    );
}

pub fn crop_weights() -> WeightMap {
    [
        (YIELD_POTENTIAL, 0.25),
        (DISEASE_RESISTANCE, 0.20),
        (CLIMATE_ADAPTATION, 0.15),
        (QUALITY_ATTRIBUTES, 0.12),
        (MARKET_DESIRABILITY, 0.10),
        (RISK_TOLERANCE, 0.10),
        (MANAGEMENT_EASE, 0.08),
    ]
    .into_iter()
    .collect()
}

fn candidate(id: &str, scores: &[(&str, f64)], baseline_score: Option<f64>) -> CandidateInput {
    CandidateInput {
        id: id.to_owned(),
        scores: scores.iter().map(|(c, v)| (*c, *v)).collect(),
        baseline_score,
    }
}

/// A candidate scoring `value` on every crop criterion.
fn uniform(id: &str, value: f64) -> CandidateInput {
    CandidateInput {
        id: id.to_owned(),
        scores: crop_weights().criteria().map(|c| (c, value)).collect(),
        baseline_score: None,
    }
}

prop_compose! {
    pub fn normalized()(value in 0.0_f64..=1.0_f64) -> Normalized {
        Normalized::new(value).unwrap()
    }
}
prop_compose! {
    pub fn weight_map(len: Range<usize>)(values in prop::collection::vec(-0.5_f64..2.0, len)) -> WeightMap {
        values.into_iter().enumerate().map(|(i, w)| (format!("criterion_{i}"), w)).collect()
    }
}
prop_compose! {
    pub fn score_matrix(row_range: Range<usize>, column_range: Range<usize>)(
        columns in column_range,
        rows in row_range,
    )(
        matrix in prop::collection::vec(prop::collection::vec(0.0_f64..=1.0, columns), rows),
        weights in prop::collection::vec(0.0_f64..=1.0, columns),
    ) -> (Vec<Vec<f64>>, Vec<f64>) {
        (matrix, weights)
    }
}
prop_compose! {
    fn candidates(len: Range<usize>)(
        scores in prop::collection::vec(prop::collection::vec(0.0_f64..=1.0, 7), len)
    ) -> Vec<CandidateInput> {
        let criteria: Vec<String> = crop_weights().criteria().map(str::to_owned).collect();
        scores
            .into_iter()
            .enumerate()
            .map(|(id, row)| CandidateInput {
                id: format!("variety-{id}"),
                scores: criteria.iter().map(String::as_str).zip(row).collect(),
                baseline_score: None,
            })
            .collect()
    }
}

#[test]
fn empty_candidates() {
    let engine = Engine::new(crop_weights());
    let result = engine.rank::<CandidateInput>(&[], None, None);
    assert!(result.results.is_empty());
    assert!(result.ideal_best.is_empty());
    assert!(result.ideal_worst.is_empty());
    assert_eq!(result.weights.len(), 7);
    assert_within(result.weights.values().sum::<f64>(), 1.0, 1e-12);
    assert_eq!(result.criteria, engine.criteria().to_vec());
}

#[test]
fn single_candidate_uses_baseline() {
    let engine = Engine::new(crop_weights());
    let only = candidate("a", &[(YIELD_POTENTIAL, 0.8)], Some(0.73));
    let result = engine.rank(&[only], None, None);
    let ranking = &result.results["a"];
    assert_eq!(ranking.closeness.as_f64(), 0.73);
    assert_eq!(ranking.rank, 1);
    assert!(result.ideal_best.is_empty());
    assert!(result.ideal_worst.is_empty());
    let yield_weight = result.weights.get(YIELD_POTENTIAL).unwrap();
    assert_eq!(ranking.weighted_scores.get(YIELD_POTENTIAL), Some(0.8 * yield_weight));
    assert_eq!(ranking.weighted_scores.get(RISK_TOLERANCE), Some(0.0));
}

#[test]
fn single_candidate_without_usable_baseline() {
    let engine = Engine::new(crop_weights());
    for baseline in [None, Some(1.5), Some(-0.2), Some(f64::NAN)] {
        let result = engine.rank(&[candidate("a", &[], baseline)], None, None);
        assert_eq!(result.results["a"].closeness, Normalized::ONE);
    }
}

#[test]
fn single_candidate_negative_zero_baseline() {
    let engine = Engine::new(crop_weights());
    let result = engine.rank(&[candidate("a", &[], Some(-0.0))], None, None);
    assert_eq!(result.results["a"].closeness, Normalized::ZERO);

    let request =
        RankRequest::from_json(r#"{"candidates": [{"id": "a", "baseline_score": -0.0}]}"#)
            .unwrap();
    let result = engine.rank(&request.candidates, None, None);
    assert_eq!(result.results["a"].closeness, Normalized::ZERO);
}

#[test]
fn dominant_candidate_ranks_first() {
    let engine = Engine::new(crop_weights());
    let candidates = [
        uniform("low", 0.2),
        uniform("high", 0.9),
        uniform("mid", 0.5),
    ];
    let result = engine.rank(&candidates, None, None);
    assert_eq!(result.results["high"].closeness, Normalized::ONE);
    assert_eq!(result.results["low"].closeness, Normalized::ZERO);
    assert_eq!(result.results["high"].rank, 1);
    assert_eq!(result.results["mid"].rank, 2);
    assert_eq!(result.results["low"].rank, 3);
    assert_eq!(result.best().map(|(id, _)| id.as_str()), Some("high"));
    assert_eq!(
        result.ranked().iter().map(|(id, _)| id.as_str()).collect::<Vec<_>>(),
        ["high", "mid", "low"]
    );
}

#[test]
fn identical_candidates_tie_at_zero() {
    let engine = Engine::new(crop_weights());
    let scores = [(YIELD_POTENTIAL, 0.6), (DISEASE_RESISTANCE, 0.4)];
    let candidates = [
        candidate("a", &scores, None),
        candidate("b", &scores, None),
        candidate("c", &scores, None),
    ];
    let result = engine.rank(&candidates, None, None);
    for ranking in result.results.values() {
        assert_eq!(ranking.closeness, Normalized::ZERO);
        assert_eq!(ranking.rank, 1);
    }
}

#[test]
fn duplicate_ids_collapse_to_last() {
    let engine = Engine::new(crop_weights());
    let candidates = [
        candidate("a", &[(YIELD_POTENTIAL, 0.1)], Some(0.2)),
        candidate("a", &[(YIELD_POTENTIAL, 0.9)], Some(0.4)),
    ];
    let result = engine.rank(&candidates, None, None);
    assert_eq!(result.results.len(), 1);
    assert_eq!(result.results["a"].closeness.as_f64(), 0.4);
}

#[test]
fn preferences_shift_the_winner() {
    let engine = Engine::new(crop_weights());
    let candidates = [
        candidate("high-yield", &[(YIELD_POTENTIAL, 0.9), (RISK_TOLERANCE, 0.2)], None),
        candidate("hardy", &[(YIELD_POTENTIAL, 0.5), (RISK_TOLERANCE, 0.9)], None),
    ];
    let result = engine.rank(&candidates, None, None);
    assert_eq!(result.best().map(|(id, _)| id.as_str()), Some("high-yield"));

    let cautious = FarmerPreferences {
        weight_overrides: [(YIELD_POTENTIAL, 0.05)].into_iter().collect(),
        primary_focus: Some(PrimaryFocus::Risk),
        ..Default::default()
    };
    let context = RegionalContext {
        climate_risks: [("drought".to_owned(), 0.9)].into_iter().collect(),
        ..Default::default()
    };
    let result = engine.rank(&candidates, Some(&context), Some(&cautious));
    assert_eq!(result.best().map(|(id, _)| id.as_str()), Some("hardy"));
    assert!(result.contextual_weights.get(RISK_TOLERANCE) > result.contextual_weights.get(YIELD_POTENTIAL));
}

#[test]
fn update_weights_replaces_snapshot() {
    let mut engine = Engine::new(crop_weights());
    let before = engine.clone();
    engine.update_weights([("b", 1.0), ("a", 1.0)].into_iter().collect());
    assert_eq!(engine.criteria().to_vec(), ["b", "a"]);
    assert_eq!(before.criteria().len(), 7);
    assert_eq!(before.base_weights(), &crop_weights());
}

#[test]
fn engine_from_json_and_entries() {
    let engine = Engine::from_json(r#"{"yield_potential": 0.7, "disease_resistance": 0.3}"#).unwrap();
    assert_eq!(engine.criteria().to_vec(), [YIELD_POTENTIAL, DISEASE_RESISTANCE]);
    assert!(Engine::from_entries([("a", 0.5), ("a", 0.5)]).is_err());
    assert!(Engine::from_json("[]").is_err());
}

#[test]
fn json_round_trip_of_request() {
    let engine = Engine::new(crop_weights());
    let request = RankRequest::from_json(
        r#"{"candidates": [
            {"id": "a", "scores": {"yield_potential": 0.9}},
            {"id": "b", "scores": {"yield_potential": 0.3}}
        ]}"#,
    )
    .unwrap();
    let result = engine.rank(
        &request.candidates,
        request.regional_context.as_ref(),
        request.farmer_preferences.as_ref(),
    );
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["results"]["a"]["rank"], 1);
    assert_eq!(json["results"]["b"]["closeness"], 0.0);
    assert_eq!(json["criteria"][0], YIELD_POTENTIAL);
}

proptest! {
    #[test]
    fn weighted_scores_match_topsis(candidates in candidates(2..24)) {
        let engine = Engine::new(crop_weights());
        let result = engine.rank(&candidates, None, None);
        let criteria = engine.criteria();
        let weights = criteria.align(&result.weights);
        let mut sorted: Vec<&CandidateInput> = candidates.iter().collect();
        sorted.sort_by(|a, b| a.id.cmp(&b.id));
        let matrix: Vec<Vec<f64>> = sorted.iter().map(|c| criteria.align(&c.scores)).collect();
        let scored = topsis::score(&matrix, &weights);
        for (candidate, row) in sorted.iter().zip(&scored.weighted) {
            let ranking = &result.results[&candidate.id];
            prop_assert_eq!(&criteria.align(&ranking.weighted_scores), row);
        }
        prop_assert!(result.results.values().any(|r| r.rank == 1));
    }

    #[test]
    fn ranking_is_deterministic_and_order_independent(seed: u64, candidates in candidates(0..24)) {
        let engine = Engine::new(crop_weights());
        let first = engine.rank(&candidates, None, None);
        let second = engine.rank(&candidates, None, None);
        prop_assert_eq!(&first, &second);

        let mut rng = SmallRng::seed_from_u64(seed);
        let mut shuffled = candidates.clone();
        shuffled.shuffle(&mut rng);
        let third = engine.rank(&shuffled, None, None);
        prop_assert_eq!(&first, &third);
    }
}
