//! Propriedades do motor verificadas com proptest.

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;

use fuzzy_evidence::core::linguistic::{HIGH, VERY_HIGH};
use fuzzy_evidence::core::{decay_weight, LinguisticRegistry};
use fuzzy_evidence::optimizer::{Candidate, ObjectiveVector};
use fuzzy_evidence::{
    Constraints, Deadline, EngineConfig, EvidenceEngine, EvidenceRelationship, IntegrationRequest,
    ObjectiveWeights, Optimizer, RawEvidence, RelationKind,
};

const TYPES: [&str; 5] = ["spectral_match", "genomics", "proteomics", "metabolomics", "literature"];

fn clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 8, 0, 0).unwrap()
}

fn raw_evidence() -> impl Strategy<Value = RawEvidence> {
    (0..TYPES.len(), 0.0..=1.0f64, 0.0..=1.0f64, 0.0..2000.0f64).prop_map(|(t, v, u, age)| {
        RawEvidence::new(TYPES[t], v, u).with_age_days(age)
    })
}

fn seeded_engine() -> EvidenceEngine {
    let engine = EvidenceEngine::new(EngineConfig::default()).unwrap();
    engine
        .seed_context(&[
            EvidenceRelationship::new("genomics", "proteomics", RelationKind::Supports, 0.8),
            EvidenceRelationship::new("proteomics", "metabolomics", RelationKind::Implies, 0.5),
            EvidenceRelationship::new("literature", "spectral_match", RelationKind::Contradicts, 0.4),
        ])
        .unwrap();
    engine
}

/// Grafo denso em contradições ao redor de `genomics`.
fn contradicting_engine() -> EvidenceEngine {
    let engine = EvidenceEngine::new(EngineConfig::default()).unwrap();
    engine
        .seed_context(&[
            EvidenceRelationship::new("genomics", "proteomics", RelationKind::Contradicts, 1.0),
            EvidenceRelationship::new("proteomics", "genomics", RelationKind::Contradicts, 1.0),
            EvidenceRelationship::new("genomics", "literature", RelationKind::Contradicts, 0.7),
            EvidenceRelationship::new("genomics", "metabolomics", RelationKind::Supports, 0.6),
            EvidenceRelationship::new("metabolomics", "proteomics", RelationKind::Implies, 0.5),
            EvidenceRelationship::new("proteomics", "spectral_match", RelationKind::Corroborates, 0.9),
        ])
        .unwrap();
    engine
}

fn high_degree(x: f64) -> f64 {
    let m = LinguisticRegistry::standard().fuzzify(x);
    m.get(HIGH) + m.get(VERY_HIGH)
}

fn unit_vector() -> impl Strategy<Value = ObjectiveVector> {
    prop::array::uniform5(0.0..=1.0f64).prop_map(|xs| ObjectiveVector {
        confidence: xs[0],
        uncertainty: xs[1],
        consistency: xs[2],
        conflicts: xs[3],
        network_coherence: xs[4],
    })
}

proptest! {
    #[test]
    fn fuzzify_is_deterministic(x in 0.0..=1.0f64) {
        let r = LinguisticRegistry::standard();
        prop_assert_eq!(r.fuzzify(x), r.fuzzify(x));
    }

    #[test]
    fn integrate_is_deterministic(evidence in prop::collection::vec(raw_evidence(), 0..8)) {
        let engine = seeded_engine();
        let request = IntegrationRequest::new("MOL-P", evidence);
        let a = engine.integrate_at(&request, clock(), &Deadline::none()).unwrap();
        let b = engine.integrate_at(&request, clock(), &Deadline::none()).unwrap();
        prop_assert_eq!(a.assessment, b.assessment);
        prop_assert_eq!(a.objective_scores.total_score.to_bits(), b.objective_scores.total_score.to_bits());
    }

    #[test]
    fn score_stays_inside_its_bounds(evidence in prop::collection::vec(raw_evidence(), 1..10)) {
        let engine = seeded_engine();
        let r = engine
            .integrate_at(&IntegrationRequest::new("MOL-R", evidence), clock(), &Deadline::none())
            .unwrap();
        let a = &r.assessment;
        let (lo, hi) = a.uncertainty_bounds;
        prop_assert!((0.0..=1.0).contains(&a.overall_score));
        prop_assert!((0.0..=1.0).contains(&lo) && (0.0..=1.0).contains(&hi));
        prop_assert!(lo <= a.overall_score && a.overall_score <= hi);
        prop_assert!((0.0..=1.0).contains(&a.consistency_score));
        prop_assert!((0.0..=1.0).contains(&a.conflict_score));
        prop_assert!((0.0..=1.0).contains(&a.coherence_score));
    }

    #[test]
    fn decay_is_strictly_decreasing(
        age in 0.0..1000.0f64,
        step in 0.01..100.0f64,
        half_life in 10.0..365.0f64,
    ) {
        prop_assert_eq!(decay_weight(0.0, half_life), 1.0);
        prop_assert!(decay_weight(age + step, half_life) < decay_weight(age, half_life));
    }

    #[test]
    fn raising_a_value_never_lowers_the_score(
        others in prop::collection::vec(raw_evidence(), 0..5),
        low in 0.0..=1.0f64,
        high in 0.0..=1.0f64,
        uncertainty in 0.0..0.9f64,
    ) {
        let (v1, v2) = if low <= high { (low, high) } else { (high, low) };
        prop_assume!(high_degree(v2) > high_degree(v1));

        // grafo vazio: o prior é neutro e só o item alterado muda
        let engine = EvidenceEngine::new(EngineConfig::default()).unwrap();
        let score = |v: f64| {
            let mut evidence = others.clone();
            evidence.push(RawEvidence::new("genomics", v, uncertainty).with_id("raised"));
            engine
                .integrate_at(&IntegrationRequest::new("MOL-M", evidence), clock(), &Deadline::none())
                .unwrap()
                .assessment
                .overall_score
        };
        prop_assert!(score(v2) >= score(v1) - 1e-12);
    }

    #[test]
    fn raising_a_value_never_lowers_the_score_on_a_seeded_graph(
        others in prop::collection::vec(raw_evidence(), 1..6),
        raised_type in 0..TYPES.len(),
        low in 0.0..=1.0f64,
        high in 0.0..=1.0f64,
        uncertainty in 0.0..0.9f64,
    ) {
        let (v1, v2) = if low <= high { (low, high) } else { (high, low) };
        prop_assume!(high_degree(v2) > high_degree(v1));

        for engine in [seeded_engine(), contradicting_engine()] {
            let score = |v: f64| {
                let mut evidence = others.clone();
                evidence.push(RawEvidence::new(TYPES[raised_type], v, uncertainty).with_id("raised"));
                engine
                    .integrate_at(&IntegrationRequest::new("MOL-S", evidence), clock(), &Deadline::none())
                    .unwrap()
                    .assessment
                    .overall_score
            };
            prop_assert!(score(v2) >= score(v1) - 1e-12);
        }
    }

    #[test]
    fn pareto_front_has_no_dominated_member(
        vectors in prop::collection::vec(unit_vector(), 1..12),
    ) {
        let optimizer = Optimizer::new(ObjectiveWeights::default(), Constraints::default(), 0.1).unwrap();
        let candidates: Vec<Candidate> = vectors
            .iter()
            .enumerate()
            .map(|(i, v)| Candidate::new(format!("c{i}"), *v))
            .collect();
        let report = optimizer.optimize(&candidates[0], &candidates[1..]);
        let front = &report.pareto_front;
        prop_assert!(!front.is_empty());
        for a in front {
            for b in front {
                prop_assert!(!a.objectives.dominates(&b.objectives));
            }
        }
        // todo candidato fora da fronteira é dominado por alguém dela
        for c in &candidates {
            if !front.iter().any(|f| f.label == c.label) {
                prop_assert!(front.iter().any(|f| f.objectives.dominates(&c.objectives)));
            }
        }
    }
}
