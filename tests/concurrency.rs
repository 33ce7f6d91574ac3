//! Leitores em paralelo com um aprendizado em curso nunca enxergam um
//! conjunto de arestas aplicado pela metade.

use std::sync::Arc;
use std::thread;

use chrono::{DateTime, TimeZone, Utc};

use fuzzy_evidence::graph::{GraphSnapshot, MoleculeEvidence, RelationKind};
use fuzzy_evidence::{EngineConfig, EvidenceEngine, EvidenceItem, InMemoryEvidenceStore};

const ROUNDS: usize = 40;
const READERS: usize = 4;

fn clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 2, 0, 0, 0).unwrap()
}

fn batch(round: usize) -> Vec<MoleculeEvidence> {
    let shift = (round % 7) as f64 * 0.05;
    (0..3)
        .map(|m| {
            MoleculeEvidence::new(
                format!("MOL-{m}"),
                vec![
                    EvidenceItem::new("genomics", 0.6 + shift, 0.1).with_source("lab"),
                    EvidenceItem::new("proteomics", 0.7 - shift, 0.1).with_source("lab"),
                    EvidenceItem::new("metabolomics", 0.2 + shift, 0.2).with_source("core"),
                    EvidenceItem::new("literature", 0.9 - shift, 0.3).with_source("pubmed"),
                ],
            )
        })
        .collect()
}

/// Toda aresta simétrica tem a reversa com a mesma força.
fn assert_symmetric(snapshot: &GraphSnapshot) {
    for rel in snapshot.relationships() {
        if !rel.relation_kind.is_symmetric() {
            continue;
        }
        let reverse = snapshot
            .edge(&rel.target_type, &rel.source_type, rel.relation_kind)
            .unwrap_or_else(|| panic!("sem reversa para {} (v{})", rel.describe(), snapshot.version()));
        assert_eq!(reverse.strength.to_bits(), rel.strength.to_bits());
    }
}

#[test]
fn readers_never_observe_partial_learning() {
    let store = Arc::new(InMemoryEvidenceStore::new());
    store.extend(
        "MOL-X",
        [
            EvidenceItem::new("genomics", 0.8, 0.1).with_timestamp(clock()),
            EvidenceItem::new("proteomics", 0.75, 0.1).with_timestamp(clock()),
            EvidenceItem::new("metabolomics", 0.3, 0.2).with_timestamp(clock()),
            EvidenceItem::new("literature", 0.6, 0.2).with_timestamp(clock()),
        ],
    );
    let engine = EvidenceEngine::new(EngineConfig::default())
        .unwrap()
        .with_provider(store);

    thread::scope(|s| {
        s.spawn(|| {
            for round in 0..ROUNDS {
                engine.learn(&batch(round));
            }
        });

        for _ in 0..READERS {
            s.spawn(|| {
                let mut last_version = 0;
                for _ in 0..ROUNDS * 2 {
                    let snapshot = engine.snapshot();
                    assert!(snapshot.version() >= last_version, "versão regrediu");
                    last_version = snapshot.version();
                    assert_symmetric(&snapshot);

                    let stats = engine.network_stats_at("MOL-X", true, None, clock()).unwrap();
                    for kind in [RelationKind::Supports, RelationKind::Corroborates, RelationKind::Contradicts] {
                        let count = stats.relationship_counts.get(&kind).copied().unwrap_or(0);
                        assert_eq!(count % 2, 0, "{kind} com contagem ímpar na v{}", stats.graph_version);
                    }
                    assert!(stats.graph_version >= last_version);
                }
            });
        }
    });

    assert_eq!(engine.store().version(), ROUNDS as u64);
    assert_symmetric(&engine.snapshot());
}

#[test]
fn integrations_run_in_parallel_against_one_snapshot() {
    let engine = EvidenceEngine::new(EngineConfig::default()).unwrap();
    engine.learn(&batch(0));
    let request = fuzzy_evidence::IntegrationRequest::new(
        "MOL-Y",
        vec![
            fuzzy_evidence::RawEvidence::new("genomics", 0.8, 0.1),
            fuzzy_evidence::RawEvidence::new("proteomics", 0.7, 0.1),
        ],
    );
    let expected = engine
        .integrate_at(&request, clock(), &fuzzy_evidence::Deadline::none())
        .unwrap()
        .assessment;

    thread::scope(|s| {
        let handles: Vec<_> = (0..READERS)
            .map(|_| {
                s.spawn(|| {
                    engine
                        .integrate_at(&request, clock(), &fuzzy_evidence::Deadline::none())
                        .unwrap()
                        .assessment
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), expected);
        }
    });
}
