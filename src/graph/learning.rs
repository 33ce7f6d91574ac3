//! # Aprendizado Incremental de Relações
//!
//! Atualiza as forças do grafo a partir de evidências que co-ocorrem na
//! mesma molécula. É um passo **online**: cada lote ajusta as forças
//! existentes com taxa limitada, sem retreinar nada.
//!
//! ## Sinais por Par de Tipos
//!
//! Para cada molécula, cada tipo presente é resumido pelo valor médio
//! dos seus itens e fuzzificado. Para cada par `(A, B)`:
//!
//! ```text
//! concordância = max_c min(μA(c), μB(c))          → supports (mesma fonte)
//!                                                   corroborates (fontes diferentes)
//! discordância = max(min(altoA, baixoB),
//!                    min(baixoA, altoB))          → contradicts
//! ```
//!
//! onde `alto = max(high, very_high)` e `baixo = max(low, very_low)`.
//!
//! ## Regra de Atualização
//!
//! Com `n` observações do mesmo par/tipo no lote e sinal médio `s̄`:
//!
//! ```text
//! α = lr · n / (n + 1)         (lr ≤ 0.5 ⇒ α < 0.5)
//! s ← s + α · (s̄ − s)
//! ```
//!
//! Arestas ausentes só são criadas quando `s̄ ≥ min_edge_strength`,
//! e nascem com a força `s̄`. As relações aprendidas são simétricas:
//! `A → B` e `B → A` recebem sempre o mesmo sinal.

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::relationship::{RelationEdge, RelationKind};
use super::snapshot::GraphSnapshot;
use crate::config::GraphConfig;
use crate::core::{EvidenceItem, LinguisticRegistry, MembershipVector};

/// Evidências de uma molécula, usadas como uma observação de co-ocorrência.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoleculeEvidence {
    pub molecule_id: String,
    pub items: Vec<EvidenceItem>,
}

impl MoleculeEvidence {
    pub fn new(molecule_id: impl Into<String>, items: Vec<EvidenceItem>) -> Self {
        Self {
            molecule_id: molecule_id.into(),
            items,
        }
    }
}

/// Resumo de um passo de aprendizado.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningReport {
    pub molecules: usize,
    pub pairs_observed: usize,
    pub edges_created: usize,
    pub edges_updated: usize,
    /// Versão do snapshot publicado.
    pub version: u64,
}

type EdgeKey = (String, String, RelationKind);

/// Perfil de um tipo dentro de uma molécula.
struct TypeProfile {
    memberships: MembershipVector,
    sources: BTreeSet<String>,
}

/// Aplica um lote sobre `base` e devolve o novo snapshot (versão `base + 1`).
pub fn learn(
    base: &GraphSnapshot,
    batch: &[MoleculeEvidence],
    linguistic: &LinguisticRegistry,
    config: &GraphConfig,
) -> (GraphSnapshot, LearningReport) {
    let per_molecule: Vec<Vec<(EdgeKey, f64)>> = batch
        .par_iter()
        .map(|molecule| molecule_signals(molecule, linguistic))
        .collect();

    // Redução sequencial, na ordem do lote.
    let mut accumulated: BTreeMap<EdgeKey, (f64, u64)> = BTreeMap::new();
    let mut pairs_observed = 0usize;
    for signals in per_molecule {
        // 4 sinais por par não ordenado
        pairs_observed += signals.len() / 4;
        for (key, signal) in signals {
            let entry = accumulated.entry(key).or_insert((0.0, 0));
            entry.0 += signal;
            entry.1 += 1;
        }
    }

    let lr = config.learning_rate;
    let mut next = base.clone();
    let mut edges_created = 0usize;
    let mut edges_updated = 0usize;

    for ((source, target, kind), (sum, n)) in accumulated {
        let mean = (sum / n as f64).clamp(0.0, 1.0);
        let alpha = lr * n as f64 / (n as f64 + 1.0);
        match next.edge_mut(&source, &target, kind) {
            Some(edge) => {
                edge.strength = (edge.strength + alpha * (mean - edge.strength)).clamp(0.0, 1.0);
                edge.observations += n;
                edges_updated += 1;
            }
            None if mean >= config.min_edge_strength => {
                next.insert_edge(
                    &source,
                    &target,
                    RelationEdge {
                        kind,
                        strength: mean,
                        observations: n,
                    },
                );
                edges_created += 1;
            }
            None => {}
        }
    }

    let version = base.version() + 1;
    let report = LearningReport {
        molecules: batch.len(),
        pairs_observed,
        edges_created,
        edges_updated,
        version,
    };
    tracing::info!(
        molecules = report.molecules,
        pairs = report.pairs_observed,
        created = report.edges_created,
        updated = report.edges_updated,
        version,
        "aprendizado de relações aplicado"
    );
    (next.with_version(version), report)
}

fn molecule_signals(molecule: &MoleculeEvidence, linguistic: &LinguisticRegistry) -> Vec<(EdgeKey, f64)> {
    let mut grouped: BTreeMap<&str, (f64, usize, BTreeSet<String>)> = BTreeMap::new();
    for item in &molecule.items {
        let entry = grouped
            .entry(item.evidence_type.as_str())
            .or_insert((0.0, 0, BTreeSet::new()));
        entry.0 += item.value;
        entry.1 += 1;
        entry.2.insert(item.source.clone());
    }

    let profiles: Vec<(&str, TypeProfile)> = grouped
        .into_iter()
        .map(|(ty, (sum, count, sources))| {
            let mean = sum / count as f64;
            (
                ty,
                TypeProfile {
                    memberships: linguistic.fuzzify(mean),
                    sources,
                },
            )
        })
        .collect();

    let mut signals = Vec::new();
    for i in 0..profiles.len() {
        for j in (i + 1)..profiles.len() {
            let (a, pa) = &profiles[i];
            let (b, pb) = &profiles[j];
            let concordance = concordance(&pa.memberships, &pb.memberships);
            let discordance = discordance(&pa.memberships, &pb.memberships);
            let kind = if pa.sources.intersection(&pb.sources).next().is_some() {
                RelationKind::Supports
            } else {
                RelationKind::Corroborates
            };
            for (s, t) in [(*a, *b), (*b, *a)] {
                signals.push(((s.to_string(), t.to_string(), kind), concordance));
                signals.push((
                    (s.to_string(), t.to_string(), RelationKind::Contradicts),
                    discordance,
                ));
            }
        }
    }
    signals
}

/// `max_c min(μA(c), μB(c))`.
pub fn concordance(a: &MembershipVector, b: &MembershipVector) -> f64 {
    a.iter()
        .map(|(name, degree)| degree.min(b.get(name)))
        .fold(0.0, f64::max)
}

/// `max(min(altoA, baixoB), min(baixoA, altoB))`.
pub fn discordance(a: &MembershipVector, b: &MembershipVector) -> f64 {
    a.high_degree()
        .min(b.low_degree())
        .max(a.low_degree().min(b.high_degree()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(ty: &str, value: f64, source: &str) -> EvidenceItem {
        EvidenceItem::new(ty, value, 0.1).with_source(source)
    }

    fn config() -> GraphConfig {
        GraphConfig::default()
    }

    #[test]
    fn agreeing_types_from_different_sources_corroborate() {
        let batch = vec![MoleculeEvidence::new(
            "m1",
            vec![item("mass_spec", 0.75, "lab_a"), item("genomics", 0.75, "lab_b")],
        )];
        let (g, report) = learn(&GraphSnapshot::empty(), &batch, &LinguisticRegistry::standard(), &config());
        assert_eq!(report.version, 1);
        assert_eq!(g.version(), 1);
        assert_eq!(g.strength("mass_spec", "genomics", RelationKind::Corroborates), 1.0);
        assert_eq!(g.strength("genomics", "mass_spec", RelationKind::Corroborates), 1.0);
        assert!(g.edge("mass_spec", "genomics", RelationKind::Contradicts).is_none());
        assert_eq!(report.pairs_observed, 1);
    }

    #[test]
    fn same_source_supports() {
        let batch = vec![MoleculeEvidence::new(
            "m1",
            vec![item("mass_spec", 0.5, "lab"), item("genomics", 0.5, "lab")],
        )];
        let (g, _) = learn(&GraphSnapshot::empty(), &batch, &LinguisticRegistry::standard(), &config());
        assert_eq!(g.strength("mass_spec", "genomics", RelationKind::Supports), 1.0);
    }

    #[test]
    fn opposing_types_contradict() {
        let batch = vec![MoleculeEvidence::new(
            "m1",
            vec![item("mass_spec", 0.95, "a"), item("literature", 0.05, "b")],
        )];
        let (g, _) = learn(&GraphSnapshot::empty(), &batch, &LinguisticRegistry::standard(), &config());
        assert!(g.strength("mass_spec", "literature", RelationKind::Contradicts) > 0.5);
        assert!(g.edge("mass_spec", "literature", RelationKind::Corroborates).is_none());
    }

    /// Taxa limitada: um lote discordante não apaga o histórico.
    #[test]
    fn bounded_update_keeps_history() {
        let linguistic = LinguisticRegistry::standard();
        let agree = vec![MoleculeEvidence::new(
            "m1",
            vec![item("mass_spec", 0.75, "a"), item("genomics", 0.75, "b")],
        )];
        let (g1, _) = learn(&GraphSnapshot::empty(), &agree, &linguistic, &config());
        let disagree = vec![MoleculeEvidence::new(
            "m2",
            vec![item("mass_spec", 0.95, "a"), item("genomics", 0.05, "b")],
        )];
        let (g2, report) = learn(&g1, &disagree, &linguistic, &config());
        let s = g2.strength("mass_spec", "genomics", RelationKind::Corroborates);
        // α = 0.2 · 1/2 = 0.1 ⇒ 1.0 → 0.9
        assert!((s - 0.9).abs() < 1e-12);
        assert_eq!(g2.version(), 2);
        assert!(report.edges_updated >= 2);
    }

    #[test]
    fn weak_signal_creates_no_edge() {
        let batch = vec![MoleculeEvidence::new(
            "m1",
            vec![item("mass_spec", 0.5, "a"), item("genomics", 0.75, "b")],
        )];
        let (g, report) = learn(&GraphSnapshot::empty(), &batch, &LinguisticRegistry::standard(), &config());
        assert_eq!(report.edges_created, 0);
        assert!(g.is_empty());
    }

    #[test]
    fn learned_edges_are_symmetric() {
        let batch = vec![
            MoleculeEvidence::new("m1", vec![item("a", 0.7, "x"), item("b", 0.72, "y"), item("c", 0.3, "z")]),
            MoleculeEvidence::new("m2", vec![item("a", 0.9, "x"), item("c", 0.1, "z")]),
        ];
        let (g, _) = learn(&GraphSnapshot::empty(), &batch, &LinguisticRegistry::standard(), &config());
        for rel in g.relationships() {
            assert_eq!(
                rel.strength,
                g.strength(&rel.target_type, &rel.source_type, rel.relation_kind)
            );
        }
    }
}
