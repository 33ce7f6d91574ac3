//! # Consistência Entre Evidências Relacionadas
//!
//! Para cada aresta do grafo cujas duas pontas estão presentes na
//! molécula, verifica se os valores observados são **compatíveis** com o
//! tipo de relação. Um `contradicts` entre dois tipos ambos "altos" é
//! um conflito; um `supports` entre valores próximos é coerente.
//!
//! ## Compatibilidade por Tipo de Relação
//!
//! | Relação | Compatibilidade |
//! |---------|-----------------|
//! | `supports`, `corroborates` | `1 − |vA − vB|` |
//! | `contradicts` | `1 − min(altoA, altoB)` |
//! | `implies` | `min(1, 1 − vA + vB)` |
//! | `requires` | `1 − min(altoA, baixoB)` |
//!
//! ## Agregação
//!
//! ```text
//! consistência = Σ s·compat / Σ s
//! conflito     = Σ s·[compat < 0.5] / Σ s
//! coerência    = 0.5·consistência + 0.3·densidade + 0.2·(1 − conflito)
//! ```
//!
//! Sem arestas aplicáveis: consistência 0.5 e conflito 0.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::{LinguisticRegistry, MembershipVector};
use crate::graph::{GraphSnapshot, RelationKind, TopologyStats};

/// Abaixo disso, a aresta conta como conflito.
pub const CONFLICT_THRESHOLD: f64 = 0.5;

/// Resumo observado de um tipo de evidência na molécula.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypeObservation {
    pub evidence_type: String,
    /// Valor médio observado.
    pub value: f64,
    pub memberships: MembershipVector,
}

/// Aresta violada pelas observações.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelationshipConflict {
    pub source_type: String,
    pub target_type: String,
    pub relation_kind: RelationKind,
    pub strength: f64,
    pub compatibility: f64,
    /// Rótulo da variável de concordância (`conflicting`, `neutral`, …).
    pub agreement: String,
}

/// Resultado da verificação de consistência.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub consistency_score: f64,
    pub conflict_score: f64,
    pub coherence_score: f64,
    pub edges_evaluated: usize,
    pub conflicts: Vec<RelationshipConflict>,
    /// Topologia do subgrafo induzido pelos tipos presentes.
    pub topology: TopologyStats,
}

/// Compatibilidade das observações `a → b` com uma relação.
pub fn compatibility(kind: RelationKind, a: &TypeObservation, b: &TypeObservation) -> f64 {
    let c = match kind {
        RelationKind::Supports | RelationKind::Corroborates => 1.0 - (a.value - b.value).abs(),
        RelationKind::Contradicts => {
            1.0 - a.memberships.high_degree().min(b.memberships.high_degree())
        }
        RelationKind::Implies => (1.0 - a.value + b.value).min(1.0),
        RelationKind::Requires => {
            1.0 - a.memberships.high_degree().min(b.memberships.low_degree())
        }
    };
    c.clamp(0.0, 1.0)
}

/// Avalia todas as arestas do subgrafo induzido pelos tipos observados.
pub fn evaluate(
    observations: &BTreeMap<String, TypeObservation>,
    snapshot: &GraphSnapshot,
    agreement: &LinguisticRegistry,
) -> ConsistencyReport {
    let present: BTreeSet<String> = observations.keys().cloned().collect();
    let edges = snapshot.induced(&present);
    let topology = TopologyStats::compute(present.iter().map(String::as_str), &edges);

    let mut weighted = 0.0;
    let mut conflicting = 0.0;
    let mut total_strength = 0.0;
    let mut edges_evaluated = 0usize;
    let mut conflicts = Vec::new();

    for edge in &edges {
        let (Some(a), Some(b)) = (
            observations.get(&edge.source_type),
            observations.get(&edge.target_type),
        ) else {
            continue;
        };
        if edge.strength <= 0.0 {
            continue;
        }
        edges_evaluated += 1;
        let compat = compatibility(edge.relation_kind, a, b);
        weighted += edge.strength * compat;
        total_strength += edge.strength;
        if compat < CONFLICT_THRESHOLD {
            conflicting += edge.strength;
            conflicts.push(RelationshipConflict {
                source_type: edge.source_type.clone(),
                target_type: edge.target_type.clone(),
                relation_kind: edge.relation_kind,
                strength: edge.strength,
                compatibility: compat,
                agreement: agreement
                    .label(compat)
                    .unwrap_or_else(|| "conflicting".to_string()),
            });
        }
    }

    let (consistency_score, conflict_score) = if total_strength > 0.0 {
        (weighted / total_strength, conflicting / total_strength)
    } else {
        (0.5, 0.0)
    };
    let coherence_score = (0.5 * consistency_score
        + 0.3 * topology.density
        + 0.2 * (1.0 - conflict_score))
        .clamp(0.0, 1.0);

    if !conflicts.is_empty() {
        tracing::debug!(conflicts = conflicts.len(), "relações violadas pelas observações");
    }

    ConsistencyReport {
        consistency_score,
        conflict_score,
        coherence_score,
        edges_evaluated,
        conflicts,
        topology,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EvidenceRelationship;

    fn obs(ty: &str, value: f64) -> (String, TypeObservation) {
        (
            ty.to_string(),
            TypeObservation {
                evidence_type: ty.to_string(),
                value,
                memberships: LinguisticRegistry::standard().fuzzify(value),
            },
        )
    }

    fn graph(rels: &[EvidenceRelationship]) -> GraphSnapshot {
        GraphSnapshot::from_relationships(1, rels).unwrap()
    }

    #[test]
    fn no_edges_is_neutral() {
        let observations: BTreeMap<_, _> = [obs("a", 0.9), obs("b", 0.1)].into_iter().collect();
        let r = evaluate(&observations, &GraphSnapshot::empty(), &LinguisticRegistry::agreement());
        assert_eq!(r.consistency_score, 0.5);
        assert_eq!(r.conflict_score, 0.0);
        assert_eq!(r.edges_evaluated, 0);
        assert!((r.coherence_score - (0.25 + 0.2)).abs() < 1e-12);
    }

    /// Dois tipos "altos" ligados por `contradicts` geram conflito.
    #[test]
    fn contradicts_between_two_highs_is_a_conflict() {
        let observations: BTreeMap<_, _> = [obs("a", 0.75), obs("b", 0.75)].into_iter().collect();
        let g = graph(&[EvidenceRelationship::new("a", "b", RelationKind::Contradicts, 0.8)]);
        let r = evaluate(&observations, &g, &LinguisticRegistry::agreement());
        assert_eq!(r.conflicts.len(), 1);
        assert_eq!(r.conflicts[0].compatibility, 0.0);
        assert_eq!(r.conflicts[0].agreement, "conflicting");
        assert_eq!(r.conflict_score, 1.0);
        assert_eq!(r.consistency_score, 0.0);
    }

    #[test]
    fn supports_between_close_values_is_consistent() {
        let observations: BTreeMap<_, _> = [obs("a", 0.8), obs("b", 0.7)].into_iter().collect();
        let g = graph(&[
            EvidenceRelationship::new("a", "b", RelationKind::Supports, 1.0),
            EvidenceRelationship::new("b", "a", RelationKind::Supports, 1.0),
        ]);
        let r = evaluate(&observations, &g, &LinguisticRegistry::agreement());
        assert!((r.consistency_score - 0.9).abs() < 1e-12);
        assert!(r.conflicts.is_empty());
        // densidade 1 ⇒ coerência = 0.45 + 0.3 + 0.2
        assert!((r.coherence_score - 0.95).abs() < 1e-12);
    }

    #[test]
    fn implies_and_requires() {
        let hi = obs("a", 0.75).1;
        let lo = obs("b", 0.1).1;
        assert!((compatibility(RelationKind::Implies, &hi, &lo) - 0.35).abs() < 1e-12);
        assert_eq!(compatibility(RelationKind::Implies, &lo, &hi), 1.0);
        assert!((compatibility(RelationKind::Requires, &hi, &lo) - 0.5).abs() < 1e-12);
        assert_eq!(compatibility(RelationKind::Requires, &lo, &hi), 1.0);
    }

    #[test]
    fn edges_to_absent_types_are_ignored() {
        let observations: BTreeMap<_, _> = [obs("a", 0.9)].into_iter().collect();
        let g = graph(&[EvidenceRelationship::new("a", "b", RelationKind::Contradicts, 1.0)]);
        let r = evaluate(&observations, &g, &LinguisticRegistry::agreement());
        assert_eq!(r.edges_evaluated, 0);
        assert_eq!(r.topology.node_count, 1);
    }
}
