//! # Predição de Evidência Ausente
//!
//! Dado um tipo-alvo e as evidências de contexto presentes, percorre o
//! grafo a partir de cada tipo de contexto em direção ao alvo, por
//! caminhos simples de até `max_hops` arestas.
//!
//! ## Propagação ao Longo de um Caminho
//!
//! ```text
//! contexto (v, u) ──s₁──▶ X ──s₂ (contradicts)──▶ alvo
//!
//! valor propagado = 1 − v            (cada `contradicts` inverte)
//! influência      = s₁ · s₂ · (1 − u)
//! ```
//!
//! ## Combinação dos Caminhos
//!
//! | Grandeza | Fórmula |
//! |----------|---------|
//! | valor previsto | `Σ infl·v / Σ infl` |
//! | divergência | desvio-padrão ponderado dos valores dos caminhos |
//! | incerteza de um caminho | `min(1, (1 − infl) + hop_penalty·(hops − 1))` |
//! | meia-largura da banda | `clamp(0.5·média(incerteza) + divergência, 0, 0.5)` |
//! | confiança | `melhor_infl · (1 − divergência)` |
//!
//! Sem nenhum caminho de influência positiva, o resultado é
//! [`Prediction::NoPathFound`]: um "desconhecido" estruturado, nunca um chute.

use serde::{Deserialize, Serialize};

use super::relationship::RelationKind;
use super::snapshot::GraphSnapshot;
use crate::config::PredictionConfig;

/// Valor observado usado como ponto de partida da predição.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContextValue {
    pub evidence_type: String,
    pub value: f64,
    #[serde(default)]
    pub uncertainty: f64,
}

impl ContextValue {
    pub fn new(evidence_type: impl Into<String>, value: f64, uncertainty: f64) -> Self {
        Self {
            evidence_type: evidence_type.into(),
            value,
            uncertainty,
        }
    }
}

/// Um caminho que contribuiu para a predição.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathTrace {
    /// Tipos visitados, do contexto até o alvo.
    pub nodes: Vec<String>,
    /// Tipo de relação de cada aresta percorrida.
    pub relations: Vec<RelationKind>,
    pub influence: f64,
    pub propagated_value: f64,
    pub uncertainty: f64,
}

impl PathTrace {
    pub fn hops(&self) -> usize {
        self.relations.len()
    }

    /// Quantas arestas `contradicts` o caminho atravessa.
    pub fn inversions(&self) -> usize {
        self.relations.iter().filter(|k| k.inverts_value()).count()
    }
}

/// Evidência prevista para um tipo ausente.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictedEvidence {
    pub evidence_type: String,
    pub predicted_value: f64,
    pub uncertainty_bounds: (f64, f64),
    /// Confiança na própria predição, em `[0, 1]`.
    pub confidence: f64,
    pub paths: Vec<PathTrace>,
}

/// Resultado de uma consulta de predição.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Prediction {
    Predicted(PredictedEvidence),
    NoPathFound { evidence_type: String },
}

impl Prediction {
    pub fn predicted(&self) -> Option<&PredictedEvidence> {
        match self {
            Prediction::Predicted(p) => Some(p),
            Prediction::NoPathFound { .. } => None,
        }
    }

    pub fn is_no_path(&self) -> bool {
        matches!(self, Prediction::NoPathFound { .. })
    }
}

/// Prevê o valor de `target` a partir de `context`.
///
/// Contextos do próprio tipo-alvo são ignorados.
pub fn predict(
    snapshot: &GraphSnapshot,
    target: &str,
    context: &[ContextValue],
    config: &PredictionConfig,
) -> Prediction {
    let paths = trace_paths(snapshot, target, context, config);
    if paths.is_empty() {
        tracing::debug!(target_type = %target, "nenhum caminho até o tipo-alvo");
        return Prediction::NoPathFound {
            evidence_type: target.to_string(),
        };
    }

    let total_influence: f64 = paths.iter().map(|p| p.influence).sum();
    let predicted_value = paths
        .iter()
        .map(|p| p.influence * p.propagated_value)
        .sum::<f64>()
        / total_influence;
    let variance = paths
        .iter()
        .map(|p| p.influence * (p.propagated_value - predicted_value).powi(2))
        .sum::<f64>()
        / total_influence;
    let divergence = variance.sqrt();
    let mean_path_uncertainty =
        paths.iter().map(|p| p.uncertainty).sum::<f64>() / paths.len() as f64;
    let half_width = (0.5 * mean_path_uncertainty + divergence).clamp(0.0, 0.5);
    let best_influence = paths.iter().map(|p| p.influence).fold(0.0, f64::max);
    let confidence = (best_influence * (1.0 - divergence)).clamp(0.0, 1.0);
    let predicted_value = predicted_value.clamp(0.0, 1.0);

    Prediction::Predicted(PredictedEvidence {
        evidence_type: target.to_string(),
        predicted_value,
        uncertainty_bounds: (
            (predicted_value - half_width).max(0.0),
            (predicted_value + half_width).min(1.0),
        ),
        confidence,
        paths,
    })
}

/// Sinal do grafo usado como prior na avaliação de uma molécula.
#[derive(Clone, Debug, PartialEq)]
pub struct PriorSignal {
    /// Média dos valores propagados, ponderada pela influência.
    pub predicted_value: f64,
    /// Maior influência entre os caminhos usados, em `[0, 1]`.
    pub weight: f64,
    pub paths: usize,
}

/// Prior de `target` a partir dos outros tipos presentes.
///
/// Só entram caminhos com número par de `contradicts`, que preservam o
/// valor, e o peso depende apenas das forças e das incertezas. Assim o
/// prior nunca diminui quando um valor de contexto aumenta. Contradições
/// entram na avaliação pelo escore de conflito, não pelo prior.
pub fn prior_signal(
    snapshot: &GraphSnapshot,
    target: &str,
    context: &[ContextValue],
    config: &PredictionConfig,
) -> Option<PriorSignal> {
    let paths: Vec<PathTrace> = trace_paths(snapshot, target, context, config)
        .into_iter()
        .filter(|p| p.inversions() % 2 == 0)
        .collect();
    if paths.is_empty() {
        return None;
    }
    let total_influence: f64 = paths.iter().map(|p| p.influence).sum();
    let predicted_value = paths
        .iter()
        .map(|p| p.influence * p.propagated_value)
        .sum::<f64>()
        / total_influence;
    let weight = paths.iter().map(|p| p.influence).fold(0.0, f64::max);
    Some(PriorSignal {
        predicted_value: predicted_value.clamp(0.0, 1.0),
        weight: weight.clamp(0.0, 1.0),
        paths: paths.len(),
    })
}

/// Todos os caminhos de influência positiva de cada contexto até `target`.
fn trace_paths(
    snapshot: &GraphSnapshot,
    target: &str,
    context: &[ContextValue],
    config: &PredictionConfig,
) -> Vec<PathTrace> {
    let mut paths = Vec::new();
    if !snapshot.contains_type(target) {
        return paths;
    }
    for ctx in context.iter().filter(|c| c.evidence_type != target) {
        let mut walker = Walker {
            snapshot,
            target,
            max_hops: config.max_hops,
            nodes: vec![ctx.evidence_type.clone()],
            relations: Vec::new(),
            found: Vec::new(),
        };
        walker.walk(&ctx.evidence_type);
        for (nodes, relations, strength_product) in walker.found {
            let inversions = relations.iter().filter(|k| k.inverts_value()).count();
            let base = ctx.value.clamp(0.0, 1.0);
            let propagated_value = if inversions % 2 == 1 { 1.0 - base } else { base };
            let influence = strength_product * (1.0 - ctx.uncertainty.clamp(0.0, 1.0));
            if influence <= 0.0 {
                continue;
            }
            let hops = relations.len();
            let uncertainty =
                ((1.0 - influence) + config.hop_penalty * (hops as f64 - 1.0)).min(1.0);
            paths.push(PathTrace {
                nodes,
                relations,
                influence,
                propagated_value,
                uncertainty,
            });
        }
    }
    paths
}

/// DFS por caminhos simples até o alvo.
struct Walker<'a> {
    snapshot: &'a GraphSnapshot,
    target: &'a str,
    max_hops: usize,
    nodes: Vec<String>,
    relations: Vec<RelationKind>,
    found: Vec<(Vec<String>, Vec<RelationKind>, f64)>,
}

impl Walker<'_> {
    fn walk(&mut self, current: &str) {
        self.step(current, 1.0);
    }

    fn step(&mut self, current: &str, strength_product: f64) {
        if self.relations.len() >= self.max_hops {
            return;
        }
        let snapshot = self.snapshot;
        for (next, edge) in snapshot.outgoing(current) {
            if self.nodes.iter().any(|n| n == next) {
                continue;
            }
            let product = strength_product * edge.strength;
            self.nodes.push(next.to_string());
            self.relations.push(edge.kind);
            if next == self.target {
                self.found
                    .push((self.nodes.clone(), self.relations.clone(), product));
            } else {
                self.step(next, product);
            }
            self.nodes.pop();
            self.relations.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::relationship::EvidenceRelationship;

    fn config() -> PredictionConfig {
        PredictionConfig::default()
    }

    fn chain() -> GraphSnapshot {
        GraphSnapshot::from_relationships(
            1,
            &[
                EvidenceRelationship::new("a", "b", RelationKind::Supports, 0.8),
                EvidenceRelationship::new("b", "c", RelationKind::Corroborates, 0.5),
                EvidenceRelationship::new("c", "d", RelationKind::Supports, 0.9),
                EvidenceRelationship::new("d", "e", RelationKind::Supports, 0.9),
            ],
        )
        .unwrap()
    }

    #[test]
    fn single_hop_prediction() {
        let p = predict(&chain(), "b", &[ContextValue::new("a", 0.9, 0.0)], &config());
        let pe = p.predicted().unwrap();
        assert!((pe.predicted_value - 0.9).abs() < 1e-12);
        assert!((pe.confidence - 0.8).abs() < 1e-12);
        assert_eq!(pe.paths.len(), 1);
        assert_eq!(pe.paths[0].nodes, vec!["a", "b"]);
        // incerteza do caminho = 0.2 ⇒ meia-largura 0.1
        assert!((pe.uncertainty_bounds.0 - 0.8).abs() < 1e-12);
        assert!((pe.uncertainty_bounds.1 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn influence_is_product_of_strengths() {
        let p = predict(&chain(), "c", &[ContextValue::new("a", 0.6, 0.5)], &config());
        let pe = p.predicted().unwrap();
        assert!((pe.paths[0].influence - 0.8 * 0.5 * 0.5).abs() < 1e-12);
        assert_eq!(pe.paths[0].hops(), 2);
    }

    #[test]
    fn hop_bound_is_respected() {
        // a → e exige 4 arestas; limite padrão é 3
        let p = predict(&chain(), "e", &[ContextValue::new("a", 0.9, 0.0)], &config());
        assert!(p.is_no_path());
    }

    #[test]
    fn contradicts_inverts_value() {
        let g = GraphSnapshot::from_relationships(
            0,
            &[EvidenceRelationship::new("a", "b", RelationKind::Contradicts, 1.0)],
        )
        .unwrap();
        let p = predict(&g, "b", &[ContextValue::new("a", 0.9, 0.0)], &config());
        assert!((p.predicted().unwrap().predicted_value - 0.1).abs() < 1e-12);
    }

    #[test]
    fn disconnected_target_has_no_path() {
        let g = GraphSnapshot::from_relationships(
            0,
            &[
                EvidenceRelationship::new("a", "b", RelationKind::Supports, 1.0),
                EvidenceRelationship::new("x", "y", RelationKind::Supports, 1.0),
            ],
        )
        .unwrap();
        let p = predict(&g, "y", &[ContextValue::new("a", 0.9, 0.0)], &config());
        assert_eq!(
            p,
            Prediction::NoPathFound {
                evidence_type: "y".into()
            }
        );
        let unknown = predict(&g, "zzz", &[ContextValue::new("a", 0.9, 0.0)], &config());
        assert!(unknown.is_no_path());
    }

    /// Caminhos divergentes alargam a banda e reduzem a confiança.
    #[test]
    fn divergent_paths_widen_the_band() {
        let g = GraphSnapshot::from_relationships(
            0,
            &[
                EvidenceRelationship::new("a", "t", RelationKind::Supports, 1.0),
                EvidenceRelationship::new("b", "t", RelationKind::Supports, 1.0),
            ],
        )
        .unwrap();
        let agree = predict(
            &g,
            "t",
            &[ContextValue::new("a", 0.8, 0.0), ContextValue::new("b", 0.8, 0.0)],
            &config(),
        );
        let split = predict(
            &g,
            "t",
            &[ContextValue::new("a", 0.9, 0.0), ContextValue::new("b", 0.1, 0.0)],
            &config(),
        );
        let agree = agree.predicted().unwrap();
        let split = split.predicted().unwrap();
        assert!((split.predicted_value - 0.5).abs() < 1e-12);
        let width = |p: &PredictedEvidence| p.uncertainty_bounds.1 - p.uncertainty_bounds.0;
        assert!(width(split) > width(agree));
        assert!(split.confidence < agree.confidence);
    }

    #[test]
    fn prior_signal_skips_inverting_paths() {
        let g = GraphSnapshot::from_relationships(
            0,
            &[
                EvidenceRelationship::new("a", "t", RelationKind::Contradicts, 1.0),
                EvidenceRelationship::new("b", "t", RelationKind::Supports, 0.6),
            ],
        )
        .unwrap();
        let only_contradicting = prior_signal(&g, "t", &[ContextValue::new("a", 0.9, 0.0)], &config());
        assert!(only_contradicting.is_none());

        let s = prior_signal(
            &g,
            "t",
            &[ContextValue::new("a", 0.9, 0.0), ContextValue::new("b", 0.7, 0.0)],
            &config(),
        )
        .unwrap();
        assert_eq!(s.paths, 1);
        assert!((s.predicted_value - 0.7).abs() < 1e-12);
        assert!((s.weight - 0.6).abs() < 1e-12);
    }

    /// Dois `contradicts` seguidos preservam o valor.
    #[test]
    fn prior_signal_keeps_double_inversion() {
        let g = GraphSnapshot::from_relationships(
            0,
            &[
                EvidenceRelationship::new("a", "m", RelationKind::Contradicts, 1.0),
                EvidenceRelationship::new("m", "t", RelationKind::Contradicts, 0.5),
            ],
        )
        .unwrap();
        let s = prior_signal(&g, "t", &[ContextValue::new("a", 0.8, 0.0)], &config()).unwrap();
        assert!((s.predicted_value - 0.8).abs() < 1e-12);
        assert!((s.weight - 0.5).abs() < 1e-12);
    }

    #[test]
    fn prior_signal_never_drops_when_context_rises() {
        let g = GraphSnapshot::from_relationships(
            0,
            &[
                EvidenceRelationship::new("a", "t", RelationKind::Supports, 0.9),
                EvidenceRelationship::new("b", "t", RelationKind::Implies, 0.4),
                EvidenceRelationship::new("a", "b", RelationKind::Contradicts, 0.7),
            ],
        )
        .unwrap();
        let value = |x: f64| {
            prior_signal(
                &g,
                "t",
                &[ContextValue::new("a", x, 0.1), ContextValue::new("b", 0.3, 0.2)],
                &config(),
            )
            .unwrap()
            .predicted_value
        };
        let mut last = value(0.0);
        for step in 1..=20 {
            let next = value(step as f64 / 20.0);
            assert!(next >= last);
            last = next;
        }
    }
}
