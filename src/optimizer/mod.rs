//! # Otimizador de Objetivos
//!
//! Pontua configurações candidatas de evidência contra cinco objetivos
//! ponderados ([`objective`]) e escolhe entre elas.
//!
//! ## Modos
//!
//! | Modo | Resultado |
//! |------|-----------|
//! | soma ponderada | melhor candidato viável; empate → maior confiança → rótulo |
//! | fronteira de Pareto | candidatos viáveis não dominados |
//! | sensibilidade | variação do escore com cada peso perturbado em `±δ` |
//!
//! ```text
//! candidatos ──► vetor de objetivos ──► restrições ──┬─► soma ponderada ──► ótimo
//!                                                    ├─► dominância ──────► Pareto
//!                                                    └─► pesos ± δ ───────► sensibilidade
//! ```
//!
//! Candidatos que violam uma [`Constraints`] são contados como inviáveis
//! e ficam fora do ótimo e da fronteira.

pub mod objective;

use serde::{Deserialize, Serialize};

pub use objective::{Constraints, Objective, ObjectiveVector, ObjectiveWeights};

use crate::error::{EngineError, Result};
use crate::graph::RelationKind;
use crate::inference::{PosteriorAssessment, RelationshipConflict};

/// Abaixo disso, o objetivo vira recomendação de melhoria.
pub const IMPROVEMENT_THRESHOLD: f64 = 0.5;

/// Ganho mínimo para que remover um item conte como melhoria.
const REMOVAL_GAIN_EPSILON: f64 = 1e-9;

/// Uma configuração de evidência já avaliada.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub label: String,
    pub objectives: ObjectiveVector,
    /// Item deixado de fora (candidatos leave-one-out).
    pub excluded_item: Option<String>,
    pub conflicts: Vec<RelationshipConflict>,
}

impl Candidate {
    pub fn new(label: impl Into<String>, objectives: ObjectiveVector) -> Self {
        Self {
            label: label.into(),
            objectives,
            excluded_item: None,
            conflicts: Vec::new(),
        }
    }

    pub fn from_assessment(label: impl Into<String>, assessment: &PosteriorAssessment) -> Self {
        Self {
            conflicts: assessment.conflicts.clone(),
            ..Self::new(label, ObjectiveVector::from_assessment(assessment))
        }
    }

    pub fn excluding(mut self, item_id: impl Into<String>) -> Self {
        self.excluded_item = Some(item_id.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub label: String,
    pub objectives: ObjectiveVector,
    pub total_score: f64,
    pub feasible: bool,
    pub excluded_item: Option<String>,
}

/// Efeito de perturbar o peso de um objetivo.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensitivityEntry {
    pub objective: Objective,
    pub weight: f64,
    pub delta_if_increased: f64,
    pub delta_if_decreased: f64,
    /// Melhor candidato sob o peso aumentado, se mudar.
    pub best_if_increased: Option<String>,
    pub best_if_decreased: Option<String>,
}

impl SensitivityEntry {
    pub fn magnitude(&self) -> f64 {
        self.delta_if_increased.abs().max(self.delta_if_decreased.abs())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensitivityReport {
    pub delta: f64,
    /// Candidato de referência (o ótimo, ou o conjunto completo sem ótimo viável).
    pub reference: String,
    pub baseline_score: f64,
    pub entries: Vec<SensitivityEntry>,
    pub most_influential: Option<Objective>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recommendation {
    ImproveObjective {
        objective: Objective,
        score: f64,
    },
    ReviewEvidence {
        item_id: String,
        score_gain: f64,
    },
    ReexamineConflict {
        source_type: String,
        target_type: String,
        relation_kind: RelationKind,
        compatibility: f64,
    },
}

impl Recommendation {
    pub fn message(&self) -> String {
        match self {
            Recommendation::ImproveObjective { objective, score } => {
                format!("Melhorar o escore de {} (atual {score:.2})", objective.label())
            }
            Recommendation::ReviewEvidence { item_id, score_gain } => {
                format!("Revisar a evidência {item_id}: removê-la eleva o escore em {score_gain:.3}")
            }
            Recommendation::ReexamineConflict {
                source_type,
                target_type,
                relation_kind,
                compatibility,
            } => format!(
                "Reexaminar {source_type} × {target_type}: relação '{}' com compatibilidade {compatibility:.2}",
                relation_kind.label()
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub best: Option<ScoredCandidate>,
    pub optimal_score: Option<f64>,
    pub pareto_front: Vec<ScoredCandidate>,
    pub sensitivity: SensitivityReport,
    pub recommendations: Vec<Recommendation>,
    pub candidates_evaluated: usize,
    pub infeasible: usize,
}

/// Otimizador sem estado: pesos normalizados, restrições e `δ`.
#[derive(Clone, Debug)]
pub struct Optimizer {
    weights: ObjectiveWeights,
    normalized: [f64; 5],
    constraints: Constraints,
    delta: f64,
}

impl Optimizer {
    /// # Erros
    ///
    /// [`EngineError::Configuration`] para pesos, restrições ou `δ` inválidos.
    pub fn new(weights: ObjectiveWeights, constraints: Constraints, delta: f64) -> Result<Self> {
        weights.validate()?;
        constraints.validate()?;
        if !delta.is_finite() || delta <= 0.0 {
            return Err(EngineError::config(format!(
                "sensitivity_delta deve ser positivo, recebido {delta}"
            )));
        }
        let normalized = weights
            .normalized()
            .ok_or_else(|| EngineError::config("pesos dos objetivos não normalizáveis"))?;
        Ok(Self {
            weights,
            normalized,
            constraints,
            delta,
        })
    }

    pub fn weights(&self) -> &ObjectiveWeights {
        &self.weights
    }

    /// Escore total de um vetor de objetivos.
    pub fn score(&self, objectives: &ObjectiveVector) -> f64 {
        objectives.weighted(&self.normalized)
    }

    pub fn score_candidate(&self, candidate: &Candidate) -> ScoredCandidate {
        ScoredCandidate {
            label: candidate.label.clone(),
            objectives: candidate.objectives,
            total_score: self.score(&candidate.objectives),
            feasible: self.constraints.admits(&candidate.objectives),
            excluded_item: candidate.excluded_item.clone(),
        }
    }

    /// Avalia `baseline` (o conjunto completo) e as alternativas.
    ///
    /// As recomendações são derivadas do `baseline`: objetivos fracos,
    /// itens cuja remoção melhora o escore e conflitos observados.
    pub fn optimize(&self, baseline: &Candidate, alternatives: &[Candidate]) -> OptimizationReport {
        let scored: Vec<ScoredCandidate> = std::iter::once(baseline)
            .chain(alternatives)
            .map(|c| self.score_candidate(c))
            .collect();

        let feasible: Vec<&ScoredCandidate> = scored.iter().filter(|c| c.feasible).collect();
        let infeasible = scored.len() - feasible.len();
        let best = best_of(&feasible, |c| c.total_score).cloned();
        let pareto_front = pareto_front(&feasible);

        let reference = best.as_ref().unwrap_or(&scored[0]);
        let sensitivity = self.sensitivity(reference, &feasible);
        let recommendations = self.recommendations(baseline, &scored);

        tracing::debug!(
            candidates = scored.len(),
            infeasible,
            pareto = pareto_front.len(),
            best = best.as_ref().map(|b| b.label.as_str()).unwrap_or("-"),
            "otimização concluída"
        );

        OptimizationReport {
            optimal_score: best.as_ref().map(|b| b.total_score),
            best,
            pareto_front,
            sensitivity,
            recommendations,
            candidates_evaluated: scored.len(),
            infeasible,
        }
    }

    fn sensitivity(
        &self,
        reference: &ScoredCandidate,
        feasible: &[&ScoredCandidate],
    ) -> SensitivityReport {
        let base = self.weights.as_array();
        let current_best = best_of(feasible, |c| c.total_score).map(|c| c.label.clone());

        let entries: Vec<SensitivityEntry> = Objective::ALL
            .iter()
            .enumerate()
            .map(|(k, &objective)| {
                let perturbed = |sign: f64| {
                    let mut w = base;
                    w[k] = (w[k] + sign * self.delta).max(0.0);
                    objective::normalize(w)
                };
                let (delta_if_increased, best_if_increased) =
                    self.perturbation(perturbed(1.0), reference, feasible, &current_best);
                let (delta_if_decreased, best_if_decreased) =
                    self.perturbation(perturbed(-1.0), reference, feasible, &current_best);
                SensitivityEntry {
                    objective,
                    weight: base[k],
                    delta_if_increased,
                    delta_if_decreased,
                    best_if_increased,
                    best_if_decreased,
                }
            })
            .collect();

        // empate fica com o primeiro objetivo na ordem canônica
        let most_influential = entries
            .iter()
            .fold(None::<&SensitivityEntry>, |acc, e| match acc {
                Some(top) if top.magnitude() >= e.magnitude() => Some(top),
                _ => Some(e),
            })
            .filter(|e| e.magnitude() > 0.0)
            .map(|e| e.objective);

        SensitivityReport {
            delta: self.delta,
            reference: reference.label.clone(),
            baseline_score: reference.total_score,
            entries,
            most_influential,
        }
    }

    /// Variação do escore de referência e novo ótimo (se mudar) sob `weights`.
    fn perturbation(
        &self,
        weights: Option<[f64; 5]>,
        reference: &ScoredCandidate,
        feasible: &[&ScoredCandidate],
        current_best: &Option<String>,
    ) -> (f64, Option<String>) {
        // todos os pesos zerados: o escore não é definido, conta como sem efeito
        let Some(w) = weights else {
            return (0.0, None);
        };
        let delta = reference.objectives.weighted(&w) - reference.total_score;
        let best = best_of(feasible, |c| c.objectives.weighted(&w)).map(|c| c.label.clone());
        let changed = best.filter(|label| Some(label) != current_best.as_ref());
        (delta, changed)
    }

    fn recommendations(&self, baseline: &Candidate, scored: &[ScoredCandidate]) -> Vec<Recommendation> {
        let mut out = Vec::new();

        for objective in Objective::ALL {
            let score = baseline.objectives.get(objective);
            if score < IMPROVEMENT_THRESHOLD {
                out.push(Recommendation::ImproveObjective { objective, score });
            }
        }

        let base_score = self.score(&baseline.objectives);
        for c in scored {
            let Some(item_id) = &c.excluded_item else {
                continue;
            };
            let gain = c.total_score - base_score;
            if gain > REMOVAL_GAIN_EPSILON {
                out.push(Recommendation::ReviewEvidence {
                    item_id: item_id.clone(),
                    score_gain: gain,
                });
            }
        }

        for conflict in &baseline.conflicts {
            out.push(Recommendation::ReexamineConflict {
                source_type: conflict.source_type.clone(),
                target_type: conflict.target_type.clone(),
                relation_kind: conflict.relation_kind,
                compatibility: conflict.compatibility,
            });
        }
        out
    }
}

/// Maior escore; empate → maior confiança → menor rótulo.
fn best_of<'a>(
    candidates: &[&'a ScoredCandidate],
    score: impl Fn(&ScoredCandidate) -> f64,
) -> Option<&'a ScoredCandidate> {
    candidates.iter().copied().max_by(|a, b| {
        score(*a)
            .total_cmp(&score(*b))
            .then(a.objectives.confidence.total_cmp(&b.objectives.confidence))
            .then_with(|| b.label.cmp(&a.label))
    })
}

/// Candidatos não dominados por nenhum outro, na ordem de entrada.
pub fn pareto_front(candidates: &[&ScoredCandidate]) -> Vec<ScoredCandidate> {
    candidates
        .iter()
        .enumerate()
        .filter(|(i, c)| {
            !candidates
                .iter()
                .enumerate()
                .any(|(j, other)| *i != j && other.objectives.dominates(&c.objectives))
        })
        .map(|(_, c)| (*c).clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(xs: [f64; 5]) -> ObjectiveVector {
        ObjectiveVector {
            confidence: xs[0],
            uncertainty: xs[1],
            consistency: xs[2],
            conflicts: xs[3],
            network_coherence: xs[4],
        }
    }

    fn optimizer() -> Optimizer {
        Optimizer::new(ObjectiveWeights::default(), Constraints::default(), 0.1).unwrap()
    }

    #[test]
    fn weighted_sum_picks_highest_score() {
        let base = Candidate::new("all", vector([0.6, 0.6, 0.6, 0.6, 0.6]));
        let better = Candidate::new("without:x", vector([0.8, 0.8, 0.8, 0.8, 0.8])).excluding("x");
        let report = optimizer().optimize(&base, &[better]);
        let best = report.best.unwrap();
        assert_eq!(best.label, "without:x");
        assert!((best.total_score - 0.8).abs() < 1e-12);
        assert_eq!(report.pareto_front.len(), 1);
        assert!(report
            .recommendations
            .iter()
            .any(|r| matches!(r, Recommendation::ReviewEvidence { item_id, .. } if item_id == "x")));
    }

    #[test]
    fn ties_break_on_confidence_then_label() {
        // mesmo escore total, confiança diferente
        let w = ObjectiveWeights {
            maximize_confidence: 1.0,
            minimize_uncertainty: 1.0,
            maximize_consistency: 0.0,
            minimize_conflicts: 0.0,
            maximize_network_coherence: 0.0,
        };
        let opt = Optimizer::new(w, Constraints::default(), 0.1).unwrap();
        let a = Candidate::new("a", vector([0.4, 0.8, 0.5, 0.5, 0.5]));
        let b = Candidate::new("b", vector([0.8, 0.4, 0.5, 0.5, 0.5]));
        assert_eq!(opt.optimize(&a, &[b.clone()]).best.unwrap().label, "b");

        let c = Candidate::new("c", b.objectives);
        assert_eq!(opt.optimize(&c, &[b]).best.unwrap().label, "b");
    }

    #[test]
    fn pareto_front_keeps_tradeoffs() {
        let base = Candidate::new("all", vector([0.9, 0.2, 0.5, 0.5, 0.5]));
        let alt1 = Candidate::new("alt1", vector([0.2, 0.9, 0.5, 0.5, 0.5]));
        let dominated = Candidate::new("alt2", vector([0.1, 0.1, 0.5, 0.5, 0.5]));
        let report = optimizer().optimize(&base, &[alt1, dominated]);
        let labels: Vec<_> = report.pareto_front.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, ["all", "alt1"]);
    }

    #[test]
    fn infeasible_candidates_are_excluded() {
        let constraints = Constraints {
            min_confidence: Some(0.7),
            max_uncertainty_spread: None,
        };
        let opt = Optimizer::new(ObjectiveWeights::default(), constraints, 0.1).unwrap();
        let base = Candidate::new("all", vector([0.5, 0.9, 0.9, 0.9, 0.9]));
        let alt = Candidate::new("alt", vector([0.75, 0.5, 0.5, 0.5, 0.5]));
        let report = opt.optimize(&base, &[alt]);
        assert_eq!(report.infeasible, 1);
        assert_eq!(report.best.unwrap().label, "alt");
        assert!(report.pareto_front.iter().all(|c| c.feasible));

        let none = opt.optimize(&Candidate::new("all", vector([0.1; 5])), &[]);
        assert!(none.best.is_none());
        assert!(none.optimal_score.is_none());
        assert_eq!(none.sensitivity.reference, "all");
    }

    #[test]
    fn sensitivity_finds_dominant_objective() {
        // confiança alta e demais baixos: aumentar o peso de confiança sobe o escore
        let base = Candidate::new("all", vector([1.0, 0.0, 0.0, 0.0, 0.0]));
        let report = optimizer().optimize(&base, &[]);
        let s = &report.sensitivity;
        assert_eq!(s.entries.len(), 5);
        let conf = &s.entries[0];
        assert!(conf.delta_if_increased > 0.0);
        assert!(conf.delta_if_decreased < 0.0);
        assert_eq!(s.most_influential, Some(Objective::Confidence));
    }

    #[test]
    fn uniform_objectives_have_no_sensitivity() {
        let base = Candidate::new("all", vector([0.7; 5]));
        let report = optimizer().optimize(&base, &[]);
        assert!(report.sensitivity.entries.iter().all(|e| e.magnitude() < 1e-12));
    }

    #[test]
    fn weak_objectives_become_recommendations() {
        let base = Candidate::new("all", vector([0.4, 0.9, 0.3, 0.9, 0.9]));
        let report = optimizer().optimize(&base, &[]);
        let weak: Vec<_> = report
            .recommendations
            .iter()
            .filter_map(|r| match r {
                Recommendation::ImproveObjective { objective, .. } => Some(*objective),
                _ => None,
            })
            .collect();
        assert_eq!(weak, [Objective::Confidence, Objective::Consistency]);
        assert!(report.recommendations[0].message().contains("0.40"));
    }

    #[test]
    fn conflicts_become_recommendations() {
        let mut base = Candidate::new("all", vector([0.9; 5]));
        base.conflicts.push(RelationshipConflict {
            source_type: "mass_spec".into(),
            target_type: "genomics".into(),
            relation_kind: RelationKind::Contradicts,
            strength: 0.8,
            compatibility: 0.1,
            agreement: "conflicting".into(),
        });
        let report = optimizer().optimize(&base, &[]);
        assert_eq!(report.recommendations.len(), 1);
        assert!(report.recommendations[0].message().contains("mass_spec"));
    }

    #[test]
    fn bad_delta_is_rejected() {
        assert!(Optimizer::new(ObjectiveWeights::default(), Constraints::default(), 0.0).is_err());
    }
}
