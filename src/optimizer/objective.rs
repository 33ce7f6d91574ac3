//! # Objetivos de Qualidade
//!
//! Cinco objetivos, todos orientados para **maior é melhor**:
//!
//! | Objetivo | Valor | Peso padrão |
//! |----------|-------|-------------|
//! | `confidence` | escore geral | 0.30 |
//! | `uncertainty` | `1 − largura da banda` | 0.20 |
//! | `consistency` | consistência entre tipos relacionados | 0.25 |
//! | `conflicts` | `1 − escore de conflito` | 0.15 |
//! | `network_coherence` | coerência topológica | 0.10 |
//!
//! Os pesos não precisam somar 1; são normalizados antes do uso.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::inference::PosteriorAssessment;

/// Pesos nomeados dos objetivos (≥ 0, soma positiva).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveWeights {
    /// Peso do escore geral.
    pub maximize_confidence: f64,
    /// Peso de `1 − largura da banda`.
    pub minimize_uncertainty: f64,
    pub maximize_consistency: f64,
    /// Peso de `1 − escore de conflito`.
    pub minimize_conflicts: f64,
    pub maximize_network_coherence: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            maximize_confidence: 0.30,
            minimize_uncertainty: 0.20,
            maximize_consistency: 0.25,
            minimize_conflicts: 0.15,
            maximize_network_coherence: 0.10,
        }
    }
}

impl ObjectiveWeights {
    /// Pesos na ordem de [`Objective::ALL`].
    pub fn as_array(&self) -> [f64; 5] {
        [
            self.maximize_confidence,
            self.minimize_uncertainty,
            self.maximize_consistency,
            self.minimize_conflicts,
            self.maximize_network_coherence,
        ]
    }

    /// Confere os pesos antes de qualquer cálculo.
    ///
    /// # Erros
    ///
    /// [`EngineError::Configuration`] para peso negativo ou não finito, e
    /// para soma nula ou que estoura para infinito.
    pub fn validate(&self) -> Result<()> {
        for (objective, w) in Objective::ALL.iter().zip(self.as_array()) {
            if !w.is_finite() || w < 0.0 {
                return Err(EngineError::config(format!(
                    "peso de {} deve ser finito e ≥ 0, recebido {w}",
                    objective.name()
                )));
            }
        }
        let total: f64 = self.as_array().iter().sum();
        if !total.is_finite() {
            return Err(EngineError::config(format!(
                "a soma dos pesos dos objetivos deve ser finita, recebido {total}"
            )));
        }
        if total <= 0.0 {
            return Err(EngineError::config("a soma dos pesos dos objetivos deve ser positiva"));
        }
        Ok(())
    }

    /// Pesos divididos pela soma; `None` se a soma não for finita e positiva.
    pub fn normalized(&self) -> Option<[f64; 5]> {
        normalize(self.as_array())
    }
}

/// Divide pela soma; `None` se ela não for finita e positiva.
pub(crate) fn normalize(mut w: [f64; 5]) -> Option<[f64; 5]> {
    let total: f64 = w.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return None;
    }
    for x in &mut w {
        *x /= total;
    }
    Some(w)
}

/// Um dos cinco objetivos, na ordem usada pelos vetores de pesos.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    Confidence,
    Uncertainty,
    Consistency,
    Conflicts,
    NetworkCoherence,
}

impl Objective {
    pub const ALL: [Objective; 5] = [
        Objective::Confidence,
        Objective::Uncertainty,
        Objective::Consistency,
        Objective::Conflicts,
        Objective::NetworkCoherence,
    ];

    /// Nome estável, usado em serialização e mensagens de erro.
    pub fn name(self) -> &'static str {
        match self {
            Objective::Confidence => "confidence",
            Objective::Uncertainty => "uncertainty",
            Objective::Consistency => "consistency",
            Objective::Conflicts => "conflicts",
            Objective::NetworkCoherence => "network_coherence",
        }
    }

    /// Rótulo legível para recomendações.
    pub fn label(self) -> &'static str {
        match self {
            Objective::Confidence => "confiança",
            Objective::Uncertainty => "incerteza",
            Objective::Consistency => "consistência",
            Objective::Conflicts => "conflitos",
            Objective::NetworkCoherence => "coerência da rede",
        }
    }

    fn index(self) -> usize {
        match self {
            Objective::Confidence => 0,
            Objective::Uncertainty => 1,
            Objective::Consistency => 2,
            Objective::Conflicts => 3,
            Objective::NetworkCoherence => 4,
        }
    }
}

/// Valores dos cinco objetivos para uma avaliação, todos em `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveVector {
    pub confidence: f64,
    pub uncertainty: f64,
    pub consistency: f64,
    pub conflicts: f64,
    pub network_coherence: f64,
}

impl ObjectiveVector {
    /// Extrai os objetivos de uma avaliação; incerteza e conflito são invertidos.
    pub fn from_assessment(a: &PosteriorAssessment) -> Self {
        Self {
            confidence: a.overall_score,
            uncertainty: (1.0 - a.uncertainty_spread()).clamp(0.0, 1.0),
            consistency: a.consistency_score,
            conflicts: (1.0 - a.conflict_score).clamp(0.0, 1.0),
            network_coherence: a.coherence_score,
        }
    }

    /// Valores na ordem de [`Objective::ALL`].
    pub fn as_array(&self) -> [f64; 5] {
        [
            self.confidence,
            self.uncertainty,
            self.consistency,
            self.conflicts,
            self.network_coherence,
        ]
    }

    pub fn get(&self, objective: Objective) -> f64 {
        self.as_array()[objective.index()]
    }

    /// Largura da banda de incerteza de origem.
    pub fn uncertainty_spread(&self) -> f64 {
        1.0 - self.uncertainty
    }

    /// `Σ wₖ·objₖ` com pesos já normalizados.
    pub fn weighted(&self, normalized: &[f64; 5]) -> f64 {
        self.as_array()
            .iter()
            .zip(normalized)
            .map(|(v, w)| v * w)
            .sum()
    }

    /// `self` é ≥ em todos os objetivos e > em pelo menos um.
    pub fn dominates(&self, other: &ObjectiveVector) -> bool {
        let a = self.as_array();
        let b = other.as_array();
        let no_worse = a.iter().zip(&b).all(|(x, y)| x >= y);
        let better = a.iter().zip(&b).any(|(x, y)| x > y);
        no_worse && better
    }
}

/// Restrições opcionais de viabilidade.
///
/// Um candidato que viola qualquer restrição fica fora do ótimo e da
/// fronteira de Pareto.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constraints {
    /// Escore geral mínimo, em `[0, 1]`.
    pub min_confidence: Option<f64>,
    /// Largura máxima da banda de incerteza, em `[0, 1]`.
    pub max_uncertainty_spread: Option<f64>,
}

impl Constraints {
    /// # Erros
    ///
    /// [`EngineError::Configuration`] para limite não finito ou fora de `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        for (name, bound) in [
            ("min_confidence", self.min_confidence),
            ("max_uncertainty_spread", self.max_uncertainty_spread),
        ] {
            if let Some(x) = bound {
                if !x.is_finite() || !(0.0..=1.0).contains(&x) {
                    return Err(EngineError::config(format!("{name} fora de [0, 1]: {x}")));
                }
            }
        }
        Ok(())
    }

    /// `true` se `v` respeita todas as restrições presentes.
    pub fn admits(&self, v: &ObjectiveVector) -> bool {
        self.min_confidence.map_or(true, |min| v.confidence >= min)
            && self
                .max_uncertainty_spread
                .map_or(true, |max| v.uncertainty_spread() <= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::Optimizer;

    fn vector(xs: [f64; 5]) -> ObjectiveVector {
        ObjectiveVector {
            confidence: xs[0],
            uncertainty: xs[1],
            consistency: xs[2],
            conflicts: xs[3],
            network_coherence: xs[4],
        }
    }

    #[test]
    fn default_weights_are_valid_and_sum_to_one() {
        let w = ObjectiveWeights::default();
        assert!(w.validate().is_ok());
        let n = w.normalized().unwrap();
        assert!((n.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn weights_need_not_sum_to_one() {
        let w = ObjectiveWeights {
            maximize_confidence: 3.0,
            minimize_uncertainty: 1.0,
            maximize_consistency: 0.0,
            minimize_conflicts: 0.0,
            maximize_network_coherence: 0.0,
        };
        assert!(w.validate().is_ok());
        assert_eq!(w.normalized().unwrap(), [0.75, 0.25, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn negative_or_all_zero_weights_are_rejected() {
        let negative = ObjectiveWeights {
            minimize_conflicts: -0.1,
            ..Default::default()
        };
        assert!(matches!(negative.validate(), Err(EngineError::Configuration(_))));

        let zero = ObjectiveWeights {
            maximize_confidence: 0.0,
            minimize_uncertainty: 0.0,
            maximize_consistency: 0.0,
            minimize_conflicts: 0.0,
            maximize_network_coherence: 0.0,
        };
        assert!(zero.validate().is_err());
        assert!(zero.normalized().is_none());
    }

    #[test]
    fn overflowing_weight_sum_is_rejected() {
        let huge = ObjectiveWeights {
            maximize_confidence: f64::MAX,
            minimize_uncertainty: f64::MAX,
            ..Default::default()
        };
        assert!(matches!(huge.validate(), Err(EngineError::Configuration(_))));
        assert!(huge.normalized().is_none());
        assert!(Optimizer::new(huge, Constraints::default(), 0.1).is_err());
    }

    #[test]
    fn dominance_is_strict() {
        let a = vector([0.8, 0.5, 0.5, 0.5, 0.5]);
        let b = vector([0.7, 0.5, 0.5, 0.5, 0.5]);
        assert!(a.dominates(&b));
        assert!(!b.dominates(&a));
        assert!(!a.dominates(&a));

        let c = vector([0.9, 0.1, 0.5, 0.5, 0.5]);
        assert!(!a.dominates(&c) && !c.dominates(&a));
    }

    #[test]
    fn constraints_filter_candidates() {
        let c = Constraints {
            min_confidence: Some(0.6),
            max_uncertainty_spread: Some(0.3),
        };
        assert!(c.admits(&vector([0.7, 0.8, 0.5, 0.5, 0.5])));
        assert!(!c.admits(&vector([0.5, 0.8, 0.5, 0.5, 0.5])));
        assert!(!c.admits(&vector([0.7, 0.6, 0.5, 0.5, 0.5])));
        assert!(Constraints { min_confidence: Some(1.5), ..Default::default() }
            .validate()
            .is_err());
    }
}
