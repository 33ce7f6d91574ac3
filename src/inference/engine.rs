//! # Motor Fuzzy-Bayesiano
//!
//! Funde as evidências de **uma** molécula em uma avaliação posterior:
//! escore pontual, banda de incerteza e decomposição linguística.
//!
//! ## Pipeline
//!
//! ```text
//! itens ──┬─ decay_weight(idade)                       (paralelo por item)
//!         ├─ fuzzify(valor) → defuzz
//!         └─ L = 0.5 + (defuzz − 0.5)·(1 − u)·decay
//!                     │
//! grafo ── prior por tipo: P = 0.5 + (pred − 0.5)·peso   (paralelo por tipo)
//!                     │
//!          posterior = L·P / (L·P + (1 − L)(1 − P))
//!                     │
//!          escore = Σ wᵢ·postᵢ / Σ wᵢ,   wᵢ = decay·(1 − u)·peso_evidência
//!                     │
//!          banda, decomposição linguística, consistência
//! ```
//!
//! A fusão é uma **aproximação ponderada** de atualização bayesiana para
//! escores contínuos. Não é uma densidade de probabilidade e não deve
//! ser interpretada como tal.
//!
//! ## Monotonicidade
//!
//! O prior de um tipo só segue caminhos do grafo que preservam o valor, e
//! o peso de cada caminho não depende dos valores observados. Elevar o
//! valor de um item sobe a sua verossimilhança sem baixar nenhum prior.
//! Arestas `contradicts` entram pelo escore de conflito.
//!
//! ## Determinismo
//!
//! O trabalho por item e por tipo roda em paralelo com `rayon`, mas as
//! reduções são feitas em sequência sobre vetores na ordem de entrada:
//! mesma entrada e mesmo snapshot ⇒ saída idêntica bit a bit.
//!
//! ## Casos de Borda
//!
//! | Entrada | Resultado |
//! |---------|-----------|
//! | nenhum item | escore 0.5, banda `[0, 1]` |
//! | um item | banda `± incerteza`, aviso `LowCorroboration` |
//! | todos os pesos zero | pesos uniformes, aviso `UniformWeights` |

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::consistency::{self, ConsistencyReport, RelationshipConflict, TypeObservation};
use crate::config::{InferenceConfig, PredictionConfig};
use crate::core::{
    EvidenceItem, LinguisticRegistry, MembershipVector, TemporalAnomaly, TemporalDecay,
};
use crate::error::{EngineError, Result};
use crate::graph::{ContextValue, GraphSnapshot, TopologyStats};

/// Prazo cooperativo, verificado nas fronteiras entre estágios.
#[derive(Clone, Copy, Debug, Default)]
pub struct Deadline {
    expires_at: Option<Instant>,
}

impl Deadline {
    /// Sem prazo.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn after(duration: Duration) -> Self {
        Self {
            expires_at: Some(Instant::now() + duration),
        }
    }

    pub fn from_millis(ms: Option<u64>) -> Self {
        ms.map_or_else(Self::none, |ms| Self::after(Duration::from_millis(ms)))
    }

    /// Tempo restante (`None` sem prazo).
    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|t| t.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|t| Instant::now() >= t)
    }

    /// Falha com [`EngineError::DeadlineExceeded`] se o prazo passou.
    pub fn check(&self, stage: &'static str) -> Result<()> {
        if self.is_expired() {
            tracing::warn!(stage, "prazo excedido, abortando avaliação");
            return Err(EngineError::DeadlineExceeded { stage });
        }
        Ok(())
    }
}

/// Avisos não fatais anexados a uma avaliação.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssessmentWarning {
    /// Avaliação baseada em um único item: sem validação cruzada.
    LowCorroboration { item_id: String },
    /// Todos os pesos de agregação eram zero; usados pesos uniformes.
    UniformWeights,
}

/// Origem do prior de um tipo.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriorSource {
    /// Sem sinal do grafo: prior neutro.
    Neutral,
    /// Predito pelo grafo a partir dos outros tipos presentes.
    Graph {
        predicted_value: f64,
        weight: f64,
        paths: usize,
    },
}

/// Confiança detalhada de um item de evidência.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvidenceContribution {
    pub item_id: String,
    pub evidence_type: String,
    pub value: f64,
    pub uncertainty: f64,
    pub age_days: f64,
    pub decay_weight: f64,
    /// `(1 − u)·decay`.
    pub reliability: f64,
    pub memberships: MembershipVector,
    pub defuzzified: f64,
    pub likelihood: f64,
    pub prior: f64,
    pub prior_source: PriorSource,
    pub posterior: f64,
    /// Peso normalizado na agregação (soma 1 entre os itens).
    pub weight: f64,
    /// `weight · posterior`; a soma entre os itens é o escore geral.
    pub contribution_score: f64,
}

/// Resultado do motor para uma molécula.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PosteriorAssessment {
    pub overall_score: f64,
    pub uncertainty_bounds: (f64, f64),
    pub linguistic_assessment: MembershipVector,
    pub dominant_category: Option<String>,
    pub contributions: Vec<EvidenceContribution>,
    pub consistency_score: f64,
    pub coherence_score: f64,
    pub conflict_score: f64,
    pub conflicts: Vec<RelationshipConflict>,
    /// Topologia do subgrafo de relações entre os tipos presentes.
    pub subgraph: TopologyStats,
    pub warnings: Vec<AssessmentWarning>,
    pub temporal_anomalies: Vec<TemporalAnomaly>,
    pub graph_version: u64,
}

impl PosteriorAssessment {
    /// Largura da banda de incerteza.
    pub fn uncertainty_spread(&self) -> f64 {
        self.uncertainty_bounds.1 - self.uncertainty_bounds.0
    }

    pub fn has_low_corroboration(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, AssessmentWarning::LowCorroboration { .. }))
    }
}

/// Avaliação intermediária de um item (antes do prior).
struct ItemEval {
    age_days: f64,
    decay_weight: f64,
    anomaly: Option<TemporalAnomaly>,
    memberships: MembershipVector,
    defuzzified: f64,
    reliability: f64,
    likelihood: f64,
}

/// Motor de inferência, sem estado mutável, seguro entre threads.
#[derive(Clone, Debug)]
pub struct FuzzyBayesianEngine {
    linguistic: LinguisticRegistry,
    agreement: LinguisticRegistry,
    decay: TemporalDecay,
    inference: InferenceConfig,
    prediction: PredictionConfig,
}

impl Default for FuzzyBayesianEngine {
    fn default() -> Self {
        Self::new(
            LinguisticRegistry::standard(),
            TemporalDecay::default(),
            InferenceConfig::default(),
            PredictionConfig::default(),
        )
    }
}

impl FuzzyBayesianEngine {
    pub fn new(
        linguistic: LinguisticRegistry,
        decay: TemporalDecay,
        inference: InferenceConfig,
        prediction: PredictionConfig,
    ) -> Self {
        Self {
            linguistic,
            agreement: LinguisticRegistry::agreement(),
            decay,
            inference,
            prediction,
        }
    }

    pub fn linguistic(&self) -> &LinguisticRegistry {
        &self.linguistic
    }

    pub fn decay(&self) -> &TemporalDecay {
        &self.decay
    }

    /// Avalia os itens de uma molécula contra um snapshot do grafo.
    ///
    /// `evidence_weights` multiplica o peso de agregação por id de item
    /// (ausente = 1.0). Itens já devem estar validados.
    ///
    /// # Erros
    ///
    /// Apenas [`EngineError::DeadlineExceeded`]; nenhum resultado parcial é devolvido.
    pub fn assess(
        &self,
        items: &[EvidenceItem],
        snapshot: &GraphSnapshot,
        now: DateTime<Utc>,
        evidence_weights: &BTreeMap<String, f64>,
        deadline: &Deadline,
    ) -> Result<PosteriorAssessment> {
        deadline.check("fuzzify")?;
        if items.is_empty() {
            return Ok(self.neutral(snapshot));
        }

        let evals: Vec<ItemEval> = items
            .par_iter()
            .map(|item| self.evaluate_item(item, now))
            .collect();

        deadline.check("priors")?;
        let priors = self.priors(items, snapshot);

        deadline.check("aggregate")?;
        let neutral = self.inference.neutral_prior;
        let posteriors: Vec<(f64, PriorSource, f64)> = items
            .iter()
            .zip(&evals)
            .map(|(item, eval)| {
                let (prior, source) = priors
                    .get(item.evidence_type.as_str())
                    .cloned()
                    .unwrap_or((neutral, PriorSource::Neutral));
                (prior, source, fuse(eval.likelihood, prior))
            })
            .collect();

        let mut warnings = Vec::new();
        let raw_weights: Vec<f64> = items
            .iter()
            .zip(&evals)
            .map(|(item, eval)| {
                let multiplier = evidence_weights
                    .get(&item.id)
                    .copied()
                    .filter(|w| w.is_finite() && *w >= 0.0)
                    .unwrap_or(1.0);
                eval.reliability * multiplier
            })
            .collect();
        let weight_sum: f64 = raw_weights.iter().sum();
        let weights: Vec<f64> = if weight_sum > 0.0 {
            raw_weights.iter().map(|w| w / weight_sum).collect()
        } else {
            warnings.push(AssessmentWarning::UniformWeights);
            vec![1.0 / items.len() as f64; items.len()]
        };

        let overall_score = weights
            .iter()
            .zip(&posteriors)
            .map(|(w, (_, _, p))| w * p)
            .sum::<f64>()
            .clamp(0.0, 1.0);

        let uncertainty_bounds = if items.len() == 1 {
            warnings.push(AssessmentWarning::LowCorroboration {
                item_id: items[0].id.clone(),
            });
            let u = items[0].uncertainty;
            ((overall_score - u).max(0.0), (overall_score + u).min(1.0))
        } else {
            let variance: f64 = weights
                .iter()
                .zip(&posteriors)
                .map(|(w, (_, _, p))| w * (p - overall_score).powi(2))
                .sum();
            let mean_uncertainty: f64 = weights
                .iter()
                .zip(items)
                .map(|(w, item)| w * item.uncertainty)
                .sum();
            let spread = variance.sqrt() + mean_uncertainty / (items.len() as f64).sqrt();
            ((overall_score - spread).max(0.0), (overall_score + spread).min(1.0))
        };

        deadline.check("consistency")?;
        let report = self.consistency(items, snapshot);

        let linguistic_assessment = self.linguistic.fuzzify(overall_score);
        let dominant_category = linguistic_assessment
            .dominant()
            .map(|(name, _)| name.to_string());

        let mut temporal_anomalies = Vec::new();
        let mut contributions = Vec::with_capacity(items.len());
        for (((item, eval), (prior, source, posterior)), weight) in items
            .iter()
            .zip(evals)
            .zip(posteriors)
            .zip(weights)
        {
            if let Some(anomaly) = eval.anomaly {
                temporal_anomalies.push(anomaly);
            }
            contributions.push(EvidenceContribution {
                item_id: item.id.clone(),
                evidence_type: item.evidence_type.clone(),
                value: item.value,
                uncertainty: item.uncertainty,
                age_days: eval.age_days,
                decay_weight: eval.decay_weight,
                reliability: eval.reliability,
                memberships: eval.memberships,
                defuzzified: eval.defuzzified,
                likelihood: eval.likelihood,
                prior,
                prior_source: source,
                posterior,
                weight,
                contribution_score: weight * posterior,
            });
        }

        Ok(PosteriorAssessment {
            overall_score,
            uncertainty_bounds,
            linguistic_assessment,
            dominant_category,
            contributions,
            consistency_score: report.consistency_score,
            coherence_score: report.coherence_score,
            conflict_score: report.conflict_score,
            conflicts: report.conflicts,
            subgraph: report.topology,
            warnings,
            temporal_anomalies,
            graph_version: snapshot.version(),
        })
    }

    /// Compatibilidade dos valores observados (média por tipo) com as
    /// arestas do subgrafo induzido.
    pub fn consistency(&self, items: &[EvidenceItem], snapshot: &GraphSnapshot) -> ConsistencyReport {
        consistency::evaluate(&self.observations(items), snapshot, &self.agreement)
    }

    /// Avaliação neutra, maximamente incerta (nenhuma evidência).
    fn neutral(&self, snapshot: &GraphSnapshot) -> PosteriorAssessment {
        let score = self.inference.neutral_prior;
        let report = consistency::evaluate(&BTreeMap::new(), snapshot, &self.agreement);
        let linguistic_assessment = self.linguistic.fuzzify(score);
        PosteriorAssessment {
            overall_score: score,
            uncertainty_bounds: (0.0, 1.0),
            dominant_category: linguistic_assessment
                .dominant()
                .map(|(name, _)| name.to_string()),
            linguistic_assessment,
            contributions: Vec::new(),
            consistency_score: report.consistency_score,
            coherence_score: report.coherence_score,
            conflict_score: report.conflict_score,
            conflicts: Vec::new(),
            subgraph: report.topology,
            warnings: Vec::new(),
            temporal_anomalies: Vec::new(),
            graph_version: snapshot.version(),
        }
    }

    fn evaluate_item(&self, item: &EvidenceItem, now: DateTime<Utc>) -> ItemEval {
        let outcome = self
            .decay
            .evaluate(&item.id, &item.evidence_type, item.timestamp, now);
        let memberships = self.linguistic.fuzzify_for(&item.evidence_type, item.value);
        let defuzzified = self
            .linguistic
            .defuzzify(&item.evidence_type, &memberships)
            .unwrap_or(item.value);
        let reliability = (1.0 - item.uncertainty) * outcome.weight;
        let likelihood = (0.5 + (defuzzified - 0.5) * reliability).clamp(0.0, 1.0);
        ItemEval {
            age_days: outcome.age_days,
            decay_weight: outcome.weight,
            anomaly: outcome.anomaly,
            memberships,
            defuzzified,
            reliability,
            likelihood,
        }
    }

    /// Prior por tipo, predito a partir dos **outros** tipos presentes.
    fn priors(&self, items: &[EvidenceItem], snapshot: &GraphSnapshot) -> BTreeMap<String, (f64, PriorSource)> {
        if !self.inference.use_graph_priors || snapshot.is_empty() {
            return BTreeMap::new();
        }
        let types: Vec<&str> = {
            let mut t: Vec<&str> = items.iter().map(|i| i.evidence_type.as_str()).collect();
            t.sort_unstable();
            t.dedup();
            t
        };
        let context: Vec<ContextValue> = items
            .iter()
            .map(|i| ContextValue::new(i.evidence_type.clone(), i.value, i.uncertainty))
            .collect();
        let neutral = self.inference.neutral_prior;

        types
            .par_iter()
            .map(|ty| {
                let prior = match snapshot.prior_signal(ty, &context, &self.prediction) {
                    Some(signal) => (
                        (neutral + (signal.predicted_value - neutral) * signal.weight).clamp(0.0, 1.0),
                        PriorSource::Graph {
                            predicted_value: signal.predicted_value,
                            weight: signal.weight,
                            paths: signal.paths,
                        },
                    ),
                    None => (neutral, PriorSource::Neutral),
                };
                (ty.to_string(), prior)
            })
            .collect::<Vec<_>>()
            .into_iter()
            .collect()
    }

    /// Valor médio observado por tipo, para a verificação de consistência.
    fn observations(&self, items: &[EvidenceItem]) -> BTreeMap<String, TypeObservation> {
        let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
        for item in items {
            let entry = sums.entry(item.evidence_type.as_str()).or_insert((0.0, 0));
            entry.0 += item.value;
            entry.1 += 1;
        }
        sums.into_iter()
            .map(|(ty, (sum, n))| {
                let value = sum / n as f64;
                (
                    ty.to_string(),
                    TypeObservation {
                        evidence_type: ty.to_string(),
                        value,
                        memberships: self.linguistic.fuzzify(value),
                    },
                )
            })
            .collect()
    }
}

/// `L·P / (L·P + (1 − L)(1 − P))`, 0.5 quando o denominador se anula.
pub fn fuse(likelihood: f64, prior: f64) -> f64 {
    let numerator = likelihood * prior;
    let denominator = numerator + (1.0 - likelihood) * (1.0 - prior);
    if denominator > 0.0 {
        (numerator / denominator).clamp(0.0, 1.0)
    } else {
        0.5
    }
}
