//! # Configuração do Motor
//!
//! [`EngineConfig`] reúne todos os parâmetros numéricos do motor. Cada
//! seção usa `#[serde(default)]`, então um TOML parcial é suficiente:
//!
//! ```toml
//! deadline_ms = 2000
//!
//! [decay]
//! half_life_days = 45.0
//! per_type = { literature = 365.0 }
//!
//! [prediction]
//! max_hops = 2
//! ```
//!
//! ## Padrões
//!
//! | Seção | Parâmetro | Padrão |
//! |-------|-----------|--------|
//! | `decay` | `half_life_days` | 30 |
//! | `graph` | `learning_rate` (≤ 0.5) | 0.2 |
//! | `graph` | `min_edge_strength` | 0.1 |
//! | `prediction` | `max_hops` | 3 |
//! | `prediction` | `hop_penalty` | 0.1 |
//! | `prediction` | `confidence_threshold` | 0.0 |
//! | `prediction` | `max_predictions` | 10 |
//! | `inference` | `neutral_prior` | 0.5 |
//! | `inference` | `use_graph_priors` | true |
//! | `optimizer` | `weights` | 0.30 / 0.20 / 0.25 / 0.15 / 0.10 |
//! | `optimizer` | `sensitivity_delta` | 0.1 |
//!
//! [`EngineConfig::validate`] rejeita valores malformados **antes** de
//! qualquer cálculo.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{LinguisticRegistry, LinguisticVariable, TemporalDecay};
use crate::error::{EngineError, Result};
use crate::optimizer::ObjectiveWeights;

/// Limite superior da taxa de aprendizado.
pub const MAX_LEARNING_RATE: f64 = 0.5;

/// Maior número de saltos aceito na caminhada de predição.
pub const MAX_HOPS_LIMIT: usize = 8;

/// Configuração completa do motor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub decay: DecayConfig,
    pub graph: GraphConfig,
    pub inference: InferenceConfig,
    pub optimizer: OptimizerConfig,
    pub prediction: PredictionConfig,
    /// Prazo padrão por requisição, em milissegundos.
    pub deadline_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayConfig {
    pub half_life_days: f64,
    /// Meias-vidas específicas por tipo de evidência (dias).
    pub per_type: BTreeMap<String, f64>,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            half_life_days: crate::core::decay::DEFAULT_HALF_LIFE_DAYS,
            per_type: BTreeMap::new(),
        }
    }
}

impl DecayConfig {
    /// Constrói o modelo de decaimento (valida as meias-vidas).
    pub fn build(&self) -> Result<TemporalDecay> {
        let mut model = TemporalDecay::new(self.half_life_days)?;
        for (ty, hl) in &self.per_type {
            model = model.with_override(ty.clone(), *hl)?;
        }
        Ok(model)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub learning_rate: f64,
    /// Sinal mínimo para criar uma aresta nova.
    pub min_edge_strength: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.2,
            min_edge_strength: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    pub max_hops: usize,
    /// Incerteza extra por salto além do primeiro.
    pub hop_penalty: f64,
    pub confidence_threshold: f64,
    pub max_predictions: usize,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            max_hops: 3,
            hop_penalty: 0.1,
            confidence_threshold: 0.0,
            max_predictions: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub neutral_prior: f64,
    /// Desligado, todo prior é neutro (útil para isolar a verossimilhança).
    pub use_graph_priors: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            neutral_prior: 0.5,
            use_graph_priors: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub weights: ObjectiveWeights,
    pub sensitivity_delta: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            weights: ObjectiveWeights::default(),
            sensitivity_delta: 0.1,
        }
    }
}

impl EngineConfig {
    /// Lê e valida um arquivo TOML.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Interpreta e valida um TOML em memória.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejeita parâmetros fora de faixa com [`EngineError::Configuration`].
    pub fn validate(&self) -> Result<()> {
        self.decay.build()?;

        let g = &self.graph;
        if !(g.learning_rate > 0.0 && g.learning_rate <= MAX_LEARNING_RATE) {
            return Err(EngineError::config(format!(
                "learning_rate deve estar em (0, {MAX_LEARNING_RATE}], recebido {}",
                g.learning_rate
            )));
        }
        unit("graph.min_edge_strength", g.min_edge_strength)?;

        let p = &self.prediction;
        if p.max_hops == 0 || p.max_hops > MAX_HOPS_LIMIT {
            return Err(EngineError::config(format!(
                "max_hops deve estar em 1..={MAX_HOPS_LIMIT}, recebido {}",
                p.max_hops
            )));
        }
        unit("prediction.hop_penalty", p.hop_penalty)?;
        unit("prediction.confidence_threshold", p.confidence_threshold)?;

        unit("inference.neutral_prior", self.inference.neutral_prior)?;

        self.optimizer.weights.validate()?;
        let delta = self.optimizer.sensitivity_delta;
        if !delta.is_finite() || delta <= 0.0 {
            return Err(EngineError::config(format!(
                "sensitivity_delta deve ser positivo, recebido {delta}"
            )));
        }
        if self.deadline_ms == Some(0) {
            return Err(EngineError::config("deadline_ms não pode ser zero"));
        }
        Ok(())
    }
}

fn unit(name: &str, x: f64) -> Result<()> {
    if x.is_finite() && (0.0..=1.0).contains(&x) {
        Ok(())
    } else {
        Err(EngineError::config(format!("{name} fora de [0, 1]: {x}")))
    }
}

/// Configuração fuzzy de uma requisição de integração.
///
/// Sem `variables`, usa as cinco categorias padrão; `per_type` acrescenta
/// variáveis por tipo de evidência. `half_life_days` sobrescreve a
/// meia-vida padrão só para esta requisição.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzyConfig {
    pub variables: Option<Vec<LinguisticVariable>>,
    pub per_type: BTreeMap<String, Vec<LinguisticVariable>>,
    pub half_life_days: Option<f64>,
}

impl FuzzyConfig {
    /// Monta o registro linguístico, validando cada variável.
    pub fn build_registry(&self) -> Result<LinguisticRegistry> {
        let mut registry = match &self.variables {
            None => LinguisticRegistry::standard(),
            Some(vars) => {
                let mut r = LinguisticRegistry::empty();
                for v in vars {
                    r.register(v.clone())?;
                }
                r
            }
        };
        for (ty, vars) in &self.per_type {
            for v in vars {
                registry.register_for_type(ty, v.clone())?;
            }
        }
        Ok(registry)
    }

    /// Modelo de decaimento efetivo: o do motor, com a meia-vida padrão
    /// trocada se a requisição pedir.
    pub fn build_decay(&self, base: &DecayConfig) -> Result<TemporalDecay> {
        match self.half_life_days {
            None => base.build(),
            Some(hl) => DecayConfig {
                half_life_days: hl,
                per_type: base.per_type.clone(),
            }
            .build(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MembershipFunction;

    #[test]
    fn defaults_are_valid() {
        let c = EngineConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.prediction.max_hops, 3);
        assert_eq!(c.decay.half_life_days, 30.0);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let c = EngineConfig::from_toml_str(
            r#"
            deadline_ms = 1500

            [decay]
            half_life_days = 45.0
            per_type = { literature = 365.0 }

            [prediction]
            max_hops = 2
            "#,
        )
        .unwrap();
        assert_eq!(c.deadline_ms, Some(1500));
        assert_eq!(c.prediction.max_hops, 2);
        assert_eq!(c.prediction.max_predictions, 10);
        assert_eq!(c.graph.learning_rate, 0.2);
        let decay = c.decay.build().unwrap();
        assert_eq!(decay.half_life_for("literature"), 365.0);
        assert_eq!(decay.half_life_for("genomics"), 45.0);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let too_fast = EngineConfig::from_toml_str("[graph]\nlearning_rate = 0.9\n");
        assert!(matches!(too_fast, Err(EngineError::Configuration(_))));
        let no_hops = EngineConfig::from_toml_str("[prediction]\nmax_hops = 0\n");
        assert!(no_hops.is_err());
        let bad_weight = EngineConfig::from_toml_str(
            "[optimizer.weights]\nmaximize_confidence = -1.0\n",
        );
        assert!(bad_weight.is_err());
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = EngineConfig::from_toml_str("deadline_ms = [").unwrap_err();
        assert!(matches!(err, EngineError::ConfigParse(_)));
    }

    #[test]
    fn fuzzy_config_custom_variables() {
        let fc = FuzzyConfig {
            variables: Some(vec![
                LinguisticVariable::new("weak", MembershipFunction::triangular(0.0, 0.0, 0.5)),
                LinguisticVariable::new("strong", MembershipFunction::triangular(0.5, 1.0, 1.0)),
            ]),
            ..Default::default()
        };
        let r = fc.build_registry().unwrap();
        assert_eq!(r.variables().len(), 2);

        let broken = FuzzyConfig {
            variables: Some(vec![LinguisticVariable::new(
                "bad",
                MembershipFunction::triangular(0.9, 0.1, 0.5),
            )]),
            ..Default::default()
        };
        assert!(broken.build_registry().is_err());
    }
}
