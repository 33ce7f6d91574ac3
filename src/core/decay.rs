//! # Decaimento Temporal — Evidência Envelhece
//!
//! Evidências antigas pesam menos. O peso segue uma meia-vida exponencial:
//!
//! ```text
//! decay_weight(age) = 0.5 ^ (age_days / half_life_days)
//!
//! peso
//! 1.0 ┤●
//!     │  ●
//! 0.5 ┤      ●            (age = half_life)
//!     │           ●
//! 0.25┤                 ● (age = 2·half_life)
//!     └──────────────────── idade (dias)
//! ```
//!
//! ## Timestamps no Futuro
//!
//! Idades negativas (timestamp posterior ao instante de avaliação) **não**
//! são erro: são tratadas como idade zero (peso total) e sinalizadas com
//! um [`TemporalAnomaly`] para o chamador.
//!
//! ## Meia-vida por Tipo
//!
//! A meia-vida padrão é configurável ([`TemporalDecay::new`]) e cada tipo
//! de evidência pode ter sua própria ([`TemporalDecay::with_override`]).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Meia-vida padrão em dias.
pub const DEFAULT_HALF_LIFE_DAYS: f64 = 30.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Peso de decaimento `0.5^(age/half_life)`, em `(0, 1]`.
///
/// Idades negativas ou não finitas contam como zero.
pub fn decay_weight(age_days: f64, half_life_days: f64) -> f64 {
    let age = if age_days.is_finite() { age_days.max(0.0) } else { 0.0 };
    let weight = 0.5_f64.powf(age / half_life_days);
    // Idades enormes sofrem underflow para 0.0; o contrato é (0, 1].
    weight.max(f64::MIN_POSITIVE)
}

/// Diagnóstico não fatal: timestamp posterior ao instante de avaliação.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemporalAnomaly {
    pub item_id: String,
    pub timestamp: DateTime<Utc>,
    pub evaluated_at: DateTime<Utc>,
    /// Quantos dias no futuro o item está.
    pub skew_days: f64,
}

/// Resultado da avaliação temporal de um item.
#[derive(Clone, Debug, PartialEq)]
pub struct DecayOutcome {
    pub age_days: f64,
    pub weight: f64,
    pub anomaly: Option<TemporalAnomaly>,
}

/// Modelo de decaimento com meia-vida padrão e overrides por tipo.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TemporalDecay {
    half_life_days: f64,
    #[serde(default)]
    overrides: BTreeMap<String, f64>,
}

impl Default for TemporalDecay {
    fn default() -> Self {
        Self {
            half_life_days: DEFAULT_HALF_LIFE_DAYS,
            overrides: BTreeMap::new(),
        }
    }
}

impl TemporalDecay {
    /// Cria o modelo com uma meia-vida padrão.
    ///
    /// # Erros
    ///
    /// [`EngineError::Configuration`] se a meia-vida não for finita e positiva.
    pub fn new(half_life_days: f64) -> Result<Self> {
        check_half_life("padrão", half_life_days)?;
        Ok(Self {
            half_life_days,
            overrides: BTreeMap::new(),
        })
    }

    /// Define uma meia-vida específica para um tipo de evidência.
    pub fn with_override(mut self, evidence_type: impl Into<String>, half_life_days: f64) -> Result<Self> {
        let evidence_type = evidence_type.into();
        check_half_life(&evidence_type, half_life_days)?;
        self.overrides.insert(evidence_type, half_life_days);
        Ok(self)
    }

    pub fn default_half_life(&self) -> f64 {
        self.half_life_days
    }

    /// Meia-vida efetiva para um tipo.
    pub fn half_life_for(&self, evidence_type: &str) -> f64 {
        self.overrides
            .get(evidence_type)
            .copied()
            .unwrap_or(self.half_life_days)
    }

    /// Calcula idade, peso e eventual anomalia de um item.
    pub fn evaluate(
        &self,
        item_id: &str,
        evidence_type: &str,
        timestamp: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> DecayOutcome {
        let raw_age = age_in_days(timestamp, now);
        let anomaly = if raw_age < 0.0 {
            tracing::debug!(item = %item_id, skew_days = -raw_age, "anomalia temporal: timestamp no futuro");
            Some(TemporalAnomaly {
                item_id: item_id.to_string(),
                timestamp,
                evaluated_at: now,
                skew_days: -raw_age,
            })
        } else {
            None
        };
        let age_days = raw_age.max(0.0);
        DecayOutcome {
            age_days,
            weight: decay_weight(age_days, self.half_life_for(evidence_type)),
            anomaly,
        }
    }

    /// Revalida meias-vidas (após desserializar).
    pub fn validate(&self) -> Result<()> {
        check_half_life("padrão", self.half_life_days)?;
        for (ty, hl) in &self.overrides {
            check_half_life(ty, *hl)?;
        }
        Ok(())
    }
}

/// Idade em dias fracionários (negativa quando `timestamp > now`).
pub fn age_in_days(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - timestamp).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY
}

fn check_half_life(label: &str, half_life_days: f64) -> Result<()> {
    if !half_life_days.is_finite() || half_life_days <= 0.0 {
        return Err(EngineError::config(format!(
            "meia-vida '{label}' deve ser positiva, recebido {half_life_days}"
        )));
    }
    Ok(())
}
