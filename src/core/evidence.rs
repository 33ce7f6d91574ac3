//! # Evidência — Medições Observadas Sobre uma Molécula
//!
//! Um [`EvidenceItem`] é **uma medição**: um valor em `[0, 1]` de um certo
//! tipo (ex: `spectral_match`), com incerteza, instante e proveniência.
//! Itens são imutáveis; correções chegam como novos itens, preservando
//! o histórico de auditoria.
//!
//! ## Duas Portas de Entrada
//!
//! | Entrada | Valores fora de `[0, 1]` | Tipo desconhecido |
//! |---------|--------------------------|-------------------|
//! | [`RawEvidence`] + [`EvidenceTypeRegistry::validate`] (ingestão) | `ValidationError` | `ValidationError` |
//! | [`EvidenceItem::new`] (construção programática) | limitados a `[0, 1]` | - |
//!
//! Em ambos os casos o invariante vale: todo `EvidenceItem` tem
//! `value` e `uncertainty` dentro de `[0, 1]`. Itens desserializados
//! (JSON de um provedor, por exemplo) passam pela mesma validação de
//! faixa que um [`RawEvidence`]; o tipo é conferido pelo motor com
//! [`EvidenceTypeRegistry::check_item`].
//!
//! ## Registro de Tipos
//!
//! Tipos de evidência não são strings livres comparadas por convenção:
//! o [`EvidenceTypeRegistry`] lista explicitamente os tipos aceitos, e
//! um tipo desconhecido vira erro detectável em vez de ser ignorado.
//!
//! | Tipo padrão | Descrição |
//! |-------------|-----------|
//! | `spectral_match` | Casamento de espectro (MS/MS) |
//! | `sequence_similarity` | Similaridade de sequência |
//! | `pathway_membership` | Pertencimento a via metabólica |
//! | `mass_spec` | Espectrometria de massa |
//! | `genomics` | Evidência genômica |
//! | `proteomics` | Evidência proteômica |
//! | `metabolomics` | Evidência metabolômica |
//! | `literature` | Menção na literatura |

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, Result};

/// Padrão aceito para identificadores de tipo de evidência.
pub const EVIDENCE_TYPE_PATTERN: &str = "^[a-z][a-z0-9_]*$";

/// Idade máxima aceita em `age_days` (~270 anos).
const MAX_AGE_DAYS: f64 = 100_000.0;

static TYPE_ID_REGEX: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();

/// Uma medição observada sobre uma molécula.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEvidence")]
pub struct EvidenceItem {
    pub id: String,
    pub evidence_type: String,
    /// Sempre em `[0, 1]`.
    pub value: f64,
    /// Sempre em `[0, 1]`.
    pub uncertainty: f64,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl EvidenceItem {
    /// Cria um item com id aleatório, instante atual e fonte `"unknown"`.
    ///
    /// `value` e `uncertainty` são limitados a `[0, 1]`. `NaN` vira
    /// valor 0 e incerteza 1 (o item não contribui com confiança).
    pub fn new(evidence_type: impl Into<String>, value: f64, uncertainty: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            evidence_type: evidence_type.into(),
            value: clamp_unit(value, 0.0),
            uncertainty: clamp_unit(uncertainty, 1.0),
            timestamp: Utc::now(),
            source: "unknown".to_string(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Desserialização estrita: faixa conferida, id gerado se ausente e
/// `age_days` relativo ao instante atual.
impl TryFrom<RawEvidence> for EvidenceItem {
    type Error = EngineError;

    fn try_from(raw: RawEvidence) -> Result<Self> {
        let id = raw.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
        build_item(&raw, id, Utc::now())
    }
}

fn clamp_unit(x: f64, nan_fallback: f64) -> f64 {
    if x.is_nan() {
        nan_fallback
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// Registro de evidência como chega da ingestão, ainda não validado.
///
/// O instante pode vir como `timestamp` absoluto ou como `age_days`
/// relativo ao instante de avaliação. Sem nenhum dos dois, a idade é zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawEvidence {
    #[serde(default)]
    pub id: Option<String>,
    pub evidence_type: String,
    pub value: f64,
    pub uncertainty: f64,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub age_days: Option<f64>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl RawEvidence {
    pub fn new(evidence_type: impl Into<String>, value: f64, uncertainty: f64) -> Self {
        Self {
            id: None,
            evidence_type: evidence_type.into(),
            value,
            uncertainty,
            timestamp: None,
            age_days: None,
            source: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_age_days(mut self, age_days: f64) -> Self {
        self.age_days = Some(age_days);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Identificador efetivo: o informado ou `"<tipo>#<posição>"`.
    pub fn effective_id(&self, index: usize) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| format!("{}#{}", self.evidence_type, index))
    }
}

/// Informações registradas para um tipo de evidência.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceTypeInfo {
    #[serde(default)]
    pub description: String,
    /// Meia-vida específica do tipo, em dias.
    #[serde(default)]
    pub half_life_days: Option<f64>,
}

/// Registro explícito dos tipos de evidência aceitos.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvidenceTypeRegistry {
    types: BTreeMap<String, EvidenceTypeInfo>,
}

impl Default for EvidenceTypeRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl EvidenceTypeRegistry {
    pub fn empty() -> Self {
        Self {
            types: BTreeMap::new(),
        }
    }

    /// Registro com os oito tipos padrão.
    pub fn standard() -> Self {
        let defaults = [
            ("spectral_match", "Casamento de espectro MS/MS"),
            ("sequence_similarity", "Similaridade de sequência"),
            ("pathway_membership", "Pertencimento a via metabólica"),
            ("mass_spec", "Espectrometria de massa"),
            ("genomics", "Evidência genômica"),
            ("proteomics", "Evidência proteômica"),
            ("metabolomics", "Evidência metabolômica"),
            ("literature", "Menção na literatura"),
        ];
        Self {
            types: defaults
                .into_iter()
                .map(|(id, description)| {
                    (
                        id.to_string(),
                        EvidenceTypeInfo {
                            description: description.to_string(),
                            half_life_days: None,
                        },
                    )
                })
                .collect(),
        }
    }

    /// Registra um novo tipo.
    ///
    /// # Erros
    ///
    /// [`EngineError::Configuration`] se o id não casar com
    /// [`EVIDENCE_TYPE_PATTERN`], se já existir, ou se a meia-vida for inválida.
    pub fn register(&mut self, id: impl Into<String>, info: EvidenceTypeInfo) -> Result<()> {
        let id = id.into();
        check_type_id(&id)?;
        if self.types.contains_key(&id) {
            return Err(EngineError::config(format!("tipo de evidência '{id}' já registrado")));
        }
        if let Some(hl) = info.half_life_days {
            if !hl.is_finite() || hl <= 0.0 {
                return Err(EngineError::config(format!(
                    "meia-vida de '{id}' deve ser positiva, recebido {hl}"
                )));
            }
        }
        tracing::debug!(evidence_type = %id, "tipo de evidência registrado");
        self.types.insert(id, info);
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.types.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&EvidenceTypeInfo> {
        self.types.get(id)
    }

    /// Ids registrados, em ordem alfabética.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// `(tipo, meia-vida)` dos tipos com meia-vida própria.
    pub fn half_life_overrides(&self) -> impl Iterator<Item = (&str, f64)> {
        self.types
            .iter()
            .filter_map(|(id, info)| info.half_life_days.map(|hl| (id.as_str(), hl)))
    }

    /// Valida um registro bruto e o converte em [`EvidenceItem`].
    ///
    /// `index` é a posição do item no lote (usada para gerar um id estável
    /// quando o registro não traz um) e `now` o instante de avaliação.
    ///
    /// # Erros
    ///
    /// [`EngineError::Validation`] se o tipo for desconhecido ou se
    /// `value`/`uncertainty`/`age_days` forem não finitos ou fora de faixa.
    pub fn validate(&self, raw: &RawEvidence, index: usize, now: DateTime<Utc>) -> Result<EvidenceItem> {
        let id = raw.effective_id(index);

        if !self.contains(&raw.evidence_type) {
            return Err(EngineError::invalid(
                id,
                format!("tipo de evidência desconhecido '{}'", raw.evidence_type),
            ));
        }
        build_item(raw, id, now)
    }

    /// Garante que um item já construído tem tipo registrado e valores
    /// em `[0, 1]`.
    ///
    /// Itens de um [`EvidenceProvider`](crate::provider::EvidenceProvider)
    /// podem ter sido montados campo a campo, sem passar por `new`.
    pub fn check_item(&self, item: &EvidenceItem) -> Result<()> {
        if !self.contains(&item.evidence_type) {
            return Err(EngineError::invalid(
                item.id.clone(),
                format!("tipo de evidência desconhecido '{}'", item.evidence_type),
            ));
        }
        check_unit(&item.id, "value", item.value)?;
        check_unit(&item.id, "uncertainty", item.uncertainty)
    }
}

/// Confere faixas e resolve o instante de um registro bruto.
fn build_item(raw: &RawEvidence, id: String, now: DateTime<Utc>) -> Result<EvidenceItem> {
    check_unit(&id, "value", raw.value)?;
    check_unit(&id, "uncertainty", raw.uncertainty)?;

    let timestamp = match (raw.timestamp, raw.age_days) {
        (Some(ts), _) => ts,
        (None, Some(age)) => {
            if !age.is_finite() || age.abs() > MAX_AGE_DAYS {
                return Err(EngineError::invalid(id, format!("age_days fora de faixa: {age}")));
            }
            now - Duration::milliseconds((age * 86_400_000.0).round() as i64)
        }
        (None, None) => now,
    };

    Ok(EvidenceItem {
        id,
        evidence_type: raw.evidence_type.clone(),
        value: raw.value,
        uncertainty: raw.uncertainty,
        timestamp,
        source: raw.source.clone().unwrap_or_else(|| "unknown".to_string()),
        metadata: raw.metadata.clone(),
    })
}

fn check_unit(id: &str, field: &str, x: f64) -> Result<()> {
    if !x.is_finite() || !(0.0..=1.0).contains(&x) {
        return Err(EngineError::invalid(id, format!("{field} fora de [0, 1]: {x}")));
    }
    Ok(())
}

fn check_type_id(id: &str) -> Result<()> {
    let regex = TYPE_ID_REGEX
        .get_or_init(|| Regex::new(EVIDENCE_TYPE_PATTERN))
        .as_ref()
        .map_err(|e| EngineError::config(format!("padrão de tipo inválido: {e}")))?;
    if regex.is_match(id) {
        Ok(())
    } else {
        Err(EngineError::config(format!(
            "id de tipo '{id}' não casa com {EVIDENCE_TYPE_PATTERN}"
        )))
    }
}
