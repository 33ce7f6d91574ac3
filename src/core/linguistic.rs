//! # Variáveis Linguísticas — Categorias Fuzzy de Confiança
//!
//! Uma [`LinguisticVariable`] é uma categoria nomeada (ex: `"high"`) ligada
//! a uma [`MembershipFunction`] e a uma faixa `[lo, hi]` do universo de
//! evidência. O [`LinguisticRegistry`] agrupa as variáveis de uma
//! configuração e transforma valores escalares em [`MembershipVector`]s.
//!
//! ## Categorias Padrão
//!
//! | Variável | Forma | Faixa | Valor nominal |
//! |----------|-------|-------|---------------|
//! | `very_low` | triangular(0, 0, 0.2) | [0.0, 0.2] | 0.10 |
//! | `low` | triangular(0.1, 0.25, 0.4) | [0.1, 0.4] | 0.25 |
//! | `medium` | triangular(0.3, 0.5, 0.7) | [0.3, 0.7] | 0.50 |
//! | `high` | triangular(0.6, 0.75, 0.9) | [0.6, 0.9] | 0.75 |
//! | `very_high` | triangular(0.8, 1.0, 1.0) | [0.8, 1.0] | 0.90 |
//!
//! O valor nominal de cada categoria é o **ponto médio** da sua faixa;
//! é ele que entra na defuzzificação do motor de inferência.
//!
//! ## Determinismo
//!
//! `fuzzify` é uma função pura: mesma entrada, mesma saída, bit a bit.
//! Os vetores de pertinência usam `BTreeMap` para que a ordem de iteração
//! (e portanto qualquer soma feita sobre eles) seja sempre a mesma.
//!
//! ## Exemplo
//!
//! ```rust
//! use fuzzy_evidence::core::LinguisticRegistry;
//!
//! let registry = LinguisticRegistry::standard();
//! let mv = registry.fuzzify(0.7);
//! assert!(mv.get("high") > 0.0);
//! assert!(mv.get("medium") == 0.0);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::membership::MembershipFunction;
use crate::error::{EngineError, Result};

pub const VERY_LOW: &str = "very_low";
pub const LOW: &str = "low";
pub const MEDIUM: &str = "medium";
pub const HIGH: &str = "high";
pub const VERY_HIGH: &str = "very_high";

/// As cinco categorias padrão, em ordem crescente de confiança.
pub const STANDARD_CATEGORIES: [&str; 5] = [VERY_LOW, LOW, MEDIUM, HIGH, VERY_HIGH];

/// Categoria fuzzy nomeada com sua função de pertinência.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinguisticVariable {
    /// Nome da categoria (ex: `"high"`).
    pub name: String,
    /// Forma + parâmetros da função de pertinência.
    pub membership_fn: MembershipFunction,
    /// Faixa `[lo, hi]` explícita. Quando ausente, usa o suporte da função.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<(f64, f64)>,
}

impl LinguisticVariable {
    /// Cria uma variável cuja faixa é o suporte da função.
    pub fn new(name: impl Into<String>, membership_fn: MembershipFunction) -> Self {
        Self {
            name: name.into(),
            membership_fn,
            range: None,
        }
    }

    /// Cria uma variável com faixa explícita.
    pub fn with_range(
        name: impl Into<String>,
        membership_fn: MembershipFunction,
        range: (f64, f64),
    ) -> Self {
        Self {
            name: name.into(),
            membership_fn,
            range: Some(range),
        }
    }

    /// Faixa efetiva `[lo, hi]` da variável.
    pub fn range(&self) -> (f64, f64) {
        self.range.unwrap_or_else(|| self.membership_fn.support())
    }

    /// Valor de confiança nominal: ponto médio da faixa, limitado a `[0, 1]`.
    pub fn nominal_value(&self) -> f64 {
        let (lo, hi) = self.range();
        ((lo + hi) / 2.0).clamp(0.0, 1.0)
    }

    /// Grau de pertinência de `x` nesta categoria.
    pub fn degree(&self, x: f64) -> f64 {
        self.membership_fn.degree(x)
    }

    /// Valida nome, função e faixa.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(EngineError::config("variável linguística sem nome"));
        }
        self.membership_fn
            .validate()
            .map_err(|e| EngineError::config(format!("variável '{}': {}", self.name, e)))?;
        if let Some((lo, hi)) = self.range {
            if !lo.is_finite() || !hi.is_finite() || lo > hi {
                return Err(EngineError::config(format!(
                    "variável '{}': faixa inválida [{lo}, {hi}]",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// Resultado da fuzzificação: nome da variável → grau em `[0, 1]`.
///
/// Os graus **não** precisam somar 1: conjuntos fuzzy sobrepostos são
/// permitidos. Categorias ausentes do mapa têm grau 0.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MembershipVector(BTreeMap<String, f64>);

impl MembershipVector {
    /// Grau de uma categoria (0.0 se não avaliada).
    pub fn get(&self, name: &str) -> f64 {
        self.0.get(name).copied().unwrap_or(0.0)
    }

    /// Itera `(nome, grau)` em ordem alfabética.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Soma dos graus; zero significa que nenhuma categoria "disparou".
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// Grau "alto": `max(high, very_high)`.
    pub fn high_degree(&self) -> f64 {
        self.get(HIGH).max(self.get(VERY_HIGH))
    }

    /// Grau "baixo": `max(low, very_low)`.
    pub fn low_degree(&self) -> f64 {
        self.get(LOW).max(self.get(VERY_LOW))
    }

    /// Categoria de maior grau. Empates ficam com a primeira em ordem alfabética.
    pub fn dominant(&self) -> Option<(&str, f64)> {
        let mut best: Option<(&str, f64)> = None;
        for (name, degree) in self.iter() {
            match best {
                Some((_, d)) if d >= degree => {}
                _ => best = Some((name, degree)),
            }
        }
        best.filter(|(_, d)| *d > 0.0)
    }

    /// Média elemento a elemento de vários vetores.
    pub fn mean<'a>(vectors: impl IntoIterator<Item = &'a MembershipVector>) -> MembershipVector {
        let mut sums: BTreeMap<String, f64> = BTreeMap::new();
        let mut n = 0usize;
        for v in vectors {
            n += 1;
            for (name, degree) in v.iter() {
                *sums.entry(name.to_string()).or_default() += degree;
            }
        }
        if n > 0 {
            for value in sums.values_mut() {
                *value /= n as f64;
            }
        }
        MembershipVector(sums)
    }
}

impl FromIterator<(String, f64)> for MembershipVector {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        MembershipVector(iter.into_iter().collect())
    }
}

/// Registro de variáveis linguísticas de uma configuração.
///
/// Mantém um conjunto **base**, aplicado a toda evidência, e conjuntos
/// **extras por tipo de evidência**. Cada nome aparece no máximo uma vez
/// por tipo: registrar um nome repetido é erro de configuração.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LinguisticRegistry {
    variables: Vec<LinguisticVariable>,
    #[serde(default)]
    per_type: BTreeMap<String, Vec<LinguisticVariable>>,
}

impl Default for LinguisticRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl LinguisticRegistry {
    /// Registro vazio, útil para configurações totalmente customizadas.
    pub fn empty() -> Self {
        Self {
            variables: Vec::new(),
            per_type: BTreeMap::new(),
        }
    }

    /// As cinco categorias de confiança padrão.
    pub fn standard() -> Self {
        Self {
            variables: vec![
                LinguisticVariable::new(VERY_LOW, MembershipFunction::triangular(0.0, 0.0, 0.2)),
                LinguisticVariable::new(LOW, MembershipFunction::triangular(0.1, 0.25, 0.4)),
                LinguisticVariable::new(MEDIUM, MembershipFunction::triangular(0.3, 0.5, 0.7)),
                LinguisticVariable::new(HIGH, MembershipFunction::triangular(0.6, 0.75, 0.9)),
                LinguisticVariable::new(VERY_HIGH, MembershipFunction::triangular(0.8, 1.0, 1.0)),
            ],
            per_type: BTreeMap::new(),
        }
    }

    /// Variável de **concordância** entre evidências (conflitante / neutra / apoiadora).
    ///
    /// Usada para rotular a compatibilidade de pares de evidência nos diagnósticos.
    pub fn agreement() -> Self {
        Self {
            variables: vec![
                LinguisticVariable::new(
                    "conflicting",
                    MembershipFunction::trapezoidal(0.0, 0.0, 0.3, 0.5),
                ),
                LinguisticVariable::new("neutral", MembershipFunction::triangular(0.3, 0.5, 0.7)),
                LinguisticVariable::new(
                    "supporting",
                    MembershipFunction::trapezoidal(0.5, 0.7, 1.0, 1.0),
                ),
            ],
            per_type: BTreeMap::new(),
        }
    }

    /// Registra uma variável no conjunto base.
    ///
    /// # Erros
    ///
    /// [`EngineError::Configuration`] se a variável for malformada ou se
    /// o nome já estiver registrado.
    pub fn register(&mut self, variable: LinguisticVariable) -> Result<()> {
        variable.validate()?;
        if self.variables.iter().any(|v| v.name == variable.name) {
            return Err(EngineError::config(format!(
                "variável '{}' já registrada",
                variable.name
            )));
        }
        tracing::debug!(name = %variable.name, kind = variable.membership_fn.kind_label(), "variável linguística registrada");
        self.variables.push(variable);
        Ok(())
    }

    /// Registra uma variável extra válida apenas para um tipo de evidência.
    pub fn register_for_type(
        &mut self,
        evidence_type: &str,
        variable: LinguisticVariable,
    ) -> Result<()> {
        variable.validate()?;
        let clashes_base = self.variables.iter().any(|v| v.name == variable.name);
        let extras = self.per_type.entry(evidence_type.to_string()).or_default();
        if clashes_base || extras.iter().any(|v| v.name == variable.name) {
            return Err(EngineError::config(format!(
                "variável '{}' já registrada para '{}'",
                variable.name, evidence_type
            )));
        }
        extras.push(variable);
        Ok(())
    }

    /// Revalida todas as variáveis (usado após desserializar um registro).
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::BTreeSet::new();
        for v in &self.variables {
            v.validate()?;
            if !seen.insert(v.name.as_str()) {
                return Err(EngineError::config(format!("variável '{}' duplicada", v.name)));
            }
        }
        for (ty, extras) in &self.per_type {
            for v in extras {
                v.validate()?;
                if seen.contains(v.name.as_str()) {
                    return Err(EngineError::config(format!(
                        "variável '{}' de '{}' colide com o conjunto base",
                        v.name, ty
                    )));
                }
            }
        }
        Ok(())
    }

    /// Variáveis do conjunto base.
    pub fn variables(&self) -> &[LinguisticVariable] {
        &self.variables
    }

    /// Variáveis aplicáveis a um tipo: base + extras do tipo.
    pub fn variables_for<'a>(
        &'a self,
        evidence_type: &str,
    ) -> impl Iterator<Item = &'a LinguisticVariable> + 'a {
        let extras = self
            .per_type
            .get(evidence_type)
            .map(|v| v.as_slice())
            .unwrap_or(&[]);
        self.variables.iter().chain(extras.iter())
    }

    /// Avalia todas as variáveis base contra `value`.
    pub fn fuzzify(&self, value: f64) -> MembershipVector {
        self.variables
            .iter()
            .map(|v| (v.name.clone(), v.degree(value)))
            .collect()
    }

    /// Avalia as variáveis base e as extras do tipo contra `value`.
    pub fn fuzzify_for(&self, evidence_type: &str, value: f64) -> MembershipVector {
        self.variables_for(evidence_type)
            .map(|v| (v.name.clone(), v.degree(value)))
            .collect()
    }

    /// Defuzzificação por média ponderada dos valores nominais.
    ///
    /// Retorna `None` quando nenhuma categoria tem grau positivo.
    pub fn defuzzify(&self, evidence_type: &str, memberships: &MembershipVector) -> Option<f64> {
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for variable in self.variables_for(evidence_type) {
            let degree = memberships.get(&variable.name);
            numerator += degree * variable.nominal_value();
            denominator += degree;
        }
        if denominator > 0.0 {
            Some((numerator / denominator).clamp(0.0, 1.0))
        } else {
            None
        }
    }

    /// Rótulo dominante de um valor (ex: `0.85 → "high"`).
    pub fn label(&self, value: f64) -> Option<String> {
        self.fuzzify(value).dominant().map(|(name, _)| name.to_string())
    }
}
