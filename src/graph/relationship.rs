//! # Relações Entre Tipos de Evidência
//!
//! Uma [`EvidenceRelationship`] é uma aresta **dirigida e tipada** entre
//! dois *tipos* de evidência (nunca entre instâncias). Ela diz como a
//! observação de um tipo informa o outro.
//!
//! ## Tipos de Relação ([`RelationKind`])
//!
//! | Tipo | Leitura | Propagação do valor | Origem típica |
//! |------|---------|---------------------|---------------|
//! | `Supports` | A apoia B (mesma fonte) | `v` | aprendizado |
//! | `Corroborates` | A corrobora B (fontes diferentes) | `v` | aprendizado |
//! | `Contradicts` | A contradiz B | `1 − v` | aprendizado |
//! | `Implies` | A alto ⇒ B alto | `v` | contexto de vias |
//! | `Requires` | A alto exige B alto | `v` | contexto de vias |
//!
//! ## Força
//!
//! `strength ∈ [0, 1]`. Forças são **atualizadas** pelo passo de
//! aprendizado, nunca zeradas silenciosamente.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tipo de relação entre dois tipos de evidência.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Supports,
    Contradicts,
    Corroborates,
    Implies,
    Requires,
}

impl RelationKind {
    pub const ALL: [RelationKind; 5] = [
        RelationKind::Supports,
        RelationKind::Contradicts,
        RelationKind::Corroborates,
        RelationKind::Implies,
        RelationKind::Requires,
    ];

    /// Identificador estável (snake_case), igual ao usado na serialização.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Supports => "supports",
            RelationKind::Contradicts => "contradicts",
            RelationKind::Corroborates => "corroborates",
            RelationKind::Implies => "implies",
            RelationKind::Requires => "requires",
        }
    }

    /// Label legível em PT-BR.
    pub fn label(&self) -> &'static str {
        match self {
            RelationKind::Supports => "apoia",
            RelationKind::Contradicts => "contradiz",
            RelationKind::Corroborates => "corrobora",
            RelationKind::Implies => "implica",
            RelationKind::Requires => "exige",
        }
    }

    /// `true` quando o valor propagado por esta aresta é invertido (`1 − v`).
    pub fn inverts_value(&self) -> bool {
        matches!(self, RelationKind::Contradicts)
    }

    /// Relações aprendidas por co-ocorrência valem nos dois sentidos.
    pub fn is_symmetric(&self) -> bool {
        matches!(
            self,
            RelationKind::Supports | RelationKind::Corroborates | RelationKind::Contradicts
        )
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Peso de uma aresta no grafo de relações.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelationEdge {
    pub kind: RelationKind,
    /// Força em `[0, 1]`.
    pub strength: f64,
    /// Quantas observações já alimentaram esta aresta.
    #[serde(default)]
    pub observations: u64,
}

/// Aresta dirigida e tipada entre dois tipos de evidência (forma plana,
/// usada em relatórios, persistência e semeadura).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRelationship {
    pub source_type: String,
    pub target_type: String,
    pub relation_kind: RelationKind,
    pub strength: f64,
    #[serde(default)]
    pub observations: u64,
}

impl EvidenceRelationship {
    pub fn new(
        source_type: impl Into<String>,
        target_type: impl Into<String>,
        relation_kind: RelationKind,
        strength: f64,
    ) -> Self {
        Self {
            source_type: source_type.into(),
            target_type: target_type.into(),
            relation_kind,
            strength,
            observations: 0,
        }
    }

    /// Descrição legível (ex: `"mass_spec apoia genomics (0.72)"`).
    pub fn describe(&self) -> String {
        format!(
            "{} {} {} ({:.2})",
            self.source_type,
            self.relation_kind.label(),
            self.target_type,
            self.strength
        )
    }
}
