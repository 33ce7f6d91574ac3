//! # Módulo Core — Tipos Fundamentais do Domínio
//!
//! Os blocos básicos do motor de evidências:
//!
//! - [`MembershipFunction`]: forma fuzzy (triangular, trapezoidal, gaussiana, sigmoide)
//! - [`LinguisticVariable`] / [`LinguisticRegistry`]: categorias `very_low`…`very_high`
//! - [`MembershipVector`]: resultado da fuzzificação de um valor
//! - [`TemporalDecay`]: peso de evidência por idade (meia-vida)
//! - [`EvidenceItem`] / [`RawEvidence`] / [`EvidenceTypeRegistry`]: medições e seus tipos
//!
//! ## Fluxo
//!
//! ```text
//! RawEvidence ──validate──▶ EvidenceItem ──decay──▶ peso
//!                                 │
//!                                 └──fuzzify──▶ MembershipVector
//! ```

/// Funções de pertinência e sua validação.
pub mod membership;

/// Variáveis linguísticas e o registro que as agrupa.
pub mod linguistic;

/// Decaimento temporal por meia-vida.
pub mod decay;

/// Itens de evidência e registro de tipos.
pub mod evidence;

pub use decay::{decay_weight, DecayOutcome, TemporalAnomaly, TemporalDecay};
pub use evidence::{EvidenceItem, EvidenceTypeInfo, EvidenceTypeRegistry, RawEvidence};
pub use linguistic::{LinguisticRegistry, LinguisticVariable, MembershipVector};
pub use membership::MembershipFunction;
