//! # Módulo Inference — Fusão Fuzzy-Bayesiana de Evidências
//!
//! Converte o conjunto de evidências de uma molécula em uma
//! [`PosteriorAssessment`]: escore, banda de incerteza, decomposição
//! linguística e diagnóstico de consistência com o grafo de relações.
//!
//! | Sub-módulo | Responsabilidade |
//! |------------|------------------|
//! | [`engine`] | verossimilhança, prior, fusão, agregação, banda |
//! | [`consistency`] | compatibilidade das observações com as arestas do grafo |

pub mod consistency;
pub mod engine;

pub use consistency::{ConsistencyReport, RelationshipConflict, TypeObservation};
pub use engine::{
    AssessmentWarning, Deadline, EvidenceContribution, FuzzyBayesianEngine, PosteriorAssessment,
    PriorSource,
};
