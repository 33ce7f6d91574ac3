//! # Fuzzy Evidence — Integração Fuzzy-Bayesiana de Evidências
//!
//! Converte medições heterogêneas e incertas sobre uma molécula candidata
//! (casamentos espectrais, similaridade de sequência, pertencimento a vias,
//! etc.) em uma **avaliação de confiança com banda de incerteza**, e prevê
//! evidências ainda não observadas a partir de um grafo aprendido de
//! relações entre tipos de evidência.
//!
//! ## Arquitetura
//!
//! ```text
//! RawEvidence ──► core (validação, decaimento, fuzzificação)
//!                   │
//!                   ▼
//!            inference (verossimilhança ⊗ prior do grafo → posterior)
//!                   │            ▲
//!                   │            │ snapshot imutável (Arc)
//!                   ▼            │
//!             optimizer        graph (aprendizado, predição, topologia)
//!                   │
//!                   ▼
//!             orchestrator::EvidenceEngine  (integrate, network_stats,
//!                                            predict_evidence, optimize_objective)
//! ```
//!
//! | Módulo | Papel |
//! |--------|-------|
//! | [`core`] | funções de pertinência, variáveis linguísticas, decaimento, itens de evidência |
//! | [`graph`] | grafo de relações versionado, aprendizado e predição |
//! | [`inference`] | fusão fuzzy-bayesiana e consistência |
//! | [`optimizer`] | objetivos ponderados, Pareto, sensibilidade |
//! | [`orchestrator`] | as quatro operações públicas |
//! | [`provider`] | fonte de evidências por molécula |
//! | [`persistence`] | snapshot do grafo em JSON |
//!
//! ## Exemplo
//!
//! ```no_run
//! use fuzzy_evidence::{EngineConfig, EvidenceEngine, IntegrationRequest, RawEvidence};
//!
//! let engine = EvidenceEngine::new(EngineConfig::default())?;
//! let request = IntegrationRequest::new(
//!     "MOL-001",
//!     vec![RawEvidence::new("spectral_match", 0.85, 0.1).with_age_days(0.0)],
//! );
//! let result = engine.integrate(&request)?;
//! println!("{:.3}", result.assessment.overall_score);
//! # Ok::<(), fuzzy_evidence::EngineError>(())
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod graph;
pub mod inference;
pub mod optimizer;
pub mod orchestrator;
pub mod persistence;
pub mod provider;

pub use config::{EngineConfig, FuzzyConfig};
pub use error::{EngineError, Result};
pub use graph::{EvidenceRelationship, GraphSnapshot, RelationKind, RelationshipStore};
pub use inference::{Deadline, FuzzyBayesianEngine, PosteriorAssessment};
pub use optimizer::{Constraints, ObjectiveWeights, Optimizer};
pub use orchestrator::{
    EvidenceEngine, IntegrationRequest, IntegrationResult, NetworkStats, OptimizationOutcome,
    OptimizationRequest, PredictionReport, PredictionRequest,
};
pub use provider::{EvidenceProvider, InMemoryEvidenceStore};

pub use crate::core::{EvidenceItem, RawEvidence};
