//! # Grafo de Relações Entre Tipos de Evidência
//!
//! Grafo aprendido, ponderado e tipado sobre **tipos** de evidência.
//! Serve a duas operações:
//!
//! 1. **Aprendizado** ([`learning`]): co-ocorrências ajustam as forças das arestas
//! 2. **Predição** ([`prediction`]): caminhada limitada estima tipos ausentes
//!
//! É o único estado mutável compartilhado do motor. Ele vive em um
//! [`RelationshipStore`] que publica [`GraphSnapshot`]s imutáveis.

pub mod learning;
pub mod prediction;
pub mod relationship;
pub mod snapshot;
pub mod store;

pub use learning::{LearningReport, MoleculeEvidence};
pub use prediction::{
    predict, prior_signal, ContextValue, PathTrace, PredictedEvidence, Prediction, PriorSignal,
};
pub use relationship::{EvidenceRelationship, RelationEdge, RelationKind};
pub use snapshot::{GraphSnapshot, SnapshotRecord, TopologyStats};
pub use store::RelationshipStore;

impl GraphSnapshot {
    /// Atalho para [`prediction::predict`] sobre este snapshot.
    pub fn predict(
        &self,
        target: &str,
        context: &[ContextValue],
        config: &crate::config::PredictionConfig,
    ) -> Prediction {
        prediction::predict(self, target, context, config)
    }

    /// Atalho para [`prediction::prior_signal`] sobre este snapshot.
    pub fn prior_signal(
        &self,
        target: &str,
        context: &[ContextValue],
        config: &crate::config::PredictionConfig,
    ) -> Option<PriorSignal> {
        prediction::prior_signal(self, target, context, config)
    }
}
