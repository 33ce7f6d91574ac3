//! # RelationshipStore — Publicação de Snapshots
//!
//! Guarda o snapshot corrente do grafo de relações e serializa escritas.
//!
//! ```text
//!  leitores (N em paralelo)          escritor (1 por vez)
//!  ────────────────────────          ────────────────────
//!  read lock ─ clone Arc ─ solta     writer.lock()
//!        │                           base = snapshot()
//!        ▼                           next = learn(base, lote)   ← fora de qualquer RwLock
//!  Arc<GraphSnapshot> imutável       write lock ─ troca Arc ─ solta
//! ```
//!
//! O `RwLock` só é segurado pelo tempo de clonar ou trocar um `Arc`.
//! Um leitor nunca observa um conjunto de arestas parcialmente aplicado:
//! ou vê a versão anterior inteira, ou a nova inteira.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::learning::{self, LearningReport, MoleculeEvidence};
use super::relationship::{EvidenceRelationship, RelationEdge};
use super::snapshot::GraphSnapshot;
use crate::config::GraphConfig;
use crate::core::LinguisticRegistry;
use crate::error::Result;

/// Dono do grafo de relações compartilhado entre requisições.
#[derive(Debug, Default)]
pub struct RelationshipStore {
    current: RwLock<Arc<GraphSnapshot>>,
    writer: Mutex<()>,
}

impl RelationshipStore {
    pub fn new(initial: GraphSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
            writer: Mutex::new(()),
        }
    }

    /// Snapshot corrente (imutável).
    pub fn snapshot(&self) -> Arc<GraphSnapshot> {
        self.current.read().clone()
    }

    pub fn version(&self) -> u64 {
        self.current.read().version()
    }

    /// Aplica um lote de aprendizado e publica o snapshot resultante.
    pub fn learn(
        &self,
        batch: &[MoleculeEvidence],
        linguistic: &LinguisticRegistry,
        config: &GraphConfig,
    ) -> LearningReport {
        let _gate = self.writer.lock();
        let base = self.snapshot();
        let (next, report) = learning::learn(&base, batch, linguistic, config);
        self.publish(next);
        report
    }

    /// Semeia relações a partir de contexto externo (vias, interações).
    ///
    /// Arestas novas são inseridas; existentes só têm a força **elevada**
    /// até a do prior, nunca reduzida.
    ///
    /// # Erros
    ///
    /// [`EngineError::Configuration`] se algum prior for inválido; nesse
    /// caso nada é publicado.
    pub fn seed(&self, priors: &[EvidenceRelationship]) -> Result<u64> {
        // valida o lote inteiro antes de tocar no grafo
        GraphSnapshot::from_relationships(0, priors)?;

        let _gate = self.writer.lock();
        let base = self.snapshot();
        let mut next = (*base).clone();
        for prior in priors {
            match next.edge_mut(&prior.source_type, &prior.target_type, prior.relation_kind) {
                Some(edge) => edge.strength = edge.strength.max(prior.strength),
                None => next.insert_edge(
                    &prior.source_type,
                    &prior.target_type,
                    RelationEdge {
                        kind: prior.relation_kind,
                        strength: prior.strength,
                        observations: prior.observations,
                    },
                ),
            }
        }
        let version = base.version() + 1;
        self.publish(next.with_version(version));
        Ok(version)
    }

    /// Substitui o snapshot inteiro (ex: carregado do disco).
    ///
    /// A versão publicada é sempre maior que a corrente.
    pub fn replace(&self, snapshot: GraphSnapshot) -> u64 {
        let _gate = self.writer.lock();
        let current = self.version();
        let version = snapshot.version().max(current + 1);
        self.publish(snapshot.with_version(version));
        version
    }

    fn publish(&self, next: GraphSnapshot) {
        let version = next.version();
        let edges = next.edge_count();
        let next = Arc::new(next);
        *self.current.write() = next;
        tracing::debug!(version, edges, "snapshot do grafo publicado");
    }
}

impl From<GraphSnapshot> for RelationshipStore {
    fn from(snapshot: GraphSnapshot) -> Self {
        Self::new(snapshot)
    }
}
