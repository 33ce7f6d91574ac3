//! # Provedores de Evidência
//!
//! [`EvidenceProvider`] é a interface estreita com o armazenamento externo
//! de evidências: dado o id de uma molécula, devolve seus itens.
//! [`InMemoryEvidenceStore`] é a implementação em memória usada pelo
//! binário e pelos testes.
//!
//! O provedor não conhece o registro de tipos. O
//! [`EvidenceEngine`](crate::orchestrator::EvidenceEngine) confere cada
//! item devolvido e descarta, com aviso, os de tipo desconhecido ou
//! valores fora de `[0, 1]`.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::core::EvidenceItem;
use crate::error::{EngineError, Result};

/// Fonte de evidências por molécula.
///
/// Implementações são compartilhadas entre threads atrás de um `Arc`.
pub trait EvidenceProvider: Send + Sync {
    /// Todos os itens registrados para a molécula, na ordem de chegada.
    ///
    /// # Erros
    ///
    /// [`EngineError::UnknownMolecule`] se a molécula não existir.
    fn evidence_for(&self, molecule_id: &str) -> Result<Vec<EvidenceItem>>;
}

/// Evidências em memória, indexadas por id de molécula.
///
/// Leituras concorrentes; escritas serializadas pelo `RwLock`.
#[derive(Debug, Default)]
pub struct InMemoryEvidenceStore {
    molecules: RwLock<BTreeMap<String, Vec<EvidenceItem>>>,
}

impl InMemoryEvidenceStore {
    /// Armazém vazio.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acrescenta itens à molécula (criando-a se preciso).
    ///
    /// Itens são imutáveis: correções chegam como itens novos.
    pub fn extend(&self, molecule_id: impl Into<String>, items: impl IntoIterator<Item = EvidenceItem>) {
        let molecule_id = molecule_id.into();
        let mut guard = self.molecules.write();
        let entry = guard.entry(molecule_id.clone()).or_default();
        let before = entry.len();
        entry.extend(items);
        tracing::debug!(molecule = %molecule_id, added = entry.len() - before, "evidências armazenadas");
    }

    /// Ids das moléculas conhecidas, em ordem alfabética.
    pub fn molecule_ids(&self) -> Vec<String> {
        self.molecules.read().keys().cloned().collect()
    }

    /// Número de moléculas (não de itens).
    pub fn len(&self) -> usize {
        self.molecules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.molecules.read().is_empty()
    }
}

impl EvidenceProvider for InMemoryEvidenceStore {
    fn evidence_for(&self, molecule_id: &str) -> Result<Vec<EvidenceItem>> {
        self.molecules
            .read()
            .get(molecule_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownMolecule(molecule_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_molecule_is_an_error() {
        let store = InMemoryEvidenceStore::new();
        assert!(matches!(
            store.evidence_for("MOL-404"),
            Err(EngineError::UnknownMolecule(id)) if id == "MOL-404"
        ));
    }

    #[test]
    fn extend_appends_in_order() {
        let store = InMemoryEvidenceStore::new();
        store.extend("m1", [EvidenceItem::new("genomics", 0.4, 0.2).with_id("a")]);
        store.extend("m1", [EvidenceItem::new("genomics", 0.6, 0.2).with_id("b")]);
        let ids: Vec<_> = store.evidence_for("m1").unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(store.molecule_ids(), ["m1"]);
    }

    #[test]
    fn known_molecule_may_have_no_items() {
        let store = InMemoryEvidenceStore::new();
        store.extend("empty", []);
        assert!(store.evidence_for("empty").unwrap().is_empty());
    }
}
