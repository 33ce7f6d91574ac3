//! # GraphSnapshot — Versão Imutável do Grafo de Relações
//!
//! O grafo de relações entre tipos de evidência é o único estado que vive
//! além de uma requisição. Ele é publicado como **snapshots imutáveis e
//! versionados**: leitores recebem um `Arc<GraphSnapshot>` e nunca veem
//! uma atualização pela metade; escritores constroem um snapshot novo e
//! o publicam de uma vez (veja [`RelationshipStore`](super::RelationshipStore)).
//!
//! ## Armazenamento
//!
//! - **Grafo**: `petgraph::StableDiGraph<String, RelationEdge>`. Nós são tipos
//!   de evidência; pode haver várias arestas entre o mesmo par (uma por [`RelationKind`]).
//! - **Índice**: `BTreeMap<String, NodeIndex>`; busca por tipo em ordem estável.
//!
//! ## Serialização
//!
//! O snapshot é serializado na forma plana [`SnapshotRecord`]
//! (`version` + lista de relações ordenada); o índice é reconstruído
//! na desserialização.
//!
//! ## Estatísticas de Topologia
//!
//! | Métrica | Definição |
//! |---------|-----------|
//! | `density` | pares ordenados distintos `(a, b)` com aresta ÷ `n·(n−1)` |
//! | `clustering_coefficient` | média do coeficiente local no grafo não dirigido (grau < 2 conta 0) |

use std::collections::{BTreeMap, BTreeSet};

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use super::relationship::{EvidenceRelationship, RelationEdge, RelationKind};
use crate::error::{EngineError, Result};

/// Forma plana e serializável de um snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub version: u64,
    pub relationships: Vec<EvidenceRelationship>,
}

/// Snapshot imutável do grafo de relações.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(into = "SnapshotRecord", try_from = "SnapshotRecord")]
pub struct GraphSnapshot {
    version: u64,
    graph: StableDiGraph<String, RelationEdge>,
    node_index: BTreeMap<String, NodeIndex>,
}

impl GraphSnapshot {
    /// Snapshot vazio, versão 0.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Constrói um snapshot a partir de uma lista de relações.
    ///
    /// # Erros
    ///
    /// [`EngineError::Configuration`] para laços (`a → a`), tipos vazios,
    /// forças fora de `[0, 1]` ou arestas repetidas (mesmo par e tipo).
    pub fn from_relationships(version: u64, relationships: &[EvidenceRelationship]) -> Result<Self> {
        let mut snapshot = Self {
            version,
            ..Self::default()
        };
        for rel in relationships {
            if rel.source_type.is_empty() || rel.target_type.is_empty() {
                return Err(EngineError::config("relação com tipo de evidência vazio"));
            }
            if rel.source_type == rel.target_type {
                return Err(EngineError::config(format!(
                    "laço não permitido em '{}'",
                    rel.source_type
                )));
            }
            if !rel.strength.is_finite() || !(0.0..=1.0).contains(&rel.strength) {
                return Err(EngineError::config(format!(
                    "força fora de [0, 1] em {}",
                    rel.describe()
                )));
            }
            if snapshot
                .edge(&rel.source_type, &rel.target_type, rel.relation_kind)
                .is_some()
            {
                return Err(EngineError::config(format!(
                    "relação repetida: {}",
                    rel.describe()
                )));
            }
            snapshot.insert_edge(
                &rel.source_type,
                &rel.target_type,
                RelationEdge {
                    kind: rel.relation_kind,
                    strength: rel.strength,
                    observations: rel.observations,
                },
            );
        }
        Ok(snapshot)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.edge_count() == 0
    }

    /// `true` se o tipo aparece como nó.
    pub fn contains_type(&self, evidence_type: &str) -> bool {
        self.node_index.contains_key(evidence_type)
    }

    /// Tipos presentes no grafo, em ordem alfabética.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.node_index.keys().map(String::as_str)
    }

    /// Aresta `source → target` de um tipo específico, se existir.
    pub fn edge(&self, source: &str, target: &str, kind: RelationKind) -> Option<&RelationEdge> {
        let a = *self.node_index.get(source)?;
        let b = *self.node_index.get(target)?;
        self.graph
            .edges_connecting(a, b)
            .map(|e| e.weight())
            .find(|w| w.kind == kind)
    }

    /// Força da aresta, ou 0.0 se ausente.
    pub fn strength(&self, source: &str, target: &str, kind: RelationKind) -> f64 {
        self.edge(source, target, kind).map_or(0.0, |e| e.strength)
    }

    /// Arestas que saem de `source`, ordenadas por `(alvo, tipo)`.
    pub fn outgoing(&self, source: &str) -> Vec<(&str, &RelationEdge)> {
        let Some(&idx) = self.node_index.get(source) else {
            return Vec::new();
        };
        let mut out: Vec<(&str, &RelationEdge)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .filter_map(|e| {
                self.graph
                    .node_weight(e.target())
                    .map(|name| (name.as_str(), e.weight()))
            })
            .collect();
        out.sort_by(|a, b| a.0.cmp(b.0).then(a.1.kind.cmp(&b.1.kind)));
        out
    }

    /// Todas as relações, ordenadas por `(origem, alvo, tipo)`.
    pub fn relationships(&self) -> Vec<EvidenceRelationship> {
        let mut rels: Vec<EvidenceRelationship> = self
            .graph
            .edge_indices()
            .filter_map(|id| {
                let (a, b) = self.graph.edge_endpoints(id)?;
                let source = self.graph.node_weight(a)?;
                let target = self.graph.node_weight(b)?;
                let w = self.graph.edge_weight(id)?;
                Some(EvidenceRelationship {
                    source_type: source.clone(),
                    target_type: target.clone(),
                    relation_kind: w.kind,
                    strength: w.strength,
                    observations: w.observations,
                })
            })
            .collect();
        rels.sort_by(|a, b| {
            a.source_type
                .cmp(&b.source_type)
                .then_with(|| a.target_type.cmp(&b.target_type))
                .then(a.relation_kind.cmp(&b.relation_kind))
        });
        rels
    }

    /// Relações cujas duas pontas estão em `types` (subgrafo induzido).
    pub fn induced(&self, types: &BTreeSet<String>) -> Vec<EvidenceRelationship> {
        self.relationships()
            .into_iter()
            .filter(|r| types.contains(&r.source_type) && types.contains(&r.target_type))
            .collect()
    }

    /// Estatísticas do grafo inteiro.
    pub fn topology(&self) -> TopologyStats {
        TopologyStats::compute(self.types(), &self.relationships())
    }

    pub(crate) fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    pub(crate) fn edge_mut(
        &mut self,
        source: &str,
        target: &str,
        kind: RelationKind,
    ) -> Option<&mut RelationEdge> {
        let a = *self.node_index.get(source)?;
        let b = *self.node_index.get(target)?;
        let id = self
            .graph
            .edges_connecting(a, b)
            .find(|e| e.weight().kind == kind)
            .map(|e| e.id())?;
        self.graph.edge_weight_mut(id)
    }

    pub(crate) fn insert_edge(&mut self, source: &str, target: &str, edge: RelationEdge) {
        let a = self.ensure_node(source);
        let b = self.ensure_node(target);
        self.graph.add_edge(a, b, edge);
    }

    fn ensure_node(&mut self, evidence_type: &str) -> NodeIndex {
        if let Some(&idx) = self.node_index.get(evidence_type) {
            return idx;
        }
        let idx = self.graph.add_node(evidence_type.to_string());
        self.node_index.insert(evidence_type.to_string(), idx);
        idx
    }
}

impl From<GraphSnapshot> for SnapshotRecord {
    fn from(snapshot: GraphSnapshot) -> Self {
        SnapshotRecord {
            version: snapshot.version,
            relationships: snapshot.relationships(),
        }
    }
}

impl TryFrom<SnapshotRecord> for GraphSnapshot {
    type Error = EngineError;

    fn try_from(record: SnapshotRecord) -> Result<Self> {
        GraphSnapshot::from_relationships(record.version, &record.relationships)
    }
}

/// Estatísticas de topologia de um grafo (ou subgrafo) de relações.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologyStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub density: f64,
    pub clustering_coefficient: f64,
    /// Contagem de arestas por tipo de relação.
    pub relationship_counts: BTreeMap<RelationKind, usize>,
}

impl TopologyStats {
    /// Calcula as estatísticas para um conjunto de nós e arestas.
    ///
    /// Nós citados pelas arestas mas ausentes de `nodes` também contam.
    pub fn compute<'a>(
        nodes: impl IntoIterator<Item = &'a str>,
        relationships: &[EvidenceRelationship],
    ) -> Self {
        let mut node_set: BTreeSet<&str> = nodes.into_iter().collect();
        let mut ordered_pairs: BTreeSet<(&str, &str)> = BTreeSet::new();
        let mut neighbors: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        let mut relationship_counts = BTreeMap::new();

        for rel in relationships {
            let (a, b) = (rel.source_type.as_str(), rel.target_type.as_str());
            node_set.insert(a);
            node_set.insert(b);
            *relationship_counts.entry(rel.relation_kind).or_insert(0) += 1;
            if a == b {
                continue;
            }
            ordered_pairs.insert((a, b));
            neighbors.entry(a).or_default().insert(b);
            neighbors.entry(b).or_default().insert(a);
        }

        let n = node_set.len();
        let density = if n > 1 {
            ordered_pairs.len() as f64 / (n * (n - 1)) as f64
        } else {
            0.0
        };

        let clustering_coefficient = if n == 0 {
            0.0
        } else {
            let total: f64 = node_set
                .iter()
                .map(|node| local_clustering(node, &neighbors))
                .sum();
            total / n as f64
        };

        Self {
            node_count: n,
            edge_count: relationships.len(),
            density,
            clustering_coefficient,
            relationship_counts,
        }
    }
}

fn local_clustering(node: &str, neighbors: &BTreeMap<&str, BTreeSet<&str>>) -> f64 {
    let Some(adj) = neighbors.get(node) else {
        return 0.0;
    };
    let k = adj.len();
    if k < 2 {
        return 0.0;
    }
    let adj: Vec<&str> = adj.iter().copied().collect();
    let mut links = 0usize;
    for i in 0..k {
        for j in (i + 1)..k {
            if neighbors
                .get(adj[i])
                .is_some_and(|set| set.contains(adj[j]))
            {
                links += 1;
            }
        }
    }
    links as f64 / (k * (k - 1) / 2) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> GraphSnapshot {
        GraphSnapshot::from_relationships(
            1,
            &[
                EvidenceRelationship::new("a", "b", RelationKind::Supports, 0.8),
                EvidenceRelationship::new("b", "c", RelationKind::Corroborates, 0.6),
                EvidenceRelationship::new("c", "a", RelationKind::Contradicts, 0.4),
            ],
        )
        .unwrap()
    }

    #[test]
    fn lookup_by_kind() {
        let g = triangle();
        assert_eq!(g.strength("a", "b", RelationKind::Supports), 0.8);
        assert_eq!(g.strength("a", "b", RelationKind::Contradicts), 0.0);
        assert_eq!(g.strength("b", "a", RelationKind::Supports), 0.0);
        assert!(g.contains_type("c"));
        assert!(!g.contains_type("z"));
    }

    #[test]
    fn invalid_relationships_are_rejected() {
        let self_loop = [EvidenceRelationship::new("a", "a", RelationKind::Supports, 0.5)];
        assert!(GraphSnapshot::from_relationships(0, &self_loop).is_err());
        let strong = [EvidenceRelationship::new("a", "b", RelationKind::Supports, 1.5)];
        assert!(GraphSnapshot::from_relationships(0, &strong).is_err());
        let dup = [
            EvidenceRelationship::new("a", "b", RelationKind::Supports, 0.5),
            EvidenceRelationship::new("a", "b", RelationKind::Supports, 0.6),
        ];
        assert!(GraphSnapshot::from_relationships(0, &dup).is_err());
    }

    /// Triângulo dirigido: 3 pares ordenados de 6 possíveis, clustering 1.
    #[test]
    fn triangle_topology() {
        let stats = triangle().topology();
        assert_eq!(stats.node_count, 3);
        assert_eq!(stats.edge_count, 3);
        assert!((stats.density - 0.5).abs() < 1e-12);
        assert!((stats.clustering_coefficient - 1.0).abs() < 1e-12);
        assert_eq!(stats.relationship_counts[&RelationKind::Supports], 1);
    }

    #[test]
    fn parallel_edges_count_once_for_density() {
        let g = GraphSnapshot::from_relationships(
            0,
            &[
                EvidenceRelationship::new("a", "b", RelationKind::Supports, 0.5),
                EvidenceRelationship::new("a", "b", RelationKind::Contradicts, 0.2),
            ],
        )
        .unwrap();
        let stats = g.topology();
        assert_eq!(stats.edge_count, 2);
        assert!((stats.density - 0.5).abs() < 1e-12);
        assert_eq!(stats.clustering_coefficient, 0.0);
    }

    #[test]
    fn empty_topology() {
        let stats = GraphSnapshot::empty().topology();
        assert_eq!(stats.node_count, 0);
        assert_eq!(stats.density, 0.0);
        assert_eq!(stats.clustering_coefficient, 0.0);
    }

    #[test]
    fn serde_roundtrip_preserves_edges() {
        let g = triangle();
        let json = serde_json::to_string(&g).unwrap();
        let back: GraphSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.version(), 1);
        assert_eq!(back.relationships(), g.relationships());
    }

    #[test]
    fn outgoing_is_sorted() {
        let g = GraphSnapshot::from_relationships(
            0,
            &[
                EvidenceRelationship::new("a", "z", RelationKind::Supports, 0.5),
                EvidenceRelationship::new("a", "b", RelationKind::Implies, 0.5),
                EvidenceRelationship::new("a", "b", RelationKind::Supports, 0.5),
            ],
        )
        .unwrap();
        let targets: Vec<(&str, RelationKind)> =
            g.outgoing("a").into_iter().map(|(t, e)| (t, e.kind)).collect();
        assert_eq!(
            targets,
            vec![
                ("b", RelationKind::Supports),
                ("b", RelationKind::Implies),
                ("z", RelationKind::Supports)
            ]
        );
    }
}
