//! # Persistência — Snapshot do Grafo de Relações em Disco
//!
//! Serializa o [`GraphSnapshot`] (versão + lista de arestas) como JSON
//! "pretty-printed" para facilitar inspeção manual:
//!
//! ```json
//! {
//!   "version": 12,
//!   "relationships": [
//!     { "source_type": "genomics", "target_type": "proteomics",
//!       "relation_kind": "supports", "strength": 0.72, "observations": 9 }
//!   ]
//! }
//! ```
//!
//! O índice de nós não é serializado; é reconstruído ao carregar.
//!
//! ## ⚠️ Atomicidade
//!
//! A escrita usa arquivo temporário + `rename` no mesmo diretório, então
//! um crash durante a escrita não corrompe o snapshot anterior.

use std::path::Path;

use anyhow::{Context, Result};

use crate::graph::{GraphSnapshot, RelationshipStore};

/// Salva um snapshot em `path`, criando o diretório se preciso.
///
/// # Erros
///
/// Falha ao criar o diretório, serializar ou escrever o arquivo.
pub fn save_snapshot(snapshot: &GraphSnapshot, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Falha ao criar diretório {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(snapshot).context("Falha ao serializar o grafo de relações")?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).with_context(|| format!("Falha ao escrever {}", tmp.display()))?;
    std::fs::rename(&tmp, path).with_context(|| format!("Falha ao mover para {}", path.display()))?;
    tracing::info!(
        version = snapshot.version(),
        edges = snapshot.edge_count(),
        path = %path.display(),
        "grafo de relações salvo"
    );
    Ok(())
}

/// Salva o snapshot corrente de um store.
pub fn save_store(store: &RelationshipStore, path: impl AsRef<Path>) -> Result<()> {
    save_snapshot(&store.snapshot(), path)
}

/// Carrega um snapshot, ou devolve um vazio se o arquivo não existir.
///
/// # Erros
///
/// O arquivo existe mas está corrompido ou viola as invariantes do grafo
/// (força fora de `[0, 1]`, laço, aresta duplicada).
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<GraphSnapshot> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::info!(path = %path.display(), "nenhum snapshot encontrado, iniciando grafo vazio");
        return Ok(GraphSnapshot::empty());
    }
    let json = std::fs::read_to_string(path).with_context(|| format!("Falha ao ler {}", path.display()))?;
    let snapshot: GraphSnapshot =
        serde_json::from_str(&json).with_context(|| format!("Falha ao desserializar {}", path.display()))?;
    tracing::info!(
        version = snapshot.version(),
        edges = snapshot.edge_count(),
        "grafo de relações carregado do disco"
    );
    Ok(snapshot)
}
