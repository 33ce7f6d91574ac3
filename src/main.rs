//! # fuzzy-evidence — CLI
//!
//! Ponto de entrada fino sobre o [`EvidenceEngine`]: lê pedidos em JSON,
//! imprime o resultado em JSON na saída padrão.
//!
//! ```text
//! fuzzy-evidence integrate <pedido.json>               # um pedido ou uma lista (lote)
//! fuzzy-evidence predict   <pedido.json>
//! fuzzy-evidence stats     <evidencias.json> <molécula> [janela_dias]
//! fuzzy-evidence optimize  <evidencias.json> <pedido.json>
//! fuzzy-evidence learn     <evidencias.json>           # aprende e salva o grafo
//! fuzzy-evidence seed      <relações.json>             # semeia priors e salva o grafo
//! ```
//!
//! `evidencias.json` é um mapa `molécula → [EvidenceItem]`.
//!
//! ## Ambiente
//!
//! | Variável | Uso |
//! |----------|-----|
//! | `FUZZY_EVIDENCE_CONFIG` | caminho do TOML de configuração (opcional) |
//! | `FUZZY_EVIDENCE_GRAPH` | caminho do snapshot do grafo em JSON (opcional) |
//! | `RUST_LOG` | filtro de logs (padrão `info`) |
//!
//! ```bash
//! RUST_LOG=debug fuzzy-evidence integrate pedido.json
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use fuzzy_evidence::graph::MoleculeEvidence;
use fuzzy_evidence::persistence;
use fuzzy_evidence::{
    EngineConfig, EvidenceEngine, EvidenceItem, EvidenceRelationship, InMemoryEvidenceStore,
    IntegrationRequest, OptimizationRequest, PredictionRequest,
};

const USAGE: &str = "uso: fuzzy-evidence <integrate|predict|stats|optimize|learn|seed> <arquivo.json> [...]";

/// Um pedido isolado ou um lote.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<IntegrationRequest>),
    One(Box<IntegrationRequest>),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (command, rest) = match args.split_first() {
        Some((c, rest)) => (c.as_str(), rest),
        None => bail!(USAGE),
    };

    let config = match std::env::var_os("FUZZY_EVIDENCE_CONFIG") {
        Some(path) => EngineConfig::from_toml_file(&path)
            .with_context(|| format!("Falha ao carregar configuração {}", Path::new(&path).display()))?,
        None => EngineConfig::default(),
    };
    let graph_path = std::env::var_os("FUZZY_EVIDENCE_GRAPH").map(PathBuf::from);
    let snapshot = match &graph_path {
        Some(path) => persistence::load_snapshot(path)?,
        None => Default::default(),
    };

    let store = Arc::new(InMemoryEvidenceStore::new());
    let engine = EvidenceEngine::new(config)
        .context("Configuração do motor inválida")?
        .with_provider(store.clone())
        .with_snapshot(snapshot);
    let engine = Arc::new(engine);

    match (command, rest) {
        ("integrate", [path]) => match read_json::<OneOrMany>(path)? {
            OneOrMany::One(request) => {
                let result = engine.integrate_async(*request).await?;
                print_json(&result)?;
            }
            OneOrMany::Many(requests) => {
                let results: Vec<BatchEntry<_>> = engine
                    .integrate_batch(requests)
                    .await
                    .into_iter()
                    .map(BatchEntry::from)
                    .collect();
                print_json(&results)?;
            }
        },
        ("predict", [path]) => {
            let request: PredictionRequest = read_json(path)?;
            print_json(&engine.predict_evidence(&request)?)?;
        }
        ("stats", [evidence, molecule, window @ ..]) => {
            load_evidence(&store, evidence)?;
            let window = match window {
                [] => None,
                [days] => Some(days.parse::<f64>().with_context(|| format!("janela inválida: {days}"))?),
                _ => bail!(USAGE),
            };
            print_json(&engine.network_stats(molecule, true, window)?)?;
        }
        ("optimize", [evidence, path]) => {
            load_evidence(&store, evidence)?;
            let request: OptimizationRequest = read_json(path)?;
            print_json(&engine.optimize_objective(&request)?)?;
        }
        ("learn", [evidence]) => {
            let molecules = load_evidence(&store, evidence)?;
            let batch: Vec<MoleculeEvidence> = molecules
                .into_iter()
                .map(|(id, items)| MoleculeEvidence::new(id, items))
                .collect();
            let report = engine.learn(&batch);
            save_graph(&engine, graph_path.as_deref())?;
            print_json(&report)?;
        }
        ("seed", [path]) => {
            let priors: Vec<EvidenceRelationship> = read_json(path)?;
            let version = engine.seed_context(&priors)?;
            save_graph(&engine, graph_path.as_deref())?;
            print_json(&serde_json::json!({ "version": version }))?;
        }
        _ => bail!(USAGE),
    }
    Ok(())
}

/// Resultado de um item do lote (erros viram texto).
#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum BatchEntry<T> {
    Ok { result: T },
    Error { error: String },
}

impl<T> From<fuzzy_evidence::Result<T>> for BatchEntry<T> {
    fn from(r: fuzzy_evidence::Result<T>) -> Self {
        match r {
            Ok(result) => BatchEntry::Ok { result },
            Err(e) => BatchEntry::Error { error: e.to_string() },
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &str) -> Result<T> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Falha ao ler {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("Falha ao interpretar {path}"))
}

fn load_evidence(store: &InMemoryEvidenceStore, path: &str) -> Result<BTreeMap<String, Vec<EvidenceItem>>> {
    let molecules: BTreeMap<String, Vec<EvidenceItem>> = read_json(path)?;
    for (id, items) in &molecules {
        store.extend(id.clone(), items.iter().cloned());
    }
    tracing::info!(molecules = molecules.len(), "evidências carregadas");
    Ok(molecules)
}

fn save_graph(engine: &EvidenceEngine, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => persistence::save_store(engine.store(), path),
        None => {
            tracing::warn!("FUZZY_EVIDENCE_GRAPH não definido, grafo não foi salvo");
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Falha ao serializar resultado")?;
    println!("{json}");
    Ok(())
}
