//! # Orquestrador — As Quatro Operações do Motor
//!
//! O [`EvidenceEngine`] é a fachada do sistema. Ele amarra o registro de
//! tipos, o motor fuzzy-bayesiano, o otimizador e o grafo de relações
//! compartilhado, expondo quatro operações:
//!
//! | Operação | Entrada | Saída |
//! |----------|---------|-------|
//! | [`integrate`](EvidenceEngine::integrate) | evidências brutas de uma molécula | avaliação + objetivos + metadados |
//! | [`network_stats`](EvidenceEngine::network_stats) | id da molécula | topologia, distribuição, impacto do decaimento |
//! | [`predict_evidence`](EvidenceEngine::predict_evidence) | tipos-alvo + contexto | predições ranqueadas com caminhos |
//! | [`optimize_objective`](EvidenceEngine::optimize_objective) | pesos, restrições, pesos por item | ótimo, Pareto, sensibilidade, recomendações |
//!
//! ## Ciclo de uma Integração
//!
//! ```text
//! RawEvidence[] ──► validação por item ──┬─► rejeitados (warn, relatados)
//!                                        └─► EvidenceItem[]
//!                                                 │
//!                   snapshot do grafo (Arc) ──────┤
//!                                                 ▼
//!                                   FuzzyBayesianEngine::assess
//!                                                 │
//!                                   objetivos ponderados + metadados
//! ```
//!
//! Só [`learn`](EvidenceEngine::learn) e [`seed_context`](EvidenceEngine::seed_context)
//! alteram estado compartilhado; as quatro operações apenas leem um snapshot.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{DecayConfig, EngineConfig, FuzzyConfig};
use crate::core::{EvidenceItem, EvidenceTypeRegistry, LinguisticRegistry, RawEvidence, TemporalAnomaly};
use crate::error::{EngineError, Result};
use crate::graph::{
    ContextValue, EvidenceRelationship, GraphSnapshot, LearningReport, MoleculeEvidence,
    PredictedEvidence, Prediction, RelationKind, RelationshipStore, TopologyStats,
};
use crate::inference::{Deadline, FuzzyBayesianEngine, PosteriorAssessment, RelationshipConflict};
use crate::optimizer::{
    Candidate, Constraints, ObjectiveVector, ObjectiveWeights, OptimizationReport, Optimizer,
};
use crate::provider::{EvidenceProvider, InMemoryEvidenceStore};

/// Pedido de integração de evidências de uma molécula.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IntegrationRequest {
    pub molecule_id: String,
    #[serde(default)]
    pub evidence: Vec<RawEvidence>,
    #[serde(default)]
    pub fuzzy_config: FuzzyConfig,
    /// Sem pesos, usa os da configuração do motor.
    #[serde(default)]
    pub objective_weights: Option<ObjectiveWeights>,
    /// Multiplicadores (≥ 0) do peso de agregação, por id de item.
    #[serde(default)]
    pub evidence_weights: BTreeMap<String, f64>,
    /// Prazo em ms; sem valor, vale o `deadline_ms` da configuração.
    #[serde(default)]
    pub deadline_ms: Option<u64>,
}

impl IntegrationRequest {
    pub fn new(molecule_id: impl Into<String>, evidence: Vec<RawEvidence>) -> Self {
        Self {
            molecule_id: molecule_id.into(),
            evidence,
            fuzzy_config: FuzzyConfig::default(),
            objective_weights: None,
            evidence_weights: BTreeMap::new(),
            deadline_ms: None,
        }
    }
}

/// Item rejeitado na validação.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RejectedEvidence {
    pub index: usize,
    pub item_id: String,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    pub request_id: Uuid,
    pub molecule_id: String,
    pub graph_version: u64,
    pub evaluated_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub valid_items: usize,
    pub invalid_items: usize,
    pub rejected: Vec<RejectedEvidence>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveScores {
    pub objectives: ObjectiveVector,
    pub total_score: f64,
    pub weights: ObjectiveWeights,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntegrationResult {
    pub assessment: PosteriorAssessment,
    pub objective_scores: ObjectiveScores,
    pub metadata: ProcessingMetadata,
}

/// Agregado por molécula: itens, subgrafo induzido e sua topologia.
///
/// Construído por requisição e descartado ao fim dela.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvidenceNetwork {
    pub molecule_id: String,
    pub items: Vec<EvidenceItem>,
    pub relationships: Vec<EvidenceRelationship>,
    pub topology: TopologyStats,
    pub graph_version: u64,
}

impl EvidenceNetwork {
    pub fn build(molecule_id: impl Into<String>, items: Vec<EvidenceItem>, snapshot: &GraphSnapshot) -> Self {
        let types: BTreeSet<String> = items.iter().map(|i| i.evidence_type.clone()).collect();
        let relationships = snapshot.induced(&types);
        let topology = TopologyStats::compute(types.iter().map(String::as_str), &relationships);
        Self {
            molecule_id: molecule_id.into(),
            items,
            relationships,
            topology,
            graph_version: snapshot.version(),
        }
    }

    pub fn types(&self) -> BTreeSet<&str> {
        self.items.iter().map(|i| i.evidence_type.as_str()).collect()
    }

    /// Cada item como contexto de predição.
    pub fn context(&self) -> Vec<ContextValue> {
        self.items
            .iter()
            .map(|i| ContextValue::new(i.evidence_type.clone(), i.value, i.uncertainty))
            .collect()
    }
}

/// Resumo dos itens de um tipo.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypeDistribution {
    pub count: usize,
    pub mean_value: f64,
    pub mean_uncertainty: f64,
    pub mean_decay_weight: f64,
}

/// Quanto o decaimento temporal descontou das evidências.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecayImpact {
    pub window_days: Option<f64>,
    pub items_considered: usize,
    pub items_outside_window: usize,
    /// `None` sem itens na janela.
    pub mean_decay_weight: Option<f64>,
    pub min_decay_weight: Option<f64>,
    /// `Σ decay_weight`: quantos itens "frescos" as evidências equivalem.
    pub effective_evidence: f64,
    pub temporal_anomalies: Vec<TemporalAnomaly>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkStats {
    pub molecule_id: String,
    pub graph_version: u64,
    pub topology: TopologyStats,
    pub evidence_distribution: BTreeMap<String, TypeDistribution>,
    pub relationship_counts: BTreeMap<RelationKind, usize>,
    /// Arestas do subgrafo violadas pelos valores observados da molécula.
    pub conflict_count: usize,
    pub conflicts: Vec<RelationshipConflict>,
    pub temporal_decay: DecayImpact,
    /// Predições para tipos registrados ausentes (se pedidas).
    pub predictions: Option<Vec<PredictedEvidence>>,
    /// Itens do provedor descartados na validação.
    pub rejected: Vec<RejectedEvidence>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub molecule_id: String,
    /// Vazio: todos os tipos registrados ausentes do contexto.
    #[serde(default)]
    pub evidence_types: Vec<String>,
    /// Vazio: as evidências da molécula no provedor.
    #[serde(default)]
    pub context_evidence: Vec<ContextValue>,
    #[serde(default)]
    pub confidence_threshold: Option<f64>,
    #[serde(default)]
    pub max_predictions: Option<usize>,
}

impl PredictionRequest {
    pub fn new(molecule_id: impl Into<String>) -> Self {
        Self {
            molecule_id: molecule_id.into(),
            evidence_types: Vec::new(),
            context_evidence: Vec::new(),
            confidence_threshold: None,
            max_predictions: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictionReport {
    pub molecule_id: String,
    pub graph_version: u64,
    /// Ordenadas por confiança decrescente, depois por tipo.
    pub predictions: Vec<PredictedEvidence>,
    pub no_path: Vec<String>,
    pub below_threshold: Vec<String>,
    /// Itens do provedor descartados ao montar o contexto.
    pub rejected: Vec<RejectedEvidence>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRequest {
    pub molecule_id: String,
    #[serde(default)]
    pub weights: Option<ObjectiveWeights>,
    #[serde(default)]
    pub constraints: Constraints,
    #[serde(default)]
    pub evidence_weights: BTreeMap<String, f64>,
}

impl OptimizationRequest {
    pub fn new(molecule_id: impl Into<String>) -> Self {
        Self {
            molecule_id: molecule_id.into(),
            weights: None,
            constraints: Constraints::default(),
            evidence_weights: BTreeMap::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimizationOutcome {
    pub molecule_id: String,
    pub graph_version: u64,
    pub report: OptimizationReport,
    /// Itens do provedor descartados antes da otimização.
    pub rejected: Vec<RejectedEvidence>,
}

/// Fachada do motor: configuração, registros, grafo e provedor.
pub struct EvidenceEngine {
    config: EngineConfig,
    types: EvidenceTypeRegistry,
    decay_config: DecayConfig,
    engine: FuzzyBayesianEngine,
    store: RelationshipStore,
    provider: Arc<dyn EvidenceProvider>,
}

impl std::fmt::Debug for EvidenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvidenceEngine")
            .field("types", &self.types.len())
            .field("graph_version", &self.store.version())
            .finish_non_exhaustive()
    }
}

impl EvidenceEngine {
    /// Motor com os tipos padrão, grafo vazio e provedor em memória vazio.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_types(config, EvidenceTypeRegistry::standard())
    }

    /// # Erros
    ///
    /// [`EngineError::Configuration`] se a configuração for inválida.
    pub fn with_types(config: EngineConfig, types: EvidenceTypeRegistry) -> Result<Self> {
        config.validate()?;

        // meias-vidas do registro, sobrescritas pelas da configuração
        let mut per_type: BTreeMap<String, f64> = types
            .half_life_overrides()
            .map(|(ty, hl)| (ty.to_string(), hl))
            .collect();
        per_type.extend(config.decay.per_type.clone());
        let decay_config = DecayConfig {
            half_life_days: config.decay.half_life_days,
            per_type,
        };

        let engine = FuzzyBayesianEngine::new(
            LinguisticRegistry::standard(),
            decay_config.build()?,
            config.inference.clone(),
            config.prediction.clone(),
        );
        tracing::info!(types = types.len(), "motor de evidências inicializado");
        Ok(Self {
            config,
            types,
            decay_config,
            engine,
            store: RelationshipStore::default(),
            provider: Arc::new(InMemoryEvidenceStore::new()),
        })
    }

    pub fn with_provider(mut self, provider: Arc<dyn EvidenceProvider>) -> Self {
        self.provider = provider;
        self
    }

    /// Publica `snapshot` como grafo inicial.
    pub fn with_snapshot(self, snapshot: GraphSnapshot) -> Self {
        self.store.replace(snapshot);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn types(&self) -> &EvidenceTypeRegistry {
        &self.types
    }

    pub fn store(&self) -> &RelationshipStore {
        &self.store
    }

    pub fn snapshot(&self) -> Arc<GraphSnapshot> {
        self.store.snapshot()
    }

    // ─── integrate ──────────────────────────────────────────────

    /// Integra com o relógio atual e o prazo do pedido (ou da configuração).
    pub fn integrate(&self, request: &IntegrationRequest) -> Result<IntegrationResult> {
        let deadline = Deadline::from_millis(request.deadline_ms.or(self.config.deadline_ms));
        self.integrate_at(request, Utc::now(), &deadline)
    }

    /// Integra com instante de avaliação explícito.
    ///
    /// Com o mesmo `now` e o mesmo snapshot, a avaliação e os objetivos
    /// são idênticos bit a bit (só os metadados variam).
    ///
    /// # Erros
    ///
    /// - [`EngineError::Configuration`] para configuração fuzzy, pesos ou multiplicadores inválidos
    /// - [`EngineError::AllEvidenceInvalid`] se havia itens e todos foram rejeitados
    /// - [`EngineError::DeadlineExceeded`] se o prazo estourar
    pub fn integrate_at(
        &self,
        request: &IntegrationRequest,
        now: DateTime<Utc>,
        deadline: &Deadline,
    ) -> Result<IntegrationResult> {
        let started = Instant::now();
        let request_id = Uuid::new_v4();

        check_evidence_weights(&request.evidence_weights)?;
        let weights = request
            .objective_weights
            .clone()
            .unwrap_or_else(|| self.config.optimizer.weights.clone());
        let optimizer = Optimizer::new(
            weights.clone(),
            Constraints::default(),
            self.config.optimizer.sensitivity_delta,
        )?;
        let custom_engine = self.engine_for(&request.fuzzy_config)?;
        let engine = custom_engine.as_ref().unwrap_or(&self.engine);

        let (items, rejected) = self.validate_all(&request.evidence, now)?;
        if !request.evidence.is_empty() && items.is_empty() {
            tracing::warn!(
                molecule = %request.molecule_id,
                rejected = rejected.len(),
                "todas as evidências foram rejeitadas"
            );
            return Err(EngineError::AllEvidenceInvalid {
                rejected: rejected.len(),
            });
        }

        let snapshot = self.store.snapshot();
        let assessment = engine.assess(&items, &snapshot, now, &request.evidence_weights, deadline)?;
        let objectives = ObjectiveVector::from_assessment(&assessment);
        let total_score = optimizer.score(&objectives);

        let elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            molecule = %request.molecule_id,
            %request_id,
            valid = items.len(),
            invalid = rejected.len(),
            score = assessment.overall_score,
            graph_version = snapshot.version(),
            elapsed_ms,
            "integração concluída"
        );

        Ok(IntegrationResult {
            objective_scores: ObjectiveScores {
                objectives,
                total_score,
                weights,
            },
            metadata: ProcessingMetadata {
                request_id,
                molecule_id: request.molecule_id.clone(),
                graph_version: snapshot.version(),
                evaluated_at: now,
                elapsed_ms,
                valid_items: items.len(),
                invalid_items: rejected.len(),
                rejected,
            },
            assessment,
        })
    }

    /// [`integrate`](Self::integrate) numa thread bloqueante do tokio, sob `timeout`.
    ///
    /// # Erros
    ///
    /// Além dos de `integrate`: [`EngineError::DeadlineExceeded`] se o prazo
    /// vencer antes da task terminar e [`EngineError::TaskJoin`] se ela falhar.
    pub async fn integrate_async(self: &Arc<Self>, request: IntegrationRequest) -> Result<IntegrationResult> {
        let budget = request.deadline_ms.or(self.config.deadline_ms);
        let molecule_id = request.molecule_id.clone();
        let engine = Arc::clone(self);
        let task = tokio::task::spawn_blocking(move || engine.integrate(&request));

        let joined = match budget {
            Some(ms) => match tokio::time::timeout(Duration::from_millis(ms), task).await {
                Ok(joined) => joined,
                Err(_) => {
                    tracing::warn!(molecule = %molecule_id, deadline_ms = ms, "prazo excedido aguardando integração");
                    return Err(EngineError::DeadlineExceeded { stage: "integrate" });
                }
            },
            None => task.await,
        };
        joined.map_err(|e| EngineError::TaskJoin(e.to_string()))?
    }

    /// Integra várias moléculas em paralelo, uma task por molécula.
    ///
    /// Os resultados saem na ordem dos pedidos.
    pub async fn integrate_batch(self: &Arc<Self>, requests: Vec<IntegrationRequest>) -> Vec<Result<IntegrationResult>> {
        let count = requests.len();
        let results =
            futures_util::future::join_all(requests.into_iter().map(|r| self.integrate_async(r))).await;
        let failed = results.iter().filter(|r| r.is_err()).count();
        tracing::info!(count, failed, "lote de integrações concluído");
        results
    }

    // ─── network_stats ──────────────────────────────────────────

    pub fn network_stats(
        &self,
        molecule_id: &str,
        include_predictions: bool,
        temporal_window_days: Option<f64>,
    ) -> Result<NetworkStats> {
        self.network_stats_at(molecule_id, include_predictions, temporal_window_days, Utc::now())
    }

    /// # Erros
    ///
    /// - [`EngineError::UnknownMolecule`]
    /// - [`EngineError::Configuration`] para janela temporal não positiva
    /// - [`EngineError::AllEvidenceInvalid`] se nenhum item do provedor for válido
    pub fn network_stats_at(
        &self,
        molecule_id: &str,
        include_predictions: bool,
        temporal_window_days: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<NetworkStats> {
        if let Some(w) = temporal_window_days {
            if !w.is_finite() || w <= 0.0 {
                return Err(EngineError::config(format!(
                    "temporal_window_days deve ser positivo, recebido {w}"
                )));
            }
        }
        let (all_items, rejected) = self.provided_evidence(molecule_id)?;
        let decay = self.engine.decay();

        let mut items = Vec::with_capacity(all_items.len());
        let mut weights = Vec::with_capacity(all_items.len());
        let mut anomalies = Vec::new();
        let mut outside = 0usize;
        for item in all_items {
            let outcome = decay.evaluate(&item.id, &item.evidence_type, item.timestamp, now);
            if temporal_window_days.is_some_and(|w| outcome.age_days > w) {
                outside += 1;
                continue;
            }
            anomalies.extend(outcome.anomaly);
            weights.push(outcome.weight);
            items.push(item);
        }

        let snapshot = self.store.snapshot();
        let network = EvidenceNetwork::build(molecule_id, items, &snapshot);

        let mut sums: BTreeMap<String, (usize, f64, f64, f64)> = BTreeMap::new();
        for (item, w) in network.items.iter().zip(&weights) {
            let e = sums.entry(item.evidence_type.clone()).or_insert((0, 0.0, 0.0, 0.0));
            e.0 += 1;
            e.1 += item.value;
            e.2 += item.uncertainty;
            e.3 += w;
        }
        let evidence_distribution = sums
            .into_iter()
            .map(|(ty, (n, v, u, w))| {
                let n_f = n as f64;
                (
                    ty,
                    TypeDistribution {
                        count: n,
                        mean_value: v / n_f,
                        mean_uncertainty: u / n_f,
                        mean_decay_weight: w / n_f,
                    },
                )
            })
            .collect();

        let effective_evidence: f64 = weights.iter().sum();
        let temporal_decay = DecayImpact {
            window_days: temporal_window_days,
            items_considered: weights.len(),
            items_outside_window: outside,
            mean_decay_weight: (!weights.is_empty()).then(|| effective_evidence / weights.len() as f64),
            min_decay_weight: weights.iter().copied().reduce(f64::min),
            effective_evidence,
            temporal_anomalies: anomalies,
        };

        let predictions = include_predictions.then(|| {
            let present = network.types();
            let context = network.context();
            let targets: Vec<String> = self
                .types
                .ids()
                .filter(|ty| !present.contains(ty))
                .map(str::to_string)
                .collect();
            let (predicted, _, _) = self.rank_predictions(
                &snapshot,
                &targets,
                &context,
                self.config.prediction.confidence_threshold,
                self.config.prediction.max_predictions,
            );
            predicted
        });

        let consistency = self.engine.consistency(&network.items, &snapshot);
        tracing::debug!(
            molecule = %molecule_id,
            items = network.items.len(),
            edges = network.topology.edge_count,
            graph_version = network.graph_version,
            "estatísticas da rede calculadas"
        );

        Ok(NetworkStats {
            molecule_id: molecule_id.to_string(),
            graph_version: network.graph_version,
            relationship_counts: network.topology.relationship_counts.clone(),
            topology: network.topology,
            evidence_distribution,
            conflict_count: consistency.conflicts.len(),
            conflicts: consistency.conflicts,
            temporal_decay,
            predictions,
            rejected,
        })
    }

    // ─── predict_evidence ───────────────────────────────────────

    /// Prevê tipos ausentes a partir do contexto.
    ///
    /// # Erros
    ///
    /// - [`EngineError::Validation`] para tipo-alvo ou de contexto não registrado
    /// - [`EngineError::Configuration`] para limiar fora de `[0, 1]`
    /// - [`EngineError::UnknownMolecule`] sem contexto explícito e sem a molécula no provedor
    /// - [`EngineError::AllEvidenceInvalid`] se o contexto do provedor for todo inválido
    pub fn predict_evidence(&self, request: &PredictionRequest) -> Result<PredictionReport> {
        let threshold = request
            .confidence_threshold
            .unwrap_or(self.config.prediction.confidence_threshold);
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(EngineError::config(format!(
                "confidence_threshold fora de [0, 1]: {threshold}"
            )));
        }
        let max_predictions = request
            .max_predictions
            .unwrap_or(self.config.prediction.max_predictions);

        let mut rejected = Vec::new();
        let context = if request.context_evidence.is_empty() {
            let (items, dropped) = self.provided_evidence(&request.molecule_id)?;
            rejected = dropped;
            items
                .iter()
                .map(|i| ContextValue::new(i.evidence_type.clone(), i.value, i.uncertainty))
                .collect()
        } else {
            for (index, ctx) in request.context_evidence.iter().enumerate() {
                let id = format!("{}#{index}", ctx.evidence_type);
                if !self.types.contains(&ctx.evidence_type) {
                    return Err(EngineError::invalid(
                        id,
                        format!("tipo de evidência desconhecido '{}'", ctx.evidence_type),
                    ));
                }
                for (field, x) in [("value", ctx.value), ("uncertainty", ctx.uncertainty)] {
                    if !x.is_finite() || !(0.0..=1.0).contains(&x) {
                        return Err(EngineError::invalid(id, format!("{field} fora de [0, 1]: {x}")));
                    }
                }
            }
            request.context_evidence.clone()
        };

        let targets: Vec<String> = if request.evidence_types.is_empty() {
            let present: BTreeSet<&str> = context.iter().map(|c| c.evidence_type.as_str()).collect();
            self.types
                .ids()
                .filter(|ty| !present.contains(ty))
                .map(str::to_string)
                .collect()
        } else {
            for ty in &request.evidence_types {
                if !self.types.contains(ty) {
                    return Err(EngineError::invalid(
                        ty.clone(),
                        format!("tipo de evidência desconhecido '{ty}'"),
                    ));
                }
            }
            let unique: BTreeSet<&String> = request.evidence_types.iter().collect();
            unique.into_iter().cloned().collect()
        };

        let snapshot = self.store.snapshot();
        let (predictions, no_path, below_threshold) =
            self.rank_predictions(&snapshot, &targets, &context, threshold, max_predictions);
        tracing::debug!(
            molecule = %request.molecule_id,
            predicted = predictions.len(),
            no_path = no_path.len(),
            below_threshold = below_threshold.len(),
            "predição de evidências concluída"
        );
        Ok(PredictionReport {
            molecule_id: request.molecule_id.clone(),
            graph_version: snapshot.version(),
            predictions,
            no_path,
            below_threshold,
            rejected,
        })
    }

    /// Prediz cada alvo em paralelo e ranqueia por confiança, depois tipo.
    fn rank_predictions(
        &self,
        snapshot: &GraphSnapshot,
        targets: &[String],
        context: &[ContextValue],
        threshold: f64,
        max_predictions: usize,
    ) -> (Vec<PredictedEvidence>, Vec<String>, Vec<String>) {
        let outcomes: Vec<Prediction> = targets
            .par_iter()
            .map(|ty| snapshot.predict(ty, context, &self.config.prediction))
            .collect();

        let mut predicted = Vec::new();
        let mut no_path = Vec::new();
        let mut below = Vec::new();
        for outcome in outcomes {
            match outcome {
                Prediction::NoPathFound { evidence_type } => no_path.push(evidence_type),
                Prediction::Predicted(p) if p.confidence < threshold => below.push(p.evidence_type),
                Prediction::Predicted(p) => predicted.push(p),
            }
        }
        predicted.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.evidence_type.cmp(&b.evidence_type))
        });
        predicted.truncate(max_predictions);
        (predicted, no_path, below)
    }

    // ─── optimize_objective ─────────────────────────────────────

    pub fn optimize_objective(&self, request: &OptimizationRequest) -> Result<OptimizationOutcome> {
        self.optimize_objective_at(request, Utc::now())
    }

    /// Avalia o conjunto completo, o conjunto ponderado (se houver pesos
    /// por item) e cada subconjunto leave-one-out, e otimiza entre eles.
    ///
    /// # Erros
    ///
    /// [`EngineError::UnknownMolecule`], [`EngineError::Configuration`] e
    /// [`EngineError::AllEvidenceInvalid`].
    pub fn optimize_objective_at(
        &self,
        request: &OptimizationRequest,
        now: DateTime<Utc>,
    ) -> Result<OptimizationOutcome> {
        check_evidence_weights(&request.evidence_weights)?;
        let weights = request
            .weights
            .clone()
            .unwrap_or_else(|| self.config.optimizer.weights.clone());
        let optimizer = Optimizer::new(
            weights,
            request.constraints.clone(),
            self.config.optimizer.sensitivity_delta,
        )?;

        let (items, rejected) = self.provided_evidence(&request.molecule_id)?;
        let snapshot = self.store.snapshot();
        let deadline = Deadline::from_millis(self.config.deadline_ms);
        let unweighted = BTreeMap::new();

        let full = self.engine.assess(&items, &snapshot, now, &unweighted, &deadline)?;
        let baseline = Candidate::from_assessment("all", &full);

        let mut alternatives = Vec::new();
        if !request.evidence_weights.is_empty() {
            let weighted = self
                .engine
                .assess(&items, &snapshot, now, &request.evidence_weights, &deadline)?;
            alternatives.push(Candidate::from_assessment("weighted", &weighted));
        }
        if items.len() >= 2 {
            let subsets: Vec<Result<Candidate>> = (0..items.len())
                .into_par_iter()
                .map(|skip| {
                    let subset: Vec<EvidenceItem> = items
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| *i != skip)
                        .map(|(_, item)| item.clone())
                        .collect();
                    let assessment = self.engine.assess(&subset, &snapshot, now, &unweighted, &deadline)?;
                    let id = &items[skip].id;
                    Ok(Candidate::from_assessment(format!("without:{id}"), &assessment).excluding(id.clone()))
                })
                .collect();
            for candidate in subsets {
                alternatives.push(candidate?);
            }
        }

        let report = optimizer.optimize(&baseline, &alternatives);
        tracing::info!(
            molecule = %request.molecule_id,
            candidates = report.candidates_evaluated,
            infeasible = report.infeasible,
            optimal = report.optimal_score.unwrap_or(f64::NAN),
            recommendations = report.recommendations.len(),
            "otimização de objetivos concluída"
        );
        Ok(OptimizationOutcome {
            molecule_id: request.molecule_id.clone(),
            graph_version: snapshot.version(),
            report,
            rejected,
        })
    }

    // ─── estado compartilhado ───────────────────────────────────

    /// Aprende co-ocorrências de um lote de moléculas.
    ///
    /// Itens de tipo não registrado são descartados com aviso.
    pub fn learn(&self, batch: &[MoleculeEvidence]) -> LearningReport {
        let filtered: Vec<MoleculeEvidence> = batch
            .iter()
            .map(|m| {
                let items = m
                    .items
                    .iter()
                    .filter(|item| match self.types.check_item(item) {
                        Ok(()) => true,
                        Err(e) => {
                            tracing::warn!(molecule = %m.molecule_id, error = %e, "item ignorado no aprendizado");
                            false
                        }
                    })
                    .cloned()
                    .collect();
                MoleculeEvidence::new(m.molecule_id.clone(), items)
            })
            .collect();
        self.store
            .learn(&filtered, self.engine.linguistic(), &self.config.graph)
    }

    /// Aprende a partir das evidências de moléculas do provedor.
    pub fn learn_molecules(&self, molecule_ids: &[&str]) -> Result<LearningReport> {
        let batch = molecule_ids
            .iter()
            .map(|id| Ok(MoleculeEvidence::new(*id, self.provider.evidence_for(id)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.learn(&batch))
    }

    /// Semeia priors de contexto (vias, interações) no grafo.
    ///
    /// # Erros
    ///
    /// [`EngineError::Validation`] para tipo não registrado;
    /// [`EngineError::Configuration`] para prior malformado.
    pub fn seed_context(&self, priors: &[EvidenceRelationship]) -> Result<u64> {
        for prior in priors {
            for ty in [&prior.source_type, &prior.target_type] {
                if !self.types.contains(ty) {
                    return Err(EngineError::invalid(
                        prior.describe(),
                        format!("tipo de evidência desconhecido '{ty}'"),
                    ));
                }
            }
        }
        let version = self.store.seed(priors)?;
        tracing::info!(priors = priors.len(), version, "priors de contexto semeados");
        Ok(version)
    }

    // ─── auxiliares ─────────────────────────────────────────────

    /// Motor próprio da requisição, se a configuração fuzzy não for a padrão.
    fn engine_for(&self, fuzzy: &FuzzyConfig) -> Result<Option<FuzzyBayesianEngine>> {
        if fuzzy.variables.is_none() && fuzzy.per_type.is_empty() && fuzzy.half_life_days.is_none() {
            return Ok(None);
        }
        for ty in fuzzy.per_type.keys() {
            if !self.types.contains(ty) {
                return Err(EngineError::config(format!(
                    "variáveis para tipo não registrado '{ty}'"
                )));
            }
        }
        Ok(Some(FuzzyBayesianEngine::new(
            fuzzy.build_registry()?,
            fuzzy.build_decay(&self.decay_config)?,
            self.config.inference.clone(),
            self.config.prediction.clone(),
        )))
    }

    /// Evidências da molécula no provedor, conferidas item a item.
    ///
    /// Itens inválidos são descartados com aviso; se havia itens e todos
    /// caíram, falha com [`EngineError::AllEvidenceInvalid`].
    fn provided_evidence(&self, molecule_id: &str) -> Result<(Vec<EvidenceItem>, Vec<RejectedEvidence>)> {
        let provided = self.provider.evidence_for(molecule_id)?;
        let total = provided.len();
        let mut items = Vec::with_capacity(total);
        let mut rejected = Vec::new();
        for (index, item) in provided.into_iter().enumerate() {
            match self.types.check_item(&item) {
                Ok(()) => items.push(item),
                Err(EngineError::Validation { item_id, reason }) => {
                    tracing::warn!(molecule = %molecule_id, item = %item_id, %reason, "evidência do provedor rejeitada");
                    rejected.push(RejectedEvidence {
                        index,
                        item_id,
                        reason,
                    });
                }
                Err(e) => return Err(e),
            }
        }
        if total > 0 && items.is_empty() {
            return Err(EngineError::AllEvidenceInvalid {
                rejected: rejected.len(),
            });
        }
        Ok((items, rejected))
    }

    fn validate_all(
        &self,
        raw: &[RawEvidence],
        now: DateTime<Utc>,
    ) -> Result<(Vec<EvidenceItem>, Vec<RejectedEvidence>)> {
        let mut items = Vec::with_capacity(raw.len());
        let mut rejected = Vec::new();
        for (index, record) in raw.iter().enumerate() {
            match self.types.validate(record, index, now) {
                Ok(item) => items.push(item),
                Err(EngineError::Validation { item_id, reason }) => {
                    tracing::warn!(item = %item_id, %reason, "evidência rejeitada");
                    rejected.push(RejectedEvidence {
                        index,
                        item_id,
                        reason,
                    });
                }
                Err(e) => return Err(e),
            }
        }
        Ok((items, rejected))
    }
}

fn check_evidence_weights(weights: &BTreeMap<String, f64>) -> Result<()> {
    for (id, w) in weights {
        if !w.is_finite() || *w < 0.0 {
            return Err(EngineError::config(format!(
                "peso da evidência '{id}' deve ser finito e ≥ 0, recebido {w}"
            )));
        }
    }
    Ok(())
}
