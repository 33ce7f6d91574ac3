//! # Erros do Motor de Evidências
//!
//! Taxonomia de falhas **fatais** do motor. Diagnósticos não fatais
//! (anomalia temporal, ausência de caminho no grafo, baixa corroboração)
//! não aparecem aqui; são valores retornados junto com o resultado.
//!
//! | Variante | Quando ocorre | Efeito |
//! |----------|---------------|--------|
//! | `Configuration` | Parâmetros de função de pertinência, pesos ou config inválidos | Rejeita antes de qualquer cálculo |
//! | `Validation` | Item de evidência fora de faixa ou tipo desconhecido | Rejeita só o item |
//! | `AllEvidenceInvalid` | Nenhum item válido restou no lote | Falha total, sem avaliação |
//! | `DeadlineExceeded` | Prazo do chamador estourou | Aborta sem publicar nada |

use thiserror::Error;

/// Alias de resultado usado em todo o crate.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Erros do motor de integração de evidências.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuração malformada (funções de pertinência, pesos, limites).
    #[error("configuração inválida: {0}")]
    Configuration(String),

    /// Um item de evidência específico foi rejeitado.
    #[error("evidência '{item_id}' inválida: {reason}")]
    Validation { item_id: String, reason: String },

    /// Todos os itens fornecidos foram rejeitados na validação.
    #[error("nenhuma evidência válida entre {rejected} itens")]
    AllEvidenceInvalid { rejected: usize },

    /// O prazo fornecido pelo chamador foi excedido.
    #[error("prazo excedido durante '{stage}'")]
    DeadlineExceeded { stage: &'static str },

    /// Molécula sem evidências no provedor consultado.
    #[error("molécula desconhecida: {0}")]
    UnknownMolecule(String),

    #[error("erro de E/S: {0}")]
    Io(#[from] std::io::Error),

    #[error("erro de serialização: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("erro ao ler configuração TOML: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A task de trabalho terminou com pânico ou foi cancelada.
    #[error("falha na task de análise: {0}")]
    TaskJoin(String),
}

impl EngineError {
    /// Atalho para erros de configuração.
    pub fn config(msg: impl Into<String>) -> Self {
        EngineError::Configuration(msg.into())
    }

    /// Atalho para erros de validação de um item.
    pub fn invalid(item_id: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::Validation {
            item_id: item_id.into(),
            reason: reason.into(),
        }
    }

    /// `true` para erros que invalidam só um item (o lote continua).
    pub fn is_per_item(&self) -> bool {
        matches!(self, EngineError::Validation { .. })
    }
}
