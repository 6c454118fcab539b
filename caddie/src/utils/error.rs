// FICHIER : caddie/src/utils/error.rs

use serde::Serialize;
use serde_json::Value;
use std::io;

use crate::remote::RemoteError;

// --- RE-EXPORTS ANYHOW (Pour la flexibilité du CLI) ---
pub use anyhow::{anyhow, Context};
// On renomme le Result de anyhow pour ne pas qu'il écrase le nôtre
pub use anyhow::Result as AnyResult;

/// Nom du service injecté dans chaque erreur structurée (corrélation des logs).
pub const SERVICE_NAME: &str = "caddie-core";

/// Type de résultat standard du moteur de panier.
pub type CaddieResult<T> = std::result::Result<T, AppError>;

/// Charge utile d'une erreur structurée (type Datadog / ELK).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StructuredError {
    pub service: String,
    pub code: String,
    pub component: String,
    pub message: String,
    pub context: Value,
}

impl StructuredError {
    pub fn new(code: &str, message: impl Into<String>, context: Value) -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
            code: code.to_string(),
            component: component_from_code(code),
            message: message.into(),
            context,
        }
    }
}

/// Déduit le composant depuis le code : `ERR_CART_ITEM_NOT_FOUND` -> `CART`.
pub fn component_from_code(code: &str) -> String {
    code.strip_prefix("ERR_")
        .and_then(|rest| rest.split('_').next())
        .filter(|segment| !segment.is_empty())
        .unwrap_or("CORE")
        .to_string()
}

/// Enumération centrale des erreurs de l'application.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("[{}] {} : {}", .0.component, .0.code, .0.message)]
    Structured(Box<StructuredError>),

    #[error("Erreur du service distant : {0}")]
    Remote(#[from] RemoteError),
}

impl AppError {
    /// Construit une erreur structurée sans la retourner (pour `map_err`, `ok_or_else`...).
    pub fn structured(code: &str, message: impl Into<String>, context: Value) -> Self {
        AppError::Structured(Box::new(StructuredError::new(code, message, context)))
    }

    /// Code machine de l'erreur (les erreurs distantes exposent leur genre).
    pub fn code(&self) -> &str {
        match self {
            AppError::Structured(data) => &data.code,
            AppError::Remote(remote) => remote.kind(),
        }
    }

    /// Erreur distante sous-jacente, si l'erreur vient du réseau.
    pub fn as_remote(&self) -> Option<&RemoteError> {
        match self {
            AppError::Remote(remote) => Some(remote),
            AppError::Structured(_) => None,
        }
    }
}

// Sérialisation en simple chaîne pour les couches de présentation (CLI, toasts).
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::structured("ERR_IO", err.to_string(), Value::Null)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::structured(
            "ERR_JSON_SERIALIZATION",
            err.to_string(),
            serde_json::json!({ "line": err.line(), "column": err.column() }),
        )
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Remote(RemoteError::from(err))
    }
}

// Permet de faire : return Err("Mon erreur".into());
impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::structured("ERR_SYSTEM", s, Value::Null)
    }
}

impl From<&str> for AppError {
    fn from(s: &str) -> Self {
        AppError::structured("ERR_SYSTEM", s, Value::Null)
    }
}
