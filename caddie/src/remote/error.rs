// FICHIER : caddie/src/remote/error.rs

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Erreurs renvoyées par les collaborateurs distants (service panier, optimiseur).
///
/// Les réponses non-2xx portent un genre machine (`error`) et un message lisible
/// (`message`) ; on conserve les deux pour l'affichage et pour le routage
/// (ex : demande de connexion).
#[derive(Debug, Clone, Error, Serialize, PartialEq)]
pub enum RemoteError {
    #[error("Ressource introuvable : {0}")]
    NotFound(String),

    #[error("Authentification requise : {0}")]
    AuthenticationRequired(String),

    #[error("Requête refusée ({kind}) : {message}")]
    Rejected { kind: String, message: String },

    #[error("Erreur serveur {status} : {message}")]
    Server { status: u16, message: String },

    #[error("Erreur de transport : {0}")]
    Transport(String),

    #[error("Réponse illisible : {0}")]
    Decode(String),
}

/// Corps d'erreur standard du backend : `{ "error": "...", "message": "..." }`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl RemoteError {
    /// Décode une réponse non-2xx.
    pub fn from_status(status: u16, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let message = parsed
            .message
            .unwrap_or_else(|| format!("HTTP {}", status));
        let kind = parsed.error;

        if kind.as_deref() == Some("authentication_required") || status == 401 || status == 403
        {
            return RemoteError::AuthenticationRequired(message);
        }
        match status {
            404 => RemoteError::NotFound(message),
            400..=499 => RemoteError::Rejected {
                kind: kind.unwrap_or_else(|| format!("http_{}", status)),
                message,
            },
            _ => RemoteError::Server { status, message },
        }
    }

    /// Genre machine de l'erreur.
    pub fn kind(&self) -> &str {
        match self {
            RemoteError::NotFound(_) => "not_found",
            RemoteError::AuthenticationRequired(_) => "authentication_required",
            RemoteError::Rejected { kind, .. } => kind.as_str(),
            RemoteError::Server { .. } => "server_error",
            RemoteError::Transport(_) => "transport",
            RemoteError::Decode(_) => "decode",
        }
    }

    /// Message lisible, sans le préfixe de catégorie.
    pub fn message(&self) -> &str {
        match self {
            RemoteError::NotFound(m)
            | RemoteError::AuthenticationRequired(m)
            | RemoteError::Transport(m)
            | RemoteError::Decode(m) => m.as_str(),
            RemoteError::Rejected { message, .. } | RemoteError::Server { message, .. } => {
                message.as_str()
            }
        }
    }

    /// Erreurs qui peuvent disparaître en réessayant (jamais les 4xx).
    pub fn is_transient(&self) -> bool {
        matches!(self, RemoteError::Server { .. } | RemoteError::Transport(_))
            || matches!(self, RemoteError::Rejected { kind, .. } if kind == "http_429")
    }

    pub fn requires_login(&self) -> bool {
        matches!(self, RemoteError::AuthenticationRequired(_))
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RemoteError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            RemoteError::from_status(status.as_u16(), "")
        } else {
            RemoteError::Transport(err.to_string())
        }
    }
}
