// FICHIER : caddie/src/utils/json.rs

use crate::caddie_error;
use crate::utils::error::CaddieResult;
use serde::de::DeserializeOwned;
use serde::Serialize;

// --- RE-EXPORTS (Single Source of Truth pour le JSON) ---
pub use serde_json::{json, Map, Value};

/// Parse une chaîne JSON en un type T.
/// Capture l'erreur de parsing avec un extrait du contenu en cas d'échec.
pub fn parse<T: DeserializeOwned>(s: &str) -> CaddieResult<T> {
    match serde_json::from_str(s) {
        Ok(val) => Ok(val),
        Err(e) => {
            // On capture un extrait du JSON pour aider au débogage
            let snippet: String = s.chars().take(100).collect();
            caddie_error!(
                "ERR_JSON_PARSE",
                error = e,
                context = json!({ "snippet": snippet })
            );
        }
    }
}

/// Convertit un type T en chaîne JSON formatée (pretty).
pub fn stringify_pretty<T: Serialize>(v: &T) -> CaddieResult<String> {
    match serde_json::to_string_pretty(v) {
        Ok(s) => Ok(s),
        Err(e) => caddie_error!("ERR_JSON_STRINGIFY_PRETTY", error = e),
    }
}
