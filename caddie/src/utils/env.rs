// FICHIER : caddie/src/utils/env.rs

use crate::utils::error::{AppError, CaddieResult};
use serde_json::json;
use std::env;
use std::str::FromStr;

/// Récupère une variable d'environnement (Requis).
/// Renvoie une erreur explicite si la clé est manquante.
pub fn get(key: &str) -> CaddieResult<String> {
    env::var(key).map_err(|_| {
        AppError::structured(
            "ERR_CONFIG_ENV_MISSING",
            format!("Variable d'environnement manquante : {}", key),
            json!({ "var": key }),
        )
    })
}

/// Récupère une variable d'environnement (Optionnel).
pub fn get_optional(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Récupère et parse une variable (ex: CADDIE_DEBOUNCE_MS=500).
pub fn get_parsed<T: FromStr>(key: &str) -> CaddieResult<T> {
    let val = get(key)?;
    val.parse::<T>().map_err(|_| {
        AppError::structured(
            "ERR_CONFIG_ENV_PARSE",
            format!("Impossible de parser la variable : {}", key),
            json!({ "var": key, "value": val }),
        )
    })
}
