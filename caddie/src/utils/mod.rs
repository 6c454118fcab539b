// FICHIER : caddie/src/utils/mod.rs

// =========================================================================
//  CADDIE UTILS - Foundation Layer
// =========================================================================

pub mod config;
pub mod env;
pub mod error;
pub mod i18n;
pub mod json;
pub mod logger;
pub mod macros;
pub mod net;

// --- FAÇADES SÉMANTIQUES ---

/// **Core Foundation** : Types de base et Erreurs.
pub mod core {
    pub use super::error::{AppError, CaddieResult, StructuredError};
    pub use chrono::{DateTime, Utc};
}

/// **Data Abstraction** : Manipulation JSON.
pub mod data {
    pub use super::json::{json, parse, stringify_pretty, Map, Value};
    pub use serde::{Deserialize, Serialize};
    pub use std::collections::{HashMap, HashSet};
}

/// **Application Context** : Accès global Config/Log/Env.
pub mod context {
    pub use super::config::AppConfig;
    pub use super::i18n::{init_i18n, init_i18n_from_str, t};
    pub use super::logger::init_logging;
}

/// **Connectivity** : Client HTTP partagé.
pub mod net_client {
    pub use super::net::{get_client, post_json_with_retry, send_empty, send_json};
}

/// **Le Prélude** : À utiliser via `use crate::utils::prelude::*;`
pub mod prelude {
    pub use super::context::AppConfig;
    pub use super::core::{AppError, CaddieResult, DateTime, Utc};
    pub use super::data::{json, Deserialize, Serialize, Value};
    pub use tracing::{debug, error, info, instrument, warn};
}

// --> Exports directs
pub use config::AppConfig;
pub use error::{AppError, CaddieResult};
pub use logger::init_logging;

// --> Async Runtime & Sync
pub use async_trait::async_trait;
pub use std::sync::{Arc, Mutex, MutexGuard};
pub use std::time::Duration;
pub use tokio::sync::{broadcast, Mutex as AsyncMutex, Notify};
