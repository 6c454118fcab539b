// FICHIER : caddie/src/utils/config.rs

use crate::caddie_error;
use crate::utils::env as app_env;
use crate::utils::error::CaddieResult;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

/// Singleton global pour la configuration
static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Constantes Système (Single Source of Truth)
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api/";
pub const DEFAULT_DEBOUNCE_MS: u64 = 1500;
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Configuration globale structurée par niveaux de responsabilité
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub core: CoreConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub optimizer: OptimizerConfig,

    // Gestion transparente de la conversion Liste -> Map via Serde
    #[serde(default, deserialize_with = "deserialize_paths_flexible")]
    pub paths: HashMap<String, String>,
}

// --- SOUS-STRUCTURES DE CONFIGURATION ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoreConfig {
    pub env_mode: String,
    pub log_level: String,
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    /// Racine REST du service panier et de l'optimiseur
    pub base_url: String,
    pub timeout_secs: u64,
    /// Tentatives pour l'optimiseur (jamais pour la synchro du panier)
    pub optimizer_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncConfig {
    /// Fenêtre de quiescence du debounce (front descendant)
    pub debounce_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizerConfig {
    /// Plafonds de magasins proposés en onglets
    pub store_options: Vec<u32>,
}

// --- HELPERS SERDE ---

fn deserialize_paths_flexible<'de, D>(
    deserializer: D,
) -> std::result::Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v: Value = Deserialize::deserialize(deserializer)?;

    if let Some(map) = v.as_object() {
        let mut paths = HashMap::new();
        for (key, val) in map {
            if let Some(s) = val.as_str() {
                paths.insert(key.clone(), s.to_string());
            }
        }
        Ok(paths)
    } else if let Some(arr) = v.as_array() {
        let mut paths = HashMap::new();
        for item in arr {
            let id = item.get("id").and_then(|v| v.as_str());
            let val = item.get("value").and_then(|v| v.as_str());
            if let (Some(k), Some(v)) = (id, val) {
                paths.insert(k.to_string(), v.to_string());
            }
        }
        Ok(paths)
    } else {
        Err(serde::de::Error::custom(
            "Format de 'paths' invalide : attendu Map ou Liste",
        ))
    }
}

// --- IMPLÉMENTATION PRINCIPALE ---

impl AppConfig {
    pub fn init() -> CaddieResult<()> {
        if CONFIG.get().is_some() {
            return Ok(());
        }

        let target_env = if cfg!(test) || env::var("CADDIE_ENV_MODE").as_deref() == Ok("test") {
            "test".to_string()
        } else if let Ok(env_override) = env::var("CADDIE_ENV_MODE") {
            env_override
        } else if cfg!(debug_assertions) {
            "development".to_string()
        } else {
            "production".to_string()
        };

        let mut config = if target_env == "test" {
            Self::create_default_test_config()
        } else {
            Self::load_user_config(&target_env)?
        };
        config.apply_env_overrides();

        if CONFIG.set(config).is_err() {
            caddie_error!(
                "ERR_CONFIG_INIT_ONCE",
                error = "La configuration est déjà initialisée"
            );
        }

        Ok(())
    }

    pub fn get() -> &'static AppConfig {
        CONFIG
            .get()
            .expect("❌ AppConfig non initialisé ! Appelez AppConfig::init() au démarrage.")
    }

    /// Variante non paniquante (utilisée par les couches qui tolèrent l'absence de config).
    pub fn try_get() -> Option<&'static AppConfig> {
        CONFIG.get()
    }

    pub fn get_path(&self, id: &str) -> Option<PathBuf> {
        self.paths.get(id).map(PathBuf::from)
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.sync.debounce_ms)
    }

    /// Charge `CADDIE_CONFIG` ou `~/.caddie/config.json`, sinon les valeurs par défaut.
    fn load_user_config(env_mode: &str) -> CaddieResult<Self> {
        let path = match app_env::get_optional("CADDIE_CONFIG") {
            Some(explicit) => Some(PathBuf::from(explicit)),
            None => dirs::home_dir().map(|h| h.join(".caddie").join(CONFIG_FILE_NAME)),
        };

        let Some(path) = path.filter(|p| p.exists()) else {
            tracing::debug!("Aucun fichier de configuration, valeurs par défaut ({})", env_mode);
            return Ok(Self::defaults_for(env_mode));
        };

        Self::load_from_file(&path)
    }

    pub fn load_from_file(path: &std::path::Path) -> CaddieResult<Self> {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => caddie_error!(
                "ERR_CONFIG_FS_READ",
                error = e,
                context = serde_json::json!({ "path": path.to_string_lossy() })
            ),
        };

        let mut config: AppConfig = match serde_json::from_str(&content) {
            Ok(cfg) => cfg,
            Err(e) => caddie_error!(
                "ERR_CONFIG_PARSE",
                error = e,
                context = serde_json::json!({ "path": path.to_string_lossy() })
            ),
        };
        config.fill_default_paths();
        Ok(config)
    }

    fn defaults_for(env_mode: &str) -> Self {
        let mut config = AppConfig {
            core: CoreConfig {
                env_mode: env_mode.to_string(),
                log_level: "warn".to_string(),
                language: "fr".to_string(),
            },
            api: ApiConfig::default(),
            sync: SyncConfig::default(),
            optimizer: OptimizerConfig::default(),
            paths: HashMap::new(),
        };
        config.fill_default_paths();
        config
    }

    fn fill_default_paths(&mut self) {
        let home = dirs::home_dir()
            .unwrap_or_else(env::temp_dir)
            .join(".caddie");
        self.paths
            .entry("PATH_CADDIE_HOME".to_string())
            .or_insert_with(|| home.to_string_lossy().to_string());
        let logs = self
            .get_path("PATH_CADDIE_HOME")
            .unwrap_or(home)
            .join("logs");
        self.paths
            .entry("PATH_LOGS".to_string())
            .or_insert_with(|| logs.to_string_lossy().to_string());
    }

    fn apply_env_overrides(&mut self) {
        if let Some(url) = app_env::get_optional("CADDIE_API_URL") {
            self.api.base_url = url;
        }
        if let Some(lang) = app_env::get_optional("CADDIE_LANG") {
            self.core.language = lang;
        }
        if let Ok(ms) = app_env::get_parsed::<u64>("CADDIE_DEBOUNCE_MS") {
            self.sync.debounce_ms = ms;
        }
    }

    fn create_default_test_config() -> Self {
        let tmp = env::temp_dir().join(format!("caddie_test_{}", std::process::id()));
        let mut paths = HashMap::new();
        paths.insert(
            "PATH_CADDIE_HOME".to_string(),
            tmp.to_string_lossy().to_string(),
        );
        paths.insert(
            "PATH_LOGS".to_string(),
            tmp.join("logs").to_string_lossy().to_string(),
        );

        AppConfig {
            core: CoreConfig {
                env_mode: "test".to_string(),
                log_level: "debug".to_string(),
                language: "en".to_string(),
            },
            api: ApiConfig::default(),
            sync: SyncConfig::default(),
            optimizer: OptimizerConfig::default(),
            paths,
        }
    }
}

// --- IMPLÉMENTATIONS PAR DÉFAUT ---

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: 30,
            optimizer_retries: 3,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            store_options: vec![2, 3, 4],
        }
    }
}

// --- TESTS UNITAIRES ---


// --- MODULE MOCKS PUBLIC ---

pub mod test_mocks {
    use super::*;

    /// Injecte la configuration de test (sandbox dans le dossier temporaire).
    pub fn inject_mock_config() {
        if CONFIG.get().is_some() {
            return;
        }

        let config = AppConfig::create_default_test_config();
        if let Some(path) = config.paths.get("PATH_CADDIE_HOME") {
            let _ = fs::create_dir_all(path);
        }
        let _ = CONFIG.set(config);
    }
}
