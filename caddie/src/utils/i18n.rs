// FICHIER : caddie/src/utils/i18n.rs

use crate::utils::config::AppConfig;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock, RwLock};

// Singleton global thread-safe : Une seule instance pour toute l'app
static TRANSLATOR: OnceLock<Arc<RwLock<Translator>>> = OnceLock::new();

/// Structure interne qui détient les données
pub struct Translator {
    translations: HashMap<String, String>,
    pub current_lang: String,
}

impl Translator {
    fn new() -> Self {
        Self {
            translations: HashMap::new(),
            current_lang: "en".to_string(), // Langue par défaut technique
        }
    }

    /// Charge un fichier de langue depuis `<PATH_CADDIE_HOME>/locales/{lang}.json`
    pub fn load(&mut self, lang: &str) {
        let Some(home) = AppConfig::try_get().and_then(|c| c.get_path("PATH_CADDIE_HOME")) else {
            tracing::warn!("⚠️ Configuration absente, traductions non chargées ({})", lang);
            return;
        };
        let path = home.join("locales").join(format!("{}.json", lang));
        self.load_from_path(lang, path);
    }

    /// Charge un dictionnaire déjà en mémoire (locales embarquées à la compilation)
    pub fn load_from_str(&mut self, lang: &str, content: &str) -> bool {
        // On attend un simple dictionnaire clé/valeur : {"CART_SYNCED": "Panier synchronisé"}
        match serde_json::from_str::<HashMap<String, String>>(content) {
            Ok(map) => {
                self.translations = map;
                self.current_lang = lang.to_string();
                true
            }
            Err(e) => {
                tracing::error!("❌ Erreur parsing JSON langue ({}): {}", lang, e);
                false
            }
        }
    }

    fn load_from_path(&mut self, lang: &str, path: PathBuf) {
        if !path.exists() {
            tracing::warn!("⚠️ Fichier de traduction introuvable : {:?}", path);
            return;
        }
        match fs::read_to_string(&path) {
            Ok(content) => {
                if self.load_from_str(lang, &content) {
                    tracing::info!("🌍 Langue chargée : {} (depuis {:?})", lang, path);
                }
            }
            Err(e) => {
                tracing::error!(
                    "❌ Impossible de lire le fichier langue ({:?}): {}",
                    path,
                    e
                );
            }
        }
    }

    pub fn t(&self, key: &str) -> String {
        self.translations
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

fn translator() -> &'static Arc<RwLock<Translator>> {
    TRANSLATOR.get_or_init(|| Arc::new(RwLock::new(Translator::new())))
}

/// Initialise le système global avec une langue cible (depuis le disque)
pub fn init_i18n(lang: &str) {
    if let Ok(mut write_guard) = translator().write() {
        write_guard.load(lang);
    }
}

/// Initialise le système global depuis un contenu embarqué
pub fn init_i18n_from_str(lang: &str, content: &str) {
    if let Ok(mut write_guard) = translator().write() {
        write_guard.load_from_str(lang, content);
    }
}

/// Helper public : Traduit une clé via l'instance globale
pub fn t(key: &str) -> String {
    if let Some(arc) = TRANSLATOR.get() {
        if let Ok(read_guard) = arc.read() {
            return read_guard.t(key);
        }
    }
    // Fallback si le système n'est pas encore init
    key.to_string()
}
