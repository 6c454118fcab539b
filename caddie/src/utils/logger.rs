// FICHIER : caddie/src/utils/logger.rs

use crate::utils::config::AppConfig;
use std::path::PathBuf;
use std::sync::Once;
use tracing::Metadata;
use tracing_appender::rolling;
use tracing_subscriber::{
    filter::filter_fn, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

static INIT: Once = Once::new();

const LOG_FILE: &str = "caddie.log";

/// Dossier des journaux : `PATH_LOGS` si configuré, sinon un sous-dossier temporaire.
pub fn log_dir() -> PathBuf {
    AppConfig::try_get()
        .and_then(|c| c.get_path("PATH_LOGS"))
        .unwrap_or_else(|| std::env::temp_dir().join("caddie").join("logs"))
}

/// Niveau console : `RUST_LOG` d'abord, puis `core.log_level`.
fn console_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = AppConfig::try_get()
            .map(|c| c.core.log_level.as_str())
            .unwrap_or("warn");
        EnvFilter::new(level)
    })
}

/// Les traces portant un champ `event` viennent des macros `user_*`, déjà affichées.
fn is_plain_trace(metadata: &Metadata<'_>) -> bool {
    metadata.fields().field("event").is_none()
}

/// Journal JSON quotidien + console compacte. Appels suivants sans effet.
pub fn init_logging() {
    INIT.call_once(|| {
        let dir = log_dir();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            eprintln!("Dossier de logs indisponible ({:?}) : {}", dir, e);
        }

        let json_file = fmt::layer()
            .json()
            .with_writer(rolling::daily(&dir, LOG_FILE))
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        let console = fmt::layer()
            .compact()
            .with_target(false)
            .with_filter(console_filter())
            .with_filter(filter_fn(is_plain_trace));

        match tracing_subscriber::registry()
            .with(json_file)
            .with(console)
            .try_init()
        {
            Ok(()) => tracing::info!(dir = ?dir, "🚀 Journalisation active"),
            // Un subscriber global existe déjà (tests)
            Err(_) => tracing::debug!("Logger déjà en place, initialisation ignorée"),
        }
    });
}
