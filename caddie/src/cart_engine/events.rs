// FICHIER : caddie/src/cart_engine/events.rs

use crate::cart_engine::outcome::{MutationOutcome, SyncOutcome};
use crate::remote::RemoteError;
use crate::utils::{broadcast, i18n, prelude::*};

/// Capacité du canal : un abonné lent perd les plus anciens événements, jamais l'émetteur.
pub const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoticeKind {
    Info,
    Warning,
    Error,
    /// Action possible : proposer la connexion à l'utilisateur.
    LoginRequired,
}

/// Notification "fire-and-forget" destinée à l'utilisateur (toast).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub key: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Notice {
    pub fn new(kind: NoticeKind, key: &str) -> Self {
        Self {
            kind,
            key: key.to_string(),
            message: i18n::t(key),
            at: Utc::now(),
        }
    }

    pub fn with_detail(mut self, detail: &str) -> Self {
        self.message = format!("{} : {}", self.message, detail);
        self
    }

    /// Notification d'échec distant ; une authentification manquante devient une invite.
    pub fn from_remote(key: &str, err: &RemoteError) -> Self {
        if err.requires_login() {
            return Notice::new(NoticeKind::LoginRequired, "AUTH_LOGIN_REQUIRED")
                .with_detail(err.message());
        }
        Notice::new(NoticeKind::Error, key).with_detail(err.message())
    }
}

/// Transitions observables du moteur.
#[derive(Debug, Clone, PartialEq)]
pub enum CartEvent {
    Applied { revision: u64 },
    SyncDispatched { revision: u64 },
    Synced(SyncOutcome),
    Substitution(MutationOutcome),
    CartReplaced { cart_id: Option<String>, revision: u64 },
    Notice(Notice),
}

/// Bus d'événements partagé par le store, le scheduler et les substitutions.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CartEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: CartEvent) {
        debug!(?event, "événement panier");
        // Aucun abonné : l'événement est simplement perdu
        let _ = self.sender.send(event);
    }

    pub fn notify(&self, notice: Notice) {
        match notice.kind {
            NoticeKind::Info => info!(key = %notice.key, "🔔 {}", notice.message),
            NoticeKind::Warning | NoticeKind::LoginRequired => {
                warn!(key = %notice.key, "⚠️ {}", notice.message)
            }
            NoticeKind::Error => error!(key = %notice.key, "❌ {}", notice.message),
        }
        self.emit(CartEvent::Notice(notice));
    }
}
