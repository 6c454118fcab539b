// FICHIER : caddie/src/cart_engine/sync/state.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub enum SyncStatus {
    /// Rien à envoyer.
    #[default]
    Idle,
    /// Un envoi est programmé, la fenêtre de quiescence court.
    Pending,
    /// Le panier de cette révision est en cours d'envoi.
    InFlight { revision: u64 },
    /// Le dernier envoi et la relecture ont échoué.
    Error(String),
}

impl SyncStatus {
    pub fn is_busy(&self) -> bool {
        matches!(self, SyncStatus::Pending | SyncStatus::InFlight { .. })
    }
}

// --- TESTS UNITAIRES ---
