// FICHIER : caddie/src/cart_engine/sync/queue.rs

use crate::utils::{Duration, Mutex, Notify};
use tokio::time::{sleep_until, Instant};

/// File d'attente à un seul emplacement : au plus un envoi programmé.
///
/// Chaque `schedule()` repousse l'échéance de la fenêtre complète. Le worker
/// ne part qu'après une fenêtre entière sans nouvelle programmation.
#[derive(Debug)]
pub struct SyncQueue {
    slot: Mutex<Option<Instant>>,
    wake: Notify,
    window: Duration,
}

impl SyncQueue {
    pub fn new(window: Duration) -> Self {
        Self {
            slot: Mutex::new(None),
            wake: Notify::new(),
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Programme (ou repousse) l'envoi.
    pub fn schedule(&self) {
        let due = Instant::now() + self.window;
        *self.slot.lock().unwrap_or_else(|p| p.into_inner()) = Some(due);
        self.wake.notify_one();
    }

    pub fn is_pending(&self) -> bool {
        self.slot.lock().unwrap_or_else(|p| p.into_inner()).is_some()
    }

    /// Vide l'emplacement. Retourne `true` s'il contenait un envoi.
    pub fn take(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take()
            .is_some()
    }

    fn due(&self) -> Option<Instant> {
        *self.slot.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn take_if_due(&self) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(|p| p.into_inner());
        match *slot {
            Some(due) if due <= Instant::now() => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    /// Attend l'échéance de l'envoi programmé, puis le retire de la file.
    pub async fn next_due(&self) {
        loop {
            match self.due() {
                None => self.wake.notified().await,
                Some(due) => {
                    tokio::select! {
                        _ = sleep_until(due) => {
                            if self.take_if_due() {
                                return;
                            }
                        }
                        _ = self.wake.notified() => {}
                    }
                }
            }
        }
    }
}

// --- TESTS UNITAIRES ---
