// FICHIER : caddie/src/cart_engine/sync/scheduler.rs

use crate::cart_engine::events::{CartEvent, EventBus, Notice, NoticeKind};
use crate::cart_engine::outcome::SyncOutcome;
use crate::cart_engine::store::{CartStore, Reconciliation};
use crate::cart_engine::sync::queue::SyncQueue;
use crate::cart_engine::sync::state::SyncStatus;
use crate::remote::{CartService, RemoteError, SyncCartRequest};
use crate::utils::prelude::*;
use crate::utils::{Arc, AsyncMutex, Duration, Mutex};
use tokio::task::JoinHandle;

struct SchedulerInner {
    store: Arc<CartStore>,
    service: Arc<dyn CartService>,
    events: EventBus,
    queue: SyncQueue,
    /// Un seul envoi à la fois (worker et `flush` partagent ce verrou).
    in_flight: AsyncMutex<()>,
    status: Mutex<SyncStatus>,
}

/// Synchronisation différée du panier complet.
///
/// Les mutations rapprochées se fondent en un seul envoi, qui lit l'état le
/// plus récent au moment du départ. La réponse n'est appliquée que si aucune
/// mutation locale n'est survenue entre-temps ; un échec déclenche une
/// relecture complète du panier distant.
pub struct SyncScheduler {
    inner: Arc<SchedulerInner>,
    worker: JoinHandle<()>,
}

impl SyncScheduler {
    /// Démarre le worker. Doit être appelé dans un runtime tokio.
    pub fn start(
        store: Arc<CartStore>,
        service: Arc<dyn CartService>,
        events: EventBus,
        window: Duration,
    ) -> Self {
        let inner = Arc::new(SchedulerInner {
            store,
            service,
            events,
            queue: SyncQueue::new(window),
            in_flight: AsyncMutex::new(()),
            status: Mutex::new(SyncStatus::Idle),
        });

        let worker = {
            let inner = inner.clone();
            tokio::spawn(async move {
                loop {
                    inner.queue.next_due().await;
                    inner.dispatch().await;
                }
            })
        };

        debug!(window_ms = window.as_millis() as u64, "⏱️ Scheduler de synchronisation démarré");
        Self { inner, worker }
    }

    /// Programme (ou repousse) l'envoi du panier.
    pub fn schedule(&self) {
        self.inner.queue.schedule();
        let mut status = self.inner.status_guard();
        if !matches!(*status, SyncStatus::InFlight { .. }) {
            *status = SyncStatus::Pending;
        }
    }

    pub fn status(&self) -> SyncStatus {
        self.inner.status_guard().clone()
    }

    pub fn is_pending(&self) -> bool {
        self.inner.queue.is_pending()
    }

    /// Abandonne l'envoi programmé (panier supprimé).
    pub fn cancel_pending(&self) -> bool {
        let cancelled = self.inner.queue.take();
        if cancelled {
            info!("🗑️ Synchronisation programmée abandonnée");
            self.inner.settle_status(None);
        }
        cancelled
    }

    /// Envoie immédiatement l'état programmé, ou attend la fin de l'envoi en cours.
    ///
    /// Retourne `None` quand rien n'était programmé.
    pub async fn flush(&self) -> Option<SyncOutcome> {
        if self.inner.queue.take() {
            return Some(self.inner.dispatch().await);
        }
        let _guard = self.inner.in_flight.lock().await;
        None
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

impl SchedulerInner {
    fn status_guard(&self) -> std::sync::MutexGuard<'_, SyncStatus> {
        self.status.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn set_status(&self, status: SyncStatus) {
        *self.status_guard() = status;
    }

    fn settle_status(&self, outcome: Option<&SyncOutcome>) {
        let next = match outcome {
            Some(SyncOutcome::Failed { reason }) => SyncStatus::Error(reason.clone()),
            _ if self.queue.is_pending() => SyncStatus::Pending,
            _ => SyncStatus::Idle,
        };
        self.set_status(next);
    }

    async fn dispatch(&self) -> SyncOutcome {
        let _guard = self.in_flight.lock().await;

        // L'état lu est celui du départ, jamais celui de la programmation
        let Some(snapshot) = self.store.snapshot() else {
            debug!("Aucun panier actif : synchronisation ignorée");
            self.settle_status(None);
            self.events.emit(CartEvent::Synced(SyncOutcome::Skipped));
            return SyncOutcome::Skipped;
        };

        let sent_revision = snapshot.revision;
        self.set_status(SyncStatus::InFlight {
            revision: sent_revision,
        });
        self.events.emit(CartEvent::SyncDispatched {
            revision: sent_revision,
        });

        let request = SyncCartRequest::from_cart(&snapshot.cart);
        info!(
            cart_id = %request.cart_id,
            revision = sent_revision,
            items = request.items.len(),
            "📤 Synchronisation du panier"
        );

        let outcome = match self.service.sync_cart(&request).await {
            Ok(server_cart) => match self.store.reconcile(sent_revision, server_cart) {
                Reconciliation::Applied { revision } => {
                    debug!(revision, "✅ Réponse serveur appliquée");
                    SyncOutcome::Confirmed { revision }
                }
                Reconciliation::Stale { current } => {
                    debug!(
                        sent_revision,
                        current, "Réponse obsolète ignorée (mutation locale plus récente)"
                    );
                    // Une édition hors file (substitution) a pu passer : on relance
                    if !self.queue.is_pending() {
                        debug!(current, "🔁 Aucune synchronisation en attente, nouvelle programmation");
                        self.queue.schedule();
                    }
                    SyncOutcome::Superseded {
                        sent_revision,
                        current_revision: current,
                    }
                }
            },
            Err(err) => self.recover(err).await,
        };

        self.settle_status(Some(&outcome));
        self.events.emit(CartEvent::Synced(outcome.clone()));
        outcome
    }

    /// Pas de nouvel essai : l'état distant fait foi.
    async fn recover(&self, err: RemoteError) -> SyncOutcome {
        warn!(error = %err, "⚠️ Échec de synchronisation, relecture du panier distant");
        self.events
            .notify(Notice::from_remote("CART_SYNC_FAILED", &err));

        match self.service.fetch_active_cart().await {
            Ok(cart) => {
                let cart_id = cart.as_ref().map(|c| c.id.clone());
                let revision = self.store.replace(cart);
                // Les éditions programmées depuis sont sacrifiées avec l'état local
                self.queue.take();
                self.events
                    .emit(CartEvent::CartReplaced { cart_id, revision });
                SyncOutcome::RolledBack {
                    revision,
                    reason: err.to_string(),
                }
            }
            Err(refetch_err) => {
                error!(error = %refetch_err, "❌ Relecture du panier impossible, état local conservé");
                self.events.notify(
                    Notice::new(NoticeKind::Error, "CART_REFETCH_FAILED")
                        .with_detail(refetch_err.message()),
                );
                SyncOutcome::Failed {
                    reason: format!("{} / {}", err, refetch_err),
                }
            }
        }
    }
}

// --- TESTS UNITAIRES ---
