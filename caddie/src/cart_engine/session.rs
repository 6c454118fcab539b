// FICHIER : caddie/src/cart_engine/session.rs

use crate::caddie_error;
use crate::cart_engine::events::{CartEvent, EventBus, Notice, NoticeKind};
use crate::cart_engine::model::{Cart, CartSummary, ProductRef};
use crate::cart_engine::outcome::{MutationOutcome, SyncOutcome};
use crate::cart_engine::store::CartStore;
use crate::cart_engine::substitution::{SubstitutionCommand, SubstitutionManager};
use crate::cart_engine::sync::{SyncScheduler, SyncStatus};
use crate::optimizer::navigator::ResultNavigator;
use crate::optimizer::request::OptimizationRequestBuilder;
use crate::optimizer::result::ApiResponse;
use crate::remote::{
    CartService, HttpCartService, HttpOptimizer, OptimizerService, RemoteError, SessionIdentity,
};
use crate::utils::prelude::*;
use crate::utils::{broadcast, Arc, AsyncMutex, Duration};

pub const DEFAULT_CART_NAME: &str = "Mon panier";

/// Réglages de la session (issus de la config ou fixés par les tests).
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub debounce: Duration,
    pub store_options: Vec<u32>,
    pub default_cart_name: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(1500),
            store_options: vec![2, 3, 4],
            default_cart_name: DEFAULT_CART_NAME.to_string(),
        }
    }
}

impl SessionSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            debounce: config.debounce_window(),
            store_options: config.optimizer.store_options.clone(),
            ..Self::default()
        }
    }
}

/// Issue d'une demande d'optimisation : jamais une erreur.
#[derive(Debug, Clone)]
pub enum OptimizationOutcome {
    Available(ResultNavigator),
    Unavailable { reason: String },
}

/// Racine de composition : un store, un scheduler, un gestionnaire de substitutions.
pub struct CartSession {
    store: Arc<CartStore>,
    service: Arc<dyn CartService>,
    optimizer: Arc<dyn OptimizerService>,
    events: EventBus,
    scheduler: SyncScheduler,
    substitutions: SubstitutionManager,
    settings: SessionSettings,
    /// Évite de créer deux paniers lors d'ajouts concurrents.
    provisioning: AsyncMutex<()>,
}

impl CartSession {
    /// Doit être construit dans un runtime tokio (le scheduler y démarre son worker).
    pub fn new(
        service: Arc<dyn CartService>,
        optimizer: Arc<dyn OptimizerService>,
        settings: SessionSettings,
    ) -> Self {
        let store = Arc::new(CartStore::new());
        let events = EventBus::new();
        let scheduler = SyncScheduler::start(
            store.clone(),
            service.clone(),
            events.clone(),
            settings.debounce,
        );
        let substitutions = SubstitutionManager::new(store.clone(), service.clone(), events.clone());

        Self {
            store,
            service,
            optimizer,
            events,
            scheduler,
            substitutions,
            settings,
            provisioning: AsyncMutex::new(()),
        }
    }

    /// Session HTTP configurée depuis `AppConfig`.
    pub fn from_config(identity: SessionIdentity) -> CaddieResult<Self> {
        let config = AppConfig::get();
        let service = HttpCartService::from_config(identity.clone())?;
        let optimizer = HttpOptimizer::from_config(identity)?;
        Ok(Self::new(
            Arc::new(service),
            Arc::new(optimizer),
            SessionSettings::from_config(config),
        ))
    }

    // --- LECTURE ---

    pub fn cart(&self) -> Option<Cart> {
        self.store.current()
    }

    pub fn revision(&self) -> u64 {
        self.store.revision()
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.scheduler.status()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> {
        self.events.subscribe()
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    fn remote_failure(&self, key: &str, err: RemoteError) -> AppError {
        self.events.notify(Notice::from_remote(key, &err));
        AppError::Remote(err)
    }

    fn replace_cart(&self, cart: Option<Cart>) -> u64 {
        let cart_id = cart.as_ref().map(|c| c.id.clone());
        let revision = self.store.replace(cart);
        self.events
            .emit(CartEvent::CartReplaced { cart_id, revision });
        revision
    }

    /// Charge le panier actif distant (aucun n'est créé).
    ///
    /// Les modifications en attente partent avant la relecture.
    pub async fn bootstrap(&self) -> CaddieResult<Option<Cart>> {
        self.flush().await;
        match self.service.fetch_active_cart().await {
            Ok(cart) => {
                info!(found = cart.is_some(), "🛒 Panier actif chargé");
                self.replace_cart(cart.clone());
                Ok(cart)
            }
            Err(err) => Err(self.remote_failure("CART_LOAD_FAILED", err)),
        }
    }

    /// Garantit un panier actif : le distant s'il existe, sinon un nouveau.
    pub async fn ensure_active_cart(&self) -> CaddieResult<Cart> {
        let _guard = self.provisioning.lock().await;
        if let Some(cart) = self.store.current() {
            return Ok(cart);
        }

        let cart = match self.service.fetch_active_cart().await {
            Ok(Some(cart)) => cart,
            Ok(None) => {
                info!(name = %self.settings.default_cart_name, "🆕 Aucun panier actif, création");
                self.service
                    .create_cart(&self.settings.default_cart_name)
                    .await
                    .map_err(|e| self.remote_failure("CART_CREATE_FAILED", e))?
            }
            Err(err) => return Err(self.remote_failure("CART_LOAD_FAILED", err)),
        };

        self.replace_cart(Some(cart.clone()));
        Ok(cart)
    }

    // --- MUTATIONS DU PANIER (debounce) ---

    fn applied(&self, outcome: MutationOutcome) -> MutationOutcome {
        self.events.emit(CartEvent::Applied {
            revision: outcome.revision(),
        });
        self.scheduler.schedule();
        outcome
    }

    pub async fn add_item(&self, product: ProductRef, quantity: i64) -> CaddieResult<MutationOutcome> {
        // Validation avant tout appel réseau (y compris la création du panier)
        if quantity < 1 {
            caddie_error!(
                "ERR_CART_INVALID_QUANTITY",
                error = format!("Quantité invalide : {}", quantity),
                context = json!({ "product_id": product.id, "quantity": quantity })
            );
        }
        self.ensure_active_cart().await?;
        let outcome = self.store.add_item(product, quantity)?;
        Ok(self.applied(outcome))
    }

    pub fn update_item_quantity(&self, item_id: &str, quantity: i64) -> CaddieResult<MutationOutcome> {
        let outcome = self.store.update_item_quantity(item_id, quantity)?;
        Ok(self.applied(outcome))
    }

    pub fn remove_item(&self, item_id: &str) -> CaddieResult<MutationOutcome> {
        let outcome = self.store.remove_item(item_id)?;
        Ok(self.applied(outcome))
    }

    // --- SUBSTITUTIONS (envoi immédiat) ---

    pub async fn approve_substitution(&self, item_id: &str, substitution_id: &str) -> CaddieResult<MutationOutcome> {
        self.substitutions
            .apply(item_id, substitution_id, SubstitutionCommand::Approve)
            .await
    }

    pub async fn unapprove_substitution(&self, item_id: &str, substitution_id: &str) -> CaddieResult<MutationOutcome> {
        self.substitutions
            .apply(item_id, substitution_id, SubstitutionCommand::Unapprove)
            .await
    }

    pub async fn set_substitution_quantity(
        &self,
        item_id: &str,
        substitution_id: &str,
        quantity: i64,
    ) -> CaddieResult<MutationOutcome> {
        self.substitutions
            .apply(item_id, substitution_id, SubstitutionCommand::SetQuantity(quantity))
            .await
    }

    pub async fn update_item_substitution(
        &self,
        item_id: &str,
        substitution_id: &str,
        is_approved: bool,
        quantity: i64,
    ) -> CaddieResult<MutationOutcome> {
        self.substitutions
            .apply(
                item_id,
                substitution_id,
                SubstitutionCommand::Set {
                    is_approved,
                    quantity,
                },
            )
            .await
    }

    /// La relecture qui suit la suppression écrase le panier local : on vide la file avant.
    pub async fn remove_substitution(&self, item_id: &str, substitution_id: &str) -> CaddieResult<MutationOutcome> {
        self.flush().await;
        self.substitutions.remove(item_id, substitution_id).await
    }

    // --- SYNCHRONISATION ---

    /// Envoie immédiatement les modifications en attente.
    pub async fn flush(&self) -> Option<SyncOutcome> {
        self.scheduler.flush().await
    }

    // --- CYCLE DE VIE DES PANIERS ---

    pub async fn list_carts(&self) -> CaddieResult<Vec<CartSummary>> {
        self.flush().await;
        self.service
            .list_carts()
            .await
            .map_err(|e| self.remote_failure("CART_LIST_FAILED", e))
    }

    /// Crée un panier qui devient actif ; l'ancien est synchronisé d'abord.
    pub async fn create_cart(&self, name: &str) -> CaddieResult<Cart> {
        validate_name(name)?;
        self.flush().await;
        let cart = self
            .service
            .create_cart(name.trim())
            .await
            .map_err(|e| self.remote_failure("CART_CREATE_FAILED", e))?;
        self.replace_cart(Some(cart.clone()));
        Ok(cart)
    }

    pub async fn rename_cart(&self, cart_id: &str, name: &str) -> CaddieResult<Cart> {
        validate_name(name)?;
        let cart = self
            .service
            .rename_cart(cart_id, name.trim())
            .await
            .map_err(|e| self.remote_failure("CART_RENAME_FAILED", e))?;
        if self.store.active_cart_id().as_deref() == Some(cart_id) {
            self.store.rename_active(&cart.name);
        }
        Ok(cart)
    }

    /// Supprime un panier ; s'il est actif, ses modifications en attente sont abandonnées.
    pub async fn delete_cart(&self, cart_id: &str) -> CaddieResult<()> {
        let is_active = self.store.active_cart_id().as_deref() == Some(cart_id);
        if is_active {
            self.scheduler.cancel_pending();
            // Attend la fin d'un envoi déjà parti
            self.flush().await;
        }

        self.service
            .delete_cart(cart_id)
            .await
            .map_err(|e| self.remote_failure("CART_DELETE_FAILED", e))?;

        if is_active {
            self.replace_cart(None);
        }
        self.events
            .notify(Notice::new(NoticeKind::Info, "CART_DELETED").with_detail(cart_id));
        Ok(())
    }

    /// Bascule de panier : l'ancien est synchronisé avant que le nouveau ne soit visible.
    pub async fn switch_cart(&self, cart_id: &str) -> CaddieResult<Cart> {
        self.flush().await;
        let cart = self
            .service
            .switch_cart(cart_id)
            .await
            .map_err(|e| self.remote_failure("CART_SWITCH_FAILED", e))?;
        self.replace_cart(Some(cart.clone()));
        Ok(cart)
    }

    // --- OPTIMISATION ---

    pub async fn optimize(&self, store_ids: Vec<String>) -> OptimizationOutcome {
        let cart = match self.store.current() {
            Some(cart) if !cart.is_empty() => cart,
            _ => {
                debug!("Panier vide : aucune optimisation demandée");
                return OptimizationOutcome::Available(ResultNavigator::new(ApiResponse::empty()));
            }
        };

        let request = OptimizationRequestBuilder::new(&cart)
            .with_stores(store_ids)
            .build();
        info!(groups = request.items.len(), stores = request.store_ids.len(), "🧮 Demande d'optimisation");

        match self.optimizer.optimize(&request).await {
            Ok(response) => OptimizationOutcome::Available(ResultNavigator::new(response)),
            Err(err) => {
                self.events
                    .notify(Notice::from_remote("OPTIMIZE_UNAVAILABLE", &err));
                OptimizationOutcome::Unavailable {
                    reason: err.to_string(),
                }
            }
        }
    }
}

fn validate_name(name: &str) -> CaddieResult<()> {
    if name.trim().is_empty() {
        caddie_error!("ERR_CART_INVALID_NAME", context = json!({ "name": name }));
    }
    Ok(())
}

// --- TESTS UNITAIRES ---
