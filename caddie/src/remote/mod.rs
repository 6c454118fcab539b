// FICHIER : caddie/src/remote/mod.rs

//! Collaborateurs distants du moteur : service panier (store-of-record) et
//! optimiseur multi-magasins.

pub mod contract;
pub mod error;
pub mod http;
pub mod memory;

use crate::cart_engine::model::{Cart, CartSummary};
use crate::optimizer::request::OptimizationRequest;
use crate::optimizer::result::ApiResponse;
use crate::utils::async_trait;

pub use contract::{SubstitutionPatch, SyncCartRequest, SyncItemPayload, SyncSubstitutionPayload};
pub use error::RemoteError;
pub use http::{HttpCartService, HttpOptimizer};
pub use memory::{InMemoryCartService, Operation, ScriptedOptimizer};

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Identité de session fournie par l'appelant (jamais amorcée ici).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionIdentity {
    Anonymous(String),
    Token(String),
}

/// Service panier distant.
#[async_trait]
pub trait CartService: Send + Sync {
    /// Panier actif de la session ; `None` si aucun n'existe encore.
    async fn fetch_active_cart(&self) -> RemoteResult<Option<Cart>>;

    async fn list_carts(&self) -> RemoteResult<Vec<CartSummary>>;

    /// Crée un panier qui devient immédiatement actif.
    async fn create_cart(&self, name: &str) -> RemoteResult<Cart>;

    async fn rename_cart(&self, cart_id: &str, name: &str) -> RemoteResult<Cart>;

    async fn delete_cart(&self, cart_id: &str) -> RemoteResult<()>;

    async fn switch_cart(&self, cart_id: &str) -> RemoteResult<Cart>;

    /// Remplace le contenu complet du panier et renvoie l'état faisant autorité.
    async fn sync_cart(&self, request: &SyncCartRequest) -> RemoteResult<Cart>;

    async fn patch_substitution(
        &self,
        item_id: &str,
        substitution_id: &str,
        patch: &SubstitutionPatch,
    ) -> RemoteResult<()>;

    async fn delete_substitution(&self, item_id: &str, substitution_id: &str) -> RemoteResult<()>;
}

/// Optimiseur multi-magasins (boîte noire).
#[async_trait]
pub trait OptimizerService: Send + Sync {
    async fn optimize(&self, request: &OptimizationRequest) -> RemoteResult<ApiResponse>;
}
