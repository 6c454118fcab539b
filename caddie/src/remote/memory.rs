// FICHIER : caddie/src/remote/memory.rs

use super::contract::{SubstitutionPatch, SyncCartRequest};
use super::{CartService, OptimizerService, RemoteError, RemoteResult};
use crate::cart_engine::model::{Cart, CartItem, CartSubstitution, CartSummary, ProductRef};
use crate::optimizer::request::OptimizationRequest;
use crate::optimizer::result::ApiResponse;
use crate::utils::{async_trait, Mutex, MutexGuard};
use std::collections::{HashMap, VecDeque};
use tokio::sync::watch;
use tracing::debug;

/// Opérations du service panier, pour l'injection d'échecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchActive,
    ListCarts,
    CreateCart,
    RenameCart,
    DeleteCart,
    SwitchCart,
    SyncCart,
    PatchSubstitution,
    DeleteSubstitution,
}

#[derive(Debug, Default)]
struct Backend {
    carts: Vec<Cart>,
    active: Option<String>,
    catalog: HashMap<String, ProductRef>,
    next_id: u64,
    failures: HashMap<Operation, VecDeque<RemoteError>>,
    calls: HashMap<Operation, usize>,
    sync_requests: Vec<SyncCartRequest>,
    patch_requests: Vec<(String, String, SubstitutionPatch)>,
}

impl Backend {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    /// Compte l'appel et consomme l'échec programmé éventuel.
    fn enter(&mut self, op: Operation) -> RemoteResult<()> {
        *self.calls.entry(op).or_default() += 1;
        match self.failures.get_mut(&op).and_then(|q| q.pop_front()) {
            Some(err) => {
                debug!(?op, error = %err, "Échec injecté");
                Err(err)
            }
            None => Ok(()),
        }
    }

    fn cart_index(&self, cart_id: &str) -> RemoteResult<usize> {
        self.carts
            .iter()
            .position(|c| c.id == cart_id)
            .ok_or_else(|| RemoteError::NotFound(format!("Panier {} introuvable", cart_id)))
    }

    fn view(&self, index: usize) -> Cart {
        let mut cart = self.carts[index].clone();
        cart.is_active = self.active.as_deref() == Some(cart.id.as_str());
        cart
    }

    fn product(&self, product_id: &str) -> ProductRef {
        self.catalog
            .get(product_id)
            .cloned()
            .unwrap_or_else(|| ProductRef::new(product_id, product_id))
    }

    fn substitution_mut(
        &mut self,
        item_id: &str,
        substitution_id: &str,
    ) -> RemoteResult<&mut CartSubstitution> {
        self.carts
            .iter_mut()
            .flat_map(|c| c.items.iter_mut())
            .find(|i| i.id == item_id)
            .and_then(|i| i.substitutions.iter_mut().find(|s| s.id == substitution_id))
            .ok_or_else(|| {
                RemoteError::NotFound(format!(
                    "Substitution {}/{} introuvable",
                    item_id, substitution_id
                ))
            })
    }
}

/// Store-of-record en mémoire : même contrat que le service HTTP.
///
/// Attribue les identifiants durables, apparie les lignes par produit,
/// supprime les lignes à quantité nulle. Sert au mode hors-ligne du CLI et
/// aux tests (échecs injectés, envois retenus).
#[derive(Debug)]
pub struct InMemoryCartService {
    state: Mutex<Backend>,
    sync_gate: watch::Sender<bool>,
}

impl Default for InMemoryCartService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCartService {
    pub fn new() -> Self {
        let (sync_gate, _) = watch::channel(true);
        Self {
            state: Mutex::new(Backend::default()),
            sync_gate,
        }
    }

    pub fn with_products(products: impl IntoIterator<Item = ProductRef>) -> Self {
        let service = Self::new();
        for product in products {
            service.register_product(product);
        }
        service
    }

    fn lock(&self) -> MutexGuard<'_, Backend> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn register_product(&self, product: ProductRef) {
        self.lock().catalog.insert(product.id.clone(), product);
    }

    pub fn product(&self, product_id: &str) -> Option<ProductRef> {
        self.lock().catalog.get(product_id).cloned()
    }

    /// Insère un panier tel quel et l'active.
    pub fn seed_cart(&self, cart: Cart) {
        let mut backend = self.lock();
        backend.active = Some(cart.id.clone());
        backend.carts.retain(|c| c.id != cart.id);
        backend.carts.push(cart);
    }

    /// Le catalogue propose un remplacement pour une ligne existante.
    pub fn offer_substitution(&self, item_id: &str, substitution: CartSubstitution) -> bool {
        let mut backend = self.lock();
        let item = backend
            .carts
            .iter_mut()
            .flat_map(|c| c.items.iter_mut())
            .find(|i| i.id == item_id);
        match item {
            Some(item) => {
                item.substitutions.push(substitution);
                true
            }
            None => false,
        }
    }

    /// Programme un échec pour le prochain appel de l'opération.
    pub fn fail_next(&self, op: Operation, err: RemoteError) {
        self.lock().failures.entry(op).or_default().push_back(err);
    }

    /// Retient les envois de panier : ils sont enregistrés puis attendent `release_syncs`.
    pub fn hold_syncs(&self) {
        self.sync_gate.send_replace(false);
    }

    pub fn release_syncs(&self) {
        self.sync_gate.send_replace(true);
    }

    pub fn sync_requests(&self) -> Vec<SyncCartRequest> {
        self.lock().sync_requests.clone()
    }

    pub fn patch_requests(&self) -> Vec<(String, String, SubstitutionPatch)> {
        self.lock().patch_requests.clone()
    }

    pub fn calls(&self, op: Operation) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn server_cart(&self, cart_id: &str) -> Option<Cart> {
        let backend = self.lock();
        backend.cart_index(cart_id).ok().map(|i| backend.view(i))
    }

    pub fn active_cart(&self) -> Option<Cart> {
        let backend = self.lock();
        let id = backend.active.clone()?;
        backend.cart_index(&id).ok().map(|i| backend.view(i))
    }
}

#[async_trait]
impl CartService for InMemoryCartService {
    async fn fetch_active_cart(&self) -> RemoteResult<Option<Cart>> {
        let mut backend = self.lock();
        backend.enter(Operation::FetchActive)?;
        let Some(id) = backend.active.clone() else {
            return Ok(None);
        };
        Ok(backend.cart_index(&id).ok().map(|i| backend.view(i)))
    }

    async fn list_carts(&self) -> RemoteResult<Vec<CartSummary>> {
        let mut backend = self.lock();
        backend.enter(Operation::ListCarts)?;
        Ok((0..backend.carts.len())
            .map(|i| backend.view(i).summary())
            .collect())
    }

    async fn create_cart(&self, name: &str) -> RemoteResult<Cart> {
        let mut backend = self.lock();
        backend.enter(Operation::CreateCart)?;
        let id = backend.next_id("cart");
        backend.carts.push(Cart::new(id.clone(), name));
        backend.active = Some(id);
        let index = backend.carts.len() - 1;
        Ok(backend.view(index))
    }

    async fn rename_cart(&self, cart_id: &str, name: &str) -> RemoteResult<Cart> {
        let mut backend = self.lock();
        backend.enter(Operation::RenameCart)?;
        let index = backend.cart_index(cart_id)?;
        backend.carts[index].name = name.to_string();
        Ok(backend.view(index))
    }

    async fn delete_cart(&self, cart_id: &str) -> RemoteResult<()> {
        let mut backend = self.lock();
        backend.enter(Operation::DeleteCart)?;
        let index = backend.cart_index(cart_id)?;
        backend.carts.remove(index);
        if backend.active.as_deref() == Some(cart_id) {
            backend.active = None;
        }
        Ok(())
    }

    async fn switch_cart(&self, cart_id: &str) -> RemoteResult<Cart> {
        let mut backend = self.lock();
        backend.enter(Operation::SwitchCart)?;
        let index = backend.cart_index(cart_id)?;
        backend.active = Some(cart_id.to_string());
        Ok(backend.view(index))
    }

    async fn sync_cart(&self, request: &SyncCartRequest) -> RemoteResult<Cart> {
        self.lock().sync_requests.push(request.clone());

        // Porte ouverte par défaut ; fermée par `hold_syncs`
        let mut gate = self.sync_gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;

        let mut backend = self.lock();
        backend.enter(Operation::SyncCart)?;
        let index = backend.cart_index(&request.cart_id)?;

        let previous = std::mem::take(&mut backend.carts[index].items);
        let mut items = Vec::with_capacity(request.items.len());

        for payload in request.items.iter().filter(|p| p.quantity > 0) {
            let mut item = match previous.iter().find(|i| i.product.id == payload.product_id) {
                Some(existing) => existing.clone(),
                None => CartItem {
                    id: backend.next_id("item"),
                    product: backend.product(&payload.product_id),
                    quantity: payload.quantity,
                    substitutions: Vec::new(),
                },
            };
            item.quantity = payload.quantity;

            for sub_payload in &payload.substitutions {
                if let Some(sub) = item
                    .substitutions
                    .iter_mut()
                    .find(|s| s.id == sub_payload.id)
                {
                    sub.is_approved = sub_payload.is_approved;
                    sub.quantity = sub_payload.quantity.max(1);
                }
            }
            items.push(item);
        }

        backend.carts[index].items = items;
        Ok(backend.view(index))
    }

    async fn patch_substitution(
        &self,
        item_id: &str,
        substitution_id: &str,
        patch: &SubstitutionPatch,
    ) -> RemoteResult<()> {
        let mut backend = self.lock();
        backend
            .patch_requests
            .push((item_id.to_string(), substitution_id.to_string(), *patch));
        backend.enter(Operation::PatchSubstitution)?;

        if patch.quantity == 0 {
            return Err(RemoteError::Rejected {
                kind: "invalid_quantity".into(),
                message: "La quantité doit être positive".into(),
            });
        }
        let sub = backend.substitution_mut(item_id, substitution_id)?;
        sub.is_approved = patch.is_approved;
        sub.quantity = patch.quantity;
        Ok(())
    }

    async fn delete_substitution(&self, item_id: &str, substitution_id: &str) -> RemoteResult<()> {
        let mut backend = self.lock();
        backend.enter(Operation::DeleteSubstitution)?;
        let item = backend
            .carts
            .iter_mut()
            .flat_map(|c| c.items.iter_mut())
            .find(|i| i.id == item_id)
            .ok_or_else(|| RemoteError::NotFound(format!("Article {} introuvable", item_id)))?;

        let before = item.substitutions.len();
        item.substitutions.retain(|s| s.id != substitution_id);
        if item.substitutions.len() == before {
            return Err(RemoteError::NotFound(format!(
                "Substitution {}/{} introuvable",
                item_id, substitution_id
            )));
        }
        Ok(())
    }
}

/// Optimiseur scripté : réponse fixe ou échec, requêtes enregistrées.
#[derive(Debug)]
pub struct ScriptedOptimizer {
    reply: RemoteResult<ApiResponse>,
    requests: Mutex<Vec<OptimizationRequest>>,
}

impl ScriptedOptimizer {
    pub fn responding(response: ApiResponse) -> Self {
        Self {
            reply: Ok(response),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: RemoteError) -> Self {
        Self {
            reply: Err(err),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<OptimizationRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

#[async_trait]
impl OptimizerService for ScriptedOptimizer {
    async fn optimize(&self, request: &OptimizationRequest) -> RemoteResult<ApiResponse> {
        self.requests
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(request.clone());
        self.reply.clone()
    }
}

// --- TESTS UNITAIRES ---
