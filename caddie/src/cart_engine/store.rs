// FICHIER : caddie/src/cart_engine/store.rs

use crate::caddie_error;
use crate::cart_engine::model::{temporary_item_id, Cart, CartItem, CartSubstitution, ProductRef};
use crate::cart_engine::outcome::MutationOutcome;
use crate::utils::prelude::*;
use crate::utils::{Mutex, MutexGuard};

/// Copie du panier capturée au moment de l'envoi.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSnapshot {
    pub revision: u64,
    pub cart: Cart,
}

/// Verdict de la réconciliation d'une réponse serveur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    Applied { revision: u64 },
    /// Une mutation locale plus récente (ou un autre panier) : réponse ignorée.
    Stale { current: u64 },
}

#[derive(Debug, Default)]
struct StoreState {
    cart: Option<Cart>,
    revision: u64,
}

impl StoreState {
    fn bump(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    fn cart_mut(&mut self) -> CaddieResult<&mut Cart> {
        match self.cart.as_mut() {
            Some(cart) => Ok(cart),
            None => caddie_error!("ERR_CART_NO_ACTIVE", context = json!({})),
        }
    }
}

/// Représentation locale faisant autorité du panier actif.
///
/// Toutes les méthodes sont synchrones : le nouvel état est visible au retour.
/// Le verrou n'est jamais conservé au-delà d'un appel.
#[derive(Debug, Default)]
pub struct CartStore {
    state: Mutex<StoreState>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cart(cart: Cart) -> Self {
        let store = Self::new();
        store.replace(Some(cart));
        store
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        // Un panic pendant une mutation ne doit pas condamner le panier
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn current(&self) -> Option<Cart> {
        self.lock().cart.clone()
    }

    pub fn active_cart_id(&self) -> Option<String> {
        self.lock().cart.as_ref().map(|c| c.id.clone())
    }

    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    pub fn snapshot(&self) -> Option<SyncSnapshot> {
        let state = self.lock();
        state.cart.as_ref().map(|cart| SyncSnapshot {
            revision: state.revision,
            cart: cart.clone(),
        })
    }

    /// Remplace intégralement l'état local (relecture serveur, changement de panier).
    pub fn replace(&self, cart: Option<Cart>) -> u64 {
        let mut state = self.lock();
        state.cart = cart;
        state.bump()
    }

    pub fn clear(&self) -> u64 {
        self.replace(None)
    }

    /// Ajoute un produit, ou augmente la quantité de la ligne existante.
    pub fn add_item(&self, product: ProductRef, quantity: i64) -> CaddieResult<MutationOutcome> {
        if quantity < 1 {
            caddie_error!(
                "ERR_CART_INVALID_QUANTITY",
                error = format!("Quantité invalide : {}", quantity),
                context = json!({ "product_id": product.id, "quantity": quantity })
            );
        }
        let quantity = clamp_quantity(quantity);

        let mut state = self.lock();
        let cart = state.cart_mut()?;

        if let Some(item) = cart.items.iter_mut().find(|i| i.product.id == product.id) {
            item.quantity = item.quantity.saturating_add(quantity);
            debug!(item_id = %item.id, quantity = item.quantity, "Ligne existante incrémentée");
        } else {
            let item = CartItem {
                id: temporary_item_id(),
                product,
                quantity,
                substitutions: Vec::new(),
            };
            debug!(item_id = %item.id, "Nouvelle ligne (identifiant temporaire)");
            cart.items.push(item);
        }

        let revision = state.bump();
        Ok(MutationOutcome::Applied { revision })
    }

    /// Fixe la quantité d'une ligne ; une quantité nulle ou négative la supprime.
    pub fn update_item_quantity(&self, item_id: &str, quantity: i64) -> CaddieResult<MutationOutcome> {
        let mut state = self.lock();
        let cart = state.cart_mut()?;

        let Some(index) = cart.items.iter().position(|i| i.id == item_id) else {
            caddie_error!(
                "ERR_CART_ITEM_NOT_FOUND",
                error = format!("Article inconnu : {}", item_id),
                context = json!({ "item_id": item_id, "cart_id": cart.id })
            );
        };

        if quantity <= 0 {
            cart.items.retain(|i| i.id != item_id);
        } else {
            cart.items[index].quantity = clamp_quantity(quantity);
        }

        let revision = state.bump();
        Ok(MutationOutcome::Applied { revision })
    }

    pub fn remove_item(&self, item_id: &str) -> CaddieResult<MutationOutcome> {
        self.update_item_quantity(item_id, 0)
    }

    /// Copie courante d'une substitution.
    pub fn substitution(&self, item_id: &str, substitution_id: &str) -> CaddieResult<CartSubstitution> {
        let state = self.lock();
        let found = state
            .cart
            .as_ref()
            .and_then(|c| c.find_item(item_id))
            .and_then(|i| i.find_substitution(substitution_id))
            .cloned();

        match found {
            Some(sub) => Ok(sub),
            None => caddie_error!(
                "ERR_CART_SUBSTITUTION_NOT_FOUND",
                error = format!("Substitution inconnue : {}/{}", item_id, substitution_id),
                context = json!({ "item_id": item_id, "substitution_id": substitution_id })
            ),
        }
    }

    /// Remplace l'approbation et la quantité d'une seule substitution.
    ///
    /// Retourne la copie d'avant mutation pour permettre l'annulation.
    pub fn update_item_substitution(
        &self,
        item_id: &str,
        substitution_id: &str,
        is_approved: bool,
        quantity: u32,
    ) -> CaddieResult<(CartSubstitution, MutationOutcome)> {
        let mut state = self.lock();
        let cart = state.cart_mut()?;

        let sub = cart
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .and_then(|i| i.substitutions.iter_mut().find(|s| s.id == substitution_id));

        let Some(sub) = sub else {
            caddie_error!(
                "ERR_CART_SUBSTITUTION_NOT_FOUND",
                error = format!("Substitution inconnue : {}/{}", item_id, substitution_id),
                context = json!({ "item_id": item_id, "substitution_id": substitution_id })
            );
        };

        let previous = sub.clone();
        // Non approuvée implique une quantité de 1
        sub.quantity = if is_approved { quantity.max(1) } else { 1 };
        sub.is_approved = is_approved;

        let revision = state.bump();
        Ok((previous, MutationOutcome::Applied { revision }))
    }

    /// Restaure la copie d'une substitution. Retourne `false` si la ligne a disparu entre-temps.
    pub fn restore_substitution(&self, item_id: &str, previous: CartSubstitution) -> bool {
        let mut state = self.lock();
        let restored = state
            .cart
            .as_mut()
            .and_then(|c| c.items.iter_mut().find(|i| i.id == item_id))
            .and_then(|i| i.substitutions.iter_mut().find(|s| s.id == previous.id))
            .map(|slot| *slot = previous)
            .is_some();

        if restored {
            state.bump();
        }
        restored
    }

    /// Applique la réponse serveur si aucune mutation locale n'a eu lieu depuis l'envoi.
    pub fn reconcile(&self, sent_revision: u64, server_cart: Cart) -> Reconciliation {
        let mut state = self.lock();
        let same_cart = state.cart.as_ref().map(|c| c.id.as_str()) == Some(server_cart.id.as_str());

        if state.revision != sent_revision || !same_cart {
            return Reconciliation::Stale {
                current: state.revision,
            };
        }

        let mut cart = server_cart;
        cart.is_active = true;
        state.cart = Some(cart);
        Reconciliation::Applied {
            revision: state.bump(),
        }
    }

    pub fn rename_active(&self, name: &str) -> Option<u64> {
        let mut state = self.lock();
        let cart = state.cart.as_mut()?;
        cart.name = name.to_string();
        Some(state.bump())
    }
}

fn clamp_quantity(quantity: i64) -> u32 {
    u32::try_from(quantity).unwrap_or(u32::MAX)
}

// --- TESTS UNITAIRES ---
