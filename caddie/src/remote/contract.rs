// FICHIER : caddie/src/remote/contract.rs

use crate::cart_engine::model::Cart;
use serde::{Deserialize, Serialize};

/// Corps de `PUT /carts/{id}/items` : le panier complet, identifié par produit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncCartRequest {
    pub cart_id: String,
    pub items: Vec<SyncItemPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncItemPayload {
    pub product_id: String,
    pub quantity: u32,
    #[serde(default)]
    pub substitutions: Vec<SyncSubstitutionPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncSubstitutionPayload {
    pub id: String,
    pub is_approved: bool,
    pub quantity: u32,
}

impl SyncCartRequest {
    /// Projette l'état local ; les identifiants temporaires ne quittent jamais le client.
    pub fn from_cart(cart: &Cart) -> Self {
        Self {
            cart_id: cart.id.clone(),
            items: cart
                .items
                .iter()
                .map(|item| SyncItemPayload {
                    product_id: item.product.id.clone(),
                    quantity: item.quantity,
                    substitutions: item
                        .substitutions
                        .iter()
                        .map(|s| SyncSubstitutionPayload {
                            id: s.id.clone(),
                            is_approved: s.is_approved,
                            quantity: s.quantity,
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    pub fn quantity_of(&self, product_id: &str) -> Option<u32> {
        self.items
            .iter()
            .find(|i| i.product_id == product_id)
            .map(|i| i.quantity)
    }
}

/// Corps de `PATCH /cart-items/{item}/substitutions/{sub}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubstitutionPatch {
    pub is_approved: bool,
    pub quantity: u32,
}
