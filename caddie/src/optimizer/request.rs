// FICHIER : caddie/src/optimizer/request.rs

use crate::cart_engine::model::Cart;
use serde::{Deserialize, Serialize};

/// Un produit candidat pour une ligne du panier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupEntry {
    pub product_id: String,
    pub quantity: u32,
    pub is_substitute: bool,
}

/// "N'importe lequel de ces produits satisfait cette ligne."
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemGroup {
    pub item_id: String,
    pub entries: Vec<GroupEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizationRequest {
    pub items: Vec<ItemGroup>,
    pub store_ids: Vec<String>,
}

impl OptimizationRequest {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Projette le panier et ses substitutions approuvées vers l'optimiseur.
pub struct OptimizationRequestBuilder<'a> {
    cart: &'a Cart,
    store_ids: Vec<String>,
}

impl<'a> OptimizationRequestBuilder<'a> {
    pub fn new(cart: &'a Cart) -> Self {
        Self {
            cart,
            store_ids: Vec::new(),
        }
    }

    pub fn with_stores<I, S>(mut self, store_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.store_ids = store_ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(self) -> OptimizationRequest {
        let items = self
            .cart
            .items
            .iter()
            .map(|item| {
                // Le produit d'origine d'abord, puis les seuls substituts approuvés
                let original = GroupEntry {
                    product_id: item.product.id.clone(),
                    quantity: item.quantity,
                    is_substitute: false,
                };
                let substitutes = item.approved_substitutions().map(|s| GroupEntry {
                    product_id: s.product.id.clone(),
                    quantity: s.quantity,
                    is_substitute: true,
                });
                ItemGroup {
                    item_id: item.id.clone(),
                    entries: std::iter::once(original).chain(substitutes).collect(),
                }
            })
            .collect();

        OptimizationRequest {
            items,
            store_ids: self.store_ids,
        }
    }
}
