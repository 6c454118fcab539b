// FICHIER : caddie/src/cart_engine/model.rs

use crate::caddie_error;
use crate::utils::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};

/// Préfixe des identifiants locaux, remplacés par le serveur à la synchro.
pub const TEMP_ID_PREFIX: &str = "tmp_";

static TEMP_ID_SEQ: AtomicU64 = AtomicU64::new(0);

/// Prix d'un produit chez une enseigne donnée.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetailerPrice {
    pub store_id: String,
    pub price: f64,
}

/// Référence produit possédée par le catalogue : jamais modifiée par le moteur.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductRef {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub prices: Vec<RetailerPrice>,
}

impl ProductRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            brand: None,
            unit: None,
            image_url: None,
            prices: Vec::new(),
        }
    }

    pub fn with_price(mut self, store_id: impl Into<String>, price: f64) -> Self {
        self.prices.push(RetailerPrice {
            store_id: store_id.into(),
            price,
        });
        self
    }

    /// Prix le plus bas connu (affichage uniquement).
    pub fn lowest_price(&self) -> Option<&RetailerPrice> {
        self.prices
            .iter()
            .min_by(|a, b| a.price.total_cmp(&b.price))
    }
}

/// Produit de remplacement proposé pour une ligne du panier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartSubstitution {
    pub id: String,
    pub product: ProductRef,
    pub quantity: u32,
    pub is_approved: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    pub id: String,
    pub product: ProductRef,
    pub quantity: u32,
    #[serde(default)]
    pub substitutions: Vec<CartSubstitution>,
}

impl CartItem {
    pub fn has_temporary_id(&self) -> bool {
        is_temporary_id(&self.id)
    }

    pub fn find_substitution(&self, substitution_id: &str) -> Option<&CartSubstitution> {
        self.substitutions.iter().find(|s| s.id == substitution_id)
    }

    pub fn approved_substitutions(&self) -> impl Iterator<Item = &CartSubstitution> {
        self.substitutions.iter().filter(|s| s.is_approved)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cart {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub is_active: bool,
}

impl Cart {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            items: Vec::new(),
            is_active: true,
        }
    }

    pub fn find_item(&self, item_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    pub fn item_for_product(&self, product_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product.id == product_id)
    }

    /// Nombre total d'unités (somme des quantités).
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn summary(&self) -> CartSummary {
        CartSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            is_active: self.is_active,
            item_count: self.items.len(),
        }
    }
}

/// Vue allégée renvoyée par la liste des paniers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub item_count: usize,
}

/// Identifiant local basé sur l'horloge, en attendant l'identifiant durable du serveur.
pub fn temporary_item_id() -> String {
    format!(
        "{}{}_{}",
        TEMP_ID_PREFIX,
        Utc::now().timestamp_millis(),
        TEMP_ID_SEQ.fetch_add(1, Ordering::Relaxed)
    )
}

pub fn is_temporary_id(id: &str) -> bool {
    id.starts_with(TEMP_ID_PREFIX)
}

/// Valide une quantité saisie à la main avant toute mutation.
pub fn parse_quantity_input(raw: &str) -> CaddieResult<u32> {
    let trimmed = raw.trim();
    match trimmed.parse::<i64>() {
        Ok(q) if q >= 1 => Ok(u32::try_from(q).unwrap_or(u32::MAX)),
        Ok(q) => caddie_error!(
            "ERR_CART_INVALID_QUANTITY",
            error = format!("La quantité doit être positive (reçu {})", q),
            context = json!({ "input": trimmed })
        ),
        Err(e) => caddie_error!(
            "ERR_CART_INVALID_QUANTITY",
            error = e,
            context = json!({ "input": trimmed })
        ),
    }
}

// --- TESTS UNITAIRES ---
