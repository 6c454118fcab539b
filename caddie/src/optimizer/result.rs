// FICHIER : caddie/src/optimizer/result.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannedItem {
    pub product_id: String,
    #[serde(default)]
    pub name: String,
    pub quantity: u32,
    pub unit_price: f64,
    #[serde(default)]
    pub is_substitute: bool,
}

/// Achats prévus dans un magasin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorePlan {
    pub store_id: String,
    #[serde(default)]
    pub store_name: String,
    pub subtotal: f64,
    #[serde(default)]
    pub items: Vec<PlannedItem>,
}

/// Meilleur découpage pour un plafond de magasins donné.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizationResult {
    pub max_stores: u32,
    pub total_cost: f64,
    pub savings: f64,
    #[serde(default)]
    pub stores: Vec<StorePlan>,
}

impl OptimizationResult {
    /// Un résultat sans magasin est une réponse "vide" pour cet onglet.
    pub fn is_usable(&self) -> bool {
        !self.stores.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OptimizationDataSet {
    #[serde(default)]
    pub baseline_cost: f64,
    #[serde(default)]
    pub best_single_store: Option<OptimizationResult>,
    #[serde(default)]
    pub optimization_results: Vec<OptimizationResult>,
}

impl OptimizationDataSet {
    pub fn result_for(&self, max_stores: u32) -> Option<&OptimizationResult> {
        self.optimization_results
            .iter()
            .find(|r| r.max_stores == max_stores)
    }

    pub fn is_empty(&self) -> bool {
        self.best_single_store.is_none() && self.optimization_results.is_empty()
    }
}

/// Réponse de `POST /optimize` : l'arbre avec substituts à plat, l'autre à part.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse {
    #[serde(flatten)]
    pub results: OptimizationDataSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_subs_results: Option<OptimizationDataSet>,
}

impl ApiResponse {
    /// Réponse d'un panier vide : aucun résultat, sans appel réseau.
    pub fn empty() -> Self {
        Self {
            results: OptimizationDataSet::default(),
            no_subs_results: Some(OptimizationDataSet::default()),
        }
    }
}
