// FICHIER : caddie/src/optimizer/mod.rs

/// Organisation des deux arbres de résultats (avec / sans substituts).
pub mod navigator;

/// Projection du panier en groupes d'articles interchangeables.
pub mod request;

/// Contrat de réponse de l'optimiseur.
pub mod result;

pub use navigator::{NavigatorOverview, ResultNavigator, SubstitutionMode, TabView};
pub use request::{GroupEntry, ItemGroup, OptimizationRequest, OptimizationRequestBuilder};
pub use result::{ApiResponse, OptimizationDataSet, OptimizationResult, PlannedItem, StorePlan};
