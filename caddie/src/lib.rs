// FICHIER : caddie/src/lib.rs

//! Moteur d'état du panier : mutations optimistes, synchronisation différée
//! avec le service panier distant et préparation des requêtes d'optimisation
//! multi-magasins.

pub mod cart_engine;
pub mod optimizer;
pub mod remote;
pub mod utils;
