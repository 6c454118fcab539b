// FICHIER : caddie/src/cart_engine/sync/mod.rs

/// File à emplacement unique qui porte le debounce (front descendant).
pub mod queue;

/// Envoi différé et unique du panier complet, avec réconciliation.
pub mod scheduler;

/// États observables de la synchronisation (Idle, Pending, InFlight, Error).
pub mod state;

pub use queue::SyncQueue;
pub use scheduler::SyncScheduler;
pub use state::SyncStatus;
