// FICHIER : caddie/src/cart_engine/mod.rs

pub mod events;
pub mod model;
pub mod outcome;
pub mod session;
pub mod store;
pub mod substitution;
pub mod sync;

pub use events::{CartEvent, EventBus, Notice, NoticeKind};
pub use model::{Cart, CartItem, CartSubstitution, CartSummary, ProductRef, RetailerPrice};
pub use outcome::{MutationOutcome, SyncOutcome};
pub use session::{CartSession, OptimizationOutcome, SessionSettings};
pub use store::{CartStore, Reconciliation, SyncSnapshot};
pub use substitution::{SubstitutionCommand, SubstitutionManager, SubstitutionState};
pub use sync::{SyncQueue, SyncScheduler, SyncStatus};
