// FICHIER : caddie/src/cart_engine/substitution.rs

use crate::cart_engine::events::{CartEvent, EventBus, Notice};
use crate::cart_engine::outcome::MutationOutcome;
use crate::cart_engine::store::CartStore;
use crate::remote::{CartService, SubstitutionPatch};
use crate::utils::prelude::*;
use crate::utils::Arc;

/// État d'une substitution : approuvée ou non, avec sa quantité.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubstitutionState {
    pub is_approved: bool,
    pub quantity: u32,
}

/// Intentions utilisateur sur une substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubstitutionCommand {
    Approve,
    Unapprove,
    SetQuantity(i64),
    /// Forme brute (approbation + quantité), normalisée par les mêmes règles.
    Set { is_approved: bool, quantity: i64 },
}

impl SubstitutionState {
    /// Fonction de transition pure.
    pub fn transition(self, command: SubstitutionCommand) -> SubstitutionState {
        const RESET: SubstitutionState = SubstitutionState {
            is_approved: false,
            quantity: 1,
        };

        match command {
            SubstitutionCommand::Approve => SubstitutionState {
                is_approved: true,
                quantity: self.quantity.max(1),
            },
            SubstitutionCommand::Unapprove => RESET,
            SubstitutionCommand::SetQuantity(q) if q <= 0 => RESET,
            SubstitutionCommand::SetQuantity(q) if self.is_approved => SubstitutionState {
                is_approved: true,
                quantity: to_quantity(q),
            },
            // Non approuvée : la quantité reste à 1.
            SubstitutionCommand::SetQuantity(_) => RESET,
            SubstitutionCommand::Set {
                is_approved: true,
                quantity,
            } if quantity > 0 => SubstitutionState {
                is_approved: true,
                quantity: to_quantity(quantity),
            },
            SubstitutionCommand::Set { .. } => RESET,
        }
    }
}

fn to_quantity(q: i64) -> u32 {
    u32::try_from(q).unwrap_or(u32::MAX)
}

/// Mutations de substitutions, envoyées immédiatement (hors debounce).
pub struct SubstitutionManager {
    store: Arc<CartStore>,
    service: Arc<dyn CartService>,
    events: EventBus,
}

impl SubstitutionManager {
    pub fn new(store: Arc<CartStore>, service: Arc<dyn CartService>, events: EventBus) -> Self {
        Self {
            store,
            service,
            events,
        }
    }

    /// Mutation optimiste puis `PATCH` ; en cas d'échec la copie d'avant mutation est restaurée.
    ///
    /// Aucune garde d'ordre : deux requêtes concurrentes sur la même
    /// substitution peuvent se terminer dans le désordre.
    pub async fn apply(
        &self,
        item_id: &str,
        substitution_id: &str,
        command: SubstitutionCommand,
    ) -> CaddieResult<MutationOutcome> {
        let current = self.store.substitution(item_id, substitution_id)?;
        let next = SubstitutionState {
            is_approved: current.is_approved,
            quantity: current.quantity,
        }
        .transition(command);

        let (previous, applied) = self.store.update_item_substitution(
            item_id,
            substitution_id,
            next.is_approved,
            next.quantity,
        )?;
        self.events
            .emit(CartEvent::Substitution(applied.clone()));

        let patch = SubstitutionPatch {
            is_approved: next.is_approved,
            quantity: next.quantity,
        };
        debug!(item_id, substitution_id, ?patch, "📤 Mise à jour de substitution");

        let outcome = match self
            .service
            .patch_substitution(item_id, substitution_id, &patch)
            .await
        {
            Ok(()) => MutationOutcome::Confirmed {
                revision: applied.revision(),
            },
            Err(err) => {
                warn!(item_id, substitution_id, error = %err, "Substitution refusée, restauration");
                if !self.store.restore_substitution(item_id, previous) {
                    debug!(item_id, "Ligne disparue entre-temps, rien à restaurer");
                }
                self.events
                    .notify(Notice::from_remote("SUBSTITUTION_UPDATE_FAILED", &err));
                MutationOutcome::RolledBack {
                    revision: self.store.revision(),
                    reason: err.to_string(),
                }
            }
        };

        self.events
            .emit(CartEvent::Substitution(outcome.clone()));
        Ok(outcome)
    }

    /// Suppression non optimiste, suivie d'une relecture complète dans tous les cas.
    pub async fn remove(&self, item_id: &str, substitution_id: &str) -> CaddieResult<MutationOutcome> {
        self.store.substitution(item_id, substitution_id)?;

        let deleted = self
            .service
            .delete_substitution(item_id, substitution_id)
            .await;
        if let Err(err) = &deleted {
            self.events
                .notify(Notice::from_remote("SUBSTITUTION_REMOVE_FAILED", err));
        }

        let refetched = match self.service.fetch_active_cart().await {
            Ok(cart) => {
                let cart_id = cart.as_ref().map(|c| c.id.clone());
                let revision = self.store.replace(cart);
                self.events
                    .emit(CartEvent::CartReplaced { cart_id, revision });
                Ok(revision)
            }
            Err(err) => {
                self.events
                    .notify(Notice::from_remote("CART_REFETCH_FAILED", &err));
                Err(err)
            }
        };

        let outcome = match (deleted, refetched) {
            (Ok(()), Ok(revision)) => MutationOutcome::Confirmed { revision },
            (Err(err), _) => MutationOutcome::RolledBack {
                revision: self.store.revision(),
                reason: err.to_string(),
            },
            (Ok(()), Err(err)) => MutationOutcome::RolledBack {
                revision: self.store.revision(),
                reason: err.to_string(),
            },
        };

        self.events
            .emit(CartEvent::Substitution(outcome.clone()));
        Ok(outcome)
    }
}

// --- TESTS UNITAIRES ---
