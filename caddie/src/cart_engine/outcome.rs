// FICHIER : caddie/src/cart_engine/outcome.rs

use serde::Serialize;

/// Résultat explicite d'une mutation du panier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MutationOutcome {
    /// Appliquée localement, en attente de confirmation distante.
    Applied { revision: u64 },
    /// Confirmée par le service distant.
    Confirmed { revision: u64 },
    /// Annulée : l'état local a été restauré (copie préalable ou relecture serveur).
    RolledBack { revision: u64, reason: String },
}

impl MutationOutcome {
    pub fn revision(&self) -> u64 {
        match self {
            MutationOutcome::Applied { revision }
            | MutationOutcome::Confirmed { revision }
            | MutationOutcome::RolledBack { revision, .. } => *revision,
        }
    }

    pub fn is_rolled_back(&self) -> bool {
        matches!(self, MutationOutcome::RolledBack { .. })
    }
}

/// Résultat d'un envoi du panier complet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SyncOutcome {
    /// La réponse serveur a remplacé l'état local.
    Confirmed { revision: u64 },
    /// Une mutation locale plus récente existe : la réponse a été ignorée.
    Superseded {
        sent_revision: u64,
        current_revision: u64,
    },
    /// Échec de l'envoi, l'état local a été relu depuis le serveur.
    RolledBack { revision: u64, reason: String },
    /// Échec de l'envoi ET de la relecture : l'état local est conservé.
    Failed { reason: String },
    /// Aucun panier actif au moment de l'envoi.
    Skipped,
}
