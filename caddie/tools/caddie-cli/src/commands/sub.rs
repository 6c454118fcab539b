use clap::{Args, Subcommand};
use caddie::cart_engine::{CartSession, MutationOutcome};
use caddie::utils::error::AnyResult;
use caddie::{user_error, user_success};

/// Substitutions proposées par le catalogue pour une ligne du panier
#[derive(Args, Clone, Debug)]
pub struct SubArgs {
    #[command(subcommand)]
    pub command: SubCommands,
}

#[derive(Subcommand, Clone, Debug)]
pub enum SubCommands {
    /// Accepte le produit de remplacement
    Approve { item_id: String, sub_id: String },
    /// Refuse le produit de remplacement (quantité ramenée à 1)
    Unapprove { item_id: String, sub_id: String },
    /// Fixe la quantité du remplacement (0 ou moins le refuse)
    Qty {
        item_id: String,
        sub_id: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Retire le remplacement (relecture complète du panier ensuite)
    Remove { item_id: String, sub_id: String },
}

pub async fn handle(args: SubArgs, session: &CartSession) -> AnyResult<()> {
    let (outcome, success_key) = match args.command {
        SubCommands::Approve { item_id, sub_id } => (
            session.approve_substitution(&item_id, &sub_id).await?,
            "SUBSTITUTION_UPDATED",
        ),
        SubCommands::Unapprove { item_id, sub_id } => (
            session.unapprove_substitution(&item_id, &sub_id).await?,
            "SUBSTITUTION_UPDATED",
        ),
        SubCommands::Qty {
            item_id,
            sub_id,
            quantity,
        } => (
            session
                .set_substitution_quantity(&item_id, &sub_id, quantity)
                .await?,
            "SUBSTITUTION_UPDATED",
        ),
        SubCommands::Remove { item_id, sub_id } => (
            session.remove_substitution(&item_id, &sub_id).await?,
            "SUBSTITUTION_REMOVED",
        ),
    };

    match outcome {
        MutationOutcome::RolledBack { reason, .. } => {
            // La notification détaillée est déjà partie sur le bus
            user_error!("CMD_FAIL", "{}", reason);
        }
        _ => user_success!(success_key),
    }
    Ok(())
}
