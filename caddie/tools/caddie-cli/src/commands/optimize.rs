use clap::Args;
use caddie::cart_engine::{CartSession, OptimizationOutcome};
use caddie::optimizer::navigator::{NavigatorOverview, PlanSummary};
use caddie::optimizer::SubstitutionMode;
use caddie::utils::data;
use caddie::utils::error::AnyResult;
use caddie::{user_error, user_info};

/// Optimisation multi-magasins du panier actif
#[derive(Args, Clone, Debug)]
pub struct OptimizeArgs {
    /// Magasins candidats (séparés par des virgules)
    #[arg(long, value_delimiter = ',')]
    pub stores: Vec<String>,

    /// Affiche l'arbre calculé sans substituts
    #[arg(long)]
    pub without_subs: bool,

    /// Sortie JSON brute (vue de présentation)
    #[arg(long)]
    pub json: bool,
}

pub async fn handle(args: OptimizeArgs, session: &CartSession) -> AnyResult<()> {
    // Le panier distant doit refléter les dernières modifications
    session.flush().await;

    let mut navigator = match session.optimize(args.stores).await {
        OptimizationOutcome::Available(navigator) => navigator,
        OptimizationOutcome::Unavailable { reason } => {
            user_error!("OPTIMIZE_UNAVAILABLE", "({})", reason);
            return Ok(());
        }
    };

    if args.without_subs {
        navigator.set_mode(SubstitutionMode::WithoutSubstitutes);
    }
    let overview = navigator.overview(&session.settings().store_options);

    if args.json {
        println!("{}", data::stringify_pretty(&overview)?);
        return Ok(());
    }
    print_overview(&overview);
    Ok(())
}

fn describe(plan: &PlanSummary) -> String {
    format!(
        "{:.2} $ (économie {:.2} $) : {}",
        plan.total_cost,
        plan.savings,
        plan.store_names.join(", ")
    )
}

fn print_overview(overview: &NavigatorOverview) {
    if !overview.optimizable {
        user_info!("OPTIMIZE_UNAVAILABLE");
        return;
    }

    user_info!(
        "OPTIMIZE_RESULTS",
        "({:?}, panier de référence {:.2} $)",
        overview.mode,
        overview.baseline_cost.unwrap_or_default()
    );

    if let Some(single) = &overview.best_single_store {
        user_info!("OPTIMIZE_BEST_SINGLE", "{}", describe(single));
    }

    for tab in &overview.tabs {
        match &tab.plan {
            Some(plan) => {
                let star = if tab.highlighted { " ⭐" } else { "" };
                println!("  [{} magasins]{} {}", tab.max_stores, star, describe(plan));
            }
            None => user_info!("OPTIMIZE_NO_RESULT", "[{} magasins]", tab.max_stores),
        }
    }
}
