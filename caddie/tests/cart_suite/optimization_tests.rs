// FICHIER : caddie/tests/cart_suite/optimization_tests.rs

use crate::common::{cart_with_substitutions, next_event, setup_with};
use caddie::cart_engine::{CartEvent, NoticeKind, OptimizationOutcome};
use caddie::optimizer::{
    ApiResponse, OptimizationDataSet, OptimizationResult, StorePlan, SubstitutionMode, TabView,
};
use caddie::remote::{RemoteError, ScriptedOptimizer};

fn plan(max_stores: u32, total_cost: f64, savings: f64) -> OptimizationResult {
    OptimizationResult {
        max_stores,
        total_cost,
        savings,
        stores: (0..max_stores)
            .map(|i| StorePlan {
                store_id: format!("s-{}", i + 1),
                store_name: format!("Magasin {}", i + 1),
                subtotal: total_cost / max_stores as f64,
                items: Vec::new(),
            })
            .collect(),
    }
}

fn scripted_response() -> ApiResponse {
    ApiResponse {
        results: OptimizationDataSet {
            baseline_cost: 30.0,
            best_single_store: Some(plan(1, 27.0, 3.0)),
            optimization_results: vec![plan(2, 24.0, 6.0), plan(3, 23.0, 7.0)],
        },
        no_subs_results: Some(OptimizationDataSet {
            baseline_cost: 30.0,
            best_single_store: Some(plan(1, 28.0, 2.0)),
            optimization_results: vec![plan(2, 26.0, 4.0)],
        }),
    }
}

#[tokio::test(start_paused = true)]
async fn test_request_carries_only_approved_substitutes() {
    let env = setup_with(ScriptedOptimizer::responding(scripted_response()));
    env.service.seed_cart(cart_with_substitutions());
    env.session.bootstrap().await.unwrap();

    let outcome = env.session.optimize(vec!["s-1".into(), "s-2".into()]).await;
    assert!(matches!(outcome, OptimizationOutcome::Available(_)));

    let requests = env.optimizer.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].store_ids, vec!["s-1", "s-2"]);

    let group = &requests[0].items[0];
    assert_eq!(group.item_id, "item-milk");
    let entries: Vec<(&str, u32, bool)> = group
        .entries
        .iter()
        .map(|e| (e.product_id.as_str(), e.quantity, e.is_substitute))
        .collect();
    assert_eq!(
        entries,
        vec![("p-milk", 2, false), ("p-oat", 1, true), ("p-soy", 3, true)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_empty_cart_skips_optimizer() {
    let env = setup_with(ScriptedOptimizer::responding(scripted_response()));

    let OptimizationOutcome::Available(nav) = env.session.optimize(Vec::new()).await else {
        panic!("Résultat vide attendu");
    };
    assert!(env.optimizer.requests().is_empty());
    assert!(!nav.is_optimizable(SubstitutionMode::WithSubstitutes));
    assert!(!nav.is_optimizable(SubstitutionMode::WithoutSubstitutes));
}

#[tokio::test(start_paused = true)]
async fn test_optimizer_failure_is_unavailable() {
    let env = setup_with(ScriptedOptimizer::failing(RemoteError::Server {
        status: 503,
        message: "surcharge".into(),
    }));
    let mut events = env.session.subscribe();
    env.service.seed_cart(cart_with_substitutions());
    env.session.bootstrap().await.unwrap();

    let outcome = env.session.optimize(Vec::new()).await;
    assert!(matches!(outcome, OptimizationOutcome::Unavailable { .. }));

    let notice = next_event(&mut events, |e| matches!(e, CartEvent::Notice(_))).await;
    match notice {
        CartEvent::Notice(n) => {
            assert_eq!(n.kind, NoticeKind::Error);
            assert_eq!(n.key, "OPTIMIZE_UNAVAILABLE");
        }
        _ => unreachable!(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_toggle_switches_trees_without_new_request() {
    let env = setup_with(ScriptedOptimizer::responding(scripted_response()));
    env.service.seed_cart(cart_with_substitutions());
    env.session.bootstrap().await.unwrap();

    let OptimizationOutcome::Available(mut nav) = env.session.optimize(Vec::new()).await else {
        panic!("Réponse attendue");
    };

    let with = nav.overview(&[2, 3, 4]);
    assert_eq!(with.mode, SubstitutionMode::WithSubstitutes);
    assert_eq!(with.best_single_store.as_ref().unwrap().savings, 3.0);
    assert!(with.tabs[1].highlighted);

    nav.toggle();
    let without = nav.overview(&[2, 3, 4]);
    assert_eq!(without.mode, SubstitutionMode::WithoutSubstitutes);
    assert!(without.tabs[0].highlighted);
    assert!(without.tabs[1].plan.is_none());
    assert_eq!(nav.tab(nav.mode(), 3), TabView::NoResult);

    assert_eq!(env.optimizer.requests().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_pending_edits_are_optimized_from_local_state() {
    let env = setup_with(ScriptedOptimizer::responding(scripted_response()));
    env.service.seed_cart(cart_with_substitutions());
    env.session.bootstrap().await.unwrap();

    env.session.update_item_quantity("item-milk", 4).unwrap();
    env.session.optimize(Vec::new()).await;

    let requests = env.optimizer.requests();
    assert_eq!(requests[0].items[0].entries[0].quantity, 4);
}
