// FICHIER : caddie/tests/cart_suite/store_tests.rs

use crate::common::{self, setup};
use caddie::cart_engine::model::ProductRef;
use caddie::cart_engine::{CartEvent, MutationOutcome};

#[tokio::test(start_paused = true)]
async fn test_mutations_are_visible_immediately() {
    let env = setup();
    let mut events = env.session.subscribe();

    let outcome = env
        .session
        .add_item(ProductRef::new("p-milk", "Lait"), 2)
        .await
        .unwrap();
    assert!(matches!(outcome, MutationOutcome::Applied { .. }));

    // Aucun envoi encore : seule la mutation locale est visible
    let cart = env.session.cart().unwrap();
    assert_eq!(cart.items[0].quantity, 2);
    assert!(cart.items[0].has_temporary_id());
    assert!(env.service.sync_requests().is_empty());

    let applied = drain_applied(&mut events);
    assert_eq!(applied, vec![outcome.revision()]);
}

#[tokio::test(start_paused = true)]
async fn test_add_same_product_twice_merges_lines() {
    let env = setup();
    let milk = ProductRef::new("p-milk", "Lait");
    env.session.add_item(milk.clone(), 1).await.unwrap();
    env.session.add_item(milk, 3).await.unwrap();

    let cart = env.session.cart().unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 4);
}

#[tokio::test(start_paused = true)]
async fn test_quantity_zero_equals_removal() {
    let a = setup();
    let b = setup();

    for env in [&a, &b] {
        env.session
            .add_item(ProductRef::new("p-milk", "Lait"), 1)
            .await
            .unwrap();
        env.session
            .add_item(ProductRef::new("p-bread", "Pain"), 1)
            .await
            .unwrap();
    }

    let milk_a = a.session.cart().unwrap().items[0].id.clone();
    let milk_b = b.session.cart().unwrap().items[0].id.clone();
    a.session.update_item_quantity(&milk_a, 0).unwrap();
    b.session.remove_item(&milk_b).unwrap();

    let products = |env: &common::TestEnv| {
        env.session
            .cart()
            .unwrap()
            .items
            .iter()
            .map(|i| (i.product.id.clone(), i.quantity))
            .collect::<Vec<_>>()
    };
    assert_eq!(products(&a), products(&b));

    // Les deux envois transportent le même panier
    a.session.flush().await;
    b.session.flush().await;
    assert_eq!(
        a.service.sync_requests()[0].items,
        b.service.sync_requests()[0].items
    );
    assert_eq!(a.service.sync_requests()[0].items.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_item_is_rejected_without_sync() {
    let env = setup();
    env.session
        .add_item(ProductRef::new("p-milk", "Lait"), 1)
        .await
        .unwrap();
    env.session.flush().await;

    let err = env.session.update_item_quantity("ghost", 3).unwrap_err();
    assert_eq!(err.code(), "ERR_CART_ITEM_NOT_FOUND");
    assert!(!env.session.sync_status().is_busy());
}

fn drain_applied(events: &mut caddie::utils::broadcast::Receiver<CartEvent>) -> Vec<u64> {
    common::drain(events)
        .into_iter()
        .filter_map(|e| match e {
            CartEvent::Applied { revision } => Some(revision),
            _ => None,
        })
        .collect()
}
