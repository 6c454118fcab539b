// FICHIER : caddie/tests/cart_suite/lifecycle_tests.rs

use crate::common::{next_event, setup, WINDOW};
use caddie::cart_engine::model::ProductRef;
use caddie::cart_engine::{CartEvent, NoticeKind};
use caddie::remote::Operation;
use tokio::time::sleep;

#[tokio::test(start_paused = true)]
async fn test_bootstrap_without_remote_cart() {
    let env = setup();
    assert_eq!(env.session.bootstrap().await.unwrap(), None);
    assert!(env.session.cart().is_none());
    // Le chargement ne crée jamais de panier
    assert_eq!(env.service.calls(Operation::CreateCart), 0);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_first_adds_create_a_single_cart() {
    let env = setup();
    let (a, b) = tokio::join!(
        env.session.add_item(ProductRef::new("p-milk", "Lait"), 1),
        env.session.add_item(ProductRef::new("p-bread", "Pain"), 1),
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(env.service.calls(Operation::CreateCart), 1);
    assert_eq!(env.session.cart().unwrap().items.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_switch_flushes_pending_edits_of_previous_cart() {
    let env = setup();
    env.session
        .add_item(ProductRef::new("p-milk", "Lait"), 2)
        .await
        .unwrap();
    let first_id = env.session.cart().unwrap().id;

    // La création pousse d'abord le panier courant
    let second = env.session.create_cart("Fête").await.unwrap();
    assert_eq!(env.service.sync_requests().len(), 1);
    assert_eq!(env.session.cart().unwrap().id, second.id);

    env.session
        .add_item(ProductRef::new("p-bread", "Pain"), 3)
        .await
        .unwrap();
    let switched = env.session.switch_cart(&first_id).await.unwrap();

    let requests = env.service.sync_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].cart_id, second.id);
    assert_eq!(requests[1].quantity_of("p-bread"), Some(3));

    // Le panier visible est l'ancien, tel que le serveur le connaît
    let cart = env.session.cart().unwrap();
    assert_eq!(cart.id, first_id);
    assert_eq!(cart.items, switched.items);
    assert_eq!(cart.item_for_product("p-milk").unwrap().quantity, 2);

    // Rien ne part plus tard vers le mauvais panier
    sleep(WINDOW * 2).await;
    assert_eq!(env.service.sync_requests().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_delete_active_cart_drops_pending_edits() {
    let env = setup();
    let mut events = env.session.subscribe();
    env.session
        .add_item(ProductRef::new("p-milk", "Lait"), 1)
        .await
        .unwrap();
    let cart_id = env.session.cart().unwrap().id;

    env.session.delete_cart(&cart_id).await.unwrap();
    assert!(env.session.cart().is_none());

    sleep(WINDOW * 2).await;
    assert!(env.service.sync_requests().is_empty());
    assert!(env.service.server_cart(&cart_id).is_none());

    let notice = next_event(&mut events, |e| matches!(e, CartEvent::Notice(_))).await;
    match notice {
        CartEvent::Notice(n) => {
            assert_eq!(n.kind, NoticeKind::Info);
            assert_eq!(n.key, "CART_DELETED");
        }
        _ => unreachable!(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_delete_other_cart_keeps_active_one() {
    let env = setup();
    let other = env.session.create_cart("Ancien").await.unwrap();
    let active = env.session.create_cart("Courant").await.unwrap();

    env.session.delete_cart(&other.id).await.unwrap();
    assert_eq!(env.session.cart().unwrap().id, active.id);
    assert_eq!(env.session.list_carts().await.unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_rename_active_cart_updates_local_name() {
    let env = setup();
    let cart = env.session.create_cart("Courses").await.unwrap();

    env.session.rename_cart(&cart.id, "  Épicerie ").await.unwrap();
    assert_eq!(env.session.cart().unwrap().name, "Épicerie");

    let err = env.session.rename_cart(&cart.id, "   ").await.unwrap_err();
    assert_eq!(err.code(), "ERR_CART_INVALID_NAME");
    assert_eq!(env.service.calls(Operation::RenameCart), 1);
}

#[tokio::test(start_paused = true)]
async fn test_list_flushes_before_reading() {
    let env = setup();
    env.session
        .add_item(ProductRef::new("p-milk", "Lait"), 2)
        .await
        .unwrap();
    env.session.create_cart("Deuxième").await.unwrap();

    let carts = env.session.list_carts().await.unwrap();
    assert_eq!(carts.len(), 2);
    // La ligne ajoutée a été poussée avant la lecture
    assert_eq!(carts.iter().map(|c| c.item_count).sum::<usize>(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_switch_keeps_current_cart() {
    let env = setup();
    let mut events = env.session.subscribe();
    let cart = env.session.create_cart("Courses").await.unwrap();

    assert!(env.session.switch_cart("cart-ghost").await.is_err());
    assert_eq!(env.session.cart().unwrap().id, cart.id);

    let notice = next_event(&mut events, |e| matches!(e, CartEvent::Notice(_))).await;
    match notice {
        CartEvent::Notice(n) => assert_eq!(n.key, "CART_SWITCH_FAILED"),
        _ => unreachable!(),
    }
}
