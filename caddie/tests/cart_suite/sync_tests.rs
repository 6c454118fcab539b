// FICHIER : caddie/tests/cart_suite/sync_tests.rs

use crate::common::{next_event, setup, wait_for_sync_requests, WINDOW};
use caddie::cart_engine::model::ProductRef;
use caddie::cart_engine::{CartEvent, NoticeKind, SyncOutcome, SyncStatus};
use caddie::remote::{Operation, RemoteError};
use caddie::utils::Duration;
use tokio::time::sleep;

#[tokio::test(start_paused = true)]
async fn test_rapid_updates_collapse_into_one_sync() {
    let env = setup();
    env.session
        .add_item(ProductRef::new("p-milk", "Lait"), 1)
        .await
        .unwrap();
    let item_id = env.session.cart().unwrap().items[0].id.clone();

    for quantity in 2..=5 {
        sleep(Duration::from_millis(200)).await;
        env.session.update_item_quantity(&item_id, quantity).unwrap();
    }

    // Front descendant : rien avant une fenêtre complète de calme
    sleep(WINDOW - Duration::from_millis(100)).await;
    assert!(env.service.sync_requests().is_empty());
    assert_eq!(env.session.sync_status(), SyncStatus::Pending);

    sleep(Duration::from_millis(200)).await;
    let requests = env.service.sync_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].quantity_of("p-milk"), Some(5));

    // La réponse serveur a été appliquée : identifiant durable
    let cart = env.session.cart().unwrap();
    assert!(!cart.items[0].has_temporary_id());
    assert_eq!(cart.items[0].quantity, 5);
    assert_eq!(env.session.sync_status(), SyncStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_dispatch_reads_latest_state() {
    let env = setup();
    env.session
        .add_item(ProductRef::new("p-milk", "Lait"), 1)
        .await
        .unwrap();
    env.session
        .add_item(ProductRef::new("p-bread", "Pain"), 2)
        .await
        .unwrap();

    sleep(WINDOW * 2).await;
    let requests = env.service.sync_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].items.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_stale_response_is_discarded() {
    let env = setup();
    let mut events = env.session.subscribe();
    env.service.hold_syncs();

    env.session
        .add_item(ProductRef::new("p-milk", "Lait"), 1)
        .await
        .unwrap();
    let item_id = env.session.cart().unwrap().items[0].id.clone();

    // Le premier envoi part puis reste bloqué côté serveur
    wait_for_sync_requests(&env.service, 1).await;
    assert!(matches!(
        env.session.sync_status(),
        SyncStatus::InFlight { .. }
    ));

    // Mutation locale pendant le vol
    env.session.update_item_quantity(&item_id, 3).unwrap();
    env.service.release_syncs();

    let first = next_event(&mut events, |e| matches!(e, CartEvent::Synced(_))).await;
    match first {
        CartEvent::Synced(SyncOutcome::Superseded {
            sent_revision,
            current_revision,
        }) => assert!(current_revision > sent_revision),
        other => panic!("Réponse obsolète attendue, obtenu {:?}", other),
    }
    // L'écho serveur (quantité 1) n'a pas écrasé l'édition locale
    assert_eq!(env.session.cart().unwrap().items[0].quantity, 3);

    // Le second envoi porte l'état le plus récent et converge
    let second = next_event(&mut events, |e| matches!(e, CartEvent::Synced(_))).await;
    assert!(matches!(
        second,
        CartEvent::Synced(SyncOutcome::Confirmed { .. })
    ));
    let requests = env.service.sync_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].quantity_of("p-milk"), Some(3));

    let cart = env.session.cart().unwrap();
    let server = env.service.server_cart(&cart.id).unwrap();
    assert_eq!(cart.items, server.items);
}

#[tokio::test(start_paused = true)]
async fn test_failed_sync_restores_server_state() {
    let env = setup();
    let mut events = env.session.subscribe();

    // Quantité 1 confirmée
    env.session
        .add_item(ProductRef::new("p-milk", "Lait"), 1)
        .await
        .unwrap();
    assert!(matches!(
        env.session.flush().await,
        Some(SyncOutcome::Confirmed { .. })
    ));
    let item_id = env.session.cart().unwrap().items[0].id.clone();

    // Passage à 3 refusé par le serveur
    env.service.fail_next(
        Operation::SyncCart,
        RemoteError::Server {
            status: 500,
            message: "boom".into(),
        },
    );
    env.session.update_item_quantity(&item_id, 3).unwrap();
    assert_eq!(env.session.cart().unwrap().items[0].quantity, 3);

    let outcome = env.session.flush().await.unwrap();
    assert!(matches!(outcome, SyncOutcome::RolledBack { .. }));
    assert_eq!(env.session.cart().unwrap().items[0].quantity, 1);
    assert_eq!(env.service.calls(Operation::FetchActive), 2);

    let notice = next_event(&mut events, |e| matches!(e, CartEvent::Notice(_))).await;
    match notice {
        CartEvent::Notice(n) => {
            assert_eq!(n.kind, NoticeKind::Error);
            assert_eq!(n.key, "CART_SYNC_FAILED");
        }
        _ => unreachable!(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_failed_sync_is_not_retried() {
    let env = setup();
    env.session
        .add_item(ProductRef::new("p-milk", "Lait"), 1)
        .await
        .unwrap();
    env.service
        .fail_next(Operation::SyncCart, RemoteError::Transport("réseau".into()));

    sleep(WINDOW * 4).await;
    assert_eq!(env.service.calls(Operation::SyncCart), 1);
    // Le panier serveur (vide) fait foi
    assert!(env.session.cart().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_auth_failure_prompts_login() {
    let env = setup();
    let mut events = env.session.subscribe();
    env.session
        .add_item(ProductRef::new("p-milk", "Lait"), 1)
        .await
        .unwrap();
    env.service.fail_next(
        Operation::SyncCart,
        RemoteError::AuthenticationRequired("Connectez-vous".into()),
    );

    env.session.flush().await;
    let notice = next_event(&mut events, |e| matches!(e, CartEvent::Notice(_))).await;
    match notice {
        CartEvent::Notice(n) => {
            assert_eq!(n.kind, NoticeKind::LoginRequired);
            assert_eq!(n.key, "AUTH_LOGIN_REQUIRED");
        }
        _ => unreachable!(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_flush_waits_for_in_flight_sync() {
    let env = setup();
    env.service.hold_syncs();
    env.session
        .add_item(ProductRef::new("p-milk", "Lait"), 1)
        .await
        .unwrap();
    wait_for_sync_requests(&env.service, 1).await;

    let release = {
        let service = env.service.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(500)).await;
            service.release_syncs();
        })
    };

    // Rien de programmé, mais l'envoi en cours doit être terminé au retour
    assert_eq!(env.session.flush().await, None);
    assert_eq!(env.session.sync_status(), SyncStatus::Idle);
    assert!(!env.session.cart().unwrap().items[0].has_temporary_id());
    release.await.unwrap();
}
