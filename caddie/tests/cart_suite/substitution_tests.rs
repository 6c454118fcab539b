// FICHIER : caddie/tests/cart_suite/substitution_tests.rs

use crate::common::{
    cart_with_substitutions, next_event, setup, wait_for_sync_requests, TestEnv, WINDOW,
};
use caddie::cart_engine::model::ProductRef;
use caddie::cart_engine::{CartEvent, MutationOutcome, NoticeKind, SyncStatus};
use caddie::remote::{Operation, RemoteError, SubstitutionPatch};
use tokio::time::sleep;

async fn seeded() -> TestEnv {
    let env = setup();
    env.service.seed_cart(cart_with_substitutions());
    env.session.bootstrap().await.unwrap();
    env
}

fn local_substitution(env: &TestEnv, sub_id: &str) -> (bool, u32) {
    let cart = env.session.cart().unwrap();
    let sub = cart
        .find_item("item-milk")
        .and_then(|i| i.find_substitution(sub_id))
        .unwrap()
        .clone();
    (sub.is_approved, sub.quantity)
}

#[tokio::test(start_paused = true)]
async fn test_approve_is_sent_immediately() {
    let env = seeded().await;

    let outcome = env
        .session
        .approve_substitution("item-milk", "sub-rice")
        .await
        .unwrap();
    assert!(matches!(outcome, MutationOutcome::Confirmed { .. }));
    assert_eq!(local_substitution(&env, "sub-rice"), (true, 1));

    let patches = env.service.patch_requests();
    assert_eq!(patches.len(), 1);
    assert_eq!(
        patches[0],
        (
            "item-milk".to_string(),
            "sub-rice".to_string(),
            SubstitutionPatch {
                is_approved: true,
                quantity: 1
            }
        )
    );
    // Hors debounce : aucune synchronisation complète
    assert!(env.service.sync_requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unapprove_resets_quantity_to_one() {
    let env = seeded().await;

    env.session
        .unapprove_substitution("item-milk", "sub-soy")
        .await
        .unwrap();
    assert_eq!(local_substitution(&env, "sub-soy"), (false, 1));
    assert_eq!(
        env.service.patch_requests()[0].2,
        SubstitutionPatch {
            is_approved: false,
            quantity: 1
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_zero_quantity_is_sent_as_unapproved_one() {
    let env = seeded().await;

    let outcome = env
        .session
        .set_substitution_quantity("item-milk", "sub-oat", 0)
        .await
        .unwrap();
    assert!(matches!(outcome, MutationOutcome::Confirmed { .. }));
    assert_eq!(
        env.service.patch_requests()[0].2,
        SubstitutionPatch {
            is_approved: false,
            quantity: 1
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_failed_patch_restores_only_that_substitution() {
    let env = seeded().await;
    let mut events = env.session.subscribe();
    env.service.fail_next(
        Operation::PatchSubstitution,
        RemoteError::Server {
            status: 503,
            message: "indisponible".into(),
        },
    );

    let outcome = env
        .session
        .set_substitution_quantity("item-milk", "sub-soy", 5)
        .await
        .unwrap();
    assert!(outcome.is_rolled_back());

    // Valeur d'avant mutation, voisines intactes
    assert_eq!(local_substitution(&env, "sub-soy"), (true, 3));
    assert_eq!(local_substitution(&env, "sub-oat"), (true, 1));
    assert_eq!(local_substitution(&env, "sub-rice"), (false, 1));

    let notice = next_event(&mut events, |e| matches!(e, CartEvent::Notice(_))).await;
    match notice {
        CartEvent::Notice(n) => {
            assert_eq!(n.kind, NoticeKind::Error);
            assert_eq!(n.key, "SUBSTITUTION_UPDATE_FAILED");
        }
        _ => unreachable!(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_optimistic_value_is_published_before_confirmation() {
    let env = seeded().await;
    let mut events = env.session.subscribe();

    env.session
        .approve_substitution("item-milk", "sub-rice")
        .await
        .unwrap();

    let applied = next_event(&mut events, |e| matches!(e, CartEvent::Substitution(_))).await;
    assert!(matches!(
        applied,
        CartEvent::Substitution(MutationOutcome::Applied { .. })
    ));
    let confirmed = next_event(&mut events, |e| matches!(e, CartEvent::Substitution(_))).await;
    assert!(matches!(
        confirmed,
        CartEvent::Substitution(MutationOutcome::Confirmed { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_remove_refetches_cart() {
    let env = seeded().await;

    let outcome = env
        .session
        .remove_substitution("item-milk", "sub-oat")
        .await
        .unwrap();
    assert!(matches!(outcome, MutationOutcome::Confirmed { .. }));

    let cart = env.session.cart().unwrap();
    let item = cart.find_item("item-milk").unwrap();
    assert!(item.find_substitution("sub-oat").is_none());
    assert_eq!(item.substitutions.len(), 2);
    // bootstrap + relecture
    assert_eq!(env.service.calls(Operation::FetchActive), 2);
}

#[tokio::test(start_paused = true)]
async fn test_failed_remove_still_refetches() {
    let env = seeded().await;
    let mut events = env.session.subscribe();
    env.service.fail_next(
        Operation::DeleteSubstitution,
        RemoteError::Transport("réseau".into()),
    );

    let outcome = env
        .session
        .remove_substitution("item-milk", "sub-oat")
        .await
        .unwrap();
    assert!(outcome.is_rolled_back());
    assert_eq!(env.service.calls(Operation::FetchActive), 2);
    assert!(env
        .session
        .cart()
        .unwrap()
        .find_item("item-milk")
        .unwrap()
        .find_substitution("sub-oat")
        .is_some());

    let notice = next_event(&mut events, |e| matches!(e, CartEvent::Notice(_))).await;
    match notice {
        CartEvent::Notice(n) => assert_eq!(n.key, "SUBSTITUTION_REMOVE_FAILED"),
        _ => unreachable!(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_unknown_substitution_is_rejected_locally() {
    let env = seeded().await;

    let err = env
        .session
        .approve_substitution("item-milk", "sub-ghost")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "ERR_CART_SUBSTITUTION_NOT_FOUND");
    assert!(env.service.patch_requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unapproved_quantity_edit_is_sent_as_one() {
    let env = seeded().await;

    env.session
        .update_item_substitution("item-milk", "sub-rice", false, 3)
        .await
        .unwrap();
    env.session
        .set_substitution_quantity("item-milk", "sub-rice", 2)
        .await
        .unwrap();

    assert_eq!(local_substitution(&env, "sub-rice"), (false, 1));
    let patches = env.service.patch_requests();
    assert_eq!(patches.len(), 2);
    for (_, _, patch) in patches {
        assert_eq!(
            patch,
            SubstitutionPatch {
                is_approved: false,
                quantity: 1
            }
        );
    }
}

// --- ENTRELACEMENTS AVEC LA SYNCHRONISATION DU PANIER ---

#[tokio::test(start_paused = true)]
async fn test_remove_keeps_pending_quantity_edit() {
    let env = seeded().await;

    env.session.update_item_quantity("item-milk", 5).unwrap();
    env.session
        .remove_substitution("item-milk", "sub-rice")
        .await
        .unwrap();

    let cart = env.session.cart().unwrap();
    let milk = cart.find_item("item-milk").unwrap();
    assert_eq!(milk.quantity, 5);
    assert!(milk.find_substitution("sub-rice").is_none());

    sleep(WINDOW * 3).await;

    let server = env.service.server_cart("cart-seed").unwrap();
    assert_eq!(server.find_item("item-milk").unwrap().quantity, 5);
    let requests = env.service.sync_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].quantity_of("p-milk"), Some(5));
    assert_eq!(env.session.cart().unwrap().items, server.items);
}

#[tokio::test(start_paused = true)]
async fn test_bootstrap_pushes_pending_edit_first() {
    let env = seeded().await;

    env.session.update_item_quantity("item-milk", 4).unwrap();
    env.session.bootstrap().await.unwrap();

    assert_eq!(
        env.session
            .cart()
            .unwrap()
            .find_item("item-milk")
            .unwrap()
            .quantity,
        4
    );
    assert_eq!(env.service.sync_requests().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_substitution_edit_during_flight_triggers_follow_up_sync() {
    let env = seeded().await;
    env.service.hold_syncs();

    env.session
        .add_item(ProductRef::new("p-bread", "Pain"), 1)
        .await
        .unwrap();
    wait_for_sync_requests(&env.service, 1).await;

    // Envoi immédiat pendant que le panier complet est bloqué côté serveur
    env.session
        .approve_substitution("item-milk", "sub-rice")
        .await
        .unwrap();
    env.service.release_syncs();

    sleep(WINDOW * 4).await;

    let cart = env.session.cart().unwrap();
    let bread = cart
        .items
        .iter()
        .find(|i| i.product.id == "p-bread")
        .unwrap();
    assert!(!bread.has_temporary_id());
    assert_eq!(env.service.sync_requests().len(), 2);
    assert_eq!(env.session.sync_status(), SyncStatus::Idle);

    // L'écho du premier envoi ne laisse pas l'approbation perdue côté serveur
    let server = env.service.server_cart("cart-seed").unwrap();
    assert_eq!(cart.items, server.items);
    assert_eq!(local_substitution(&env, "sub-rice"), (true, 1));
}

#[tokio::test(start_paused = true)]
async fn test_substitution_edit_while_sync_is_pending() {
    let env = seeded().await;

    env.session.update_item_quantity("item-milk", 6).unwrap();
    env.session
        .approve_substitution("item-milk", "sub-rice")
        .await
        .unwrap();
    assert_eq!(env.session.sync_status(), SyncStatus::Pending);

    sleep(WINDOW * 3).await;

    let requests = env.service.sync_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].quantity_of("p-milk"), Some(6));

    let server = env.service.server_cart("cart-seed").unwrap();
    assert_eq!(env.session.cart().unwrap().items, server.items);
    assert_eq!(local_substitution(&env, "sub-rice"), (true, 1));
    assert_eq!(env.session.sync_status(), SyncStatus::Idle);
}
