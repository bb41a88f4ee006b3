// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end directory flows over a temp SQLite database.

use std::sync::Arc;

use contactd_core::{
    CanSendQuery, ContactSearchFilter, DeleteContactCommand, EnsureBotRequest, ErrorKind,
    UpdateContactCommand,
};
use contactd_test_utils::{TestHarness, fixtures};

#[tokio::test]
async fn create_search_delete_by_username_substring() {
    let harness = TestHarness::new().await.unwrap();
    let contacts = &harness.contacts;

    let created = contacts
        .create(&fixtures::contact(1, "sub-1", "angelina"))
        .await
        .unwrap()
        .into_result()
        .unwrap();
    contacts
        .create(&fixtures::contact(1, "sub-2", "bob"))
        .await
        .unwrap()
        .into_result()
        .unwrap();

    let by_q = ContactSearchFilter::new(1).with_q("GEL");
    let page = contacts.search(&by_q).await.unwrap();
    assert_eq!(page.items, vec![created.clone()]);

    contacts
        .delete(&DeleteContactCommand {
            id: created.id,
            domain_id: 1,
        })
        .await
        .unwrap()
        .into_result()
        .unwrap();
    assert!(contacts.search(&by_q).await.unwrap().is_empty());

    assert_eq!(
        harness.publisher.topics().await,
        vec!["contact.created", "contact.created", "contact.deleted"]
    );
}

#[tokio::test]
async fn concurrent_upserts_insert_once() {
    let harness = TestHarness::new().await.unwrap();
    let contact = fixtures::contact(4, "shared-subject", "racer");

    let tasks: Vec<_> = (0..5)
        .map(|i| {
            let contacts = Arc::clone(&harness.contacts);
            let mut contact = contact.clone();
            contact.name = format!("writer {i}");
            tokio::spawn(async move { contacts.upsert(&contact).await })
        })
        .collect();

    let mut results = Vec::new();
    for task in tasks {
        results.push(task.await.unwrap().unwrap().into_result().unwrap());
    }
    assert_eq!(results.iter().filter(|r| r.inserted).count(), 1);
    let id = results[0].contact.id;
    assert!(results.iter().all(|r| r.contact.id == id));

    let page = harness
        .contacts
        .search(&ContactSearchFilter::new(4))
        .await
        .unwrap();
    assert_eq!(page.len(), 1);

    let topics = harness.publisher.topics().await;
    assert_eq!(topics.len(), 5);
    assert_eq!(topics.iter().filter(|t| **t == "contact.created").count(), 1);
}

#[tokio::test]
async fn upsert_twice_updates_in_place() {
    let harness = TestHarness::new().await.unwrap();
    let first = harness
        .contacts
        .upsert(&fixtures::contact_with_metadata(2, "s", "carol", "tier", "gold"))
        .await
        .unwrap()
        .value;

    let mut again = fixtures::contact(2, "s", "carol");
    again.name = "Carol Danvers".to_string();
    let second = harness.contacts.upsert(&again).await.unwrap().value;

    assert!(first.inserted);
    assert!(!second.inserted);
    assert_eq!(second.contact.id, first.contact.id);
    assert_eq!(second.contact.created_at, first.contact.created_at);
    assert!(second.contact.updated_at > first.contact.updated_at);
    assert_eq!(second.contact.name, "Carol Danvers");
}

#[tokio::test]
async fn failing_publisher_never_loses_the_write() {
    let harness = TestHarness::builder()
        .with_failing_publisher()
        .build()
        .await
        .unwrap();

    let (created, publish_error) = harness
        .contacts
        .create(&fixtures::contact(1, "s", "dave"))
        .await
        .unwrap()
        .into_parts();
    assert_eq!(publish_error.map(|e| e.kind()), Some(ErrorKind::Publish));

    let (updated, publish_error) = harness
        .contacts
        .update(&UpdateContactCommand::new(1, created.id).with_name("Dave"))
        .await
        .unwrap()
        .into_parts();
    assert!(publish_error.is_some());
    assert_eq!(updated.name, "Dave");

    let page = harness
        .contacts
        .search(&ContactSearchFilter::new(1))
        .await
        .unwrap();
    assert_eq!(page.items, vec![updated]);
    assert_eq!(harness.publisher.attempts(), 2);
}

#[tokio::test]
async fn can_send_between_tenant_peers() {
    let harness = TestHarness::new().await.unwrap();
    let a = harness
        .contacts
        .create(&fixtures::contact(7, "a", "alice"))
        .await
        .unwrap()
        .value;
    let b = harness
        .contacts
        .create(&fixtures::contact(7, "b", "bob"))
        .await
        .unwrap()
        .value;

    let query = CanSendQuery {
        domain_id: 7,
        from: a.id,
        to: b.id,
    };
    harness.contacts.can_send(&query).await.unwrap();

    let err = harness
        .contacts
        .can_send(&CanSendQuery {
            to: uuid::Uuid::new_v4(),
            ..query
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn domain_deleted_event_clears_only_that_tenant() {
    let harness = TestHarness::new().await.unwrap();
    for (domain, subject) in [(10, "a"), (10, "b"), (11, "a")] {
        let _ = harness
            .contacts
            .create(&fixtures::contact(domain, subject, "user"))
            .await
            .unwrap()
            .value;
    }
    harness.publisher.clear().await;

    let router = harness.spawn_router();
    router
        .sender
        .send(fixtures::domain_deleted(10))
        .await
        .unwrap();
    router
        .sender
        .send(contactd_bus::InboundMessage::new("domains.delete.10", "{broken"))
        .await
        .unwrap();
    let stats = router.finish().await;
    assert_eq!((stats.handled, stats.rejected), (1, 1));

    assert!(harness
        .contacts
        .search(&ContactSearchFilter::new(10))
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        harness
            .contacts
            .search(&ContactSearchFilter::new(11))
            .await
            .unwrap()
            .len(),
        1
    );
    assert!(harness.publisher.events().await.is_empty());
}

#[tokio::test]
async fn ensure_bot_is_idempotent() {
    let harness = TestHarness::new().await.unwrap();
    let request = EnsureBotRequest {
        domain_id: 1,
        flow_id: 100,
    };
    let first = harness.bots.ensure_bot(&request).await.unwrap();
    let second = harness.bots.ensure_bot(&request).await.unwrap();
    assert_eq!(first, second);

    let other_tenant = harness
        .bots
        .ensure_bot(&EnsureBotRequest {
            domain_id: 2,
            flow_id: 100,
        })
        .await
        .unwrap();
    assert_ne!(other_tenant.id, first.id);
}

#[tokio::test]
async fn ensure_bot_adopts_a_bot_created_directly() {
    let harness = TestHarness::new().await.unwrap();
    let existing = harness.bots.create(&fixtures::bot(5, 9)).await.unwrap();
    assert_eq!(existing.display_name, "flow 9 bot");

    let ensured = harness
        .bots
        .ensure_bot(&EnsureBotRequest {
            domain_id: 5,
            flow_id: 9,
        })
        .await
        .unwrap();
    assert_eq!(ensured, existing);

    let page = harness
        .bots
        .search(&contactd_core::BotSearchFilter::new(5))
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
}
