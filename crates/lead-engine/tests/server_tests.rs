//! Tests for the server's background tasks
//! An agent left waiting at the head of the queue gets a lead once one shows
//! up, without anybody else submitting a status.

use std::sync::Arc;
use std::time::Duration;

use leadq_engine::prelude::*;
use tokio_test::assert_ok;

async fn create_server(sheets: MemorySheetStore, notifier: ChannelNotifier) -> LeadEngineServer {
    let mut config = LeadEngineConfig::default();
    config.dispatch.empty_dispatch_policy = EmptyDispatchPolicy::Requeue;
    config.dispatch.retry_interval = Duration::from_millis(50);

    LeadEngineServerBuilder::new()
        .with_config(config)
        .with_memory_store(sheets)
        .with_notifier(Arc::new(notifier))
        .build()
        .await
        .expect("Failed to create lead server")
}

#[tokio::test]
async fn test_waiting_agent_gets_lead_when_one_arrives() {
    let sheets = MemorySheetStore::new();
    sheets.seed_rows(
        "leads",
        vec![vec!["LeadID", "Name", "Phone", "OtherInfo", "Status", "AssignedTo"]],
    );
    sheets.seed_rows(
        "team",
        vec![vec!["Phone Number", "Telegram Name"], vec!["+1 555 0001", "Alice"]],
    );
    let (notifier, mut deliveries) = ChannelNotifier::new();
    let mut server = create_server(sheets.clone(), notifier).await;
    assert_ok!(server.start().await);

    let alice = ChatUser::new(1001_i64, Some("alice"));
    let handler = server.handler().clone();
    handler.handle(&alice, Inbound::Message("/start".to_string())).await;
    handler
        .handle(&alice, Inbound::Contact { phone: "+1 555 0001".to_string() })
        .await;
    let reply = handler
        .handle(&alice, Inbound::Message("/getnewlead".to_string()))
        .await
        .expect("reply expected");
    assert!(reply.text.contains("You stay first in the queue"));

    sheets.seed_rows(
        "leads",
        vec![
            vec!["LeadID", "Name", "Phone", "OtherInfo", "Status", "AssignedTo"],
            vec!["31", "Omar Haddad", "+1 415 555 0131", "", "", ""],
        ],
    );

    let delivery = tokio::time::timeout(Duration::from_secs(2), deliveries.recv())
        .await
        .expect("timed out waiting for the lead")
        .expect("notifier channel closed");
    assert_eq!(delivery.agent_id, alice.id);
    assert!(delivery.message.text.contains("Lead ID: 31"));
    assert_eq!(server.engine().queue_len().await, 0);
    assert_eq!(sheets.cell("leads", 2, 5).as_deref(), Some("assigned"));

    assert_ok!(server.stop().await);
}

#[tokio::test]
async fn test_stopped_server_does_not_retry() {
    let sheets = MemorySheetStore::new();
    sheets.seed_rows(
        "team",
        vec![vec!["Phone Number", "Telegram Name"], vec!["+1 555 0001", "Alice"]],
    );
    let (notifier, mut deliveries) = ChannelNotifier::new();
    let mut server = create_server(sheets.clone(), notifier).await;
    assert_ok!(server.start().await);

    let alice = ChatUser::new(1001_i64, Some("alice"));
    let engine = server.engine().clone();
    engine.start_verification(&alice).await;
    assert_ok!(engine.verify_contact(&alice, "+1 555 0001").await);
    assert_ok!(engine.request_lead(&alice).await);
    assert_ok!(server.stop().await);

    sheets.seed_rows(
        "leads",
        vec![
            vec!["LeadID", "Name", "Phone", "OtherInfo", "Status", "AssignedTo"],
            vec!["8", "Ines Duarte", "", "", "", ""],
        ],
    );
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(deliveries.try_recv().is_err());
    assert_eq!(engine.queue_position(&alice.id).await, Some(1));
}
