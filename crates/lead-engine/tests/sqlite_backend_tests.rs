//! Tests for the SQLite-backed server
//! These verify that lead state written through the engine survives a
//! restart of the server on the same database file.

use leadq_engine::prelude::*;
use serial_test::serial;
use tempfile::TempDir;

fn rows(table: &[&[&str]]) -> Vec<Vec<String>> {
    table
        .iter()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect()
}

fn sqlite_config(temp_dir: &TempDir) -> LeadEngineConfig {
    let mut config = LeadEngineConfig::default();
    config.store.backend = StoreBackend::Sqlite;
    config.store.database_path = temp_dir.path().join("leads.db").display().to_string();
    config.store.max_connections = 2;
    config
}

async fn create_server(config: LeadEngineConfig) -> LeadEngineServer {
    LeadEngineServerBuilder::new()
        .with_config(config)
        .build()
        .await
        .expect("Failed to create lead server")
}

#[tokio::test]
#[serial]
async fn test_assignment_survives_restart() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = sqlite_config(&temp_dir);

    let mut server = create_server(config.clone()).await;
    server
        .seed_sheet(
            "leads",
            &rows(&[
                &["LeadID", "Name", "Phone", "OtherInfo", "Status", "AssignedTo"],
                &["21", "Ravi Kumar", "+91 90000 00021", "", "", ""],
                &["4", "Nora Field", "+1 303 555 0104", "", "Call Back", "Bob"],
            ]),
        )
        .await
        .expect("Failed to seed leads");
    server
        .seed_sheet(
            "team",
            &rows(&[&["Phone Number", "Telegram Name"], &["+1 555 0001", "Alice"]]),
        )
        .await
        .expect("Failed to seed team");
    server.start().await.expect("Failed to start server");

    let alice = ChatUser::new(1001_i64, Some("alice"));
    let handler = server.handler().clone();
    handler.handle(&alice, Inbound::Message("/start".to_string())).await;
    handler
        .handle(&alice, Inbound::Contact { phone: "+15550001".to_string() })
        .await;
    handler
        .handle(&alice, Inbound::Message("/getnewlead".to_string()))
        .await;

    let assignment = server
        .supervisor_api()
        .get_assignment(&alice.id)
        .await
        .expect("alice should hold a lead");
    assert_eq!(assignment.lead.lead_id.as_str(), "21");

    server.stop().await.expect("Failed to stop server");
    drop(server);

    let server = create_server(config).await;
    let leads = server.supervisor_api().list_leads().await.expect("Failed to list leads");
    assert_eq!(leads.len(), 2);

    let lead = leads
        .iter()
        .find(|lead| lead.lead_id.as_str() == "21")
        .expect("lead 21 should exist");
    assert_eq!(lead.status, LeadStatus::Assigned);
    assert_eq!(lead.assigned_to.as_deref(), Some("Alice (+15550001)"));

    let audit = server.engine().store().read_audit().await.expect("Failed to read audit");
    assert!(audit
        .iter()
        .any(|record| record.action == AuditAction::LeadAssigned
            && record.lead_id.as_deref() == Some("21")));
}

#[tokio::test]
#[serial]
async fn test_sqlite_store_health() {
    let store = SqliteSheetStore::new_in_memory()
        .await
        .expect("Failed to create in-memory database");
    assert!(store.health_check().await);

    store
        .append_row("audit trails", vec!["x".to_string(), "Bot Started".to_string()])
        .await
        .expect("Failed to append");
    let rows = store.read_all_rows("audit trails").await.expect("Failed to read");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][1], "Bot Started");
}
