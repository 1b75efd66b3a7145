#![allow(clippy::disallowed_methods)] // Allow unwrap() in tests for clarity

use localfile::LocalFileProvider;
use plugkit::types::{AttributePath, DynamicValue};
use plugkit::wire::HostResponse;
use plugkit::ProviderServer;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

const HELLO: &str = "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d";
const WORLD: &str = "7c211433f02071597741e6ff5a8ea34789abbf43";
const A: &str = "6dcd4ce23d88e2ee9568ba546c007c63d9131c1b";
const B: &str = "ae4f281df5a5d0ff3cad6371f76d5c29b6d953ec";

async fn server_in(dir: &TempDir) -> ProviderServer<LocalFileProvider> {
    let mut server = ProviderServer::new(LocalFileProvider::new());
    let request = json!({
        "op": "configure_provider",
        "config": { "base_dir": dir.path().to_str().unwrap() },
    });
    let response = server.handle_line(&request.to_string()).await;
    assert!(response.diagnostics().is_empty(), "{:?}", response);
    server
}

async fn send(server: &mut ProviderServer<LocalFileProvider>, request: serde_json::Value) -> HostResponse {
    server.handle_line(&request.to_string()).await
}

fn attr(state: &DynamicValue, name: &str) -> String {
    state.get_string(&AttributePath::new(name)).unwrap()
}

async fn create(
    server: &mut ProviderServer<LocalFileProvider>,
    filename: &str,
    content: &str,
) -> DynamicValue {
    let response = send(
        server,
        json!({
            "op": "create_resource",
            "type_name": "local_file",
            "config": { "filename": filename, "content": content },
        }),
    )
    .await;
    match response {
        HostResponse::CreateResource {
            new_state,
            diagnostics,
        } => {
            assert!(diagnostics.is_empty(), "{:?}", diagnostics);
            new_state
        }
        other => panic!("unexpected response: {:?}", other),
    }
}

async fn read(
    server: &mut ProviderServer<LocalFileProvider>,
    state: &DynamicValue,
) -> Option<DynamicValue> {
    let response = send(
        server,
        json!({
            "op": "read_resource",
            "type_name": "local_file",
            "current_state": state,
        }),
    )
    .await;
    match response {
        HostResponse::ReadResource {
            new_state,
            diagnostics,
        } => {
            assert!(diagnostics.is_empty(), "{:?}", diagnostics);
            new_state
        }
        other => panic!("unexpected response: {:?}", other),
    }
}

#[tokio::test]
async fn full_lifecycle() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("x.txt");
    let mut server = server_in(&dir).await;

    // create
    let state = create(&mut server, "x.txt", "hello").await;
    assert_eq!(attr(&state, "id"), HELLO);
    assert_eq!(attr(&state, "hash"), HELLO);
    assert_eq!(fs::read_to_string(&path).unwrap(), "hello");

    // read, no drift
    let refreshed = read(&mut server, &state).await.unwrap();
    assert_eq!(refreshed, state);

    // update
    let response = send(
        &mut server,
        json!({
            "op": "update_resource",
            "type_name": "local_file",
            "prior_state": state,
            "config": { "filename": "x.txt", "content": "world" },
        }),
    )
    .await;
    let state = match response {
        HostResponse::UpdateResource {
            new_state,
            diagnostics,
        } => {
            assert!(diagnostics.is_empty(), "{:?}", diagnostics);
            new_state
        }
        other => panic!("unexpected response: {:?}", other),
    };
    assert_eq!(attr(&state, "id"), WORLD);
    assert_eq!(attr(&state, "content"), "world");
    assert_eq!(fs::read_to_string(&path).unwrap(), "world");

    // delete
    let response = send(
        &mut server,
        json!({
            "op": "delete_resource",
            "type_name": "local_file",
            "prior_state": state,
        }),
    )
    .await;
    assert!(response.diagnostics().is_empty());
    assert!(!path.exists());

    // read after delete drops the resource
    assert!(read(&mut server, &state).await.is_none());
}

#[tokio::test]
async fn read_reports_external_edit() {
    let dir = TempDir::new().unwrap();
    let mut server = server_in(&dir).await;
    let state = create(&mut server, "drift.txt", "A").await;
    assert_eq!(attr(&state, "id"), A);

    fs::write(dir.path().join("drift.txt"), "B").unwrap();
    let refreshed = read(&mut server, &state).await.unwrap();

    assert_eq!(attr(&refreshed, "id"), B);
    assert_eq!(attr(&refreshed, "hash"), B);
    assert_eq!(attr(&refreshed, "content"), "B");
    assert_eq!(attr(&refreshed, "filename"), "drift.txt");
}

#[tokio::test]
async fn deleting_twice_succeeds() {
    let dir = TempDir::new().unwrap();
    let mut server = server_in(&dir).await;
    let state = create(&mut server, "twice.txt", "hello").await;

    for _ in 0..2 {
        let response = send(
            &mut server,
            json!({
                "op": "delete_resource",
                "type_name": "local_file",
                "prior_state": state,
            }),
        )
        .await;
        assert!(response.diagnostics().is_empty());
    }
    assert!(!dir.path().join("twice.txt").exists());
}

#[tokio::test]
async fn data_source_reads_existing_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("input.txt"), "hello").unwrap();
    let mut server = server_in(&dir).await;

    let response = send(
        &mut server,
        json!({
            "op": "read_data_source",
            "type_name": "local_file",
            "config": { "filename": "input.txt" },
        }),
    )
    .await;

    match response {
        HostResponse::ReadDataSource { state, diagnostics } => {
            assert!(diagnostics.is_empty());
            assert_eq!(attr(&state, "content"), "hello");
            assert_eq!(attr(&state, "id"), HELLO);
        }
        other => panic!("unexpected response: {:?}", other),
    }
}

#[tokio::test]
async fn data_source_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let mut server = server_in(&dir).await;

    let response = send(
        &mut server,
        json!({
            "op": "read_data_source",
            "type_name": "local_file",
            "config": { "filename": "missing.txt" },
        }),
    )
    .await;

    assert_eq!(response.diagnostics().len(), 1);
    assert!(response.diagnostics()[0].is_error());
    assert_eq!(response.diagnostics()[0].summary, "File not found");
}

#[tokio::test]
async fn plan_replaces_on_filename_change() {
    let dir = TempDir::new().unwrap();
    let mut server = server_in(&dir).await;
    let state = create(&mut server, "old.txt", "hello").await;

    let response = send(
        &mut server,
        json!({
            "op": "plan_resource_change",
            "type_name": "local_file",
            "prior_state": state,
            "config": { "filename": "new.txt", "content": "hello" },
        }),
    )
    .await;

    match response {
        HostResponse::PlanResourceChange {
            requires_replace, ..
        } => {
            assert_eq!(requires_replace, vec![AttributePath::new("filename")]);
        }
        other => panic!("unexpected response: {:?}", other),
    }
}

#[tokio::test]
async fn import_adopts_existing_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("adopt.txt"), "world").unwrap();
    let mut server = server_in(&dir).await;

    let response = send(
        &mut server,
        json!({
            "op": "import_resource_state",
            "type_name": "local_file",
            "id": "adopt.txt",
        }),
    )
    .await;

    match response {
        HostResponse::ImportResourceState {
            imported,
            diagnostics,
        } => {
            assert!(diagnostics.is_empty());
            assert_eq!(attr(&imported[0], "id"), WORLD);
            assert_eq!(attr(&imported[0], "filename"), "adopt.txt");
            // a subsequent read sees no drift
            let refreshed = read(&mut server, &imported[0]).await.unwrap();
            assert_eq!(refreshed, imported[0]);
        }
        other => panic!("unexpected response: {:?}", other),
    }
}

#[tokio::test]
async fn schema_lists_local_file() {
    let dir = TempDir::new().unwrap();
    let mut server = server_in(&dir).await;

    let response = send(&mut server, json!({ "op": "get_schema" })).await;

    match response {
        HostResponse::GetSchema {
            resource_schemas,
            data_source_schemas,
            ..
        } => {
            let resource = &resource_schemas["local_file"];
            assert!(resource.attribute("filename").unwrap().required);
            assert!(resource.attribute("hash").unwrap().computed);
            assert!(data_source_schemas.contains_key("local_file"));
        }
        other => panic!("unexpected response: {:?}", other),
    }
}
