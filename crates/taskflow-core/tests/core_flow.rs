use std::io::Cursor;
use std::time::Duration;

use chrono::NaiveDate;
use serde_json::json;
use taskflow_core::cli::{CliCommand, ListArgs};
use taskflow_core::client::HttpTaskApi;
use taskflow_core::commands::App;
use taskflow_core::controller::UiController;
use taskflow_core::render::Renderer;
use taskflow_shared::{DateFilter, Status};
use tempfile::tempdir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ID: &str = "5f0c3a52-8a0e-4c56-9a55-2d1b0e0c9b11";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).expect("date")
}

fn task_json(title: &str, status: &str, due: &str) -> serde_json::Value {
    json!({
        "id": ID,
        "title": title,
        "description": null,
        "priority": null,
        "status": status,
        "dueDate": due,
        "statusHistory": null
    })
}

fn app(
    server: &MockServer,
    input: &str,
) -> App<HttpTaskApi, Cursor<Vec<u8>>, Vec<u8>> {
    let api = HttpTaskApi::new(&server.uri(), Duration::from_secs(5)).expect("client");
    App::new(
        UiController::new(api, Box::new(today)),
        Renderer::plain(),
        tempdir().expect("tempdir").keep(),
        Cursor::new(input.as_bytes().to_vec()),
        Vec::new(),
    )
}

fn output(app: App<HttpTaskApi, Cursor<Vec<u8>>, Vec<u8>>) -> String {
    String::from_utf8(app.into_output()).expect("utf8")
}

#[tokio::test]
async fn list_with_due_filter_sends_resolved_range() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .and(query_param("dueDateFrom", "2024-06-09"))
        .and(query_param("dueDateTo", "2024-06-15"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([task_json("Ship release", "OPEN", "2024-06-15")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut app = app(&server, "");
    app.execute(CliCommand::List(ListArgs {
        due: Some(DateFilter::ThisWeek),
        ..ListArgs::default()
    }))
    .await
    .expect("list");

    let text = output(app);
    assert!(text.contains("Ship release"));
    assert!(text.contains("Due today"));
    assert!(text.contains("MEDIUM"));
}

#[tokio::test]
async fn failed_list_is_a_command_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut app = app(&server, "");
    let err = app
        .execute(CliCommand::List(ListArgs::default()))
        .await
        .expect_err("server error");
    assert_eq!(err.to_string(), "Failed to load tasks");
    assert!(output(app).contains("Error loading tasks. Please try again."));
}

#[tokio::test]
async fn status_by_prefix_updates_and_reloads() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([task_json("Ship release", "OPEN", "2024-06-20")])),
        )
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("/api/tasks/{ID}/status")))
        .and(query_param("status", "COMPLETED"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(task_json("Ship release", "COMPLETED", "2024-06-20")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut app = app(&server, "");
    app.execute(CliCommand::Status {
        id: "5f0c3a52".to_string(),
        status: Status::Completed,
    })
    .await
    .expect("status");

    assert!(output(app).contains("Task status updated successfully"));
}

#[tokio::test]
async fn declined_delete_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let mut app = app(&server, "n\n");
    app.execute(CliCommand::Delete {
        id: ID.to_string(),
        yes: false,
    })
    .await
    .expect("delete");

    let text = output(app);
    assert!(text.contains("This action cannot be undone."));
    assert!(text.contains("Deletion cancelled."));
}

#[tokio::test]
async fn shell_keeps_filters_between_commands() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .and(query_param("priority", "HIGH"))
        .and(query_param("searchTerm", "release"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let mut app = app(
        &server,
        "filter --priority high\nfilter --search release\nview calendar\nquit\n",
    );
    app.execute(CliCommand::Shell).await.expect("shell");

    assert_eq!(app.controller().filters().search_term.as_deref(), Some("release"));
    let text = output(app);
    assert!(text.contains("No tasks found. Create your first task!"));
    assert!(text.contains("error: unknown view: calendar"));
}
