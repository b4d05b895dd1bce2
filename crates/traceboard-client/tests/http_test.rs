//! HTTP tests against a mock analytics service

use chrono::{NaiveDate, TimeZone, Utc};
use mockito::{Matcher, Server, ServerGuard};
use std::sync::Arc;
use traceboard_client::{AnalyticsQueryClient, ClientConfig, Exporter, HttpAnalyticsService};
use traceboard_core::query::{ExportFormat, TopTracesRequest, TracePage};
use traceboard_core::{
    Endpoint, FilterState, Granularity, ProjectId, TimeRange, TraceId, TraceboardError,
};

const SUMMARY_BODY: &str = r#"{
    "total_traces": 3, "total_llm_calls": 5, "total_tool_calls": 2,
    "total_input_tokens": 100, "total_output_tokens": 50, "total_tokens": 150,
    "total_cost": 0.25, "avg_duration_ms": 1200.5, "min_duration_ms": 800.0,
    "max_duration_ms": 1800.0, "total_duration_ms": 3601.5, "unique_projects": 2
}"#;

const TRENDS_BODY: &str = r#"{
    "granularity": "day",
    "data": [
        {"timestamp": "2024-05-01T00:00:00", "input_tokens": 60, "output_tokens": 30,
         "total_tokens": 90, "cost": 0.15, "trace_count": 2},
        {"timestamp": "2024-05-02T00:00:00", "input_tokens": 40, "output_tokens": 20,
         "total_tokens": 60, "cost": 0.10, "trace_count": 1}
    ]
}"#;

const MODELS_BODY: &str = r#"{
    "models": [
        {"model_name": "gemini-2.0-flash", "provider": "google", "total_cost": 0.25,
         "cost_percentage": 100.0, "input_tokens": 100, "output_tokens": 50,
         "total_tokens": 150, "call_count": 5}
    ]
}"#;

const TOP_TRACES_BODY: &str = r#"{
    "traces": [
        {"trace_id": "t1", "name": "ResearchAgent_run", "total_tokens": 100,
         "total_cost": 0.2, "duration_ms": 1800.0, "llm_call_count": 3,
         "start_time": "2024-05-01T10:00:00", "project_name": "alpha", "status": "success"}
    ]
}"#;

fn json_mock(server: &mut ServerGuard, path: &str, body: &str) -> mockito::Mock {
    server
        .mock("GET", path)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
}

fn client_for(server: &ServerGuard) -> (AnalyticsQueryClient, Arc<HttpAnalyticsService>) {
    let config = ClientConfig::default().with_base_url(server.url());
    let service = Arc::new(HttpAnalyticsService::new(&config).unwrap());
    (
        AnalyticsQueryClient::new(service.clone(), TopTracesRequest::default()),
        service,
    )
}

#[tokio::test]
async fn test_snapshot_sends_identical_params_to_every_read() {
    let mut server = Server::new_async().await;

    let summary = server
        .mock("GET", "/analytics/summary")
        .match_query(Matcher::Exact("time_range=last_7d".to_string()))
        .with_header("content-type", "application/json")
        .with_body(SUMMARY_BODY)
        .expect(1)
        .create_async()
        .await;
    let trends = server
        .mock("GET", "/analytics/trends")
        .match_query(Matcher::Exact("time_range=last_7d".to_string()))
        .with_header("content-type", "application/json")
        .with_body(TRENDS_BODY)
        .expect(1)
        .create_async()
        .await;
    let models = server
        .mock("GET", "/analytics/models")
        .match_query(Matcher::Exact("time_range=last_7d".to_string()))
        .with_header("content-type", "application/json")
        .with_body(MODELS_BODY)
        .expect(1)
        .create_async()
        .await;
    let top = server
        .mock("GET", "/analytics/top-traces")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("time_range".into(), "last_7d".into()),
            Matcher::UrlEncoded("limit".into(), "10".into()),
            Matcher::UrlEncoded("sort_by".into(), "tokens".into()),
        ]))
        .with_header("content-type", "application/json")
        .with_body(TOP_TRACES_BODY)
        .expect(1)
        .create_async()
        .await;

    let (client, _) = client_for(&server);
    let filter = FilterState::default().with_time_range(TimeRange::Last7d);
    let snapshot = client.fetch_snapshot(&filter).await.unwrap();

    assert_eq!(snapshot.summary.total_traces, 3);
    assert_eq!(snapshot.granularity, Granularity::Day);
    assert_eq!(snapshot.trends.len(), 2);
    assert_eq!(snapshot.model_breakdown[0].model_name, "gemini-2.0-flash");
    assert_eq!(snapshot.top_traces[0].trace_id.as_str(), "t1");

    summary.assert_async().await;
    trends.assert_async().await;
    models.assert_async().await;
    top.assert_async().await;
}

#[tokio::test]
async fn test_custom_range_and_projects_are_encoded() {
    let mut server = Server::new_async().await;
    let expected = Matcher::AllOf(vec![
        Matcher::UrlEncoded("time_range".into(), "custom".into()),
        Matcher::UrlEncoded("start_date".into(), "2024-05-01T00:00:00.000Z".into()),
        Matcher::UrlEncoded("end_date".into(), "2024-05-10T00:00:00.000Z".into()),
        Matcher::UrlEncoded("project_ids".into(), "p1,p2".into()),
    ]);

    let summary = server
        .mock("GET", "/analytics/summary")
        .match_query(expected)
        .with_header("content-type", "application/json")
        .with_body(SUMMARY_BODY)
        .create_async()
        .await;
    json_mock(&mut server, "/analytics/trends", TRENDS_BODY)
        .create_async()
        .await;
    json_mock(&mut server, "/analytics/models", MODELS_BODY)
        .create_async()
        .await;
    json_mock(&mut server, "/analytics/top-traces", TOP_TRACES_BODY)
        .create_async()
        .await;

    let filter = FilterState::default()
        .with_time_range(TimeRange::Custom)
        .with_custom_range(
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()),
            Some(Utc.with_ymd_and_hms(2024, 5, 10, 0, 0, 0).unwrap()),
        )
        .unwrap()
        .with_projects([ProjectId::new("p2"), ProjectId::new("p1")]);

    let (client, _) = client_for(&server);
    client.fetch_snapshot(&filter).await.unwrap();
    summary.assert_async().await;
}

#[tokio::test]
async fn test_failed_read_fails_whole_snapshot() {
    let mut server = Server::new_async().await;
    json_mock(&mut server, "/analytics/summary", SUMMARY_BODY)
        .create_async()
        .await;
    server
        .mock("GET", "/analytics/trends")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;
    json_mock(&mut server, "/analytics/models", MODELS_BODY)
        .create_async()
        .await;
    json_mock(&mut server, "/analytics/top-traces", TOP_TRACES_BODY)
        .create_async()
        .await;

    let (client, _) = client_for(&server);
    let err = client
        .fetch_snapshot(&FilterState::default())
        .await
        .unwrap_err();

    match err {
        TraceboardError::PartialSnapshotFailure { endpoint, source } => {
            assert_eq!(endpoint, Endpoint::Trends);
            assert!(matches!(*source, TraceboardError::Network(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_trace_detail_not_found() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/traces/detail/missing-trace")
        .with_status(404)
        .with_body(r#"{"detail": "Trace not found"}"#)
        .create_async()
        .await;

    let (client, _) = client_for(&server);
    let err = client
        .trace_detail(&TraceId::new("missing-trace"))
        .await
        .unwrap_err();
    assert!(matches!(err, TraceboardError::TraceNotFound(id) if id == "missing-trace"));
}

#[tokio::test]
async fn test_projects_listing() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/projects")
        .with_header("content-type", "application/json")
        .with_body(
            r#"[{"id": "p1", "name": "alpha", "description": null, "is_active": true,
                 "created_at": "2024-04-01T09:00:00"}]"#,
        )
        .create_async()
        .await;

    let (client, _) = client_for(&server);
    let projects = client.projects().await.unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].id.as_str(), "p1");
    assert!(projects[0].created_at.is_some());
}

#[tokio::test]
async fn test_project_trace_listing_is_paged() {
    let mut server = Server::new_async().await;
    let listing = server
        .mock("GET", "/traces/p1")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("skip".into(), "20".into()),
            Matcher::UrlEncoded("limit".into(), "20".into()),
        ]))
        .with_header("content-type", "application/json")
        .with_body(
            r#"[{"id": "7f1c", "trace_id": "t1", "name": "ResearchAgent_run",
                 "status": "success", "start_time": "2024-05-01T10:00:00",
                 "end_time": "2024-05-01T10:00:02", "duration_ms": 1800.0,
                 "total_tokens": 100, "total_cost": 0.2, "meta": {}, "tags": ["prod"]}]"#,
        )
        .create_async()
        .await;

    let (client, _) = client_for(&server);
    let page = TracePage::new(0, 20).unwrap().next();
    let traces = client.traces(&ProjectId::new("p1"), page).await.unwrap();

    listing.assert_async().await;
    assert_eq!(traces.len(), 1);
    assert_eq!(traces[0].trace.trace_id.as_str(), "t1");
    assert_eq!(traces[0].trace.tags, vec!["prod".to_string()]);
}

#[tokio::test]
async fn test_trace_listing_server_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/traces/p1")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let (client, _) = client_for(&server);
    let err = client
        .traces(&ProjectId::new("p1"), TracePage::default())
        .await
        .unwrap_err();
    assert!(matches!(err, TraceboardError::Network(_)));
}

#[tokio::test]
async fn test_csv_export_reimports_summary_totals() {
    let csv = "Analytics Summary\r\nMetric,Value\r\nTotal Traces,3\r\nTotal Tokens,150\r\n\
               Total Cost ($),0.25\r\n\r\nTop Traces\r\nTrace ID,Name\r\nt1,ResearchAgent_run\r\n";

    let mut server = Server::new_async().await;
    let export = server
        .mock("GET", "/analytics/export")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("time_range".into(), "last_30d".into()),
            Matcher::UrlEncoded("format".into(), "csv".into()),
        ]))
        .with_header("content-type", "text/csv")
        .with_body(csv)
        .create_async()
        .await;
    json_mock(&mut server, "/analytics/summary", SUMMARY_BODY)
        .create_async()
        .await;

    let (_, service) = client_for(&server);
    let exporter = Exporter::new(service.clone());
    let filter = FilterState::default().with_time_range(TimeRange::Last30d);
    let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();

    let file = exporter
        .export_dated(&filter, ExportFormat::Csv, date)
        .await
        .unwrap();
    export.assert_async().await;
    assert_eq!(file.file_name, "analytics-2024-05-10.csv");

    let contents = file.summary().unwrap();
    let params = traceboard_core::QueryParams::from_filter(&filter).unwrap();
    let live = traceboard_core::AnalyticsService::summary(service.as_ref(), &params)
        .await
        .unwrap();
    assert_eq!(contents.summary.total_traces, live.total_traces);
    assert_eq!(contents.summary.total_tokens, live.total_tokens);
    assert_eq!(contents.summary.total_cost, live.total_cost);
    assert_eq!(contents.trace_rows, 1);
}

#[tokio::test]
async fn test_export_failure_is_wrapped() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/analytics/export")
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let (_, service) = client_for(&server);
    let err = Exporter::new(service)
        .export(&FilterState::default(), ExportFormat::Json)
        .await
        .unwrap_err();
    assert!(matches!(err, TraceboardError::ExportFailure(_)));
}
