//! HTTP-оболочка: каждый запрос заново считает дашборд для запрошенного диапазона.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Deserializer};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::constants::DATE_FORMAT;
use crate::dashboard::build_view;
use crate::error::Result;
use crate::filter::DateRange;
use crate::rental::{RentalRecord, date_bounds};
use crate::report::{PageOptions, render_dashboard, render_error_page};

/// Неизменяемое состояние, общее для всех запросов.
#[derive(Clone)]
pub struct AppState {
    records: Arc<Vec<RentalRecord>>,
    bounds: Option<DateRange>,
    minify_html: bool,
}

impl AppState {
    pub fn new(records: Vec<RentalRecord>, minify_html: bool) -> Self {
        let bounds = date_bounds(&records);
        Self {
            records: Arc::new(records),
            bounds,
            minify_html,
        }
    }

    /// Подставляет недостающие границы из данных; для пустой таблицы берётся сегодняшний день.
    fn resolve_range(&self, query: &RangeQuery) -> DateRange {
        let defaults = self.bounds.unwrap_or_else(|| {
            let today = Local::now().date_naive();
            DateRange::new(today, today)
        });
        DateRange::new(
            query.start.unwrap_or(defaults.start),
            query.end.unwrap_or(defaults.end),
        )
    }
}

/// Очищенное поле даты приходит пустой строкой и считается отсутствующей границей.
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    #[serde(default, deserialize_with = "blank_as_none")]
    start: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_as_none")]
    end: Option<NaiveDate>,
}

fn blank_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, DATE_FORMAT)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: AppState, bind: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(bind).await?;
    info!("Dashboard running on http://{bind}");
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server shutdown gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Failed to listen for shutdown signal");
    }
}

async fn dashboard(State(state): State<AppState>, Query(query): Query<RangeQuery>) -> Response {
    let range = state.resolve_range(&query);
    match build_view(&state.records, range) {
        Ok(view) => {
            debug!(days = view.summary.days, empty = view.is_empty(), "Rendering dashboard");
            let options = PageOptions {
                bounds: state.bounds,
                interactive: true,
                minify_html: state.minify_html,
            };
            Html(render_dashboard(&view, &options)).into_response()
        }
        Err(err) => {
            error!(status = "err", error = %err, "Failed to build dashboard");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(render_error_page(&err.to_string(), state.minify_html)),
            )
                .into_response()
        }
    }
}

async fn health_check() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rental::tests::record;
    use axum_test::TestServer;

    fn state(records: Vec<RentalRecord>) -> AppState {
        AppState::new(records, false)
    }

    fn sample() -> Vec<RentalRecord> {
        vec![
            record((2011, 1, 1), 1, false, false, 331, 654),
            record((2011, 1, 2), 2, false, false, 131, 670),
            record((2011, 2, 1), 3, false, true, 120, 1000),
        ]
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = TestServer::new(create_router(state(sample()))).unwrap();

        let response = server.get("/health").await;

        response.assert_status(StatusCode::OK);
        response.assert_text("ok");
    }

    #[tokio::test]
    async fn test_dashboard_defaults_to_dataset_bounds() {
        let server = TestServer::new(create_router(state(sample()))).unwrap();

        let response = server.get("/").await;

        response.assert_status(StatusCode::OK);
        let body = response.text();
        assert!(body.contains("value=\"2011-01-01\""));
        assert!(body.contains("value=\"2011-02-01\""));
        assert!(!body.contains("No data for the selected range"));
    }

    #[tokio::test]
    async fn test_dashboard_with_inverted_range_is_empty() {
        let server = TestServer::new(create_router(state(sample()))).unwrap();

        let response = server
            .get("/")
            .add_query_param("start", "2011-02-01")
            .add_query_param("end", "2011-01-01")
            .await;

        response.assert_status(StatusCode::OK);
        assert_eq!(
            response
                .text()
                .matches("No data for the selected range")
                .count(),
            5
        );
    }

    #[tokio::test]
    async fn test_dashboard_rejects_malformed_date() {
        let server = TestServer::new(create_router(state(sample()))).unwrap();

        let response = server
            .get("/")
            .add_query_param("start", "first of may")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_cleared_date_picker_falls_back_to_bound() {
        let server = TestServer::new(create_router(state(sample()))).unwrap();

        let response = server.get("/?start=&end=2011-01-02").await;

        response.assert_status(StatusCode::OK);
        let body = response.text();
        assert!(body.contains("value=\"2011-01-01\""));
        assert!(body.contains("value=\"2011-01-02\""));
        assert!(!body.contains("No data for the selected range"));
    }

    #[tokio::test]
    async fn test_unknown_weather_code_is_server_error() {
        let mut records = sample();
        records.push(record((2011, 3, 1), 6, false, true, 1, 1));
        let server = TestServer::new(create_router(state(records))).unwrap();

        let response = server.get("/").await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.text().contains("Unknown weather code 6"));
    }

    #[test]
    fn test_resolve_range_partial_query() {
        let app = state(sample());
        let query = RangeQuery {
            start: NaiveDate::from_ymd_opt(2011, 1, 2),
            end: None,
        };

        let range = app.resolve_range(&query);

        assert_eq!(range.start, NaiveDate::from_ymd_opt(2011, 1, 2).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2011, 2, 1).unwrap());
    }
}
