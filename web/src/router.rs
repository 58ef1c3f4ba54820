use crate::controller::{events_controller, health_check_controller};
use crate::stream;
use crate::AppState;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use log::*;
use tower_http::cors::{AllowOrigin, CorsLayer};

use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Pulse Relay API"
        ),
        paths(
            events_controller::create,
            health_check_controller::health_check,
        ),
        tags(
            (name = "pulse_relay", description = "Realtime Event-Fanout Relay API")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    let cors = cors_layer(&app_state);

    Router::new()
        .merge(event_routes(app_state.clone()))
        .merge(stream_routes(app_state))
        .merge(health_routes())
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
        .layer(cors)
}

// Ingestion surface for the origin application. Deliberately
// unauthenticated: it must only be reachable from the trusted internal
// network, never from the public internet.
fn event_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/events/:event_type", post(events_controller::create))
        .with_state(app_state)
}

fn stream_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/stream", get(stream::handler::stream_handler))
        .with_state(app_state)
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn cors_layer(app_state: &AppState) -> CorsLayer {
    let origins: Vec<HeaderValue> = app_state
        .config()
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring unparseable allowed origin {origin}: {e}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use clap::Parser;
    use fanout::Manager;
    use service::config::Config;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_app_state() -> AppState {
        let config = Config::parse_from(["pulse_relay_rs"]);
        AppState::new(service::AppState::new(config), Arc::new(Manager::new()))
    }

    #[tokio::test]
    async fn test_health_endpoint_responds_ok() -> anyhow::Result<()> {
        let app = define_routes(test_app_state());

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty())?)
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        assert_eq!(&body[..], b"healthy");
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() -> anyhow::Result<()> {
        let app = define_routes(test_app_state());

        let response = app
            .oneshot(Request::builder().uri("/events").body(Body::empty())?)
            .await?;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        Ok(())
    }
}
