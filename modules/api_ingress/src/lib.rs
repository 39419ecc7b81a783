//! HTTP host: wraps feature routes in the shared middleware stack and serves them.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit, http::StatusCode, middleware::from_fn, routing::get, Extension,
    Router,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

mod config;
pub mod request_id;
mod web;

pub use config::{ApiIngressConfig, DEFAULT_BODY_LIMIT_BYTES};

/// Used when `server.timeout_sec` is 0.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Owns the router shape and the server loop.
#[derive(Debug, Clone)]
pub struct ApiIngress {
    config: ApiIngressConfig,
    request_timeout: Duration,
    shutdown: CancellationToken,
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig, timeout_sec: u64, shutdown: CancellationToken) -> Self {
        let request_timeout = if timeout_sec == 0 {
            DEFAULT_REQUEST_TIMEOUT
        } else {
            Duration::from_secs(timeout_sec)
        };
        Self {
            config,
            request_timeout,
            shutdown,
        }
    }

    pub fn config(&self) -> &ApiIngressConfig {
        &self.config
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Add host routes to `routes` and wrap everything in the middleware stack.
    ///
    /// `openapi` is published at `/openapi.json` only when `enable_docs` is set.
    pub fn build_router(
        &self,
        routes: Router,
        openapi: Option<utoipa::openapi::OpenApi>,
    ) -> Result<Router> {
        let mut router = routes.route("/health", get(web::health_check));

        if self.config.enable_docs {
            if let Some(doc) = openapi {
                let value = serde_json::to_value(&doc).context("failed to render OpenAPI")?;
                router = router.route("/openapi.json", get(web::openapi_json(Arc::new(value))));
                tracing::info!("OpenAPI document served at /openapi.json");
            }
        }

        // Layers are added innermost first. Resulting order, outermost to innermost:
        // SetRequestId -> PropagateRequestId -> push_req_id_to_extensions -> Trace
        //   -> CatchPanic -> transport error envelopes -> Timeout -> CORS -> BodyLimit
        //   -> shutdown token
        router = router.layer(Extension(self.shutdown.clone()));
        // RequestBodyLimitLayer replaces axum's built-in 2 MB cap.
        router = router.layer(DefaultBodyLimit::disable());
        router = router.layer(RequestBodyLimitLayer::new(self.config.body_limit_bytes));
        if self.config.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }
        router = router.layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            self.request_timeout,
        ));
        router = router.layer(from_fn(modkit::api::translate_transport_errors));
        router = router.layer(CatchPanicLayer::custom(modkit::api::handle_panic));
        router = router.layer(request_id::create_trace_layer());
        router = router.layer(from_fn(request_id::push_req_id_to_extensions));

        let x_request_id = request_id::header();
        router = router.layer(PropagateRequestIdLayer::new(x_request_id.clone()));
        router = router.layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId));

        Ok(router)
    }

    pub async fn bind(host: &str, port: u16) -> Result<TcpListener> {
        let listener = TcpListener::bind((host, port))
            .await
            .with_context(|| format!("failed to bind {host}:{port}"))?;
        Ok(listener)
    }

    /// Serve until the shutdown token is cancelled, then drain in-flight requests.
    pub async fn serve(&self, listener: TcpListener, router: Router) -> Result<()> {
        let addr: SocketAddr = listener.local_addr()?;
        tracing::info!(%addr, "HTTP server listening");

        let shutdown = {
            let token = self.shutdown.clone();
            async move {
                token.cancelled().await;
                tracing::info!("HTTP server shutting down gracefully");
            }
        };

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP server failed")
    }
}
