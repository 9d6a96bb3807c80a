//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the Axum router: fixed routes first, the static chain as fallback
//! - Wire up middleware (request id, tracing, security headers, compression)
//! - Serve on a bound listener until the shutdown broadcast fires

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderValue, Request},
    middleware,
    response::Response,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    compression::{
        predicate::{NotForContentType, Predicate, SizeAbove},
        CompressionLayer,
    },
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::schema::ServerConfig;
use crate::health;
use crate::http::debug;
use crate::http::response::NO_CACHE;
use crate::lifecycle::StartupError;
use crate::observability::logging::RequestSpan;
use crate::routing::HandlerChain;
use crate::security::{security_headers_middleware, SecurityHeaders};
use crate::service_worker::{script, SwrPatterns};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub chain: Arc<HandlerChain>,
    pub security: Arc<SecurityHeaders>,
    pub dataset_dir: Arc<PathBuf>,
    pub service_worker_script: Bytes,
}

/// HTTP server for the dashboard.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Build every stage, header and script up front. Nothing here is
    /// recomputed per request.
    pub fn new(config: ServerConfig) -> Result<Self, StartupError> {
        let security = Arc::new(SecurityHeaders::from_config(&config.security)?);
        let chain = Arc::new(HandlerChain::from_config(&config.paths)?);
        let patterns = SwrPatterns::new(&config.paths.dataset_prefix)?;
        let service_worker_script =
            Bytes::from(script::render(&config.service_worker.cache_name, &patterns));

        tracing::debug!(stages = ?chain.stage_names(), "Handler chain built");

        let state = AppState {
            chain,
            security,
            dataset_dir: Arc::new(config.paths.resolved_dataset_dir()),
            service_worker_script,
        };

        Ok(Self {
            router: Self::build_router(&config, state),
        })
    }

    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        let mut router = Router::new().route("/healthz", get(health::liveness));

        if config.debug.enabled {
            router = router
                .route("/__csp", get(debug::csp_echo))
                .route("/__ls", get(debug::list_dataset));
        }
        if config.service_worker.enabled {
            router = router.route(&config.service_worker.path, get(serve_service_worker));
        }

        let security = state.security.clone();
        let router = router.fallback(static_handler).with_state(state);

        let router = if config.compression.enabled {
            let predicate = SizeAbove::new(config.compression.threshold_bytes)
                .and(NotForContentType::GRPC)
                .and(NotForContentType::IMAGES)
                .and(NotForContentType::SSE);
            router.layer(CompressionLayer::new().compress_when(predicate))
        } else {
            router
        };

        router
            .layer(middleware::from_fn_with_state(
                security,
                security_headers_middleware,
            ))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(RequestSpan {
                        trust_proxy: config.security.trust_proxy,
                    })
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            )
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown requested, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Everything without a fixed route goes through the static chain.
async fn static_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.chain.handle(request).await
}

async fn serve_service_worker(State(state): State<AppState>) -> Response {
    let mut response = Response::new(Body::from(state.service_worker_script.clone()));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/javascript; charset=utf-8"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_CACHE));
    headers.insert("service-worker-allowed", HeaderValue::from_static("/"));
    response
}
