//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{Router, routing::get};
use kairo_shared::time::{Clock, SystemClock};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::{
    config::ServerConfig,
    domain::{BroadcastTarget, ResourceCounter},
    infrastructure::InMemoryResourceCounter,
    usecase::{
        ChatRoom, EchoUseCase, EndpointRegistries, LifecycleController, PubSubHub, PublisherTask,
        StatusUseCase, StreamUseCase,
    },
};

use super::{
    handler::{
        chat_handler, echo_handler, get_status, health_check, pubsub_handler, realtime_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

pub type ServerError = Box<dyn std::error::Error + Send + Sync>;

/// Build the router for the given state
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket エンドポイント
        .route("/ws", get(echo_handler))
        .route("/ws/realtime", get(realtime_handler))
        .route("/ws/chat", get(chat_handler))
        .route("/pubsub", get(pubsub_handler))
        // HTTP エンドポイント
        .route("/api/health", get(health_check))
        .route("/api/status", get(get_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Real-time broadcast server
///
/// Owns the use cases behind each endpoint and the periodic publishers, which
/// are handed to the [`LifecycleController`] when the server starts serving.
///
/// # Example
///
/// ```ignore
/// let server = Server::from_config(&ServerConfig::default());
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    /// EchoUseCase（エコーチャネル）
    echo_usecase: Arc<EchoUseCase>,
    /// ChatRoom（チャットルーム）
    chat_room: Arc<ChatRoom>,
    /// StreamUseCase（リアルタイム配信の購読）
    stream_usecase: Arc<StreamUseCase>,
    /// PubSubHub（pub/sub イベント）
    pubsub_hub: Arc<PubSubHub>,
    /// StatusUseCase（ステータス取得）
    status_usecase: Arc<StatusUseCase>,
    /// Publishers started with the server
    publishers: Vec<PublisherTask>,
    lifecycle: Arc<LifecycleController>,
}

impl Server {
    pub fn new(
        echo_usecase: Arc<EchoUseCase>,
        chat_room: Arc<ChatRoom>,
        stream_usecase: Arc<StreamUseCase>,
        pubsub_hub: Arc<PubSubHub>,
        status_usecase: Arc<StatusUseCase>,
        publishers: Vec<PublisherTask>,
        lifecycle: Arc<LifecycleController>,
    ) -> Self {
        Self {
            echo_usecase,
            chat_room,
            stream_usecase,
            pubsub_hub,
            status_usecase,
            publishers,
            lifecycle,
        }
    }

    /// Wire every component with in-memory collaborators and the system clock
    pub fn from_config(config: &ServerConfig) -> Self {
        // Initialize dependencies in order:
        // 1. Registries and collaborators
        // 2. UseCases
        // 3. Publishers
        // 4. Server

        // 1. Registries and collaborators
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let registries = EndpointRegistries::new();
        let resources: Arc<dyn ResourceCounter> = Arc::new(InMemoryResourceCounter::default());

        // 2. UseCases
        let status_usecase = Arc::new(StatusUseCase::new(
            registries.clone(),
            resources,
            clock.clone(),
        ));
        let echo_usecase = Arc::new(EchoUseCase::new(registries.echo.clone(), clock.clone()));
        let chat_room = Arc::new(ChatRoom::new(registries.chat.clone(), clock.clone()));
        let stream_usecase = Arc::new(StreamUseCase::new(
            registries.realtime.clone(),
            clock.clone(),
        ));
        let pubsub_hub = Arc::new(PubSubHub::new(
            registries.pubsub.clone(),
            status_usecase.clone(),
            clock.clone(),
        ));

        // 3. Publishers fan out to realtime subscribers and pub/sub subscribers
        let targets: Vec<Arc<dyn BroadcastTarget>> =
            vec![registries.realtime.clone(), pubsub_hub.clone()];
        let publishers = vec![
            PublisherTask::system_stats(config.fast_interval, targets.clone(), clock.clone()),
            PublisherTask::sensor_data(config.slow_interval, targets, clock),
        ];

        // 4. Server
        Self::new(
            echo_usecase,
            chat_room,
            stream_usecase,
            pubsub_hub,
            status_usecase,
            publishers,
            Arc::new(LifecycleController::new()),
        )
    }

    /// Run the server until Ctrl+C or SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), ServerError> {
        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `signal` resolves
    ///
    /// Publishers are started before the first connection is accepted and are
    /// cancelled and joined after the listener stops, even when serving failed.
    pub async fn serve<F>(self, listener: TcpListener, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let closing = CancellationToken::new();
        let app_state = Arc::new(AppState {
            echo_usecase: self.echo_usecase,
            chat_room: self.chat_room,
            stream_usecase: self.stream_usecase,
            pubsub_hub: self.pubsub_hub,
            status_usecase: self.status_usecase,
            closing: closing.clone(),
        });
        let app = router(app_state);

        tracing::info!("Real-time server listening on {}", listener.local_addr()?);

        self.lifecycle.startup(self.publishers).await?;

        // Open sockets are closed as soon as the signal fires
        let graceful = async move {
            signal.await;
            closing.cancel();
        };
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(graceful)
            .await;

        let report = self.lifecycle.shutdown().await?;
        for (name, reason) in &report.failed {
            tracing::warn!("Publisher '{}' terminated abnormally: {}", name, reason);
        }
        tracing::info!("Stopped publishers: {:?}", report.stopped);

        served?;
        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
