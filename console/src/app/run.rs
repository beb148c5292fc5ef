//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::app::options::{AppOptions, LifecycleOptions};
use crate::app::state::AppState;
use crate::dashboard::{DashboardFeed, DashboardPoller};
use crate::errors::DashboardError;
use crate::server::serve::serve;
use crate::server::state::ServerState;

/// Run the console until `shutdown_signal` resolves
pub async fn run(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), DashboardError> {
    info!("Initializing fingerdoor console...");

    // Create shutdown channel
    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager = ShutdownManager::new(shutdown_tx.clone(), options.lifecycle.clone());

    if let Err(e) = init(&options, &shutdown_tx, &mut shutdown_manager).await {
        error!("Failed to start console: {}", e);
        shutdown_manager.shutdown().await?;
        return Err(e);
    }

    shutdown_signal.await;
    info!("Shutdown signal received, shutting down...");

    drop(shutdown_tx);
    shutdown_manager.shutdown().await
}

// =============================== INITIALIZATION ================================== //

async fn init(
    options: &AppOptions,
    shutdown_tx: &broadcast::Sender<()>,
    shutdown_manager: &mut ShutdownManager,
) -> Result<(), DashboardError> {
    let app_state = Arc::new(AppState::init(options).await?);
    shutdown_manager.with_app_state(app_state.clone())?;

    let dashboard = init_dashboard_poller(options, &app_state);
    let snapshots = dashboard.snapshots();
    shutdown_manager.with_dashboard_poller(dashboard)?;

    if options.enable_server {
        init_socket_server(
            options,
            ServerState::new(&app_state, snapshots),
            shutdown_manager,
            shutdown_tx.subscribe(),
        )
        .await?;
    }

    Ok(())
}

fn init_dashboard_poller(options: &AppOptions, app_state: &AppState) -> DashboardPoller {
    info!("Initializing dashboard poller...");
    let feed: Arc<dyn DashboardFeed> = app_state.http_client.clone();
    DashboardPoller::start(options.dashboard.clone(), app_state.door.clone(), feed)
}

async fn init_socket_server(
    options: &AppOptions,
    server_state: ServerState,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DashboardError> {
    info!("Initializing local HTTP server...");

    let server_handle = serve(&options.server, Arc::new(server_state), async move {
        let _ = shutdown_rx.recv().await;
    })
    .await?;

    shutdown_manager.with_socket_server_handle(server_handle)?;
    Ok(())
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    lifecycle_options: LifecycleOptions,
    app_state: Option<Arc<AppState>>,
    dashboard_poller: Option<DashboardPoller>,
    socket_server_handle: Option<JoinHandle<Result<(), DashboardError>>>,
}

impl ShutdownManager {
    pub fn new(shutdown_tx: broadcast::Sender<()>, lifecycle_options: LifecycleOptions) -> Self {
        Self {
            shutdown_tx,
            lifecycle_options,
            app_state: None,
            dashboard_poller: None,
            socket_server_handle: None,
        }
    }

    pub fn with_app_state(&mut self, state: Arc<AppState>) -> Result<(), DashboardError> {
        if self.app_state.is_some() {
            return Err(DashboardError::Shutdown("app_state already set".to_string()));
        }
        self.app_state = Some(state);
        Ok(())
    }

    pub fn with_dashboard_poller(&mut self, poller: DashboardPoller) -> Result<(), DashboardError> {
        if self.dashboard_poller.is_some() {
            return Err(DashboardError::Shutdown("dashboard_poller already set".to_string()));
        }
        self.dashboard_poller = Some(poller);
        Ok(())
    }

    pub fn with_socket_server_handle(
        &mut self,
        handle: JoinHandle<Result<(), DashboardError>>,
    ) -> Result<(), DashboardError> {
        if self.socket_server_handle.is_some() {
            return Err(DashboardError::Shutdown("server_handle already set".to_string()));
        }
        self.socket_server_handle = Some(handle);
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), DashboardError> {
        let _ = self.shutdown_tx.send(());

        match tokio::time::timeout(
            self.lifecycle_options.max_shutdown_delay,
            self.shutdown_impl(),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Shutdown timed out after {:?}, forcing shutdown...",
                    self.lifecycle_options.max_shutdown_delay
                );
                std::process::exit(1);
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), DashboardError> {
        info!("Shutting down fingerdoor console...");

        // 1. Dashboard poller
        if let Some(mut poller) = self.dashboard_poller.take() {
            poller.stop().await?;
        }

        // 2. Socket server
        if let Some(handle) = self.socket_server_handle.take() {
            handle.await.map_err(|e| DashboardError::Shutdown(e.to_string()))??;
        }

        // 3. Enrollments and door timer
        if let Some(app_state) = self.app_state.take() {
            app_state.shutdown().await?;
        }

        info!("Shutdown complete");
        Ok(())
    }
}
