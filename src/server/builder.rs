//! ServerBuilder: wires configuration, database, scheduler and router together

use super::context::AppContext;
use super::router::build_router;
use crate::config::AppConfig;
use crate::recurrence::{Scheduler, SchedulerHandle};
use crate::storage::Database;
use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;

/// Builder for the HTTP server
///
/// # Example
///
/// ```ignore
/// let config = AppConfig::load(Some(Path::new("expenses.yaml")))?;
/// ServerBuilder::new(config).serve().await?;
/// ```
pub struct ServerBuilder {
    config: AppConfig,
    database: Option<Database>,
}

impl ServerBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            database: None,
        }
    }

    async fn database(&mut self) -> Result<Database> {
        if let Some(db) = &self.database {
            return Ok(db.clone());
        }
        let db = Database::connect(
            &self.config.database.url,
            self.config.database.max_connections,
        )
        .await?;
        self.database = Some(db.clone());
        Ok(db)
    }

    /// Open the database and build the shared context
    pub async fn build_context(&mut self) -> Result<AppContext> {
        let db = self.database().await?;
        Ok(AppContext::new(&db, self.config.backup.exports_dir.clone()))
    }

    /// Build the router without starting the scheduler
    pub async fn build(mut self) -> Result<Router> {
        let ctx = self.build_context().await?;
        Ok(build_router(ctx, &self.config.static_dir))
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Open the database and apply the schema
    /// - Start the daily scheduler when enabled
    /// - Bind to the configured address and serve requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(mut self) -> Result<()> {
        let ctx = self.build_context().await?;
        let scheduler = self.start_scheduler(&ctx)?;

        let app = build_router(ctx, &self.config.static_dir);
        let addr = self.config.bind_address();
        let listener = TcpListener::bind(&addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        if let Some(handle) = scheduler {
            handle.shutdown();
        }
        if let Some(db) = &self.database {
            db.close().await;
        }

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    fn start_scheduler(&self, ctx: &AppContext) -> Result<Option<SchedulerHandle>> {
        let settings = &self.config.scheduler;
        if !settings.enabled {
            tracing::info!("scheduler disabled");
            return Ok(None);
        }

        let handle = Scheduler::new(ctx.engine.clone(), settings.run_at_time()?)
            .with_run_on_startup(settings.run_on_startup)
            .spawn();
        Ok(Some(handle))
    }
}

/// Resolve on Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
