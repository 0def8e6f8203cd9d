//! Builds the service components from configuration and runs the
//! periodic email queue drain.

use std::{sync::Arc, time::Duration};

use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use halyard_common::{
    Signal,
    config::{HalyardConfig, StoreKind},
    report::{ErrorReporter, NoopReporter, WebhookReporter},
};
use halyard_ingest::{DirectoryService, PositionsService};
use halyard_mail::{Mailer, SmtpRelay};
use halyard_store::{DocumentStore, FileStore, MemoryStore};

/// The assembled halyard service.
pub struct Controller {
    config: HalyardConfig,
    mailer: Mailer,
    directory: DirectoryService,
    positions: PositionsService,
}

impl Controller {
    /// Wire up the store, reporter, transport, and workflow services.
    pub fn build(config: HalyardConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn DocumentStore> = match config.store.kind {
            StoreKind::Memory => Arc::new(MemoryStore::new()),
            StoreKind::File => Arc::new(FileStore::open(&config.store.root)?),
        };

        let reporter: Arc<dyn ErrorReporter> = match &config.reporter.webhook_url {
            Some(url) => Arc::new(WebhookReporter::new(
                url.clone(),
                config.reporter.app_name.clone(),
            )),
            None => Arc::new(NoopReporter),
        };

        let transport = Arc::new(SmtpRelay::new(config.hello_name.clone()));

        let mailer = Mailer::new(Arc::clone(&store), transport, Arc::clone(&reporter));
        let directory = DirectoryService::new(Arc::clone(&store), Arc::clone(&reporter));
        let positions = PositionsService::new(store, reporter);

        Ok(Self {
            config,
            mailer,
            directory,
            positions,
        })
    }

    pub const fn mailer(&self) -> &Mailer {
        &self.mailer
    }

    pub const fn directory(&self) -> &DirectoryService {
        &self.directory
    }

    pub const fn positions(&self) -> &PositionsService {
        &self.positions
    }

    /// Run the periodic queue drain until a shutdown signal arrives.
    ///
    /// Each tick re-reads `queue_processing_status`, so the drain can be
    /// paused and resumed at runtime through the settings document. A
    /// drain in flight when shutdown arrives is allowed to finish.
    pub async fn serve(&self, mut shutdown: broadcast::Receiver<Signal>) -> anyhow::Result<()> {
        info!(
            interval_secs = self.config.service.drain_interval_secs,
            "queue drain service starting"
        );

        let mut drain_timer = tokio::time::interval(Duration::from_secs(
            self.config.service.drain_interval_secs.max(1),
        ));
        // Skip the immediate first tick
        drain_timer.tick().await;

        loop {
            tokio::select! {
                _ = drain_timer.tick() => {
                    self.drain_once().await;
                }
                sig = shutdown.recv() => {
                    match sig {
                        Ok(Signal::Shutdown) => {
                            info!("queue drain service received shutdown signal");
                            break;
                        }
                        Err(e) => {
                            error!(error = %e, "shutdown channel error");
                            break;
                        }
                    }
                }
            }
        }

        info!("queue drain service stopped");
        Ok(())
    }

    /// One gated drain pass.
    async fn drain_once(&self) {
        match self.mailer.queue_processing_status().await {
            Ok(true) => match self.mailer.process_queue().await {
                Ok(report) if report.is_err() => {
                    warn!(
                        in_queue = report.in_queue,
                        sent = report.sent,
                        failed = report.failures.len(),
                        "queue drained with failures"
                    );
                }
                Ok(report) => {
                    debug!(in_queue = report.in_queue, sent = report.sent, "queue drained");
                }
                Err(e) => {
                    error!(error = %e, "queue drain failed");
                }
            },
            Ok(false) => {
                debug!("queue processing is disabled, skipping drain");
            }
            Err(e) => {
                error!(error = %e, "could not read queue processing status");
            }
        }
    }
}
