use crate::pipeline::{PipelineOutcome, PublicationPipeline};
use anyhow::Result;
use listing_pulse_core::AppConfig;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

pub struct PublicationScheduler {
    config: AppConfig,
    pipeline: Arc<PublicationPipeline>,
}

impl PublicationScheduler {
    /// Creates a new publication scheduler.
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        let pipeline = Arc::new(PublicationPipeline::new(config.clone()));
        Self { config, pipeline }
    }

    /// Starts the scheduler and runs according to the cron schedule.
    ///
    /// # Errors
    /// Returns an error if the scheduler fails to start or if job
    /// scheduling fails.
    pub async fn start(self) -> Result<()> {
        if !self.config.scheduler.enabled {
            info!("publication scheduler is disabled");
            return Ok(());
        }

        info!(
            "starting publication scheduler with cron: {}",
            self.config.scheduler.cron_schedule
        );

        let scheduler = JobScheduler::new().await?;
        let pipeline = self.pipeline.clone();
        let cron_schedule = self.config.scheduler.cron_schedule.clone();

        let job = Job::new_async(cron_schedule.as_str(), move |_uuid, _lock| {
            let pipeline = pipeline.clone();
            Box::pin(async move {
                match pipeline.run_once().await {
                    Ok(PipelineOutcome::NoData) => {
                        info!("scheduled run found no price-change data");
                    }
                    Ok(PipelineOutcome::Published(delivery)) => {
                        info!(
                            delivered = delivery.delivered_count(),
                            failed = delivery.failed_count(),
                            "scheduled publication completed"
                        );
                    }
                    Err(e) => error!("scheduled publication failed: {e:#}"),
                }
            })
        })?;

        scheduler.add(job).await?;
        scheduler.start().await?;

        info!("publication scheduler started successfully");

        // Keep scheduler running
        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(60)).await;
        }
    }

    /// Runs the publication once (manual execution).
    ///
    /// # Errors
    /// Returns an error if the pipeline run fails.
    pub async fn run_once(&self) -> Result<PipelineOutcome> {
        self.pipeline.run_once().await
    }
}
