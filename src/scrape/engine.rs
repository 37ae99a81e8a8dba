//! Scrape orchestration: one browser session per job, seeds in order,
//! pagination per seed, aggregated result.

use std::sync::Arc;
use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use tracing::{info, warn};

use super::admission::Admission;
use super::error::ScrapeError;
use super::job::{Job, JobRequest};
use super::page::{scrape_page, VisitOptions};
use super::pagination::{paginate, PaginationStop};
use super::types::{ExtractedItem, JobResult, ResultItem};
use crate::browser::{PageDriver, SessionLauncher};

/// Runs scrape jobs against browser sessions from a [`SessionLauncher`].
#[derive(Clone)]
pub struct ScrapeEngine {
    launcher: Arc<dyn SessionLauncher>,
    visit: VisitOptions,
    admission: Option<Admission>,
}

impl ScrapeEngine {
    pub fn new(launcher: Arc<dyn SessionLauncher>, visit: VisitOptions) -> Self {
        Self {
            launcher,
            visit,
            admission: None,
        }
    }

    /// Gate jobs behind `admission`. Without it every job runs immediately.
    pub fn with_admission(mut self, admission: Admission) -> Self {
        self.admission = Some(admission);
        self
    }

    /// Validate `request`, wait for a job slot, then run it.
    pub async fn run(&self, request: JobRequest) -> Result<JobResult, ScrapeError> {
        let job = request.validate()?;
        let _permit = match &self.admission {
            Some(admission) => Some(admission.admit().await?),
            None => None,
        };
        self.run_job(&job).await
    }

    /// Run an already validated job.
    pub async fn run_job(&self, job: &Job) -> Result<JobResult, ScrapeError> {
        let started = Instant::now();
        info!(
            "Starting job source={} type={} urls={:?}",
            job.source,
            job.kind.as_deref().unwrap_or("-"),
            job.urls
        );

        let mut session = self
            .launcher
            .acquire()
            .await
            .map_err(ScrapeError::Orchestration)?;

        let page = session.page();
        let items = self.collect(page, job).await;

        // Released on every path past acquisition; collect never fails
        session.release().await;

        let execution_time = started.elapsed().as_secs_f64();
        info!(
            "Job {} finished: {} items in {:.2}s",
            job.source,
            items.len(),
            execution_time
        );

        Ok(JobResult {
            source: job.source.clone(),
            kind: job.kind.clone(),
            count: items.len(),
            items,
            execution_time,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        })
    }

    async fn collect(&self, page: &dyn PageDriver, job: &Job) -> Vec<ResultItem> {
        let mut items: Vec<ResultItem> = Vec::new();

        for url in &job.urls {
            info!("Processing {}", url);
            match scrape_page(page, url, &job.selectors, &self.visit).await {
                Ok(found) => {
                    info!("Extracted {} items from {}", found.len(), url);
                    tag_into(&mut items, found, job, url);
                }
                Err(e) => {
                    warn!("Skipping {}: {}", url, e);
                    continue;
                }
            }

            if let Some(rule) = job.active_pagination() {
                let summary = paginate(
                    page,
                    url,
                    rule,
                    job.min_items,
                    &job.selectors,
                    &self.visit,
                    |page_url, found| {
                        tag_into(&mut items, found, job, page_url);
                        items.len()
                    },
                )
                .await;
                if summary.stop == PaginationStop::MinItems {
                    info!("Minimum of {:?} items reached after {}", job.min_items, url);
                }
            }
        }

        items
    }
}

fn tag_into(items: &mut Vec<ResultItem>, found: Vec<ExtractedItem>, job: &Job, url: &str) {
    items.extend(
        found
            .into_iter()
            .map(|item| ResultItem::new(item, &job.source, job.kind.as_deref(), url)),
    );
}
