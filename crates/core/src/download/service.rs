//! Download orchestrator.

use std::sync::Arc;

use audiodrop_shared::{ExtractorConfig, RequestId};
use tracing::{Instrument, debug, error, info, info_span, warn};

use super::error::DownloadError;
use super::types::{DownloadOutcome, DownloadPhase, DownloadRequest};
use crate::delivery::Delivery;
use crate::extraction::{ExtractOptions, Extractor};
use crate::workspace::{Workspace, WorkspaceManager};

/// Runs download requests end to end.
///
/// Holds only read-only handles, so one instance is shared by every request.
/// Each request gets its own workspace, which is released exactly once on
/// every exit path.
pub struct DownloadService {
    workspaces: WorkspaceManager,
    extractor: Arc<dyn Extractor>,
    extractor_config: ExtractorConfig,
    delivery: Delivery,
}

impl DownloadService {
    /// Create a new download service.
    #[must_use]
    pub fn new(
        workspaces: WorkspaceManager,
        extractor: Arc<dyn Extractor>,
        extractor_config: ExtractorConfig,
        delivery: Delivery,
    ) -> Self {
        Self {
            workspaces,
            extractor,
            extractor_config,
            delivery,
        }
    }

    /// Handle one download request.
    ///
    /// In link mode the workspace is gone by the time this returns. In stream
    /// mode it is owned by the returned stream and released when the stream
    /// ends or is dropped. If this future is dropped midway the workspace is
    /// released and the extractor process killed.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::Validation` for a blank URL, and the
    /// workspace, extraction, storage or stream-setup error that ended the
    /// request otherwise. Cleanup failures are logged only.
    pub async fn handle(
        &self,
        request_id: RequestId,
        request: DownloadRequest,
    ) -> Result<DownloadOutcome, DownloadError> {
        let span = info_span!(
            "download",
            request_id = %request_id,
            delivery = self.delivery.name(),
        );
        let mut phases = PhaseTracker::default();

        let result = self
            .run(&request, &mut phases)
            .instrument(span.clone())
            .await;

        span.in_scope(|| match &result {
            Ok(_) => {
                phases.advance(DownloadPhase::Completed);
                info!(url = %request.url, "Download completed");
            }
            Err(e) => {
                let failed_during = phases.current();
                phases.advance(DownloadPhase::Failed);
                if e.is_client_error() {
                    warn!(url = %request.url, error = %e, "Download rejected");
                } else {
                    error!(
                        url = %request.url,
                        failed_during = %failed_during,
                        error = %e,
                        "Download failed"
                    );
                }
            }
        });

        result
    }

    async fn run(
        &self,
        request: &DownloadRequest,
        phases: &mut PhaseTracker,
    ) -> Result<DownloadOutcome, DownloadError> {
        phases.advance(DownloadPhase::Validating);
        let url = request.validate()?;

        phases.advance(DownloadPhase::Extracting);
        let mut workspace = self.workspaces.acquire().await?;
        let options = ExtractOptions::from_config(&self.extractor_config, workspace.path());

        let media = match self.extractor.extract(url, &options).await {
            Ok(media) => media,
            Err(e) => {
                release(&mut workspace).await;
                return Err(e.into());
            }
        };

        phases.advance(DownloadPhase::Delivering);
        match &self.delivery {
            Delivery::Link(strategy) => {
                let delivered = strategy.deliver(&media).await;
                release(&mut workspace).await;
                Ok(DownloadOutcome::Link(delivered?))
            }
            Delivery::Stream(strategy) => {
                let response = strategy
                    .deliver(&media, workspace)
                    .await
                    .map_err(DownloadError::StreamSetup)?;
                Ok(DownloadOutcome::Stream(response))
            }
        }
    }
}

/// Release a workspace, logging instead of failing.
async fn release(workspace: &mut Workspace) {
    if let Err(e) = workspace.release().await {
        warn!(error = %e, "Workspace cleanup failed");
    }
}

/// Current phase of one request, logged on every transition.
struct PhaseTracker {
    current: DownloadPhase,
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self {
            current: DownloadPhase::Received,
        }
    }
}

impl PhaseTracker {
    fn current(&self) -> DownloadPhase {
        self.current
    }

    fn advance(&mut self, next: DownloadPhase) {
        debug!(from = %self.current, phase = %next, "Download phase");
        self.current = next;
    }
}
