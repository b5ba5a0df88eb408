use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::canceller::OperationCanceller;
use crate::classify::{self, Disposition};
use crate::client::{OperationClient, ResultFetcher};
use crate::delay::{Delay, TokioDelay};
use crate::error::{RecordFault, SourcingError};
use crate::feedback::Feedback;
use crate::host::{ActivityTimer, Host};
use crate::ingest::ResultIngester;
use crate::job::JobCreator;
use crate::media::{MediaMaterializer, MediaResolver};
use crate::operation::{BulkOperation, OperationId, OperationStatus};
use crate::options::{SourcingOptions, StaleOperationPolicy};
use crate::poller::OperationPoller;
use crate::record::ContentNode;

const NO_DATA_MESSAGE: &str = "No data was returned for this operation";

/// Outcome of a run that reached `Done`.
#[derive(Debug, Default)]
pub struct RunReport {
    /// The operation whose results were ingested.
    pub operation_id: Option<OperationId>,
    pub emitted: u64,
    /// Result lines that could not be decoded.
    pub skipped: u64,
    /// Times the job was started again after an external cancellation.
    pub restarts: u32,
    pub feedback: Vec<Feedback>,
}

/// Where a run currently is.
enum Phase {
    Canceling,
    Starting { restarts: u32 },
    Polling { operation: BulkOperation, restarts: u32 },
    Ingesting(BulkOperation),
}

/// Runs one bulk export end to end: settle any stale job, start, poll,
/// download and decode the results, resolve media, and hand nodes to the host.
///
/// Run-level faults halt the run with a single fatal report. Record-level
/// faults are logged, collected in the [`RunReport`], and skipped.
pub struct SourcingOrchestrator {
    client: Arc<dyn OperationClient>,
    fetcher: Arc<dyn ResultFetcher>,
    host: Arc<dyn Host>,
    materializer: Option<Arc<dyn MediaMaterializer>>,
    delay: Arc<dyn Delay>,
    options: SourcingOptions,
}

impl SourcingOrchestrator {
    pub fn new(
        client: Arc<dyn OperationClient>,
        fetcher: Arc<dyn ResultFetcher>,
        host: Arc<dyn Host>,
        options: SourcingOptions,
    ) -> Self {
        Self {
            client,
            fetcher,
            host,
            materializer: None,
            delay: Arc::new(TokioDelay),
            options,
        }
    }

    pub fn with_materializer(mut self, materializer: Arc<dyn MediaMaterializer>) -> Self {
        self.materializer = Some(materializer);
        self
    }

    pub fn with_delay(mut self, delay: Arc<dyn Delay>) -> Self {
        self.delay = delay;
        self
    }

    pub fn options(&self) -> &SourcingOptions {
        &self.options
    }

    /// Run `job` to completion.
    ///
    /// On failure the classified [`crate::PluginError`] has already been
    /// handed to the host's reporter; the error is returned for the caller's
    /// exit status. Nodes emitted before the failure stay emitted.
    pub async fn source(&self, job: &dyn JobCreator) -> Result<RunReport, SourcingError> {
        let reporter = self.host.reporter();
        let mut timer = reporter.activity_timer(&format!("{} bulk operation", job.name()));
        timer.start();

        let mut report = RunReport::default();
        let outcome = self.drive(job, timer.as_mut(), &mut report).await;
        timer.end();

        match outcome {
            Ok(()) => {
                info!(
                    job = job.name(),
                    emitted = report.emitted,
                    skipped = report.skipped,
                    restarts = report.restarts,
                    "sourcing finished"
                );
                Ok(report)
            }
            Err(err) => {
                let plugin_error = classify::classify(&err);
                error!(job = job.name(), code = %plugin_error.code, error = %err, "sourcing failed");
                reporter.fatal(plugin_error);
                Err(err)
            }
        }
    }

    /// Poller configured from the run options.
    pub fn poller(&self) -> OperationPoller<'_> {
        OperationPoller::new(
            self.client.as_ref(),
            self.delay.as_ref(),
            self.options.poll_interval,
            self.options.max_poll_attempts,
        )
    }

    pub fn canceller(&self) -> OperationCanceller<'_> {
        OperationCanceller::new(self.client.as_ref(), self.poller())
    }

    async fn drive(
        &self,
        job: &dyn JobCreator,
        timer: &mut dyn ActivityTimer,
        report: &mut RunReport,
    ) -> Result<(), SourcingError> {
        let mut phase = Phase::Canceling;

        loop {
            phase = match phase {
                Phase::Canceling => {
                    let canceller = self.canceller();
                    match self.options.stale_operation {
                        StaleOperationPolicy::Cancel => {
                            canceller.ensure_no_operation_in_progress().await?
                        }
                        StaleOperationPolicy::AwaitFinish => {
                            canceller.await_operation_in_progress().await?
                        }
                    };
                    Phase::Starting { restarts: 0 }
                }

                Phase::Starting { restarts } => {
                    let operation = job.create(self.client.as_ref()).await?;
                    info!(job = job.name(), operation_id = %operation.id, restarts, "bulk operation started");
                    self.host
                        .cache_set(
                            &format!("last-bulk-operation:{}", job.name()),
                            Value::String(operation.id.to_string()),
                        )
                        .await?;
                    Phase::Polling {
                        operation,
                        restarts,
                    }
                }

                Phase::Polling {
                    operation,
                    restarts,
                } => {
                    let finished = self
                        .poller()
                        .await_completion(&operation.id, |status, object_count| {
                            timer.set_status(&progress_message(&operation.id, status, object_count));
                        })
                        .await?;

                    if finished.status == OperationStatus::Completed {
                        report.restarts = restarts;
                        Phase::Ingesting(finished)
                    } else {
                        let err = if finished.status == OperationStatus::Canceled {
                            SourcingError::OperationCanceledExternally {
                                id: operation.id.clone(),
                            }
                        } else {
                            SourcingError::OperationFailed {
                                id: operation.id.clone(),
                                error_code: finished.error_code,
                            }
                        };

                        match classify::disposition(&err) {
                            Disposition::Retry if restarts < self.options.max_cancel_retries => {
                                warn!(operation_id = %operation.id, restarts, "bulk operation canceled externally, starting again");
                                Phase::Starting {
                                    restarts: restarts + 1,
                                }
                            }
                            Disposition::Retry => {
                                return Err(SourcingError::RetryBudgetExceeded {
                                    last_id: operation.id,
                                    restarts,
                                });
                            }
                            Disposition::Halt => return Err(err),
                        }
                    }
                }

                Phase::Ingesting(operation) => {
                    self.ingest(job, &operation, report).await?;
                    return Ok(());
                }
            };
        }
    }

    async fn ingest(
        &self,
        job: &dyn JobCreator,
        operation: &BulkOperation,
        report: &mut RunReport,
    ) -> Result<(), SourcingError> {
        report.operation_id = Some(operation.id.clone());
        self.host
            .cache_set(
                &format!("last-completed-operation:{}", job.name()),
                Value::String(operation.id.to_string()),
            )
            .await?;

        let url = match operation.url.as_deref() {
            Some(url) if operation.object_count > 0 => url,
            _ => {
                self.host.reporter().info(NO_DATA_MESSAGE);
                report.feedback.push(Feedback::info(NO_DATA_MESSAGE));
                return Ok(());
            }
        };

        let resolver = MediaResolver::new(self.materializer.as_deref(), self.options.download_images);
        if self.options.download_images && !resolver.is_active() {
            warn!("image downloads requested but no media materializer is configured");
        }

        let mut records = ResultIngester::new(self.fetcher.as_ref()).ingest(url).await?;
        while let Some(decoded) = records.next_record().await? {
            let record = match decoded {
                Ok(record) => record,
                Err(err) => {
                    report.skipped += 1;
                    self.record_fault(report, err.into());
                    continue;
                }
            };

            let (record, media_errors) = resolver.resolve(record).await;
            for err in media_errors {
                self.record_fault(report, err.into());
            }

            let node = ContentNode::from_record(record, self.host.as_ref(), &self.options.type_prefix);
            self.host.create_node(node).await?;
            report.emitted += 1;
        }

        Ok(())
    }

    fn record_fault(&self, report: &mut RunReport, fault: RecordFault) {
        warn!(%fault, "record fault");
        self.host.reporter().warn(&fault.to_string());
        report.feedback.push(Feedback::from(&fault));
    }
}

fn progress_message(id: &OperationId, status: OperationStatus, object_count: u64) -> String {
    format!("Polling bulk operation: {id}\nStatus: {status}\nObject count: {object_count}")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::classify::PluginErrorCode;
    use crate::client::ClientError;
    use crate::job::QueryJob;
    use crate::options::Credentials;
    use crate::test_support::{
        ClientCall, FakeMaterializer, ImmediateDelay, RecordingHost, ScriptedClient,
        StaticResultFetcher,
    };

    use super::*;

    const RESULTS_URL: &str = "http://results.url";

    struct Fixture {
        client: Arc<ScriptedClient>,
        fetcher: Arc<StaticResultFetcher>,
        host: Arc<RecordingHost>,
        materializer: Arc<FakeMaterializer>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                client: Arc::new(ScriptedClient::new()),
                fetcher: Arc::new(StaticResultFetcher::new()),
                host: Arc::new(RecordingHost::new()),
                materializer: Arc::new(FakeMaterializer::returning("12345")),
            }
        }

        fn orchestrator(&self, options: SourcingOptions) -> SourcingOrchestrator {
            SourcingOrchestrator::new(
                self.client.clone(),
                self.fetcher.clone(),
                self.host.clone(),
                options,
            )
            .with_materializer(self.materializer.clone())
            .with_delay(Arc::new(ImmediateDelay::new()))
        }
    }

    fn options() -> SourcingOptions {
        SourcingOptions::new("my-shop.myshopify.com", Credentials::new(""))
            .with_poll_interval(Duration::from_millis(10))
            .with_max_poll_attempts(20)
    }

    fn job() -> QueryJob {
        QueryJob::new("products", "{ products { edges { node { id } } } }")
    }

    fn completed(count: u64) -> BulkOperation {
        BulkOperation::new("gid://shopify/BulkOperation/12345", OperationStatus::Completed)
            .with_object_count(count)
            .with_url(RESULTS_URL)
    }

    #[tokio::test]
    async fn reports_progress_and_emits_the_result() {
        let fx = Fixture::new();
        fx.client.push_current(Ok(Some(BulkOperation::new("old", OperationStatus::Completed))));
        fx.client.push_start(Ok(BulkOperation::new("54321", OperationStatus::Created)));
        fx.client.push_by_id(Ok(BulkOperation::new("", OperationStatus::Created)));
        fx.client.push_by_id(Ok(completed(1)));
        fx.fetcher.insert(RESULTS_URL, r#"{"id":"gid://shopify/Product/12345"}"#);

        let report = fx.orchestrator(options()).source(&job()).await.unwrap();

        let log = fx.host.log();
        assert!(log.statuses.contains(
            &"Polling bulk operation: 54321\nStatus: COMPLETED\nObject count: 1".to_owned()
        ));
        assert_eq!(log.timers_started, vec!["products bulk operation".to_owned()]);
        assert_eq!(log.timers_ended.len(), 1);

        let nodes = fx.host.nodes();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].shopify_id.as_str(), "gid://shopify/Product/12345");
        assert_eq!(report.emitted, 1);
        assert_eq!(fx.client.count(|c| matches!(c, ClientCall::Cancel(_))), 0);
    }

    #[tokio::test]
    async fn cancels_a_running_operation_before_starting() {
        let fx = Fixture::new();
        fx.client.push_current(Ok(Some(BulkOperation::new("stale", OperationStatus::Running))));
        fx.client.push_cancel(Ok(BulkOperation::new("stale", OperationStatus::Canceling)));
        fx.client.push_by_id(Ok(BulkOperation::new("stale", OperationStatus::Canceled)));
        fx.client.push_by_id(Ok(completed(1)));
        fx.client.push_start(Ok(BulkOperation::new("fresh", OperationStatus::Created)));
        fx.fetcher.insert(RESULTS_URL, r#"{"id":"gid://shopify/Product/12345"}"#);

        fx.orchestrator(options()).source(&job()).await.unwrap();

        let calls = fx.client.calls();
        let cancel_at = calls
            .iter()
            .position(|c| matches!(c, ClientCall::Cancel(_)))
            .unwrap();
        let start_at = calls
            .iter()
            .position(|c| matches!(c, ClientCall::Start(_)))
            .unwrap();
        assert!(cancel_at < start_at);
        assert_eq!(fx.client.count(|c| matches!(c, ClientCall::Cancel(_))), 1);
        assert_eq!(calls[cancel_at + 1], ClientCall::ById(OperationId::new("stale")));
        assert_eq!(fx.host.nodes().len(), 1);
    }

    #[tokio::test]
    async fn restarts_a_job_canceled_from_elsewhere() {
        let fx = Fixture::new();
        fx.client.push_start(Ok(BulkOperation::new("first", OperationStatus::Created)));
        fx.client.push_start(Ok(BulkOperation::new("second", OperationStatus::Created)));
        fx.client.push_by_id(Ok(BulkOperation::new("first", OperationStatus::Canceled)));
        fx.client.push_by_id(Ok(completed(1)));
        fx.fetcher.insert(RESULTS_URL, r#"{"id":"gid://shopify/Product/12345"}"#);

        let report = fx.orchestrator(options()).source(&job()).await.unwrap();

        assert_eq!(fx.client.count(|c| matches!(c, ClientCall::Start(_))), 2);
        assert_eq!(
            fx.client.count(|c| c == &ClientCall::ById(OperationId::new("second"))),
            1
        );
        assert_eq!(report.restarts, 1);
        assert_eq!(fx.host.nodes().len(), 1);
        assert!(fx.host.log().fatals.is_empty());
    }

    #[tokio::test]
    async fn failed_operation_is_fatal_with_default_code() {
        let fx = Fixture::new();
        fx.client.push_start(Ok(BulkOperation::new("op", OperationStatus::Created)));
        fx.client.push_by_id(Ok(
            BulkOperation::new("op", OperationStatus::Failed).with_error_code("ACCESS_DENIED")
        ));

        let result = fx.orchestrator(options()).source(&job()).await;

        assert!(matches!(result, Err(SourcingError::OperationFailed { .. })));
        let fatals = fx.host.log().fatals;
        assert_eq!(fatals.len(), 1);
        assert_eq!(fatals[0].code, PluginErrorCode::UnknownSourcingFailure);
        assert!(fatals[0].context_message.contains("ACCESS_DENIED"));
        assert!(fx.host.nodes().is_empty());
        assert_eq!(fx.client.count(|c| matches!(c, ClientCall::Start(_))), 1);
        assert!(fx.fetcher.fetched().is_empty());
    }

    #[tokio::test]
    async fn repeated_external_cancellation_exhausts_the_budget() {
        let fx = Fixture::new();
        fx.client.push_start(Ok(BulkOperation::new("op", OperationStatus::Created)));
        fx.client.push_by_id(Ok(BulkOperation::new("op", OperationStatus::Canceled)));

        let result = fx
            .orchestrator(options().with_max_cancel_retries(2))
            .source(&job())
            .await;

        assert!(matches!(
            result,
            Err(SourcingError::RetryBudgetExceeded { restarts: 2, .. })
        ));
        assert_eq!(fx.client.count(|c| matches!(c, ClientCall::Start(_))), 3);
        let fatals = fx.host.log().fatals;
        assert_eq!(fatals.len(), 1);
        assert_eq!(fatals[0].code, PluginErrorCode::ApiConflict);
    }

    #[tokio::test]
    async fn rejected_start_is_fatal() {
        let fx = Fixture::new();
        fx.client.push_start(Err(ClientError::Rejected(vec![
            "query: Invalid bulk query".into(),
        ])));

        let result = fx.orchestrator(options()).source(&job()).await;

        assert!(matches!(result, Err(SourcingError::RequestRejected(_))));
        let fatals = fx.host.log().fatals;
        assert_eq!(fatals.len(), 1);
        assert_eq!(fatals[0].code, PluginErrorCode::BulkOperationFailed);
        assert_eq!(fx.client.count(|c| matches!(c, ClientCall::ById(_))), 0);
    }

    #[tokio::test]
    async fn poll_timeout_is_fatal() {
        let fx = Fixture::new();
        fx.client.push_start(Ok(BulkOperation::new("op", OperationStatus::Created)));
        fx.client.push_by_id(Ok(BulkOperation::new("op", OperationStatus::Running)));

        let result = fx
            .orchestrator(options().with_max_poll_attempts(4))
            .source(&job())
            .await;

        assert!(matches!(
            result,
            Err(SourcingError::PollTimeout { attempts: 4, .. })
        ));
        assert_eq!(fx.host.log().fatals.len(), 1);
        assert_eq!(fx.host.log().timers_ended.len(), 1);
    }

    #[tokio::test]
    async fn emits_one_node_per_line_in_order() {
        let fx = Fixture::new();
        fx.client.push_start(Ok(BulkOperation::new("op", OperationStatus::Created)));
        fx.client.push_by_id(Ok(completed(3)));
        fx.fetcher.insert(
            RESULTS_URL,
            "{\"id\":\"gid://shopify/Product/1\"}\n\n{\"id\":\"gid://shopify/Product/2\"}\n{\"id\":\"gid://shopify/ProductVariant/3\",\"__parentId\":\"gid://shopify/Product/2\"}\n",
        );

        let report = fx.orchestrator(options()).source(&job()).await.unwrap();

        let ids: Vec<String> = fx
            .host
            .nodes()
            .iter()
            .map(|n| n.shopify_id.to_string())
            .collect();
        assert_eq!(
            ids,
            vec![
                "gid://shopify/Product/1",
                "gid://shopify/Product/2",
                "gid://shopify/ProductVariant/3",
            ]
        );
        assert_eq!(report.emitted, 3);
        assert_eq!(fx.host.nodes()[2].node_type, "ShopifyProductVariant");
    }

    #[tokio::test]
    async fn streamed_result_is_decoded_across_chunks() {
        let fx = Fixture::new();
        fx.client.push_start(Ok(BulkOperation::new("op", OperationStatus::Created)));
        fx.client.push_by_id(Ok(completed(3)));
        fx.fetcher.insert_chunked(
            RESULTS_URL,
            &[
                "{\"id\":\"gid://shopify/Product/1\"}\n{\"id\":\"gid://sh",
                "opify/Product/2\"}\n{bro",
                "ken\n{\"id\":\"gid://shopify/Product/4\"}\n",
            ],
        );

        let report = fx.orchestrator(options()).source(&job()).await.unwrap();

        let ids: Vec<String> = fx
            .host
            .nodes()
            .iter()
            .map(|n| n.shopify_id.to_string())
            .collect();
        assert_eq!(
            ids,
            vec![
                "gid://shopify/Product/1",
                "gid://shopify/Product/2",
                "gid://shopify/Product/4",
            ]
        );
        assert_eq!(report.skipped, 1);
        assert!(report.feedback[0].message().contains("line 3"));
    }

    #[tokio::test]
    async fn malformed_lines_are_skipped_with_a_warning() {
        let fx = Fixture::new();
        fx.client.push_start(Ok(BulkOperation::new("op", OperationStatus::Created)));
        fx.client.push_by_id(Ok(completed(2)));
        fx.fetcher.insert(
            RESULTS_URL,
            "{\"id\":\"gid://shopify/Product/1\"}\n{broken\n{\"id\":\"gid://shopify/Product/3\"}\n",
        );

        let report = fx.orchestrator(options()).source(&job()).await.unwrap();

        assert_eq!(report.emitted, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.feedback.len(), 1);
        assert!(report.feedback[0].is_warning());
        assert!(report.feedback[0].message().contains("line 2"));
        assert_eq!(fx.host.log().warnings.len(), 1);
        assert!(fx.host.log().fatals.is_empty());
    }

    #[tokio::test]
    async fn downloads_images_when_enabled() {
        let fx = Fixture::new();
        fx.client.push_start(Ok(BulkOperation::new("op", OperationStatus::Created)));
        fx.client.push_by_id(Ok(completed(1)));
        fx.fetcher.insert(
            RESULTS_URL,
            r#"{"id":"gid://shopify/Product/12345","featuredMedia":{"preview":{"image":{"originalSrc":"http://www.example.com/some-image.jpg"}}}}"#,
        );

        fx.orchestrator(options().with_download_images(true))
            .source(&job())
            .await
            .unwrap();

        let node = &fx.host.nodes()[0];
        assert_eq!(
            node.fields["featuredMedia"]["preview"]["image"]["localFile"],
            "12345"
        );
    }

    #[tokio::test]
    async fn leaves_images_alone_when_disabled() {
        let fx = Fixture::new();
        fx.client.push_start(Ok(BulkOperation::new("op", OperationStatus::Created)));
        fx.client.push_by_id(Ok(completed(1)));
        fx.fetcher.insert(
            RESULTS_URL,
            r#"{"id":"gid://shopify/Product/12345","featuredImage":{"originalSrc":"http://a.jpg"}}"#,
        );

        fx.orchestrator(options()).source(&job()).await.unwrap();

        assert!(fx.host.nodes()[0].fields["featuredImage"].get("localFile").is_none());
        assert!(fx.materializer.requested().is_empty());
    }

    #[tokio::test]
    async fn failed_image_download_still_emits_the_node() {
        let fx = Fixture::new();
        fx.client.push_start(Ok(BulkOperation::new("op", OperationStatus::Created)));
        fx.client.push_by_id(Ok(completed(1)));
        fx.materializer.fail_for("http://a.jpg", "connection refused");
        fx.fetcher.insert(
            RESULTS_URL,
            r#"{"id":"gid://shopify/Product/12345","featuredImage":{"originalSrc":"http://a.jpg"}}"#,
        );

        let report = fx
            .orchestrator(options().with_download_images(true))
            .source(&job())
            .await
            .unwrap();

        assert_eq!(fx.host.nodes().len(), 1);
        assert!(fx.host.nodes()[0].fields["featuredImage"].get("localFile").is_none());
        assert_eq!(report.skipped, 0);
        assert!(report.feedback[0].message().contains("connection refused"));
    }

    #[tokio::test]
    async fn empty_result_skips_the_download() {
        let fx = Fixture::new();
        fx.client.push_start(Ok(BulkOperation::new("op", OperationStatus::Created)));
        fx.client.push_by_id(Ok(BulkOperation::new("op", OperationStatus::Completed)));

        let report = fx.orchestrator(options()).source(&job()).await.unwrap();

        assert_eq!(report.emitted, 0);
        assert!(fx.fetcher.fetched().is_empty());
        assert_eq!(
            fx.host.log().infos,
            vec!["No data was returned for this operation".to_owned()]
        );
    }

    #[tokio::test]
    async fn host_rejection_halts_emission() {
        let client = Arc::new(ScriptedClient::new());
        client.push_start(Ok(BulkOperation::new("op", OperationStatus::Created)));
        client.push_by_id(Ok(completed(2)));
        let fetcher = Arc::new(StaticResultFetcher::new());
        fetcher.insert(
            RESULTS_URL,
            "{\"id\":\"gid://shopify/Product/1\"}\n{\"id\":\"gid://shopify/Product/2\"}\n",
        );
        let host = Arc::new(RecordingHost::rejecting_nodes());

        let result = SourcingOrchestrator::new(client, fetcher, host.clone(), options())
            .with_delay(Arc::new(ImmediateDelay::new()))
            .source(&job())
            .await;

        assert!(matches!(result, Err(SourcingError::Host(_))));
        assert_eq!(host.log().fatals.len(), 1);
    }

    #[tokio::test]
    async fn await_policy_waits_instead_of_canceling() {
        let fx = Fixture::new();
        fx.client.push_current(Ok(Some(BulkOperation::new("stale", OperationStatus::Running))));
        fx.client.push_by_id(Ok(BulkOperation::new("stale", OperationStatus::Completed)));
        fx.client.push_by_id(Ok(completed(0)));
        fx.client.push_start(Ok(BulkOperation::new("fresh", OperationStatus::Created)));

        fx.orchestrator(options().with_stale_operation(StaleOperationPolicy::AwaitFinish))
            .source(&job())
            .await
            .unwrap();

        assert_eq!(fx.client.count(|c| matches!(c, ClientCall::Cancel(_))), 0);
        assert_eq!(fx.client.count(|c| matches!(c, ClientCall::Start(_))), 1);
    }

    #[tokio::test]
    async fn records_operation_ids_in_the_cache() {
        let fx = Fixture::new();
        fx.client.push_start(Ok(BulkOperation::new("op-7", OperationStatus::Created)));
        fx.client.push_by_id(Ok(completed(0)));

        fx.orchestrator(options()).source(&job()).await.unwrap();

        let entries = fx.host.cache_entries();
        assert_eq!(
            entries[0],
            ("last-bulk-operation:products".to_owned(), Value::String("op-7".into()))
        );
        assert_eq!(entries[1].0, "last-completed-operation:products");
    }

    #[test]
    fn progress_message_format() {
        assert_eq!(
            progress_message(&OperationId::new("1"), OperationStatus::Running, 42),
            "Polling bulk operation: 1\nStatus: RUNNING\nObject count: 42"
        );
    }
}
