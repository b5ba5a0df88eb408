use bulk_source::{QueryJob, RunReport, SourcingOrchestrator};
use tracing::debug;

use super::format::print_feedback;
use crate::jobs::job_name;

/// Run one job and print the outcome to stderr.
///
/// Nodes themselves go wherever the host writes them; only the summary is
/// printed here so stdout stays clean when nodes stream to it. `None` means
/// the run failed and the host's reporter has already printed why.
pub async fn run(orchestrator: &SourcingOrchestrator, job: &QueryJob) -> Option<RunReport> {
    eprintln!(
        "Sourcing {} from {}...",
        job_name(job),
        orchestrator.options().store
    );

    let report = match orchestrator.source(job).await {
        Ok(report) => report,
        Err(err) => {
            debug!(error = %err, "sourcing run failed");
            return None;
        }
    };

    print_feedback(&report.feedback);
    eprintln!("{}", summary(&report));

    Some(report)
}

fn summary(report: &RunReport) -> String {
    let mut msg = format!("Sourced {} nodes ({} skipped)", report.emitted, report.skipped);
    if report.restarts > 0 {
        msg.push_str(&format!(" after {} restart(s)", report.restarts));
    }
    if let Some(id) = &report.operation_id {
        msg.push_str(&format!(" from {id}"));
    }
    msg.push('.');
    msg
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use bulk_source::test_support::{
        ImmediateDelay, RecordingHost, ScriptedClient, StaticResultFetcher,
    };
    use bulk_source::{
        BulkOperation, ClientError, Credentials, OperationId, OperationStatus, SourcingOptions,
    };

    use super::*;

    fn orchestrator(
        client: Arc<ScriptedClient>,
        fetcher: Arc<StaticResultFetcher>,
        host: Arc<RecordingHost>,
    ) -> SourcingOrchestrator {
        SourcingOrchestrator::new(
            client,
            fetcher,
            host,
            SourcingOptions::new("shop", Credentials::new("t")).with_poll_interval(Duration::ZERO),
        )
        .with_delay(Arc::new(ImmediateDelay::new()))
    }

    #[test]
    fn summary_mentions_restarts_only_when_present() {
        let report = RunReport {
            operation_id: Some(OperationId::new("gid://shopify/BulkOperation/1")),
            emitted: 3,
            skipped: 1,
            ..RunReport::default()
        };
        assert_eq!(
            summary(&report),
            "Sourced 3 nodes (1 skipped) from gid://shopify/BulkOperation/1."
        );

        let restarted = RunReport {
            restarts: 2,
            ..RunReport::default()
        };
        assert_eq!(summary(&restarted), "Sourced 0 nodes (0 skipped) after 2 restart(s).");
    }

    #[tokio::test]
    async fn run_returns_report_from_orchestrator() {
        let client = Arc::new(ScriptedClient::new());
        client.push_start(Ok(BulkOperation::new("op", OperationStatus::Created)));
        client.push_by_id(Ok(BulkOperation::new("op", OperationStatus::Completed)
            .with_object_count(1)
            .with_url("http://results")));

        let fetcher = Arc::new(StaticResultFetcher::new());
        fetcher.insert("http://results", r#"{"id":"gid://shopify/Product/1"}"#);
        let host = Arc::new(RecordingHost::new());

        let report = run(
            &orchestrator(client, fetcher, host.clone()),
            &QueryJob::new("products", "{ products }"),
        )
        .await
        .unwrap();

        assert_eq!(report.emitted, 1);
        assert_eq!(host.nodes().len(), 1);
    }

    #[tokio::test]
    async fn failed_run_is_reported_once_by_the_host() {
        let client = Arc::new(ScriptedClient::new());
        client.push_start(Err(ClientError::Rejected(vec!["Invalid bulk query".into()])));
        let host = Arc::new(RecordingHost::new());

        let outcome = run(
            &orchestrator(client, Arc::new(StaticResultFetcher::new()), host.clone()),
            &QueryJob::new("products", "{ products }"),
        )
        .await;

        assert!(outcome.is_none());
        assert_eq!(host.log().fatals.len(), 1);
    }
}
