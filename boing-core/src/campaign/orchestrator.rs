use std::sync::Arc;

use boing_http::{HttpClient, HttpRequest, HttpTransportErrorKind, join_url};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use tokio::task::JoinSet;

use crate::monitor::{Monitor, Narration};

use super::{
    AttemptStatus, ExecutionMode, RequestAttempt, RequestOutcome, Scenario, ScenarioKind, classify,
};

/// Invoked once per recorded outcome, in recording order.
pub type ProgressFn = Arc<dyn Fn(ScenarioKind, &RequestOutcome) + Send + Sync + 'static>;

#[derive(Debug, Clone, Serialize)]
pub struct CampaignResult {
    #[serde(serialize_with = "serialize_kind")]
    pub scenario: ScenarioKind,
    /// Outcomes in the order they were recorded.
    pub outcomes: Vec<RequestOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub narration: Vec<Narration>,
}

impl CampaignResult {
    pub fn suspicious_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.flagged).count()
    }

    pub fn error_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_error()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.is_transport_failure())
            .count()
    }
}

/// Runs scenarios against a target API and records every outcome into a shared [`Monitor`].
///
/// Campaigns never abort on a failed request, and several may run at once against the
/// same monitor.
#[derive(Clone)]
pub struct Orchestrator {
    client: HttpClient,
    target: Arc<str>,
    monitor: Arc<Monitor>,
    progress: Option<ProgressFn>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("target", &self.target)
            .field("progress", &self.progress.is_some())
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    pub fn new(client: HttpClient, target: &str, monitor: Arc<Monitor>) -> Self {
        Self {
            client,
            target: Arc::from(target.trim_end_matches('/')),
            monitor,
            progress: None,
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn monitor(&self) -> &Arc<Monitor> {
        &self.monitor
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub async fn run(&self, scenario: &Scenario) -> CampaignResult {
        let started_at = Utc::now();
        let mut narration = vec![self.monitor.narrate(scenario.tone, scenario.start_message())];
        tracing::info!(
            scenario = %scenario.kind,
            requests = scenario.request_count(),
            target = %self.target,
            "campaign started"
        );

        let attempts = scenario.attempts();
        let outcomes = match scenario.mode {
            ExecutionMode::Sequenced { pacing, .. } => {
                self.run_sequenced(scenario.kind, attempts, pacing).await
            }
            ExecutionMode::Burst { .. } => self.run_burst(scenario.kind, attempts).await,
        };

        narration.push(
            self.monitor
                .narrate(scenario.tone, scenario.completion_message(outcomes.len())),
        );

        let result = CampaignResult {
            scenario: scenario.kind,
            outcomes,
            started_at,
            finished_at: Utc::now(),
            narration,
        };
        tracing::info!(
            scenario = %scenario.kind,
            requests = result.outcomes.len(),
            suspicious = result.suspicious_count(),
            errors = result.error_count(),
            failures = result.failure_count(),
            "campaign finished"
        );
        result
    }

    /// Runs several campaigns concurrently; results come back in argument order.
    pub async fn run_many(&self, kinds: &[ScenarioKind]) -> Vec<CampaignResult> {
        let runs = kinds.iter().map(|k| self.run(k.scenario()));
        futures_util::future::join_all(runs).await
    }

    async fn run_sequenced(
        &self,
        kind: ScenarioKind,
        attempts: Vec<RequestAttempt>,
        pacing: std::time::Duration,
    ) -> Vec<RequestOutcome> {
        let mut outcomes = Vec::with_capacity(attempts.len());
        for (i, attempt) in attempts.into_iter().enumerate() {
            if i > 0 && !pacing.is_zero() {
                tokio::time::sleep(pacing).await;
            }
            let status = issue(&self.client, &self.target, &attempt).await;
            let outcome = classify(&attempt, status);
            self.record(kind, &outcome);
            outcomes.push(outcome);
        }
        outcomes
    }

    async fn run_burst(
        &self,
        kind: ScenarioKind,
        attempts: Vec<RequestAttempt>,
    ) -> Vec<RequestOutcome> {
        // Burst attempts are identical; keep one to classify tasks that die before recording.
        let template = attempts.first().cloned();
        let mut set = JoinSet::new();
        for attempt in attempts {
            let this = self.clone();
            set.spawn(async move {
                let status = issue(&this.client, &this.target, &attempt).await;
                let outcome = classify(&attempt, status);
                this.record(kind, &outcome);
                outcome
            });
        }

        let mut outcomes = Vec::with_capacity(set.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => {
                    tracing::warn!(scenario = %kind, error = %err, "burst request task failed");
                    if let Some(attempt) = &template {
                        let outcome = classify(attempt, Err(HttpTransportErrorKind::Aborted));
                        self.record(kind, &outcome);
                        outcomes.push(outcome);
                    }
                }
            }
        }
        outcomes
    }

    fn record(&self, kind: ScenarioKind, outcome: &RequestOutcome) {
        self.monitor.record(outcome);
        if let Some(progress) = &self.progress {
            (progress)(kind, outcome);
        }
    }
}

async fn issue(client: &HttpClient, target: &str, attempt: &RequestAttempt) -> AttemptStatus {
    let url = join_url(target, &attempt.uri_path);
    match client
        .request(HttpRequest::new(attempt.method.clone(), url))
        .await
    {
        Ok(res) => Ok(res.status),
        Err(err) => {
            tracing::warn!(endpoint = %attempt.endpoint, error = %err, "request failed");
            Err(err.transport_error_kind())
        }
    }
}

fn serialize_kind<S: Serializer>(kind: &ScenarioKind, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn campaign_result_serializes_kind_by_name() {
        let attempt = &ScenarioKind::ErrorFlood.scenario().attempts()[0];
        let now = Utc::now();
        let result = CampaignResult {
            scenario: ScenarioKind::ErrorFlood,
            outcomes: vec![classify(attempt, Ok(404))],
            started_at: now,
            finished_at: now,
            narration: Vec::new(),
        };

        let v = serde_json::to_value(&result).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(v["scenario"], "error-flood");
        assert_eq!(v["outcomes"][0]["status"], 404);
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.suspicious_count(), 0);
    }
}
