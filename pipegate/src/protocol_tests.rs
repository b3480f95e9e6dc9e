//! End-to-end tests of the decision-propagation protocol: router → gate
//! → worker, with decisions carried through the orchestrator's variable
//! channel exactly as the pipeline interpolates them.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;

use crate::config::RuntimeConfig;
use crate::flags::{FLAG_PIPELINE_VERSION, FLAG_REQUIRED_STAGES};
use crate::job::JobDescriptor;
use crate::runtime::Runtime;
use crate::testing::{FakePipelineStarter, InMemoryFlagProvider, RecordingReporter};

struct Harness {
    runtime: Runtime,
    flags: Arc<InMemoryFlagProvider>,
    reporter: Arc<RecordingReporter>,
    starter: Arc<FakePipelineStarter>,
}

fn harness(flags: InMemoryFlagProvider) -> Harness {
    let flags = Arc::new(flags);
    let reporter = Arc::new(RecordingReporter::new());
    let starter = Arc::new(FakePipelineStarter::new());
    let runtime = Runtime::new(
        RuntimeConfig::new("pipeline/flag-sdk-key"),
        flags.clone(),
        reporter.clone(),
        starter.clone(),
    )
    .unwrap();
    Harness {
        runtime,
        flags,
        reporter,
        starter,
    }
}

fn gate_job(job_id: &str, stage: &str) -> JobDescriptor {
    JobDescriptor::new(job_id)
        .with_parameter("stage_name", stage)
        .with_parameter("app_name", "drug-research-portal")
        .with_parameter("pipeline_version", "v1")
}

#[tokio::test]
async fn test_gate_decision_transports_to_worker_skip_path() {
    let h = harness(
        InMemoryFlagProvider::new()
            .with_flag(FLAG_REQUIRED_STAGES, json!(["source", "build", "deploy"])),
    );

    // Gate action runs first and emits the decision as an output variable.
    let gate = h.runtime.gate_evaluator();
    gate.handle(&gate_job("gate-1", "sast")).await.unwrap();
    let gate_vars = h.reporter.last_success("gate-1").unwrap();
    assert_eq!(gate_vars.get("gate_decision"), Some("skip"));

    // The orchestrator interpolates that variable into the worker action.
    let worker_job = JobDescriptor::new("worker-1")
        .with_parameter("stage_name", gate_vars.get("stage_name").unwrap())
        .with_parameter("app_name", "drug-research-portal")
        .with_parameter("pipeline_version", gate_vars.get("pipeline_version").unwrap())
        .with_parameter("gate_decision", gate_vars.get("gate_decision").unwrap());

    let worker = h.runtime.stage_worker();
    worker.handle(&worker_job).await.unwrap();

    let worker_vars = h.reporter.last_success("worker-1").unwrap();
    assert_eq!(worker_vars.get("gate_result"), Some("skipped"));
    assert_eq!(worker_vars.get("tool"), None);

    // One terminal report per invocation, no more, no less.
    assert_eq!(h.reporter.total_reports("gate-1"), 1);
    assert_eq!(h.reporter.total_reports("worker-1"), 1);
}

#[tokio::test]
async fn test_gate_decision_transports_to_worker_proceed_path() {
    let h = harness(
        InMemoryFlagProvider::new()
            .with_flag(FLAG_REQUIRED_STAGES, json!(["source", "build", "deploy"])),
    );

    let gate = h.runtime.gate_evaluator();
    gate.handle(&gate_job("gate-2", "build")).await.unwrap();
    let gate_vars = h.reporter.last_success("gate-2").unwrap();
    assert_eq!(gate_vars.get("gate_decision"), Some("proceed"));

    let worker_job = JobDescriptor::new("worker-2")
        .with_parameter("stage_name", "build")
        .with_parameter("app_name", "drug-research-portal")
        .with_parameter("pipeline_version", "v1")
        .with_parameter("gate_decision", gate_vars.get("gate_decision").unwrap());

    let worker = h.runtime.stage_worker();
    worker.handle(&worker_job).await.unwrap();

    let worker_vars = h.reporter.last_success("worker-2").unwrap();
    assert_eq!(worker_vars.get("gate_result"), Some("executed"));
    assert_eq!(worker_vars.get("tool"), Some("Build"));
    assert_eq!(
        worker_vars.get("result"),
        Some("Build succeeded — artifacts packaged")
    );
}

#[tokio::test]
async fn test_router_attaches_routing_variables_to_execution() {
    let h = harness(InMemoryFlagProvider::new().with_flag(FLAG_PIPELINE_VERSION, json!("v2")));

    let router = h.runtime.router();
    let job = JobDescriptor::new("router-1")
        .with_parameter("app_name", "drug-research-portal")
        .with_parameter("revision", "abc123");
    router.handle(&job).await.unwrap();

    let starts = h.starter.requests();
    assert_eq!(starts.len(), 1);
    assert_eq!(starts[0].pipeline_name, "shared-pipeline-v2");
    let names: Vec<&str> = starts[0].variables.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["APP_NAME", "PIPELINE_VERSION"]);

    let vars = h.reporter.last_success("router-1").unwrap();
    assert_eq!(vars.get("app"), Some("drug-research-portal"));
    assert_eq!(vars.get("pipeline_version"), Some("v2"));
}

#[tokio::test]
async fn test_fresh_sync_picks_up_targeting_change_between_invocations() {
    let h = harness(
        InMemoryFlagProvider::new().with_flag(FLAG_REQUIRED_STAGES, json!(["sast", "build"])),
    );

    let gate = h.runtime.gate_evaluator();
    gate.handle(&gate_job("gate-3", "sast")).await.unwrap();
    assert_eq!(
        h.reporter.last_success("gate-3").unwrap().get("gate_decision"),
        Some("proceed")
    );

    // Targeting rules change while the warm process sits idle.
    h.flags.set_flag(FLAG_REQUIRED_STAGES, json!(["build"]));

    gate.handle(&gate_job("gate-4", "sast")).await.unwrap();
    assert_eq!(
        h.reporter.last_success("gate-4").unwrap().get("gate_decision"),
        Some("skip")
    );
    assert_eq!(h.flags.sync_count(), 2);
}

#[tokio::test]
async fn test_exactly_once_across_all_branches() {
    let h = harness(
        InMemoryFlagProvider::new().with_flag(FLAG_REQUIRED_STAGES, json!(["build"])),
    );
    let gate = h.runtime.gate_evaluator();
    let worker = h.runtime.stage_worker();
    let router = h.runtime.router();

    // Proceed branch.
    gate.handle(&gate_job("g-proceed", "build")).await.unwrap();
    // Skip branch.
    gate.handle(&gate_job("g-skip", "sca")).await.unwrap();
    // Malformed-input branch.
    gate.handle(&JobDescriptor::new("g-bad")).await.unwrap();
    // Worker execute and skip branches.
    worker
        .handle(
            &JobDescriptor::new("w-exec")
                .with_parameter("stage_name", "deploy"),
        )
        .await
        .unwrap();
    worker
        .handle(
            &JobDescriptor::new("w-skip")
                .with_parameter("stage_name", "sca")
                .with_parameter("gate_decision", "skip"),
        )
        .await
        .unwrap();
    // Router happy branch.
    router
        .handle(&JobDescriptor::new("r-ok").with_parameter("app_name", "portal"))
        .await
        .unwrap();

    for job_id in ["g-proceed", "g-skip", "g-bad", "w-exec", "w-skip", "r-ok"] {
        assert_eq!(h.reporter.total_reports(job_id), 1, "job {job_id}");
    }
}

#[tokio::test]
async fn test_sync_failure_degrades_to_defaults_but_succeeds() {
    let flags = InMemoryFlagProvider::new()
        .with_flag(FLAG_REQUIRED_STAGES, json!(["build"]))
        .with_sync_errors();
    let h = harness(flags);

    let gate = h.runtime.gate_evaluator();
    gate.handle(&gate_job("gate-5", "sca")).await.unwrap();

    // Degraded evaluation is still a normal success, never a failure.
    assert_eq!(h.reporter.success_count("gate-5"), 1);
    assert_eq!(h.reporter.failure_count("gate-5"), 0);
}

#[tokio::test]
async fn test_concurrent_invocations_share_the_provider_handle() {
    let h = harness(
        InMemoryFlagProvider::new().with_flag(FLAG_REQUIRED_STAGES, json!(["build", "deploy"])),
    );
    let gate = Arc::new(h.runtime.gate_evaluator());

    let mut handles = Vec::new();
    for (i, stage) in ["build", "sast", "deploy", "sca"].into_iter().enumerate() {
        let gate = gate.clone();
        let job = gate_job(&format!("gate-c{i}"), stage);
        handles.push(tokio::spawn(async move { gate.handle(&job).await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    for (job_id, expected) in [
        ("gate-c0", "proceed"),
        ("gate-c1", "skip"),
        ("gate-c2", "proceed"),
        ("gate-c3", "skip"),
    ] {
        assert_eq!(
            h.reporter.last_success(job_id).unwrap().get("gate_decision"),
            Some(expected),
            "job {job_id}"
        );
    }
    // Every invocation forced its own sync.
    assert_eq!(h.flags.sync_count(), 4);
}
