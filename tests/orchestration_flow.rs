//! End-to-end orchestration scenarios over the in-memory batch service and
//! in-process runner: declared workflows run step by step through real
//! callback dispatch, exactly as a worker fleet would drive them.

mod common;

use async_trait::async_trait;
use serde_json::{json, Value};

use batchflow_core::batch::{BatchId, BatchService};
use batchflow_core::events;
use batchflow_core::jobs::{JobContext, JobOptions};
use batchflow_core::orchestration::{
    CallbackCapabilities, OrchestrationBuilder, OrchestrationError, OrchestrationJob,
    OrchestrationResult,
};

use common::Harness;

/// The canonical three-step shape: one job, then two in parallel, then one.
struct PipelineOrchestration {
    capabilities: CallbackCapabilities,
    queue: Option<String>,
}

impl PipelineOrchestration {
    fn plain() -> Self {
        Self {
            capabilities: CallbackCapabilities::none(),
            queue: None,
        }
    }
}

#[async_trait]
impl OrchestrationJob for PipelineOrchestration {
    fn class_name(&self) -> &str {
        "PipelineOrchestration"
    }

    fn build_workflow(
        &self,
        workflow: &mut OrchestrationBuilder,
        _args: &[Value],
    ) -> OrchestrationResult<()> {
        workflow.run("JobA", vec![json!(1)]);
        workflow.in_parallel(|flow| {
            flow.run("JobB", vec![json!(2)]);
            flow.run("JobC", vec![json!(3)]);
            Ok(())
        })?;
        workflow.run("JobD", vec![]);
        Ok(())
    }

    fn child_job_options(&self, _args: &[Value]) -> JobOptions {
        match &self.queue {
            Some(queue) => JobOptions::new().with_queue(queue.clone()),
            None => JobOptions::new(),
        }
    }

    fn callback_capabilities(&self) -> CallbackCapabilities {
        self.capabilities
    }
}

fn register_pipeline_jobs(harness: &Harness) {
    for name in ["JobA", "JobB", "JobC", "JobD"] {
        harness.register_recording_job(name);
    }
}

#[tokio::test]
async fn test_workflow_plan_serializes_to_declared_shape() {
    let harness = Harness::new();
    let plan = harness
        .coordinator
        .workflow_plan(&PipelineOrchestration::plain(), &[])
        .unwrap();

    assert_eq!(
        serde_json::to_value(&plan).unwrap(),
        json!([
            [{"class_name": "JobA", "options": {}, "args": [1]}],
            [
                {"class_name": "JobB", "options": {}, "args": [2]},
                {"class_name": "JobC", "options": {}, "args": [3]}
            ],
            [{"class_name": "JobD", "options": {}, "args": []}]
        ])
    );
}

#[tokio::test]
async fn test_three_step_workflow_executes_steps_in_strict_order() {
    let harness = Harness::new();
    register_pipeline_jobs(&harness);
    let mut event_rx = harness.executor.events().subscribe();

    harness
        .coordinator
        .perform(&PipelineOrchestration::plain(), &[], &JobContext::detached())
        .await
        .unwrap();
    harness.runner.drain().await.unwrap();

    // Step boundaries hold: A before both B and C, both before D. Order
    // within the parallel group is unspecified.
    let a = harness.position_of("perform:JobA:[1]");
    let b = harness.position_of("perform:JobB:[2]");
    let c = harness.position_of("perform:JobC:[3]");
    let d = harness.position_of("perform:JobD:[]");
    assert!(a < b && a < c);
    assert!(b < d && c < d);

    // DONE means done: four performs, nothing further dispatched.
    assert_eq!(harness.log_entries().len(), 4);
    assert_eq!(harness.runner.pending(), 0);

    // Lifecycle events trace the same shape: one start, three step launches,
    // two step completions (the final step registers no continuation).
    let mut names = Vec::new();
    while let Ok(event) = event_rx.try_recv() {
        names.push(event.name);
    }
    assert_eq!(
        names,
        vec![
            events::names::ORCHESTRATION_STARTED,
            events::names::STEP_ENQUEUED,
            events::names::STEP_COMPLETED,
            events::names::STEP_ENQUEUED,
            events::names::STEP_COMPLETED,
            events::names::STEP_ENQUEUED,
        ]
    );
}

#[tokio::test]
async fn test_origin_callbacks_fire_after_final_step() {
    let harness = Harness::new();
    register_pipeline_jobs(&harness);
    harness.register_logging_callback_handler("PipelineOrchestration");

    let job = PipelineOrchestration {
        capabilities: CallbackCapabilities::all(),
        queue: None,
    };
    let batch = harness
        .coordinator
        .perform(&job, &[], &JobContext::detached())
        .await
        .unwrap();
    harness.runner.drain().await.unwrap();

    assert!(harness.batch_service.is_resolved(&batch));
    let d = harness.position_of("perform:JobD:[]");
    let complete = harness.position_of("callback:PipelineOrchestration:complete");
    let success = harness.position_of("callback:PipelineOrchestration:success");
    assert!(d < complete && complete < success);
}

#[tokio::test]
async fn test_orchestration_nests_under_enclosing_batch() {
    let harness = Harness::new();
    register_pipeline_jobs(&harness);
    let enclosing = harness.batch_service.create_batch(None).await.unwrap();

    let batch = harness
        .coordinator
        .perform(
            &PipelineOrchestration::plain(),
            &[],
            &JobContext::within_batch(enclosing),
        )
        .await
        .unwrap();

    assert_eq!(
        harness.batch_service.parent_of(&batch).await.unwrap(),
        Some(enclosing)
    );

    harness.runner.drain().await.unwrap();
    // The enclosing batch resolves only once the whole orchestration has.
    assert!(harness.batch_service.is_resolved(&batch));
    assert!(harness.batch_service.is_resolved(&enclosing));
}

#[tokio::test]
async fn test_empty_workflow_still_resolves_callbacks() {
    struct EmptyOrchestration;

    #[async_trait]
    impl OrchestrationJob for EmptyOrchestration {
        fn class_name(&self) -> &str {
            "EmptyOrchestration"
        }

        fn build_workflow(
            &self,
            _workflow: &mut OrchestrationBuilder,
            _args: &[Value],
        ) -> OrchestrationResult<()> {
            Ok(())
        }

        fn callback_capabilities(&self) -> CallbackCapabilities {
            CallbackCapabilities {
                on_complete: true,
                on_success: true,
                ..CallbackCapabilities::none()
            }
        }
    }

    let harness = Harness::new();
    harness.register_logging_callback_handler("EmptyOrchestration");

    let batch = harness
        .coordinator
        .perform(&EmptyOrchestration, &[], &JobContext::detached())
        .await
        .unwrap();
    assert!(!harness.batch_service.is_resolved(&batch));

    harness.runner.drain().await.unwrap();

    assert!(harness.batch_service.is_resolved(&batch));
    assert_eq!(
        harness.log_entries(),
        vec![
            "callback:EmptyOrchestration:complete".to_string(),
            "callback:EmptyOrchestration:success".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_failing_parallel_sibling_stalls_the_workflow() {
    let harness = Harness::new();
    harness.register_recording_job("JobA");
    harness.register_failing_job("JobB");
    harness.register_recording_job("JobC");
    harness.register_recording_job("JobD");
    harness.register_logging_callback_handler("PipelineOrchestration");

    let job = PipelineOrchestration {
        capabilities: CallbackCapabilities::all(),
        queue: None,
    };
    harness
        .coordinator
        .perform(&job, &[], &JobContext::detached())
        .await
        .unwrap();
    harness.runner.drain().await.unwrap();

    let entries = harness.log_entries();
    // JobC still ran (siblings are independent), but the step never reached
    // success, so JobD never dispatched.
    assert!(entries.iter().any(|e| e == "perform:JobB:failed"));
    assert!(entries.iter().any(|e| e.starts_with("perform:JobC")));
    assert!(!entries.iter().any(|e| e.starts_with("perform:JobD")));

    // Failure surfaces through death/complete on the orchestration batch;
    // success never fires.
    assert!(entries.iter().any(|e| e == "callback:PipelineOrchestration:death"));
    assert!(entries.iter().any(|e| e == "callback:PipelineOrchestration:complete"));
    assert!(!entries.iter().any(|e| e == "callback:PipelineOrchestration:success"));
}

#[tokio::test]
async fn test_child_job_options_route_every_batch_callback_queue() {
    let harness = Harness::new();
    register_pipeline_jobs(&harness);
    let mut event_rx = harness.executor.events().subscribe();

    let job = PipelineOrchestration {
        capabilities: CallbackCapabilities::none(),
        queue: Some("low_priority".to_string()),
    };
    let orchestration_batch = harness
        .coordinator
        .perform(&job, &[], &JobContext::detached())
        .await
        .unwrap();
    harness.runner.drain().await.unwrap();

    assert_eq!(
        harness.batch_service.callback_queue_of(&orchestration_batch),
        Some("low_priority".to_string())
    );

    let mut step_batches = Vec::new();
    while let Ok(event) = event_rx.try_recv() {
        if event.name == events::names::STEP_ENQUEUED {
            let id: BatchId = serde_json::from_value(event.context["batch_id"].clone()).unwrap();
            step_batches.push(id);
        }
    }
    assert_eq!(step_batches.len(), 3);
    for step_batch in step_batches {
        assert_eq!(
            harness.batch_service.callback_queue_of(&step_batch),
            Some("low_priority".to_string())
        );
    }
}

#[tokio::test]
async fn test_unregistered_job_class_fails_the_dispatching_call() {
    let harness = Harness::new();
    // Only some of the pipeline's jobs are registered.
    harness.register_recording_job("JobB");
    harness.register_recording_job("JobC");
    harness.register_recording_job("JobD");

    let err = harness
        .coordinator
        .perform(&PipelineOrchestration::plain(), &[], &JobContext::detached())
        .await
        .unwrap_err();

    assert!(matches!(err, OrchestrationError::Dispatch(_)));
    assert!(err.to_string().contains("JobA"));
}
