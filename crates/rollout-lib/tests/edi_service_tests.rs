//! End-to-end tests against an in-process deployment service
//!
//! The fake service rolls deployments forward by one replica on every
//! inspect call and removes undeployed models one inspect after the request.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rollout_lib::{
    CancellationToken, DeployRequest, DeploymentDescriptor, DeploymentStatus, EdiClient,
    Mutation, Orchestrator, QueryFailurePolicy, RolloutError, RolloutOptions, ScaleRequest,
    UndeployRequest, WaitConfig,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct ClusterState {
    deployments: Vec<DeploymentDescriptor>,
    /// Models removed on the next inspect
    terminating: Vec<String>,
    inspects: u32,
    /// Reject inspect calls while set
    inspect_down: bool,
}

type Shared = Arc<Mutex<ClusterState>>;

fn model_id(image: &str) -> (String, String) {
    let name = image.rsplit('/').next().unwrap_or(image);
    let (model, version) = name.split_once(':').unwrap_or((name, "latest"));
    (model.to_string(), version.to_string())
}

fn refresh(deployment: &mut DeploymentDescriptor) {
    deployment.model_api_ok = deployment.ready_replicas == deployment.scale;
    deployment.status = if deployment.model_api_ok {
        DeploymentStatus::Ok
    } else {
        DeploymentStatus::Warning
    };
}

async fn deploy(
    State(state): State<Shared>,
    Json(req): Json<DeployRequest>,
) -> Json<Vec<DeploymentDescriptor>> {
    let (model, version) = model_id(&req.image);
    let descriptor = DeploymentDescriptor {
        model,
        version,
        image: req.image,
        scale: req.scale,
        ready_replicas: 0,
        status: DeploymentStatus::Warning,
        model_api_ok: false,
        name: None,
        namespace: Some("default".to_string()),
        deploy_time: None,
    };
    state.lock().unwrap().deployments.push(descriptor.clone());
    Json(vec![descriptor])
}

async fn scale(
    State(state): State<Shared>,
    Json(req): Json<ScaleRequest>,
) -> Result<Json<Vec<DeploymentDescriptor>>, (StatusCode, String)> {
    let mut state = state.lock().unwrap();
    let mut affected = Vec::new();
    for deployment in state.deployments.iter_mut().filter(|d| d.model == req.model_id) {
        deployment.scale = req.scale;
        deployment.ready_replicas = deployment.ready_replicas.min(req.scale);
        refresh(deployment);
        affected.push(deployment.clone());
    }
    if affected.is_empty() {
        return Err((StatusCode::NOT_FOUND, format!("model {} not found", req.model_id)));
    }
    Ok(Json(affected))
}

async fn undeploy(
    State(state): State<Shared>,
    Json(req): Json<UndeployRequest>,
) -> Json<Vec<DeploymentDescriptor>> {
    let mut state = state.lock().unwrap();
    let affected: Vec<_> = state
        .deployments
        .iter()
        .filter(|d| d.model == req.model_id)
        .cloned()
        .collect();
    state.terminating.push(req.model_id);
    Json(affected)
}

async fn inspect(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<DeploymentDescriptor>>, StatusCode> {
    let mut state = state.lock().unwrap();
    state.inspects += 1;
    if state.inspect_down {
        return Err(StatusCode::BAD_GATEWAY);
    }

    // Listing reflects the state before this call's progress
    let listing: Vec<_> = state
        .deployments
        .iter()
        .filter(|d| params.get("model_id").map_or(true, |m| &d.model == m))
        .cloned()
        .collect();

    let terminating = std::mem::take(&mut state.terminating);
    state.deployments.retain(|d| !terminating.contains(&d.model));
    for deployment in state.deployments.iter_mut() {
        if deployment.ready_replicas < deployment.scale {
            deployment.ready_replicas += 1;
        }
        refresh(deployment);
    }

    Ok(Json(listing))
}

async fn start_service(state: Shared) -> String {
    let app = Router::new()
        .route("/api/1.0/deploy", post(deploy))
        .route("/api/1.0/scale", post(scale))
        .route("/api/1.0/undeploy", post(undeploy))
        .route("/api/1.0/inspect", get(inspect))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn fast(timeout_secs: i64) -> RolloutOptions {
    RolloutOptions::new(
        WaitConfig::new(timeout_secs).poll_interval(Duration::from_millis(20)),
        false,
    )
}

#[tokio::test]
async fn test_deploy_scale_undeploy_lifecycle() {
    let state = Shared::default();
    let url = start_service(state.clone()).await;
    let client = EdiClient::new(&url, None).unwrap();
    let orchestrator = Orchestrator::new(&client, &client);

    let deployed = orchestrator
        .execute(
            &Mutation::Deploy(DeployRequest {
                image: "registry.local/income:1.0".to_string(),
                model_iam_role: None,
                scale: 2,
                liveness_timeout: 2,
                readiness_timeout: 2,
            }),
            &fast(10),
        )
        .await
        .unwrap();
    // ready 0 -> 1 -> 2 over the first three listings
    assert_eq!(deployed.report.polls, 3);
    assert!(deployed.report.last_snapshot[0].model_api_ok);

    let scaled = orchestrator
        .execute(
            &Mutation::Scale(ScaleRequest {
                model_id: "income".to_string(),
                model_version: None,
                scale: 3,
            }),
            &fast(10),
        )
        .await
        .unwrap();
    assert_eq!(scaled.report.last_snapshot[0].ready_replicas, 3);

    let removed = orchestrator
        .execute(
            &Mutation::Undeploy(UndeployRequest {
                model_id: "income".to_string(),
                model_version: None,
                grace_period: 0,
                ignore_not_found: false,
            }),
            &fast(10),
        )
        .await
        .unwrap();
    assert_eq!(removed.affected.len(), 1);
    assert_eq!(removed.report.polls, 2);
    assert!(client.inspect(None, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rejected_scale_does_not_poll() {
    let state = Shared::default();
    let url = start_service(state.clone()).await;
    let client = EdiClient::new(&url, None).unwrap();

    let result = Orchestrator::new(&client, &client)
        .execute(
            &Mutation::Scale(ScaleRequest {
                model_id: "missing".to_string(),
                model_version: None,
                scale: 1,
            }),
            &fast(10),
        )
        .await;

    assert!(matches!(result, Err(RolloutError::DispatchFailed { .. })));
    assert_eq!(state.lock().unwrap().inspects, 0);
}

#[tokio::test]
async fn test_status_outage_times_out_or_aborts() {
    let state = Shared::default();
    let url = start_service(state.clone()).await;
    let client = EdiClient::new(&url, None).unwrap();
    let mutation = Mutation::Deploy(DeployRequest {
        image: "registry.local/churn:0.3".to_string(),
        model_iam_role: None,
        scale: 1,
        liveness_timeout: 2,
        readiness_timeout: 2,
    });
    state.lock().unwrap().inspect_down = true;

    let tolerated = Orchestrator::new(&client, &client)
        .execute(&mutation, &fast(1))
        .await;
    match tolerated {
        Err(RolloutError::TimedOut { report, .. }) => {
            assert!(report.polls > 1);
            assert!(report.last_error.unwrap().contains("502"));
        }
        other => panic!("expected TimedOut, got {:?}", other),
    }

    let mut options = fast(1);
    options.wait = options.wait.on_query_error(QueryFailurePolicy::Abort);
    let before = state.lock().unwrap().inspects;
    let aborted = Orchestrator::new(&client, &client)
        .execute(&mutation, &options)
        .await;
    assert!(matches!(aborted, Err(RolloutError::Wait(_))));
    assert_eq!(state.lock().unwrap().inspects, before + 1);
}

#[tokio::test]
async fn test_cancellation_stops_waiting() {
    let state = Shared::default();
    let url = start_service(state.clone()).await;
    let client = EdiClient::new(&url, None).unwrap();
    let token = CancellationToken::new();
    state.lock().unwrap().inspect_down = true;

    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let result = Orchestrator::new(&client, &client)
        .cancellation(token)
        .execute(
            &Mutation::Deploy(DeployRequest {
                image: "registry.local/fraud:2.0".to_string(),
                model_iam_role: None,
                scale: 1,
                liveness_timeout: 2,
                readiness_timeout: 2,
            }),
            &fast(30),
        )
        .await;

    match result {
        Err(err @ RolloutError::Wait(_)) => assert!(err.needs_inspection()),
        other => panic!("expected cancellation, got {:?}", other),
    }
}
