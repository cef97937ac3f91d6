//! Lifecycle driver against the simulated control plane, on a paused clock

mod common;

use common::{config, driver, spec, wait};
use provflow_cloud::{
    ApiError, CancellationToken, Operation, PollConfig, ReconcileError, ResourceHandle,
    WaitPolicy,
};
use provflow_config::WaitSettings;
use provflow_resources::compute::{Instance, InstanceStatus};
use provflow_resources::database::{DatabaseCluster, DatabaseClusterStatus};
use provflow_resources::network::{
    SecurityGroup, SecurityGroupStatus, Subnet, SubnetStatus, Vpc, VpcPeering, VpcPeeringStatus,
    VpcStatus,
};
use provflow_resources::storage::{Volume, VolumeStatus};
use provflow_sim::{Call, Fault, SimulatedCloud};
use std::time::Duration;
use tokio::time::Instant;

type LifecycleDriverFor<K> = provflow_cloud::LifecycleDriver<K, SimulatedCloud<K>>;

/// pending, pending, available: ready after exactly two sleeps
#[tokio::test(start_paused = true)]
async fn test_create_ready_after_two_sleeps() {
    let (driver, sim) = driver(
        SimulatedCloud::<Vpc>::new([VpcStatus::Pending, VpcStatus::Pending, VpcStatus::Available])
            .unwrap(),
    );

    let started = Instant::now();
    let vpc = driver.create(&spec("main"), &wait(60)).await.unwrap();

    assert_eq!(started.elapsed(), Duration::from_secs(2));
    assert_eq!(vpc.handle.as_str(), "vpc-000001");
    assert_eq!(vpc.snapshot.unwrap().status, VpcStatus::Available);
    assert_eq!(sim.fetch_count(&vpc.handle).await, 3);
}

/// A cluster stuck in "creating" times out at the deadline, with no fetch
/// issued at or after it
#[tokio::test(start_paused = true)]
async fn test_create_times_out_without_fetching_past_deadline() {
    let (driver, sim) =
        driver(SimulatedCloud::<DatabaseCluster>::new([DatabaseClusterStatus::Creating]).unwrap());

    let started = Instant::now();
    let err = driver.create(&spec("orders"), &wait(3)).await.unwrap_err();

    assert_eq!(started.elapsed(), Duration::from_secs(3));
    match &err {
        ReconcileError::Timeout {
            kind,
            handle,
            operation,
            waited,
        } => {
            assert_eq!(*kind, "database_cluster");
            assert_eq!(handle.as_str(), "database_cluster-000001");
            assert_eq!(*operation, Operation::Create);
            assert_eq!(*waited, Duration::from_secs(3));
        }
        other => panic!("expected timeout, got {other}"),
    }
    assert!(err.is_retryable());

    let handle = err.handle().unwrap().clone();
    assert_eq!(sim.fetch_count(&handle).await, 3);
}

/// creating, failed: the remote diagnostic surfaces after the second fetch
#[tokio::test(start_paused = true)]
async fn test_create_failure_stops_polling() {
    let (driver, sim) = driver(
        SimulatedCloud::<Instance>::new([InstanceStatus::Pending, InstanceStatus::Failed])
            .unwrap()
            .with_failure_message("InsufficientInstanceCapacity"),
    );

    let started = Instant::now();
    let err = driver.create(&spec("web-1"), &wait(600)).await.unwrap_err();

    assert_eq!(started.elapsed(), Duration::from_secs(1));
    match &err {
        ReconcileError::TerminalFailure {
            reason, operation, ..
        } => {
            assert_eq!(reason, "InsufficientInstanceCapacity");
            assert_eq!(*operation, Operation::Create);
        }
        other => panic!("expected terminal failure, got {other}"),
    }
    assert!(!err.is_retryable());
    assert_eq!(sim.fetch_count(err.handle().unwrap()).await, 2);
}

/// Deleting an already-deleted resource succeeds, twice
#[tokio::test(start_paused = true)]
async fn test_delete_is_idempotent() {
    let (driver, sim) = driver(
        SimulatedCloud::<Subnet>::new([SubnetStatus::Available])
            .unwrap()
            .with_delete_statuses([SubnetStatus::Deleting, SubnetStatus::Deleting]),
    );
    let subnet = driver.create(&spec("private-a"), &wait(60)).await.unwrap();

    let mut handle = subnet.handle.clone();
    let started = Instant::now();
    driver.delete(&mut handle, &wait(60)).await.unwrap();
    assert!(handle.is_empty());
    assert_eq!(started.elapsed(), Duration::from_secs(2));

    // stale copy of the id: the remote says not found
    let mut stale = subnet.handle.clone();
    driver.delete(&mut stale, &wait(60)).await.unwrap();
    assert!(stale.is_empty());

    // cleared id: nothing to do at all
    driver.delete(&mut handle, &wait(60)).await.unwrap();

    assert_eq!(
        sim.calls().await,
        vec![
            Call::Create("private-a".into()),
            Call::Delete(subnet.handle.clone()),
            Call::Delete(subnet.handle.clone()),
        ]
    );
}

/// NotFound on the first delete-wait fetch means deleted, with no further fetch
#[tokio::test(start_paused = true)]
async fn test_delete_not_found_on_first_fetch() {
    let (driver, sim) =
        driver(SimulatedCloud::<SecurityGroup>::new([SecurityGroupStatus::Active]).unwrap());
    let sg = driver.create(&spec("web"), &wait(60)).await.unwrap();
    let before = sim.fetch_count(&sg.handle).await;

    let mut handle = sg.handle.clone();
    let started = Instant::now();
    driver.delete(&mut handle, &wait(60)).await.unwrap();

    assert!(handle.is_empty());
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(sim.fetch_count(&sg.handle).await, before + 1);
}

/// A volume whose creation failed can still be deleted
#[tokio::test(start_paused = true)]
async fn test_delete_cleans_up_failed_volume() {
    let (driver, _sim) = driver(
        SimulatedCloud::<Volume>::new([VolumeStatus::Creating, VolumeStatus::Error])
            .unwrap()
            .with_delete_statuses([VolumeStatus::Error, VolumeStatus::Deleting]),
    );

    let err = driver.create(&spec("data"), &wait(60)).await.unwrap_err();
    assert!(matches!(err, ReconcileError::TerminalFailure { .. }));

    let mut handle = err.handle().unwrap().clone();
    driver.delete(&mut handle, &wait(60)).await.unwrap();
    assert!(handle.is_empty());
}

/// A rejected peering request fails creation
#[tokio::test(start_paused = true)]
async fn test_peering_rejection_fails_create() {
    let (driver, _sim) = driver(
        SimulatedCloud::<VpcPeering>::new([
            VpcPeeringStatus::InitiatingRequest,
            VpcPeeringStatus::PendingAcceptance,
            VpcPeeringStatus::Rejected,
        ])
        .unwrap(),
    );

    let err = driver.create(&spec("to-shared"), &wait(60)).await.unwrap_err();
    match err {
        ReconcileError::TerminalFailure { reason, .. } => {
            assert_eq!(reason, "remote reported status 'rejected'");
        }
        other => panic!("expected terminal failure, got {other}"),
    }
}

/// Cancellation mid-sleep returns promptly and keeps the handle
#[tokio::test(start_paused = true)]
async fn test_cancel_while_waiting() {
    let (driver, _sim) =
        driver(SimulatedCloud::<DatabaseCluster>::new([DatabaseClusterStatus::Creating]).unwrap());

    let cancel = CancellationToken::new();
    let policy = WaitPolicy::Wait(
        PollConfig::new(Duration::from_secs(2))
            .with_deadline(Duration::from_secs(1800))
            .with_cancel(cancel.clone()),
    );
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1500)).await;
        cancel.cancel();
    });

    let started = Instant::now();
    let err = driver.create(&spec("orders"), &policy).await.unwrap_err();

    assert_eq!(started.elapsed(), Duration::from_millis(1500));
    assert!(matches!(
        err,
        ReconcileError::Cancelled {
            operation: Operation::Create,
            ..
        }
    ));
    assert_eq!(err.handle().unwrap().as_str(), "database_cluster-000001");
}

/// A fetch that never returns is abandoned at the deadline
#[tokio::test(start_paused = true)]
async fn test_hung_fetch_abandoned_at_deadline() {
    let (driver, sim) = driver(SimulatedCloud::<Vpc>::new([VpcStatus::Pending]).unwrap());
    sim.inject([Fault::Hang]).await;

    let started = Instant::now();
    let err = driver.create(&spec("main"), &wait(5)).await.unwrap_err();

    assert_eq!(started.elapsed(), Duration::from_secs(5));
    assert!(matches!(err, ReconcileError::Timeout { .. }));
}

/// Transient fetch errors are retried in place
#[tokio::test(start_paused = true)]
async fn test_transient_errors_are_retried() {
    let (driver, sim) =
        driver(SimulatedCloud::<Vpc>::new([VpcStatus::Pending, VpcStatus::Available]).unwrap());
    sim.inject([
        Fault::Error(ApiError::Transport("connection reset by peer".into())),
        Fault::Error(ApiError::Unauthorized("token expired".into())),
    ])
    .await;

    let vpc = driver.create(&spec("main"), &wait(60)).await.unwrap();
    assert_eq!(vpc.snapshot.unwrap().status, VpcStatus::Available);
    assert_eq!(sim.fetch_count(&vpc.handle).await, 4);
}

/// Too many transient errors in a row give up with the handle
#[tokio::test(start_paused = true)]
async fn test_transient_errors_exhausted() {
    let (driver, sim) = driver(SimulatedCloud::<Vpc>::new([VpcStatus::Available]).unwrap());
    sim.inject((0..4).map(|_| Fault::Error(ApiError::Transport("503".into()))))
        .await;

    let err = driver.create(&spec("main"), &wait(60)).await.unwrap_err();
    match &err {
        ReconcileError::Transport {
            attempts, source, ..
        } => {
            assert_eq!(*attempts, 4);
            assert_eq!(*source, ApiError::Transport("503".into()));
        }
        other => panic!("expected transport error, got {other}"),
    }
    assert!(err.is_retryable());
    assert_eq!(err.handle().unwrap().as_str(), "vpc-000001");
}

/// A rejected create is reported once and never retried
#[tokio::test(start_paused = true)]
async fn test_create_rejection_is_not_retried() {
    let (driver, sim) = driver(SimulatedCloud::<Vpc>::new([VpcStatus::Available]).unwrap());
    sim.reject_next_create("VpcLimitExceeded").await;

    let err = driver.create(&spec("main"), &wait(60)).await.unwrap_err();
    assert!(matches!(
        err,
        ReconcileError::Api {
            operation: Operation::Create,
            source: ApiError::Rejected(_),
            ..
        }
    ));
    assert!(err.handle().is_none());
    assert_eq!(sim.calls().await, vec![Call::Create("main".into())]);
}

/// Update waits for the resource to settle again
#[tokio::test(start_paused = true)]
async fn test_update_waits_until_settled() {
    let (driver, sim) = driver(
        SimulatedCloud::<SecurityGroup>::new([SecurityGroupStatus::Active])
            .unwrap()
            .with_update_statuses([
                SecurityGroupStatus::Updating,
                SecurityGroupStatus::Updating,
                SecurityGroupStatus::Active,
            ]),
    );
    let sg = driver.create(&spec("web"), &wait(60)).await.unwrap();

    let started = Instant::now();
    let snapshot = driver
        .update(
            &sg.handle,
            &serde_json::json!({ "ingress": ["0.0.0.0/0:443"] }),
            &wait(60),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(started.elapsed(), Duration::from_secs(2));
    assert_eq!(snapshot.status, SecurityGroupStatus::Active);
    assert_eq!(
        snapshot.get_attribute::<Vec<String>>("ingress"),
        Some(vec!["0.0.0.0/0:443".to_string()])
    );
    assert_eq!(sim.calls().await.len(), 2);
}

/// Fire-and-forget delete leaves the handle for the next read to clear
#[tokio::test(start_paused = true)]
async fn test_fire_and_forget_delete_then_read() {
    let (driver, _sim) = driver(
        SimulatedCloud::<Vpc>::new([VpcStatus::Available])
            .unwrap()
            .with_delete_statuses([VpcStatus::Deleting]),
    );
    let vpc = driver.create(&spec("main"), &wait(60)).await.unwrap();

    let mut handle = vpc.handle.clone();
    driver
        .delete(&mut handle, &WaitPolicy::FireAndForget)
        .await
        .unwrap();
    assert_eq!(handle, vpc.handle);

    let snapshot = driver.read(&mut handle).await.unwrap().unwrap();
    assert_eq!(snapshot.status, VpcStatus::Deleting);
    assert!(!handle.is_empty());

    assert!(driver.read(&mut handle).await.unwrap().is_none());
    assert!(handle.is_empty());
}

/// Resuming a wait on a resource that is gone reports not found
#[tokio::test(start_paused = true)]
async fn test_await_ready_on_missing_resource() {
    let (driver, _sim) = driver(SimulatedCloud::<Vpc>::new([VpcStatus::Available]).unwrap());

    let missing = ResourceHandle::new("vpc-999999");
    let err = driver.await_ready(&missing, &config(60)).await.unwrap_err();
    assert!(matches!(err, ReconcileError::NotFound { .. }));
}

/// Independent resources wait concurrently without affecting each other
#[tokio::test(start_paused = true)]
async fn test_concurrent_creates_are_independent() {
    let (driver, sim) = driver(
        SimulatedCloud::<Vpc>::new([VpcStatus::Pending, VpcStatus::Pending, VpcStatus::Available])
            .unwrap(),
    );

    let (spec_a, spec_b, spec_c) = (spec("a"), spec("b"), spec("c"));
    let policy = wait(60);

    let started = Instant::now();
    let (a, b, c) = tokio::join!(
        driver.create(&spec_a, &policy),
        driver.create(&spec_b, &policy),
        driver.create(&spec_c, &policy),
    );
    let handles = [a.unwrap().handle, b.unwrap().handle, c.unwrap().handle];

    // sharing a clock does not serialize the waits
    assert_eq!(started.elapsed(), Duration::from_secs(2));
    for handle in &handles {
        assert_eq!(sim.fetch_count(handle).await, 3);
    }
    assert_ne!(handles[0], handles[1]);
    assert_ne!(handles[1], handles[2]);
}

/// Deadlines come from the kind's defaults unless settings override them
#[test]
fn test_poll_config_from_settings() {
    let settings = WaitSettings::default();
    let create = LifecycleDriverFor::<DatabaseCluster>::poll_config(
        &settings,
        Operation::Create,
        CancellationToken::new(),
    )
    .unwrap();
    assert_eq!(create.deadline, Some(Duration::from_secs(1800)));
    assert_eq!(create.interval, Duration::from_secs(2));

    let delete = LifecycleDriverFor::<DatabaseCluster>::poll_config(
        &settings,
        Operation::Delete,
        CancellationToken::new(),
    )
    .unwrap();
    assert_eq!(delete.deadline, None);

    let mut settings = WaitSettings::default();
    settings.kinds.insert(
        "database_cluster".to_string(),
        provflow_config::KindTimeouts {
            create_timeout_secs: Some(3600),
            ..Default::default()
        },
    );
    let create = LifecycleDriverFor::<DatabaseCluster>::poll_config(
        &settings,
        Operation::Create,
        CancellationToken::new(),
    )
    .unwrap();
    assert_eq!(create.deadline, Some(Duration::from_secs(3600)));
}
