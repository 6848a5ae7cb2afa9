//! Scenario suite against scripted collaborators.
//!
//! Every test runs with paused time, so multi-minute budgets elapse
//! instantly while elapsed-time assertions stay exact to the poll tick.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;
use telemetry_checks::meters::{
    self, GLANCE_NOTIFICATIONS, KEYSTONE_GROUP_NOTIFICATIONS, KEYSTONE_PROJECT_NOTIFICATIONS,
    KEYSTONE_ROLE_NOTIFICATIONS, KEYSTONE_TRUST_NOTIFICATIONS, KEYSTONE_USER_NOTIFICATIONS,
    NEUTRON_FLOATINGIP_NOTIFICATIONS, NEUTRON_NETWORK_NOTIFICATIONS, NEUTRON_PORT_NOTIFICATIONS,
    NEUTRON_ROUTER_NOTIFICATIONS, NEUTRON_SUBNET_NOTIFICATIONS, NOVA_NOTIFICATIONS,
    SAHARA_CLUSTER_NOTIFICATIONS, SNAPSHOT_NOTIFICATIONS, VOLUME_NOTIFICATIONS,
};
use telemetry_checks::scenarios::{
    self, check_alarm_state, check_glance_notifications, check_keystone_notifications,
    check_neutron_notifications, check_sahara_notifications, check_volume_notifications,
    create_sample,
};
use telemetry_checks::waits::{wait_for_resource_status, wait_for_statistic, wait_metrics};
use telemetry_checks::{Scenario, ScenarioContext, ScenarioStatus, StepStatus, StepVerifier};
use telemetry_common::config::Config;
use telemetry_common::error::CollaboratorError;
use telemetry_common::query::ResourceFilter;
use telemetry_common::types::{AlarmState, ResourceKind, ResourceSpec};
use telemetry_test_utils::{
    init_test_tracing, sample, statistic, test_config, MockPlatform, MockTelemetry, TEST_IMAGE_ID,
};
use tokio::time::Instant;

// ============================================================================
// Test Helpers
// ============================================================================

fn context_with(config: Config, telemetry: &MockTelemetry, platform: &MockPlatform) -> ScenarioContext {
    init_test_tracing();
    ScenarioContext::new(config, Arc::new(telemetry.clone()), Arc::new(platform.clone()))
}

fn context(telemetry: &MockTelemetry, platform: &MockPlatform) -> ScenarioContext {
    context_with(test_config(), telemetry, platform)
}

/// Store one sample of every meter for `resource`.
fn seed<S: AsRef<str>>(telemetry: MockTelemetry, resource: &str, meters: &[S]) -> MockTelemetry {
    meters
        .iter()
        .fold(telemetry, |t, m| t.with_sample(sample(resource, m.as_ref())))
}

fn statuses(report: &telemetry_checks::ScenarioReport) -> Vec<(u32, StepStatus)> {
    report.steps().iter().map(|s| (s.number, s.status)).collect()
}

// ============================================================================
// Engine properties
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_created_instance_metric_arrives_on_third_tick() {
    let telemetry = MockTelemetry::new().with_sample_script(
        "instance:create",
        vec![vec![], vec![], vec![sample("instance-1", "instance:create")]],
    );
    let platform = MockPlatform::new();
    let ctx = context(&telemetry, &platform);
    let budget = Duration::from_secs(200);

    let mut verifier = StepVerifier::new("end_to_end");
    let spec = ResourceSpec::new(ResourceKind::Instance, "vm");
    let instance = verifier
        .verify(budget, 1, "Instance is not available.", "Instance is active.", || async {
            let handle = ctx.platform().create_resource(&spec).await?;
            wait_for_resource_status(&ctx, &handle, "ACTIVE", budget).await?;
            Ok::<_, telemetry_checks::PollError>(handle)
        })
        .await
        .unwrap();

    let start = Instant::now();
    let filter = ResourceFilter::resource(&instance.id);
    verifier
        .verify(
            Duration::from_secs(600),
            2,
            "Nova notifications is not received.",
            "Nova notifications is received.",
            || wait_metrics(&ctx, &["instance:create"], &filter, Duration::from_secs(600)),
        )
        .await
        .unwrap();
    let elapsed = start.elapsed();

    // Queries run at t=0, 2s and 4s with a 2s interval: the third one succeeds
    assert!(
        elapsed >= Duration::from_secs(4) && elapsed <= Duration::from_secs(6),
        "elapsed {elapsed:?}"
    );
    assert_eq!(telemetry.sample_calls("instance:create"), 3);

    let report = verifier.finish(Ok(()));
    assert!(report.passed());
    assert_eq!(
        statuses(&report),
        vec![(1, StepStatus::Passed), (2, StepStatus::Passed)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_statistic_timeout_is_recorded_as_failed_step() {
    let telemetry = MockTelemetry::new();
    let ctx = context(&telemetry, &MockPlatform::new());
    let deadline = Duration::from_secs(5);
    let filter = ResourceFilter::new();

    let mut verifier = StepVerifier::new("statistic_timeout");
    let start = Instant::now();
    let err = verifier
        .verify(
            deadline,
            1,
            "Statistic for Nova notification:cpu_util is not received.",
            "Statistic for Nova notification:cpu_util is received.",
            || wait_for_statistic(&ctx, "cpu_util", &filter, deadline),
        )
        .await
        .unwrap_err();
    let elapsed = start.elapsed();

    assert!(elapsed >= deadline && elapsed < deadline + Duration::from_secs(2));
    assert!(err
        .to_string()
        .contains("Statistic for Nova notification:cpu_util is not received."));

    let report = verifier.finish(Err(err));
    assert_eq!(report.status(), ScenarioStatus::Failed);
    let failed = report.first_failure().unwrap();
    assert_eq!(failed.number, 1);
    assert!(failed.message.contains("statistic of cpu_util not available"));
    assert!(failed.elapsed_ms >= 5000);
}

// ============================================================================
// check_alarm_state
// ============================================================================

fn instance_telemetry() -> MockTelemetry {
    let telemetry = seed(MockTelemetry::new(), "instance-1", NOVA_NOTIFICATIONS);
    seed(telemetry, "instance-1", &meters::pollsters_for(false, "m1.tiny"))
        .with_statistic_script("cpu_util", vec![vec![], vec![statistic(12.0)]])
        .with_alarm_states(vec![
            AlarmState::InsufficientData,
            AlarmState::InsufficientData,
            AlarmState::Ok,
        ])
}

#[tokio::test(start_paused = true)]
async fn test_alarm_state_passes_all_seven_steps() {
    let telemetry = instance_telemetry();
    let platform = MockPlatform::new().with_statuses(ResourceKind::Instance, &["BUILD", "ACTIVE"]);
    let ctx = context(&telemetry, &platform);

    let report = check_alarm_state(&ctx).await;

    assert!(report.passed(), "{report}");
    assert_eq!(report.steps().len(), 7);

    let alarms = telemetry.created_alarms();
    assert_eq!(alarms.len(), 1);
    assert_eq!(alarms[0].meter_name, "cpu_util");
    assert!((alarms[0].threshold - 11.0).abs() < f64::EPSILON);
    assert_eq!(alarms[0].period, 600);
    assert!(alarms[0].name.starts_with("ceilometer-alarm"));
}

#[tokio::test(start_paused = true)]
async fn test_alarm_state_skips_without_image() {
    let telemetry = MockTelemetry::new();
    let platform = MockPlatform::new().without_image();
    let ctx = context(&telemetry, &platform);

    let report = check_alarm_state(&ctx).await;

    assert_eq!(report.status(), ScenarioStatus::Skipped);
    assert!(report.steps().is_empty());
    assert!(platform.created().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_alarm_state_stops_when_instance_errors() {
    let telemetry = instance_telemetry();
    let platform = MockPlatform::new().with_statuses(ResourceKind::Instance, &["BUILD", "ERROR"]);
    let ctx = context(&telemetry, &platform);
    let start = Instant::now();

    let report = check_alarm_state(&ctx).await;

    assert_eq!(
        statuses(&report),
        vec![(1, StepStatus::Passed), (2, StepStatus::Failed)]
    );
    assert!(report.steps()[1].message.contains("Instance is not available."));
    assert!(report.steps()[1].message.contains("ERROR"));
    assert!(start.elapsed() < Duration::from_secs(10));
    assert_eq!(telemetry.sample_calls("memory"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_alarm_state_fails_when_alarm_is_never_evaluated() {
    let telemetry = instance_telemetry().with_alarm_states(vec![AlarmState::InsufficientData]);
    let ctx = context(&telemetry, &MockPlatform::new());

    let report = check_alarm_state(&ctx).await;

    let failed = report.first_failure().unwrap();
    assert_eq!(failed.number, 7);
    assert!(failed.message.contains("Alarm verify state is failed."));
    assert!(failed.message.contains("insufficient data"));
}

#[tokio::test(start_paused = true)]
async fn test_alarm_state_rejected_alarm_stops_before_evaluation() {
    let telemetry = instance_telemetry().failing_create_alarm(CollaboratorError::RequestFailed {
        status: 400,
        body: "threshold rule is invalid".to_string(),
    });
    let ctx = context(&telemetry, &MockPlatform::new());

    let report = check_alarm_state(&ctx).await;

    assert_eq!(report.status(), ScenarioStatus::Failed);
    let failed = report.first_failure().unwrap();
    assert_eq!(failed.number, 6);
    assert!(failed.message.contains("Creation alarm for sum cpu_util is failed."));
    assert!(failed.message.contains("threshold rule is invalid"));
    assert_eq!(report.steps().len(), 6);
    assert_eq!(telemetry.alarm_state_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_volume_notifications_survive_transient_query_error() {
    let telemetry = seed(MockTelemetry::new(), "volume-1", VOLUME_NOTIFICATIONS);
    let telemetry = seed(telemetry, "snapshot-2", SNAPSHOT_NOTIFICATIONS).with_sample_responses(
        "volume.size",
        vec![
            Err(CollaboratorError::RequestFailed {
                status: 503,
                body: "service unavailable".to_string(),
            }),
            Ok(vec![sample("volume-1", "volume.size")]),
        ],
    );
    let ctx = context(&telemetry, &MockPlatform::new());

    let report = check_volume_notifications(&ctx).await;

    assert!(report.passed(), "{report}");
    assert!(telemetry.sample_calls("volume.size") >= 2);
}

#[tokio::test(start_paused = true)]
async fn test_alarm_state_on_vcenter_skips_notifications_and_uses_vsphere_pollsters() {
    let telemetry = seed(
        MockTelemetry::new(),
        "instance-1",
        &meters::pollsters_for(true, "m1.small"),
    )
    .with_statistic_script("cpu_util", vec![vec![statistic(3.0)]])
    .with_alarm_states(vec![AlarmState::Alarm]);
    let platform = MockPlatform::new().with_flavor("m1.small");
    let mut config = test_config();
    config.compute.use_vcenter = true;
    let ctx = context_with(config, &telemetry, &platform);

    let report = check_alarm_state(&ctx).await;

    assert!(report.passed(), "{report}");
    assert_eq!(telemetry.sample_calls("memory"), 0);
    assert_eq!(
        platform.created()[0].attributes.get("image_name").map(String::as_str),
        Some("TestVM-VMDK")
    );
}

// ============================================================================
// create_sample
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_create_sample_passes() {
    let telemetry = MockTelemetry::new();
    let ctx = context(&telemetry, &MockPlatform::new());

    let report = create_sample(&ctx).await;

    assert!(report.passed(), "{report}");
    assert_eq!(report.steps().len(), 5);

    let created = telemetry.created_samples();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].resource_id.as_str(), TEST_IMAGE_ID);
    assert_eq!(created[0].counter_name, "image");
    assert_eq!(created[0].resource_metadata["user"], "example_metadata");
}

#[tokio::test(start_paused = true)]
async fn test_create_sample_fails_fast_on_rejected_sample() {
    let telemetry = MockTelemetry::new()
        .failing_create_sample(CollaboratorError::Unauthorized("token expired".to_string()));
    let ctx = context(&telemetry, &MockPlatform::new());

    let report = create_sample(&ctx).await;

    assert_eq!(
        statuses(&report),
        vec![(1, StepStatus::Passed), (2, StepStatus::Failed)]
    );
    assert!(report.steps()[1]
        .message
        .contains("Creation sample for update image is failed."));
}

#[tokio::test(start_paused = true)]
async fn test_create_sample_fails_when_count_never_grows() {
    // The listing keeps returning one sample even after injection
    let telemetry = MockTelemetry::new()
        .with_sample_script("image", vec![vec![sample(TEST_IMAGE_ID, "image")]]);
    let ctx = context(&telemetry, &MockPlatform::new());

    let report = create_sample(&ctx).await;

    let failed = report.first_failure().unwrap();
    assert_eq!(failed.number, 4);
    assert!(failed.message.contains("waiting for more than 1"));
}

// ============================================================================
// check_volume_notifications
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_volume_notifications_pass() {
    let telemetry = seed(MockTelemetry::new(), "volume-1", VOLUME_NOTIFICATIONS);
    let telemetry = seed(telemetry, "snapshot-2", SNAPSHOT_NOTIFICATIONS);
    let platform = MockPlatform::new()
        .with_statuses(ResourceKind::Volume, &["creating", "available"])
        .with_statuses(ResourceKind::Snapshot, &["creating", "available"]);
    let ctx = context(&telemetry, &platform);

    let report = check_volume_notifications(&ctx).await;

    assert!(report.passed(), "{report}");
    let snapshot = &platform.created()[1];
    assert_eq!(snapshot.kind, ResourceKind::Snapshot);
    assert_eq!(snapshot.parent.as_ref().map(|p| p.as_str()), Some("volume-1"));
}

#[tokio::test(start_paused = true)]
async fn test_volume_notifications_skip_without_backend() {
    let telemetry = MockTelemetry::new();
    let platform = MockPlatform::new();
    let mut config = test_config();
    config.volume.cinder_node_exist = false;
    config.volume.ceph_exist = false;
    let ctx = context_with(config, &telemetry, &platform);

    let report = check_volume_notifications(&ctx).await;

    assert_eq!(report.status(), ScenarioStatus::Skipped);
    assert_eq!(
        report.skip_reason(),
        Some("There are no cinder nodes or ceph storage for volume")
    );
    assert!(platform.created().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_volume_notifications_missing_meter_halts_before_snapshot() {
    let telemetry = MockTelemetry::new().with_sample(sample("volume-1", "volume"));
    let platform = MockPlatform::new();
    let ctx = context(&telemetry, &platform);
    let start = Instant::now();

    let report = check_volume_notifications(&ctx).await;

    let failed = report.first_failure().unwrap();
    assert_eq!(failed.number, 2);
    assert!(failed.message.contains("metrics not received: volume.size"));
    assert!(start.elapsed() >= Duration::from_secs(600));
    assert!(platform.created_of(ResourceKind::Snapshot).is_empty());
}

// ============================================================================
// check_glance_notifications
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_glance_notifications_pass() {
    let telemetry = seed(MockTelemetry::new(), "image-1", GLANCE_NOTIFICATIONS);
    let platform = MockPlatform::new().with_statuses(ResourceKind::Image, &["queued", "active"]);
    let ctx = context(&telemetry, &platform);

    let report = check_glance_notifications(&ctx).await;

    assert!(report.passed(), "{report}");
    assert_eq!(report.steps().len(), 2);
}

// ============================================================================
// check_keystone_notifications
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_keystone_notifications_pass() {
    let telemetry = seed(MockTelemetry::new(), "project-1", KEYSTONE_PROJECT_NOTIFICATIONS);
    let telemetry = seed(telemetry, "user-2", KEYSTONE_USER_NOTIFICATIONS);
    let telemetry = seed(telemetry, "role-3", KEYSTONE_ROLE_NOTIFICATIONS);
    let telemetry = seed(telemetry, "group-4", KEYSTONE_GROUP_NOTIFICATIONS);
    let telemetry = seed(telemetry, "trust-5", KEYSTONE_TRUST_NOTIFICATIONS);
    let platform = MockPlatform::new();
    let ctx = context(&telemetry, &platform);

    let report = check_keystone_notifications(&ctx).await;

    assert!(report.passed(), "{report}");
    assert_eq!(report.steps().len(), 6);
    assert_eq!(platform.created().len(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_keystone_missing_user_notification_stops_later_checks() {
    let telemetry = seed(MockTelemetry::new(), "project-1", KEYSTONE_PROJECT_NOTIFICATIONS);
    let ctx = context(&telemetry, &MockPlatform::new());

    let report = check_keystone_notifications(&ctx).await;

    assert_eq!(
        statuses(&report),
        vec![
            (1, StepStatus::Passed),
            (2, StepStatus::Passed),
            (3, StepStatus::Failed)
        ]
    );
    assert!(report.steps()[2]
        .message
        .contains("Keystone user notifications are not received."));
    assert_eq!(telemetry.sample_calls("identity.role.created"), 0);
}

// ============================================================================
// check_neutron_notifications
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_neutron_notifications_pass() {
    let telemetry = seed(MockTelemetry::new(), "network-1", NEUTRON_NETWORK_NOTIFICATIONS);
    let telemetry = seed(telemetry, "subnet-2", NEUTRON_SUBNET_NOTIFICATIONS);
    let telemetry = seed(telemetry, "port-3", NEUTRON_PORT_NOTIFICATIONS);
    let telemetry = seed(telemetry, "router-4", NEUTRON_ROUTER_NOTIFICATIONS);
    let telemetry = seed(telemetry, "floating_ip-5", NEUTRON_FLOATINGIP_NOTIFICATIONS);
    let ctx = context(&telemetry, &MockPlatform::new());

    let report = check_neutron_notifications(&ctx).await;

    assert!(report.passed(), "{report}");
    assert_eq!(report.steps().len(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_neutron_conflict_fails_creation_step() {
    let platform = MockPlatform::new().failing_create(
        ResourceKind::Router,
        CollaboratorError::RequestFailed {
            status: 409,
            body: "router quota exceeded".to_string(),
        },
    );
    let ctx = context(&MockTelemetry::new(), &platform);

    let report = check_neutron_notifications(&ctx).await;

    assert_eq!(statuses(&report), vec![(1, StepStatus::Failed)]);
    assert!(report.steps()[0].message.contains("router quota exceeded"));
}

// ============================================================================
// check_sahara_notifications
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_sahara_notifications_pass() {
    let telemetry = seed(MockTelemetry::new(), "cluster-1", SAHARA_CLUSTER_NOTIFICATIONS);
    let platform = MockPlatform::new()
        .with_statuses(ResourceKind::Cluster, &["Validating", "Spawning", "Active"]);
    let ctx = context(&telemetry, &platform);

    let report = check_sahara_notifications(&ctx).await;

    assert!(report.passed(), "{report}");
    let cluster = &platform.created()[0];
    assert_eq!(cluster.attributes.get("plugin_name").map(String::as_str), Some("vanilla"));
    assert_eq!(cluster.attributes.get("hadoop_version").map(String::as_str), Some("2.4.1"));
}

#[tokio::test(start_paused = true)]
async fn test_sahara_skips_after_image_lookup_finds_nothing() {
    let platform = MockPlatform::new().without_cluster_image();
    let ctx = context(&MockTelemetry::new(), &platform);

    let report = check_sahara_notifications(&ctx).await;

    assert_eq!(report.status(), ScenarioStatus::Skipped);
    assert_eq!(statuses(&report), vec![(1, StepStatus::Passed)]);
    assert!(platform.created().is_empty());
}

// ============================================================================
// Suite
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_suite_runs_every_scenario_in_order() {
    let platform = MockPlatform::new().without_image().without_cluster_image();
    let mut config = test_config();
    config.volume.cinder_node_exist = false;
    let ctx = context_with(config, &MockTelemetry::new(), &platform);

    let reports = scenarios::run_suite(&ctx).await;

    let names: Vec<&str> = reports.iter().map(|r| r.scenario()).collect();
    let expected: Vec<&str> = Scenario::ALL.iter().map(|s| s.name()).collect();
    assert_eq!(names, expected);

    let verdicts: Vec<ScenarioStatus> = reports.iter().map(|r| r.status()).collect();
    assert_eq!(
        verdicts,
        vec![
            ScenarioStatus::Skipped,
            ScenarioStatus::Skipped,
            ScenarioStatus::Skipped,
            ScenarioStatus::Failed,
            ScenarioStatus::Failed,
            ScenarioStatus::Failed,
            ScenarioStatus::Skipped,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_report_exports_json() {
    let telemetry = seed(MockTelemetry::new(), "image-1", GLANCE_NOTIFICATIONS);
    let ctx = context(&telemetry, &MockPlatform::new());

    let report = Scenario::GlanceNotifications.run(&ctx).await;
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

    assert_eq!(json["scenario"], "check_glance_notifications");
    assert_eq!(json["status"], "passed");
    assert_eq!(json["steps"].as_array().map(Vec::len), Some(2));
}
