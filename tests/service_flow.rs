mod common;

use std::sync::atomic::Ordering;

use common::{ScriptedCamera, ScriptedService, Step, jpeg_file, prediction};
use leaf_diagnosis::analysis::{AnalysisError, AnalysisStatus, FailureKind, SubmitReport};
use leaf_diagnosis::capture::{CaptureConfig, CaptureManager, CaptureStatus, Facing};
use leaf_diagnosis::diagnosis::{ConfidenceBand, DiagnosisTable, Fallback, Severity};
use leaf_diagnosis::source::{
    DropEvent, ImageFile, ImageSourceResolver, PayloadOrigin, SourceConfig, SourceError,
};
use leaf_diagnosis::{AppConfig, AppError, DiagnosisService};
use tokio::sync::oneshot;

fn service(steps: Vec<Step>) -> (
    DiagnosisService<ScriptedCamera, ScriptedService>,
    std::sync::Arc<common::CameraCounters>,
) {
    let (camera, counters) = ScriptedCamera::new();
    let service = DiagnosisService::new(
        &AppConfig::default(),
        camera,
        ScriptedService::new(steps),
        DiagnosisTable::builtin(),
    );
    (service, counters)
}

#[tokio::test]
async fn camera_capture_becomes_payload_and_releases_stream() {
    let (service, counters) = service(vec![Step::Now(prediction("late_blight", 0.97))]);

    let status = service.start_camera(None).await.expect("camera should start");
    assert_eq!(
        status,
        CaptureStatus::Active {
            facing: Facing::Rear,
            width: 64,
            height: 48
        }
    );

    let summary = service.capture_photo().await.expect("capture should succeed");

    assert_eq!(summary.origin, PayloadOrigin::Camera);
    assert_eq!(summary.mime_type, "image/jpeg");
    assert!(summary.file_name.starts_with("leaf-") && summary.file_name.ends_with(".jpg"));
    assert_eq!(service.capture().status(), CaptureStatus::Idle);
    assert_eq!(counters.live.load(Ordering::SeqCst), 0);
    assert_eq!(service.live_previews(), 1);

    let report = service.analyze().await;
    let view = service.view();

    assert_eq!(report, SubmitReport::Completed(AnalysisStatus::Succeeded));
    let diagnosis = view.diagnosis.expect("diagnosis should be present");
    assert_eq!(diagnosis.record.severity(), Severity::Danger);
    assert_eq!(diagnosis.severity_title, "Critical Alert");
    assert_eq!(diagnosis.confidence_band, ConfidenceBand::Strong);
    assert!(diagnosis.very_high_confidence);
}

#[tokio::test]
async fn denied_camera_surfaces_device_unavailable_and_stays_idle() {
    let (service, counters) = service(vec![]);
    counters.deny.store(true, Ordering::SeqCst);

    let err = service
        .start_camera(Some(Facing::Front))
        .await
        .expect_err("start should fail");

    assert_eq!(err.code(), "DEVICE_UNAVAILABLE");
    assert_eq!(service.capture().status(), CaptureStatus::Idle);
    assert_eq!(counters.live.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn capture_without_camera_is_rejected() {
    let (service, _) = service(vec![]);

    let result = service.capture_photo().await;

    assert!(matches!(result, Err(AppError::Capture(_))));
    assert!(service.view().selection.is_none());
}

#[tokio::test]
async fn switching_camera_keeps_a_single_stream() {
    let (service, counters) = service(vec![]);
    service.start_camera(None).await.expect("camera should start");

    let status = service.switch_camera().await.expect("switch should succeed");

    assert!(matches!(status, CaptureStatus::Active { facing: Facing::Front, .. }));
    assert_eq!(counters.opened.load(Ordering::SeqCst), 2);
    assert_eq!(counters.live.load(Ordering::SeqCst), 1);

    service.stop_camera();
    service.stop_camera();
    assert_eq!(counters.live.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn early_blight_file_is_reported_as_warning() {
    let (service, _) = service(vec![Step::Now(prediction("early_blight", 0.73))]);
    service.select_file(jpeg_file("leaf.jpg")).expect("file should be accepted");

    service.analyze().await;
    let view = service.view();

    assert_eq!(view.analysis, AnalysisStatus::Succeeded);
    let diagnosis = view.diagnosis.expect("diagnosis should be present");
    assert_eq!(diagnosis.record.severity(), Severity::Warning);
    assert_eq!(diagnosis.record.confidence_percent(), 73);
    assert_eq!(diagnosis.display_label, "early blight");
    assert_eq!(diagnosis.confidence_band, ConfidenceBand::Moderate);
}

#[tokio::test]
async fn no_leaf_is_danger_with_retake_guidance() {
    let (service, _) = service(vec![Step::Now(prediction("no_leaf", 0.40))]);
    service.select_file(jpeg_file("blurry.jpg")).expect("file should be accepted");

    service.analyze().await;
    let diagnosis = service.view().diagnosis.expect("diagnosis should be present");

    assert_eq!(diagnosis.record.severity(), Severity::Danger);
    assert_eq!(diagnosis.record.confidence_percent(), 40);
    assert_eq!(diagnosis.confidence_band, ConfidenceBand::Weak);
    assert!(diagnosis.record.recommended_action().contains("close-up"));
}

#[tokio::test]
async fn unrecognized_label_depends_on_table_fallback() {
    let (service, _) = service(vec![Step::Now(prediction("rust_spot", 0.88))]);
    service.select_file(jpeg_file("leaf.jpg")).expect("file should be accepted");
    service.analyze().await;

    let diagnosis = service.view().diagnosis.expect("diagnosis should be present");
    assert_eq!(diagnosis.record.severity(), Severity::Healthy);
    assert_eq!(diagnosis.severity_title, "Healthy Plant");
    assert!(!diagnosis.record.recognized());

    let strict = DiagnosisService::new(
        &AppConfig::default(),
        ScriptedCamera::new().0,
        ScriptedService::new(vec![Step::Now(prediction("rust_spot", 0.88))]),
        DiagnosisTable::builtin()
            .with_fallback(Fallback::Unknown)
            .expect("fallback should be valid"),
    );
    strict.select_file(jpeg_file("leaf.jpg")).expect("file should be accepted");
    strict.analyze().await;

    let diagnosis = strict.view().diagnosis.expect("diagnosis should be present");
    assert_eq!(diagnosis.record.severity(), Severity::Unknown);
}

#[tokio::test]
async fn rejected_file_keeps_selection_and_result() {
    let (service, _) = service(vec![Step::Now(prediction("healthy", 0.95))]);
    let first = service.select_file(jpeg_file("leaf.jpg")).expect("file should be accepted");
    service.analyze().await;

    let err = service
        .select_file(ImageFile::new("notes.txt", Some("text/plain"), b"hello".to_vec()))
        .expect_err("text file should be rejected");
    let view = service.view();

    assert_eq!(err.code(), "UNSUPPORTED_TYPE");
    assert_eq!(view.selection.map(|s| s.id), Some(first.id));
    assert_eq!(view.analysis, AnalysisStatus::Succeeded);
}

#[tokio::test]
async fn new_selection_clears_prior_result_before_submit() {
    let (service, _) = service(vec![
        Step::Now(prediction("healthy", 0.95)),
        Step::Now(prediction("late_blight", 0.81)),
    ]);
    service.select_file(jpeg_file("first.jpg")).expect("file should be accepted");
    service.analyze().await;
    assert_eq!(service.view().analysis, AnalysisStatus::Succeeded);

    service.select_file(jpeg_file("second.jpg")).expect("file should be accepted");
    let view = service.view();

    assert_eq!(view.analysis, AnalysisStatus::Idle);
    assert!(view.diagnosis.is_none());
    assert_eq!(service.live_previews(), 1);

    service.analyze().await;
    let diagnosis = service.view().diagnosis.expect("diagnosis should be present");
    assert_eq!(diagnosis.record.raw_label(), "late_blight");
}

#[tokio::test]
async fn stale_response_is_discarded_after_reselection() {
    let (release, gate) = oneshot::channel();
    let (service, _) = service(vec![
        Step::Gate(gate),
        Step::Now(prediction("healthy", 0.92)),
    ]);
    service.select_file(jpeg_file("first.jpg")).expect("file should be accepted");

    let user = async {
        tokio::task::yield_now().await;
        assert_eq!(service.view().analysis, AnalysisStatus::Pending);
        assert_eq!(service.analyze().await, SubmitReport::AlreadyPending);

        service.select_file(jpeg_file("second.jpg")).expect("file should be accepted");
        release
            .send(prediction("late_blight", 0.99))
            .expect("gate receiver alive");
    };
    let (report, ()) = tokio::join!(service.analyze(), user);

    assert_eq!(report, SubmitReport::Discarded);
    assert_eq!(service.view().analysis, AnalysisStatus::Idle);
    assert!(service.view().diagnosis.is_none());

    service.analyze().await;
    let view = service.view();
    assert_eq!(view.selection.map(|s| s.file_name), Some("second.jpg".to_string()));
    assert_eq!(
        view.diagnosis.map(|d| d.record.raw_label().to_string()),
        Some("healthy".to_string())
    );
}

#[tokio::test]
async fn transport_failure_shows_generic_message() {
    let (service, _) = service(vec![Step::Now(Err(AnalysisError::transport(
        FailureKind::HttpStatus(500),
        "Traceback: model.h5 missing",
    )))]);
    service.select_file(jpeg_file("leaf.jpg")).expect("file should be accepted");

    let report = service.analyze().await;
    let view = service.view();

    assert_eq!(report, SubmitReport::Completed(AnalysisStatus::Failed));
    let failure = view.failure.expect("failure should be present");
    assert_eq!(failure.code, "TRANSPORT_FAILURE");
    assert_eq!(failure.kind, Some(FailureKind::HttpStatus(500)));
    assert!(!failure.message.contains("Traceback"));

    service.clear();
    let view = service.view();
    assert_eq!(view.analysis, AnalysisStatus::Idle);
    assert!(view.selection.is_none());
    assert_eq!(service.live_previews(), 0);
}

#[tokio::test]
async fn analyze_without_selection_does_nothing() {
    let (service, _) = service(vec![]);

    assert_eq!(service.analyze().await, SubmitReport::NoPayload);
    assert_eq!(service.analysis().service().calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn drop_of_non_image_is_ignored() {
    let (service, _) = service(vec![]);

    let result = service
        .drop_files(DropEvent::new(vec![ImageFile::new(
            "report.pdf",
            Some("application/pdf"),
            b"%PDF-1.7".to_vec(),
        )]))
        .expect("drop should not error");

    assert!(result.is_none());
    assert!(service.view().selection.is_none());

    let accepted = service
        .drop_files(DropEvent::new(vec![jpeg_file("leaf.jpg")]))
        .expect("drop should not error")
        .expect("image should be accepted");
    assert_eq!(accepted.origin, PayloadOrigin::Drop);
}

#[tokio::test]
async fn dropping_service_stops_camera() {
    let (service, counters) = service(vec![]);
    service.start_camera(None).await.expect("camera should start");
    assert_eq!(counters.live.load(Ordering::SeqCst), 1);

    drop(service);

    assert_eq!(counters.live.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn view_serializes_for_presentation() {
    let (service, _) = service(vec![Step::Now(prediction("early_blight", 0.9))]);
    service.select_file(jpeg_file("leaf.jpg")).expect("file should be accepted");
    service.analyze().await;

    let json = serde_json::to_value(service.view()).expect("view should serialize");

    assert_eq!(json["capture"]["state"], "idle");
    assert_eq!(json["analysis"], "succeeded");
    assert_eq!(json["diagnosis"]["severity"], "warning");
    assert_eq!(json["diagnosis"]["very_high_confidence"], true);
    assert!(json.get("preview_url").is_none());
}

#[test]
fn concurrent_selection_never_shows_result_of_other_image() {
    let service = DiagnosisService::new(
        &AppConfig::default(),
        ScriptedCamera::new().0,
        ScriptedService::echo(),
        DiagnosisTable::builtin(),
    );
    service.select_file(jpeg_file("leaf-0.jpg")).expect("file should be accepted");

    std::thread::scope(|scope| {
        scope.spawn(|| {
            for i in 1..=200 {
                service
                    .select_file(jpeg_file(&format!("leaf-{}.jpg", i)))
                    .expect("file should be accepted");
                std::thread::yield_now();
            }
        });

        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime should build");
        for _ in 0..200 {
            runtime.block_on(service.analyze());
            let view = service.view();
            if let Some(diagnosis) = view.diagnosis {
                let selection = view.selection.expect("result implies a selection");
                assert_eq!(diagnosis.record.raw_label(), selection.file_name);
            }
        }
    });

    assert_ne!(service.view().analysis, AnalysisStatus::Pending);
}

#[tokio::test]
async fn rejected_capture_keeps_camera_running() {
    let (camera, counters) = ScriptedCamera::new();
    let manager = CaptureManager::new(camera, CaptureConfig::default());
    manager.start_capture(Facing::Rear).await.expect("camera should start");
    let mut resolver = ImageSourceResolver::new(SourceConfig {
        max_file_size: 4,
        ..SourceConfig::default()
    });

    let empty = resolver.from_capture(
        ImageFile::new("leaf-1.jpg", Some("image/jpeg"), Vec::<u8>::new()),
        &manager,
    );
    assert!(matches!(empty, Err(SourceError::UnsupportedType(_))));
    let oversized = resolver.from_capture(jpeg_file("leaf-2.jpg"), &manager);
    assert!(matches!(oversized, Err(SourceError::ResourceLimit(_))));

    assert!(manager.status().is_active());
    assert_eq!(counters.live.load(Ordering::SeqCst), 1);
    assert!(resolver.active().is_none());

    let mut resolver = ImageSourceResolver::new(SourceConfig::default());
    let payload = resolver
        .from_capture(jpeg_file("leaf-3.jpg"), &manager)
        .expect("capture should be accepted");
    assert_eq!(payload.origin(), PayloadOrigin::Camera);
    assert_eq!(manager.status(), CaptureStatus::Idle);
    assert_eq!(counters.live.load(Ordering::SeqCst), 0);
}
