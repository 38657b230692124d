//! Capture session behaviour tests.
//!
//! The session is driven with an in-memory service, camera and sink so every
//! request, frame and UI event can be observed.

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use facedesk_core::{
    CameraProvider, CameraStream, CaptureMode, CaptureSession, EnrolledPerson, FaceService,
    FacedeskError, PersonRecord, RecognitionOutcome, Result, SessionConfig, Stats, StatusLevel,
    Still, UiEvent,
};
use image::{Rgb, RgbImage};
use tokio::sync::Notify;

// ============================================================================
// Fakes
// ============================================================================

#[derive(Default)]
struct FakeService {
    register_replies: Mutex<VecDeque<Result<EnrolledPerson>>>,
    recognize_replies: Mutex<VecDeque<Result<RecognitionOutcome>>>,
    uploads: Mutex<Vec<Still>>,
    register_calls: AtomicUsize,
    recognize_calls: AtomicUsize,
    stats_calls: AtomicUsize,
    persons_calls: AtomicUsize,
    fail_stats: AtomicBool,
    /// When set, submits park until the gate is notified.
    gate: Mutex<Option<Arc<Notify>>>,
    entered: Notify,
}

impl FakeService {
    fn reply_register(&self, reply: Result<EnrolledPerson>) {
        self.register_replies.lock().unwrap().push_back(reply);
    }

    fn reply_recognize(&self, reply: Result<RecognitionOutcome>) {
        self.recognize_replies.lock().unwrap().push_back(reply);
    }

    fn hold_requests(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    fn last_upload(&self) -> Option<Still> {
        self.uploads.lock().unwrap().last().cloned()
    }

    async fn wait_at_gate(&self) {
        self.entered.notify_one();
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl FaceService for FakeService {
    async fn register(&self, name: &str, still: Still) -> Result<EnrolledPerson> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        self.uploads.lock().unwrap().push(still);
        self.wait_at_gate().await;
        let reply = self.register_replies.lock().unwrap().pop_front();
        reply.unwrap_or_else(|| {
            Ok(EnrolledPerson {
                name: name.to_string(),
                message: None,
            })
        })
    }

    async fn recognize(&self, still: Still) -> Result<RecognitionOutcome> {
        self.recognize_calls.fetch_add(1, Ordering::SeqCst);
        self.uploads.lock().unwrap().push(still);
        self.wait_at_gate().await;
        let reply = self.recognize_replies.lock().unwrap().pop_front();
        reply.unwrap_or(Ok(RecognitionOutcome::Unknown {
            confidence_percent: 0.0,
        }))
    }

    async fn stats(&self) -> Result<Stats> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_stats.load(Ordering::SeqCst) {
            return Err(FacedeskError::Transport("connection refused".into()));
        }
        Ok(Stats {
            person_count: 1,
            success_rate: 50.0,
            total_attempts: 2,
            recognitions: 1,
            unknown_faces: 1,
            last_activity: None,
        })
    }

    async fn persons(&self) -> Result<Vec<PersonRecord>> {
        self.persons_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![PersonRecord {
            id: Some(1),
            name: "Alice".into(),
            created_at: Utc::now(),
            recognition_count: 3,
            image_path: None,
        }])
    }

    async fn remove_person(&self, name: &str) -> Result<String> {
        Ok(format!("{name} removed"))
    }
}

/// Camera whose every frame is a different flat shade.
struct FakeCamera {
    available: AtomicBool,
    acquisitions: AtomicUsize,
    shade: Arc<AtomicU8>,
}

impl FakeCamera {
    fn new(available: bool) -> Self {
        Self {
            available: AtomicBool::new(available),
            acquisitions: AtomicUsize::new(0),
            shade: Arc::new(AtomicU8::new(0)),
        }
    }
}

struct FakeStream {
    shade: Arc<AtomicU8>,
}

#[async_trait]
impl CameraStream for FakeStream {
    fn resolution(&self) -> (u32, u32) {
        (32, 24)
    }

    async fn grab_frame(&self) -> Result<RgbImage> {
        let shade = self.shade.fetch_add(60, Ordering::SeqCst);
        Ok(RgbImage::from_pixel(32, 24, Rgb([shade, shade, shade])))
    }
}

#[async_trait]
impl CameraProvider for FakeCamera {
    async fn acquire(&self) -> Result<Arc<dyn CameraStream>> {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        if !self.available.load(Ordering::SeqCst) {
            return Err(FacedeskError::CameraUnavailable("permission denied".into()));
        }
        Ok(Arc::new(FakeStream {
            shade: self.shade.clone(),
        }))
    }
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<UiEvent>>,
}

impl RecordingSink {
    fn events(&self) -> Vec<UiEvent> {
        self.events.lock().unwrap().clone()
    }

    fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    fn error_statuses(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                UiEvent::Status {
                    level: StatusLevel::Error,
                    message,
                } => Some(message),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&UiEvent) -> bool) -> usize {
        self.events().iter().filter(|event| pred(event)).count()
    }
}

impl facedesk_core::NotificationSink for RecordingSink {
    fn publish(&self, event: UiEvent) {
        self.events.lock().unwrap().push(event);
    }
}

struct Harness {
    session: CaptureSession,
    service: Arc<FakeService>,
    camera: Arc<FakeCamera>,
    sink: Arc<RecordingSink>,
}

fn harness(camera_available: bool) -> Harness {
    let service = Arc::new(FakeService::default());
    let camera = Arc::new(FakeCamera::new(camera_available));
    let sink = Arc::new(RecordingSink::default());
    let session = CaptureSession::new(
        SessionConfig::default(),
        service.clone(),
        camera.clone(),
        sink.clone(),
    );
    Harness {
        session,
        service,
        camera,
        sink,
    }
}

fn png_bytes(shade: u8) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    RgbImage::from_pixel(8, 8, Rgb([shade, 0, 0]))
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

// ============================================================================
// Capture mode
// ============================================================================

#[tokio::test]
async fn test_capture_returns_most_recent_file_bytes() {
    let h = harness(true);
    h.session.acquire_camera().await.unwrap();

    let selections = [
        (png_bytes(10), "first.png"),
        (b"not an image at all".to_vec(), "second.jpg"),
        (png_bytes(200), "third.png"),
    ];

    for (bytes, name) in selections {
        h.session.select_file(bytes.clone(), name).await.unwrap();
        assert_eq!(h.session.mode(), CaptureMode::File);

        let still = h.session.capture_still().await.unwrap();
        assert_eq!(still.bytes, bytes, "file bytes must be sent unmodified");
        assert_eq!(still.filename, name);

        let again = h.session.capture_still().await.unwrap();
        assert_eq!(again.bytes, bytes, "file capture is repeatable");
    }
}

#[tokio::test]
async fn test_undecodable_file_reports_preview_failure_only() {
    let h = harness(true);
    h.session
        .select_file(b"garbage".to_vec(), "broken.jpg")
        .await
        .unwrap();

    assert_eq!(
        h.sink
            .count(|e| matches!(e, UiEvent::PreviewFailed { filename, .. } if filename == "broken.jpg")),
        1
    );
    assert_eq!(h.sink.count(|e| matches!(e, UiEvent::Preview(_))), 0);
    assert!(h.session.capture_still().await.is_ok());
}

#[tokio::test]
async fn test_decodable_file_publishes_preview() {
    let h = harness(true);
    h.session.select_file(png_bytes(50), "face.png").await.unwrap();

    let previews: Vec<_> = h
        .sink
        .events()
        .into_iter()
        .filter_map(|e| match e {
            UiEvent::Preview(preview) => Some(preview),
            _ => None,
        })
        .collect();
    assert_eq!(previews.len(), 1);
    assert_eq!(previews[0].image.width(), 8);
}

#[tokio::test]
async fn test_empty_file_is_rejected() {
    let h = harness(true);
    h.session.acquire_camera().await.unwrap();

    let result = h.session.select_file(Vec::new(), "empty.jpg").await;
    assert!(matches!(result, Err(FacedeskError::Validation(_))));
    assert_eq!(h.session.mode(), CaptureMode::Camera);
}

#[tokio::test]
async fn test_camera_still_is_a_fresh_snapshot() {
    let h = harness(true);
    h.session.acquire_camera().await.unwrap();

    let first = h.session.capture_still().await.unwrap();
    let second = h.session.capture_still().await.unwrap();

    assert_eq!(first.filename, "capture.jpg");
    assert_eq!(first.content_type, "image/jpeg");
    assert_eq!(&first.bytes[..2], &[0xFF, 0xD8]);
    assert_ne!(first.bytes, second.bytes, "each call grabs a new frame");

    let decoded = image::load_from_memory(&first.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (32, 24));
}

#[tokio::test]
async fn test_camera_denial_keeps_session_usable() {
    let h = harness(false);
    h.session.start().await;

    assert_eq!(h.session.mode(), CaptureMode::Camera);
    assert!(!h.session.has_camera_stream());
    assert!(h
        .sink
        .error_statuses()
        .iter()
        .any(|m| m.contains("permission denied")));

    assert!(matches!(
        h.session.capture_still().await,
        Err(FacedeskError::NoActiveStream)
    ));

    h.session.select_file(png_bytes(1), "fallback.png").await.unwrap();
    assert!(h.session.submit_recognition().await.is_ok());
    h.session.shutdown();
}

#[tokio::test]
async fn test_failed_acquire_leaves_file_mode_untouched() {
    let h = harness(false);
    let bytes = png_bytes(7);
    h.session.select_file(bytes.clone(), "kept.png").await.unwrap();

    let result = h.session.acquire_camera().await;
    assert!(matches!(result, Err(FacedeskError::CameraUnavailable(_))));
    assert_eq!(h.session.mode(), CaptureMode::File);
    assert_eq!(h.session.capture_still().await.unwrap().bytes, bytes);
}

#[tokio::test]
async fn test_reset_to_camera_drops_file_and_reacquires() {
    let h = harness(true);
    h.session.acquire_camera().await.unwrap();
    h.session.select_file(png_bytes(3), "old.png").await.unwrap();
    assert!(!h.session.has_camera_stream());

    h.session.reset_to_camera().await.unwrap();
    assert_eq!(h.session.mode(), CaptureMode::Camera);
    assert!(h.session.has_camera_stream());
    assert!(h.session.pending_filename().is_none());
    assert_eq!(h.camera.acquisitions.load(Ordering::SeqCst), 2);
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_blank_name_never_reaches_the_service() {
    let h = harness(true);
    h.session.acquire_camera().await.unwrap();

    for name in ["", "   ", "\t\n "] {
        let result = h.session.submit_registration(name).await;
        assert!(matches!(result, Err(FacedeskError::Validation(_))));
    }

    assert_eq!(h.service.register_calls.load(Ordering::SeqCst), 0);
    assert!(!h.session.is_busy());
    assert_eq!(h.sink.error_statuses().len(), 3);
}

#[tokio::test]
async fn test_registration_trims_name_and_announces() {
    let h = harness(true);
    h.session.acquire_camera().await.unwrap();
    h.sink.clear();

    let enrolled = h.session.submit_registration("  Alice  ").await.unwrap();
    assert_eq!(enrolled.name, "Alice");

    let upload = h.service.last_upload().unwrap();
    assert_eq!(upload.filename, "capture.jpg");

    assert_eq!(h.sink.count(|e| matches!(e, UiEvent::ClearNameInput)), 1);
    assert_eq!(
        h.sink
            .count(|e| matches!(e, UiEvent::Speak { text, .. } if text.contains("Alice"))),
        1
    );
    assert_eq!(h.sink.count(|e| matches!(e, UiEvent::Busy(true))), 1);
    assert_eq!(h.sink.count(|e| matches!(e, UiEvent::Busy(false))), 1);
    assert_eq!(h.service.stats_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.service.persons_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_service_detail_is_surfaced_verbatim() {
    let h = harness(true);
    h.session.acquire_camera().await.unwrap();
    h.service.reply_register(Err(FacedeskError::Service {
        status: 400,
        detail: Some("Name already exists".into()),
    }));

    let err = h.session.submit_registration("Alice").await.unwrap_err();
    assert_eq!(err.service_detail(), Some("Name already exists"));
    assert!(h
        .sink
        .error_statuses()
        .contains(&"Name already exists".to_string()));
    assert_eq!(h.service.register_calls.load(Ordering::SeqCst), 1, "no retry");
    assert_eq!(h.sink.count(|e| matches!(e, UiEvent::ClearNameInput)), 0);
}

#[tokio::test]
async fn test_transport_failure_surfaces_generic_message() {
    let h = harness(true);
    h.session.acquire_camera().await.unwrap();
    h.service
        .reply_register(Err(FacedeskError::Transport("connection reset".into())));

    let err = h.session.submit_registration("Alice").await.unwrap_err();
    assert!(matches!(err, FacedeskError::Transport(_)));
    assert!(h
        .sink
        .error_statuses()
        .contains(&"Unable to reach the server".to_string()));
    assert_eq!(h.service.register_calls.load(Ordering::SeqCst), 1, "no retry");
}

#[tokio::test]
async fn test_registration_without_any_source_fails_locally() {
    let h = harness(false);

    let err = h.session.submit_registration("Alice").await.unwrap_err();
    assert!(matches!(err, FacedeskError::NoActiveStream));
    assert_eq!(h.service.register_calls.load(Ordering::SeqCst), 0);
    assert!(!h.session.is_busy());
}

// ============================================================================
// In-flight guard
// ============================================================================

#[tokio::test]
async fn test_second_submit_is_rejected_while_pending() {
    let h = harness(true);
    h.session.acquire_camera().await.unwrap();
    let gate = h.service.hold_requests();

    let pending = {
        let session = h.session.clone();
        tokio::spawn(async move { session.submit_registration("Alice").await })
    };
    h.service.entered.notified().await;
    assert!(h.session.is_busy());

    assert!(matches!(
        h.session.submit_recognition().await,
        Err(FacedeskError::RequestInFlight)
    ));
    assert!(matches!(
        h.session.submit_registration("Bob").await,
        Err(FacedeskError::RequestInFlight)
    ));

    gate.notify_one();
    let enrolled = pending.await.unwrap().unwrap();
    assert_eq!(enrolled.name, "Alice");
    assert_eq!(h.service.register_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.service.recognize_calls.load(Ordering::SeqCst), 0);
    assert!(!h.session.is_busy());
}

#[tokio::test]
async fn test_guard_is_released_after_every_outcome() {
    let h = harness(true);
    h.session.acquire_camera().await.unwrap();

    h.service.reply_register(Ok(EnrolledPerson {
        name: "Alice".into(),
        message: None,
    }));
    h.service.reply_register(Err(FacedeskError::Service {
        status: 500,
        detail: None,
    }));
    h.service
        .reply_register(Err(FacedeskError::Transport("timed out".into())));

    assert!(h.session.submit_registration("Alice").await.is_ok());
    assert!(!h.session.is_busy());
    assert!(matches!(
        h.session.submit_registration("Alice").await,
        Err(FacedeskError::Service { .. })
    ));
    assert!(!h.session.is_busy());
    assert!(matches!(
        h.session.submit_registration("Alice").await,
        Err(FacedeskError::Transport(_))
    ));
    assert!(!h.session.is_busy());

    assert!(h.session.submit_recognition().await.is_ok());
    assert_eq!(h.service.register_calls.load(Ordering::SeqCst), 3);
    assert_eq!(h.service.recognize_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_guard_is_released_after_every_recognition_outcome() {
    let h = harness(true);
    h.session.acquire_camera().await.unwrap();

    h.service.reply_recognize(Ok(RecognitionOutcome::Unknown {
        confidence_percent: 10.0,
    }));
    h.service.reply_recognize(Err(FacedeskError::Service {
        status: 400,
        detail: Some("No face detected".into()),
    }));
    h.service
        .reply_recognize(Err(FacedeskError::Transport("connection reset".into())));

    assert!(h.session.submit_recognition().await.is_ok());
    assert!(!h.session.is_busy());
    assert!(matches!(
        h.session.submit_recognition().await,
        Err(FacedeskError::Service { .. })
    ));
    assert!(!h.session.is_busy());
    assert!(matches!(
        h.session.submit_recognition().await,
        Err(FacedeskError::Transport(_))
    ));
    assert!(!h.session.is_busy());

    assert!(h.session.submit_registration("Alice").await.is_ok());
    assert_eq!(h.service.recognize_calls.load(Ordering::SeqCst), 3);
    assert_eq!(h.service.register_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.sink.count(|e| matches!(e, UiEvent::Busy(true))), 4);
    assert_eq!(h.sink.count(|e| matches!(e, UiEvent::Busy(false))), 4);
}

#[tokio::test]
async fn test_guard_is_released_when_submit_is_cancelled() {
    let h = harness(true);
    h.session.acquire_camera().await.unwrap();
    let _gate = h.service.hold_requests();

    let pending = {
        let session = h.session.clone();
        tokio::spawn(async move { session.submit_recognition().await })
    };
    h.service.entered.notified().await;
    assert!(h.session.is_busy());

    pending.abort();
    let _ = pending.await;
    assert!(!h.session.is_busy());
}

// ============================================================================
// Recognition
// ============================================================================

#[tokio::test]
async fn test_recognized_outcome_announces_and_refreshes() {
    let h = harness(true);
    h.session.acquire_camera().await.unwrap();
    h.service.reply_recognize(Ok(RecognitionOutcome::Recognized {
        name: "Alice".into(),
        confidence_percent: 97.0,
    }));

    let outcome = h.session.submit_recognition().await.unwrap();
    assert_eq!(
        outcome,
        RecognitionOutcome::Recognized {
            name: "Alice".into(),
            confidence_percent: 97.0
        }
    );
    assert_eq!(h.service.persons_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.sink.count(|e| matches!(e, UiEvent::RosterUpdated(_))), 1);
    assert_eq!(
        h.sink.count(|e| matches!(
            e,
            UiEvent::Result { title, body, .. } if title == "Alice" && body.contains("97")
        )),
        1
    );
    assert_eq!(h.sink.count(|e| matches!(e, UiEvent::FocusNameInput)), 0);
}

#[tokio::test]
async fn test_unknown_outcome_requests_name_focus() {
    let h = harness(true);
    h.session.acquire_camera().await.unwrap();
    h.service.reply_recognize(Ok(RecognitionOutcome::Unknown {
        confidence_percent: 42.0,
    }));

    let outcome = h.session.submit_recognition().await.unwrap();
    assert_eq!(
        outcome,
        RecognitionOutcome::Unknown {
            confidence_percent: 42.0
        }
    );
    assert_eq!(h.sink.count(|e| matches!(e, UiEvent::FocusNameInput)), 1);
    assert_eq!(
        h.sink
            .count(|e| matches!(e, UiEvent::Speak { text, .. } if text.contains("register"))),
        1
    );
    assert_eq!(h.service.stats_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_recognition_failure_speaks_error() {
    let h = harness(true);
    h.session.acquire_camera().await.unwrap();
    h.service.reply_recognize(Err(FacedeskError::Service {
        status: 400,
        detail: Some("No face detected".into()),
    }));

    assert!(h.session.submit_recognition().await.is_err());
    assert!(h
        .sink
        .error_statuses()
        .contains(&"No face detected".to_string()));
    assert_eq!(
        h.sink
            .count(|e| matches!(e, UiEvent::Speak { text, .. } if text == "An error occurred.")),
        1
    );
    assert_eq!(h.service.stats_calls.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Auto-reset and refresh timers
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_file_registration_reverts_to_camera_after_delay() {
    let h = harness(true);
    h.session.acquire_camera().await.unwrap();

    let uploaded = png_bytes(99);
    h.session
        .select_file(uploaded.clone(), "subject.png")
        .await
        .unwrap();
    h.session.submit_registration("Alice").await.unwrap();
    assert_eq!(h.service.last_upload().unwrap().bytes, uploaded);

    tokio::time::sleep(Duration::from_millis(2900)).await;
    assert_eq!(h.session.mode(), CaptureMode::File);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(h.session.mode(), CaptureMode::Camera);
    assert!(h.session.has_camera_stream());

    let still = h.session.capture_still().await.unwrap();
    assert_ne!(still.bytes, uploaded);
    assert_eq!(still.filename, "capture.jpg");
}

#[tokio::test(start_paused = true)]
async fn test_new_file_selection_cancels_pending_reset() {
    let h = harness(true);
    h.session.select_file(png_bytes(1), "first.png").await.unwrap();
    h.session.submit_registration("Alice").await.unwrap();

    let replacement = png_bytes(2);
    h.session
        .select_file(replacement.clone(), "second.png")
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(h.session.mode(), CaptureMode::File);
    assert_eq!(h.session.capture_still().await.unwrap().bytes, replacement);
}

#[tokio::test(start_paused = true)]
async fn test_camera_registration_does_not_schedule_reset() {
    let h = harness(true);
    h.session.acquire_camera().await.unwrap();
    h.session.submit_registration("Alice").await.unwrap();

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(h.camera.acquisitions.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_periodic_refresh_until_shutdown() {
    let h = harness(true);
    h.session.start().await;
    assert_eq!(h.service.stats_calls.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(h.service.stats_calls.load(Ordering::SeqCst), 2);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(h.service.stats_calls.load(Ordering::SeqCst), 3);

    h.session.shutdown();
    assert!(!h.session.has_camera_stream());

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(h.service.stats_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_refresh_failures_are_swallowed() {
    let h = harness(true);
    h.service.fail_stats.store(true, Ordering::SeqCst);

    h.session.refresh_data().await;

    assert_eq!(h.sink.count(|e| matches!(e, UiEvent::StatsUpdated(_))), 0);
    assert_eq!(h.sink.count(|e| matches!(e, UiEvent::RosterUpdated(_))), 1);
    assert!(h.sink.error_statuses().is_empty());
}
