//! Capture session controller.
//!
//! Owns the capture mode (live camera vs. selected file), produces stills on
//! demand, serializes registration/recognition requests, and keeps the UI's
//! roster and statistics fresh.
//!
//! ```text
//! Start -> Camera (stream acquired) | Camera (no stream) on denial
//! Camera --select_file--> File
//! File --reset_to_camera / auto-reset after registration--> Camera
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use crate::capture::{decode_raster, encode_jpeg, CameraProvider, CameraStream};
use crate::config::SessionConfig;
use crate::error::{FacedeskError, Result};
use crate::model::{CaptureMode, EnrolledPerson, RecognitionOutcome, Still};
use crate::notify::{NotificationSink, Preview, StatusLevel, UiEvent};
use crate::phrases::Phrases;
use crate::service::FaceService;

/// A file chosen by the user, sent verbatim while File mode is active.
struct PendingFile {
    bytes: Vec<u8>,
    filename: String,
    selection: u64,
}

/// The active image source. Holding the stream or the file inside the
/// variant keeps "file only in File mode, stream only in Camera mode" true
/// by construction.
enum Source {
    Camera(Option<Arc<dyn CameraStream>>),
    File(PendingFile),
}

struct SessionState {
    source: Source,
    /// Bumped by every `select_file`.
    selections: u64,
}

impl SessionState {
    fn mode(&self) -> CaptureMode {
        match self.source {
            Source::Camera(_) => CaptureMode::Camera,
            Source::File(_) => CaptureMode::File,
        }
    }
}

#[derive(Default)]
struct Tasks {
    refresh: Option<JoinHandle<()>>,
    reset: Option<JoinHandle<()>>,
}

impl Tasks {
    fn abort_all(&mut self) {
        for handle in [self.refresh.take(), self.reset.take()].into_iter().flatten() {
            handle.abort();
        }
    }
}

struct Inner {
    config: SessionConfig,
    phrases: Phrases,
    service: Arc<dyn FaceService>,
    camera: Arc<dyn CameraProvider>,
    sink: Arc<dyn NotificationSink>,
    state: Mutex<SessionState>,
    in_flight: AtomicBool,
    tasks: Mutex<Tasks>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.tasks
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .abort_all();
    }
}

/// Clears the in-flight flag however the request ends, including when the
/// submitting future is dropped mid-request.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
    sink: &'a dyn NotificationSink,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
        self.sink.publish(UiEvent::Busy(false));
    }
}

/// Handle to a capture session. Clones share the same session.
#[derive(Clone)]
pub struct CaptureSession {
    inner: Arc<Inner>,
}

impl CaptureSession {
    /// Create a session in Camera mode with no stream yet.
    ///
    /// Call [`start`](Self::start) to acquire the camera and begin refreshing.
    pub fn new(
        config: SessionConfig,
        service: Arc<dyn FaceService>,
        camera: Arc<dyn CameraProvider>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let phrases = Phrases::new(config.locale);
        Self {
            inner: Arc::new(Inner {
                config,
                phrases,
                service,
                camera,
                sink,
                state: Mutex::new(SessionState {
                    source: Source::Camera(None),
                    selections: 0,
                }),
                in_flight: AtomicBool::new(false),
                tasks: Mutex::new(Tasks::default()),
            }),
        }
    }

    pub fn mode(&self) -> CaptureMode {
        self.state().mode()
    }

    /// Whether a live camera stream is currently held.
    pub fn has_camera_stream(&self) -> bool {
        matches!(self.state().source, Source::Camera(Some(_)))
    }

    /// Name of the selected file, if File mode is active.
    pub fn pending_filename(&self) -> Option<String> {
        match &self.state().source {
            Source::File(file) => Some(file.filename.clone()),
            Source::Camera(_) => None,
        }
    }

    /// Whether a registration or recognition request is outstanding.
    pub fn is_busy(&self) -> bool {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    pub fn phrases(&self) -> &Phrases {
        &self.inner.phrases
    }

    /// Acquire the camera, publish initial data and start the refresh loop.
    ///
    /// A camera failure is reported to the sink and does not stop the session.
    pub async fn start(&self) {
        info!(api_url = %self.inner.config.api_url, "Starting capture session");
        let _ = self.acquire_camera().await;
        self.refresh_data().await;
        self.spawn_refresh_loop();
    }

    /// Stop background tasks and release the camera.
    pub fn shutdown(&self) {
        self.tasks().abort_all();
        self.state().source = Source::Camera(None);
        info!("Capture session shut down");
    }

    /// Request a live stream and switch to Camera mode on success.
    ///
    /// On failure the previous mode is left untouched and
    /// [`FacedeskError::CameraUnavailable`] is reported and returned.
    #[instrument(level = "debug", skip(self))]
    pub async fn acquire_camera(&self) -> Result<()> {
        let selections_before = self.state().selections;

        let stream = match self.inner.camera.acquire().await {
            Ok(stream) => stream,
            Err(err) => {
                let err = match err {
                    FacedeskError::CameraUnavailable(_) => err,
                    other => FacedeskError::CameraUnavailable(other.to_string()),
                };
                warn!(error = %err, "Camera acquisition failed");
                self.publish_status(StatusLevel::Error, self.inner.phrases.describe_error(&err));
                return Err(err);
            }
        };

        let (width, height) = stream.resolution();
        {
            let mut state = self.state();
            if state.selections != selections_before {
                debug!("File selected while acquiring camera; keeping file mode");
                return Ok(());
            }
            state.source = Source::Camera(Some(stream));
        }

        info!(width, height, "Camera stream acquired");
        self.publish(UiEvent::ModeChanged(CaptureMode::Camera));
        self.publish_status(StatusLevel::Info, self.inner.phrases.camera_active());
        Ok(())
    }

    /// Switch to File mode with user-chosen bytes.
    ///
    /// The bytes are not validated as an image; the service decides. A
    /// preview is decoded and published, and a decode failure only produces
    /// a [`UiEvent::PreviewFailed`].
    #[instrument(level = "debug", skip(self, bytes, filename), fields(bytes = bytes.len()))]
    pub async fn select_file(&self, bytes: Vec<u8>, filename: impl Into<String>) -> Result<()> {
        let filename = filename.into();
        if bytes.is_empty() {
            let err = FacedeskError::Validation(format!("{filename} is empty"));
            self.publish_status(StatusLevel::Error, self.inner.phrases.describe_error(&err));
            return Err(err);
        }

        let preview_bytes = bytes.clone();
        {
            let mut state = self.state();
            state.selections += 1;
            let selection = state.selections;
            state.source = Source::File(PendingFile {
                bytes,
                filename: filename.clone(),
                selection,
            });
        }

        info!(filename = %filename, "File selected");
        self.publish(UiEvent::ModeChanged(CaptureMode::File));
        self.publish_status(StatusLevel::Info, self.inner.phrases.file_loaded());

        match decode_raster(preview_bytes).await {
            Ok(image) => self.publish(UiEvent::Preview(Preview {
                filename,
                image: Arc::new(image),
            })),
            Err(err) => {
                debug!(error = %err, "Preview decode failed");
                self.publish(UiEvent::PreviewFailed {
                    filename,
                    reason: err.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Drop the selected file and go back to the camera, re-acquiring it.
    pub async fn reset_to_camera(&self) -> Result<()> {
        let was_file = {
            let mut state = self.state();
            let was_file = matches!(state.source, Source::File(_));
            if was_file {
                state.source = Source::Camera(None);
            }
            was_file
        };
        if was_file {
            self.publish(UiEvent::ModeChanged(CaptureMode::Camera));
        }
        self.acquire_camera().await
    }

    /// Produce the still that would be sent right now.
    ///
    /// File mode returns the selected bytes unchanged. Camera mode grabs and
    /// encodes the current frame, so consecutive calls may differ.
    pub async fn capture_still(&self) -> Result<Still> {
        let stream = match &self.state().source {
            Source::File(file) => return Ok(Still::from_file(file.bytes.clone(), &file.filename)),
            Source::Camera(Some(stream)) => Arc::clone(stream),
            Source::Camera(None) => return Err(FacedeskError::NoActiveStream),
        };

        let frame = stream.grab_frame().await?;
        let quality = self.inner.config.jpeg_quality;
        let (width, height) = frame.dimensions();
        let jpeg = tokio::task::spawn_blocking(move || encode_jpeg(&frame, quality))
            .await
            .map_err(|e| FacedeskError::Image(format!("encode task failed: {e}")))??;

        debug!(width, height, bytes = jpeg.len(), "Captured camera still");
        Ok(Still::from_camera(jpeg))
    }

    /// Register `name` with the current still.
    ///
    /// The name is trimmed and must not be empty. Only one submit may be
    /// outstanding; a concurrent call fails with
    /// [`FacedeskError::RequestInFlight`].
    #[instrument(level = "info", skip(self))]
    pub async fn submit_registration(&self, name: &str) -> Result<EnrolledPerson> {
        let name = name.trim();
        if name.is_empty() {
            let err = FacedeskError::Validation(self.inner.phrases.name_required());
            self.publish_status(StatusLevel::Error, self.inner.phrases.describe_error(&err));
            return Err(err);
        }

        let guard = self.begin_request()?;
        self.publish_status(StatusLevel::Info, self.inner.phrases.registering());

        let result = async {
            let still = self.capture_still().await?;
            self.inner.service.register(name, still).await
        }
        .await;
        drop(guard);

        match result {
            Ok(enrolled) => {
                self.on_registered(&enrolled);
                self.refresh_data().await;
                Ok(enrolled)
            }
            Err(err) => {
                self.report_failure(&err, false);
                Err(err)
            }
        }
    }

    /// Identify the face in the current still.
    #[instrument(level = "info", skip(self))]
    pub async fn submit_recognition(&self) -> Result<RecognitionOutcome> {
        let guard = self.begin_request()?;
        self.publish_status(StatusLevel::Info, self.inner.phrases.analyzing());

        let result = async {
            let still = self.capture_still().await?;
            self.inner.service.recognize(still).await
        }
        .await;
        drop(guard);

        match result {
            Ok(outcome) => {
                self.on_recognized(&outcome);
                self.refresh_data().await;
                Ok(outcome)
            }
            Err(err) => {
                self.report_failure(&err, true);
                Err(err)
            }
        }
    }

    /// Fetch statistics and the roster and publish whatever arrives.
    ///
    /// Failures are logged and swallowed; the next tick retries.
    pub async fn refresh_data(&self) {
        let (stats, persons) = tokio::join!(self.inner.service.stats(), self.inner.service.persons());

        match stats {
            Ok(stats) => self.publish(UiEvent::StatsUpdated(stats)),
            Err(err) => warn!(error = %err, "Failed to refresh stats"),
        }
        match persons {
            Ok(persons) => {
                debug!(count = persons.len(), "Roster refreshed");
                self.publish(UiEvent::RosterUpdated(persons));
            }
            Err(err) => warn!(error = %err, "Failed to refresh roster"),
        }
    }

    fn begin_request(&self) -> Result<InFlightGuard<'_>> {
        if self
            .inner
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            let err = FacedeskError::RequestInFlight;
            warn!("Submit rejected: request already in flight");
            self.publish_status(StatusLevel::Error, self.inner.phrases.describe_error(&err));
            return Err(err);
        }
        self.publish(UiEvent::Busy(true));
        Ok(InFlightGuard {
            flag: &self.inner.in_flight,
            sink: self.inner.sink.as_ref(),
        })
    }

    fn on_registered(&self, enrolled: &EnrolledPerson) {
        let phrases = &self.inner.phrases;
        info!(name = %enrolled.name, "Registration succeeded");

        self.publish(UiEvent::ClearNameInput);
        self.publish_status(StatusLevel::Success, phrases.registered(&enrolled.name));
        self.publish(UiEvent::Result {
            level: StatusLevel::Success,
            title: phrases.registered_title(),
            body: phrases.welcome(&enrolled.name),
        });
        self.speak(phrases.welcome_registered_speech(&enrolled.name));

        let selection = match &self.state().source {
            Source::File(file) => Some(file.selection),
            Source::Camera(_) => None,
        };
        if let Some(selection) = selection {
            self.schedule_camera_reset(selection);
        }
    }

    fn on_recognized(&self, outcome: &RecognitionOutcome) {
        let phrases = &self.inner.phrases;
        match outcome {
            RecognitionOutcome::Recognized {
                name,
                confidence_percent,
            } => {
                info!(name = %name, confidence = confidence_percent, "Face recognized");
                self.publish_status(StatusLevel::Success, phrases.identified());
                self.publish(UiEvent::Result {
                    level: StatusLevel::Success,
                    title: name.clone(),
                    body: phrases.confidence(*confidence_percent),
                });
                self.speak(phrases.recognized_speech(name));
            }
            RecognitionOutcome::Unknown { confidence_percent } => {
                info!(confidence = confidence_percent, "Face not recognized");
                self.publish_status(StatusLevel::Error, phrases.unknown());
                self.publish(UiEvent::Result {
                    level: StatusLevel::Error,
                    title: phrases.not_recognized_title(),
                    body: format!(
                        "{}\n{}",
                        phrases.confidence(*confidence_percent),
                        phrases.please_register()
                    ),
                });
                self.speak(phrases.unknown_speech());
                self.publish(UiEvent::FocusNameInput);
            }
        }
    }

    fn report_failure(&self, err: &FacedeskError, speak: bool) {
        warn!(error = %err, "Request failed");
        let message = self.inner.phrases.describe_error(err);
        self.publish_status(StatusLevel::Error, message.clone());
        self.publish(UiEvent::Result {
            level: StatusLevel::Error,
            title: self.inner.phrases.error_title(),
            body: message,
        });
        if speak {
            self.speak(self.inner.phrases.error_speech());
        }
    }

    /// Return to the camera after `reset_delay`, unless another file has been
    /// selected (or the camera re-entered) in the meantime.
    fn schedule_camera_reset(&self, selection: u64) {
        let weak = Arc::downgrade(&self.inner);
        let delay = self.inner.config.reset_delay;
        debug!(delay_ms = delay.as_millis() as u64, "Scheduling return to camera");

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(session) = upgrade(&weak) else {
                return;
            };
            let still_selected = matches!(
                &session.state().source,
                Source::File(file) if file.selection == selection
            );
            if still_selected {
                info!("Returning to camera after file registration");
                let _ = session.reset_to_camera().await;
            }
        });

        if let Some(previous) = self.tasks().reset.replace(handle) {
            previous.abort();
        }
    }

    fn spawn_refresh_loop(&self) {
        let weak = Arc::downgrade(&self.inner);
        let period = self.inner.config.refresh_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(session) = upgrade(&weak) else {
                    break;
                };
                session.refresh_data().await;
            }
            debug!("Refresh loop stopped");
        });

        if let Some(previous) = self.tasks().refresh.replace(handle) {
            previous.abort();
        }
    }

    fn publish(&self, event: UiEvent) {
        self.inner.sink.publish(event);
    }

    fn publish_status(&self, level: StatusLevel, message: String) {
        self.publish(UiEvent::Status { level, message });
    }

    fn speak(&self, text: String) {
        self.publish(UiEvent::Speak {
            text,
            lang: self.inner.phrases.speech_lang(),
        });
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn tasks(&self) -> MutexGuard<'_, Tasks> {
        self.inner
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn upgrade(weak: &Weak<Inner>) -> Option<CaptureSession> {
    weak.upgrade().map(|inner| CaptureSession { inner })
}
