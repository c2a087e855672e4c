//! Session coordinator: the surfaced operations.
//!
//! Each client gets its own session, created with [`SessionCoordinator::open_session`]
//! and addressed by [`SessionId`]. A session's workflow state sits behind its
//! own mutex, held for the whole of each operation, so preview-then-confirm
//! always sees a consistent staged artifact. The session table itself is a
//! read-mostly map behind an `RwLock`.

use crate::core::error::{SessionError, SessionResult};
use crate::core::types::{AppliedSpec, FilterSpec, ImageId, PipelineSpec, RawParams, RawValue, SessionId};
use crate::filters::registry::FilterRegistry;
use crate::pipeline::composer::{ComposedTransform, PipelineComposer};
use crate::session::store::{ImageStore, UploadPayload};
use crate::workflow::record::{ImageStatus, RecordSummary, StagedArtifact};
use crate::workflow::state::WorkflowState;
use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;

/// What `current_image` reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentImage {
    pub id: ImageId,
    pub index: usize,
    pub total: usize,
    pub filter_name: String,
    pub status: ImageStatus,
}

/// Outcome of an export: how many finals were written, and which failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    pub written: usize,
    pub failed: Vec<ExportFailure>,
}

/// A final that could not be written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportFailure {
    pub id: ImageId,
    pub reason: String,
}

impl ExportReport {
    /// Whether every final was written.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// One client's workflow.
#[derive(Debug, Default)]
struct Session {
    state: Mutex<WorkflowState>,
}

/// Owns the registry, the store, and every open session.
pub struct SessionCoordinator {
    registry: Arc<FilterRegistry>,
    store: Arc<dyn ImageStore>,
    sessions: RwLock<HashMap<SessionId, Arc<Session>>>,
}

impl SessionCoordinator {
    /// Create a coordinator.
    pub fn new(registry: Arc<FilterRegistry>, store: Arc<dyn ImageStore>) -> Self {
        Self {
            registry,
            store,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Create a coordinator using the built-in filters.
    pub fn with_builtins(store: Arc<dyn ImageStore>) -> Self {
        Self::new(Arc::new(FilterRegistry::with_builtins()), store)
    }

    /// The filter registry.
    pub fn registry(&self) -> &FilterRegistry {
        &self.registry
    }

    /// Start an empty session.
    pub fn open_session(&self) -> SessionId {
        let id = SessionId::new();
        self.sessions.write().insert(id, Arc::new(Session::default()));
        debug!("Opened session {}", id);
        id
    }

    /// Drop a session and release its images from the store. Exports stay.
    /// Returns whether the session existed.
    pub fn close_session(&self, id: SessionId) -> bool {
        let Some(handle) = self.sessions.write().remove(&id) else {
            return false;
        };
        let state = handle.state.lock();
        self.release(state.ids());
        debug!("Closed session {}", id);
        true
    }

    /// Number of open sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    fn session(&self, id: SessionId) -> SessionResult<Arc<Session>> {
        self.sessions
            .read()
            .get(&id)
            .cloned()
            .ok_or(SessionError::UnknownSession(id))
    }

    fn release(&self, ids: &[ImageId]) {
        for id in ids {
            if let Err(e) = self.store.discard(id) {
                warn!("Could not release {}: {}", id, e);
            }
        }
    }

    // ========================================================================
    // Surfaced operations
    // ========================================================================

    /// Replace the session's batch with the accepted payloads.
    ///
    /// Rejected files are skipped. If nothing is accepted the session keeps
    /// its previous batch and `NoValidImages` is returned. Otherwise the
    /// replaced batch is released from the store.
    pub fn upload(&self, session: SessionId, payloads: &[UploadPayload]) -> SessionResult<Vec<ImageId>> {
        let handle = self.session(session)?;

        let mut ids = Vec::with_capacity(payloads.len());
        for payload in payloads {
            match self.store.accept_upload(payload) {
                Ok(id) => ids.push(id),
                Err(e) => warn!("Skipping upload '{}': {}", payload.filename, e),
            }
        }

        if ids.is_empty() {
            return Err(SessionError::NoValidImages);
        }

        let mut state = handle.state.lock();
        let replaced = state.ids().to_vec();
        state.reset(ids.clone());
        self.release(&replaced);
        drop(state);
        info!("Session {}: uploaded {} of {} files", session, ids.len(), payloads.len());
        Ok(ids)
    }

    /// The image under the cursor.
    pub fn current_image(&self, session: SessionId) -> SessionResult<CurrentImage> {
        let handle = self.session(session)?;
        let state = handle.state.lock();
        let record = state.current()?;
        Ok(CurrentImage {
            id: record.id().clone(),
            index: state.cursor(),
            total: state.len(),
            filter_name: record.applied().name().to_string(),
            status: record.status(),
        })
    }

    /// Preview one named filter on the current image.
    pub fn preview_single(&self, session: SessionId, spec: &FilterSpec) -> SessionResult<StagedArtifact> {
        self.preview(session, |composer| {
            Ok((AppliedSpec::Filter(spec.clone()), composer.single(spec)))
        })
    }

    /// Preview an ordered pipeline on the current image.
    pub fn preview_pipeline(&self, session: SessionId, pipeline: &PipelineSpec) -> SessionResult<StagedArtifact> {
        self.preview(session, |composer| {
            Ok((AppliedSpec::Pipeline(pipeline.clone()), composer.compose(pipeline)))
        })
    }

    /// Preview a pipeline given as a JSON request body.
    ///
    /// The body is only parsed once the session is known to hold images.
    pub fn preview_pipeline_json(&self, session: SessionId, body: &str) -> SessionResult<StagedArtifact> {
        self.preview(session, |composer| {
            let pipeline = parse_pipeline_body(body)?;
            let chain = composer.compose(&pipeline);
            Ok((AppliedSpec::Pipeline(pipeline), chain))
        })
    }

    fn preview<F>(&self, session: SessionId, build: F) -> SessionResult<StagedArtifact>
    where
        F: FnOnce(&PipelineComposer<'_>) -> SessionResult<(AppliedSpec, ComposedTransform)>,
    {
        let handle = self.session(session)?;
        let mut state = handle.state.lock();
        let id = state.current_id()?.clone();
        let (spec, chain) = build(&PipelineComposer::new(&self.registry))?;
        let name = spec.name().to_string();
        let store = &self.store;

        let artifact = state.preview(&id, spec, |id| {
            let original = store
                .load_original(id)
                .map_err(|e| SessionError::load_failure(id, e))?;
            let result = chain.run(&original);
            store
                .save_staged(id, &result)
                .map_err(|e| SessionError::PersistFailure {
                    id: id.clone(),
                    reason: e.to_string(),
                })
        })?;

        debug!("Session {}: previewed {} on {} ({} steps)", session, name, id, chain.len());
        Ok(artifact)
    }

    /// Promote the current image's staged preview.
    pub fn confirm(&self, session: SessionId) -> SessionResult<ImageId> {
        let handle = self.session(session)?;
        let mut state = handle.state.lock();
        let id = state.current_id()?.clone();
        let store = &self.store;
        state.confirm(&id, |artifact| store.load_staged(artifact))?;
        info!("Session {}: confirmed {}", session, id);
        Ok(id)
    }

    /// Move to the next image, stopping at the last.
    pub fn next(&self, session: SessionId) -> SessionResult<usize> {
        self.navigate(session, 1)
    }

    /// Move to the previous image, stopping at the first.
    pub fn prev(&self, session: SessionId) -> SessionResult<usize> {
        self.navigate(session, -1)
    }

    fn navigate(&self, session: SessionId, delta: isize) -> SessionResult<usize> {
        let handle = self.session(session)?;
        let mut state = handle.state.lock();
        state.navigate(delta)
    }

    /// Write every confirmed image to the export area.
    ///
    /// Every final is attempted. Failures are collected in the report; only
    /// when nothing at all could be written is the first failure returned as
    /// `PersistFailure`.
    pub fn export(&self, session: SessionId) -> SessionResult<ExportReport> {
        let handle = self.session(session)?;
        let state = handle.state.lock();
        if state.confirmed_count() == 0 {
            return Err(SessionError::NoConfirmedImages);
        }

        let mut report = ExportReport::default();
        for (id, image) in state.finals() {
            match self.store.persist_final(id, image) {
                Ok(()) => {
                    info!("Session {}: exported {}", session, id.display_name());
                    report.written += 1;
                }
                Err(e) => {
                    warn!("Session {}: failed to export {}: {}", session, id.display_name(), e);
                    report.failed.push(ExportFailure {
                        id: id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if report.written == 0 {
            if let Some(first) = report.failed.first() {
                return Err(SessionError::PersistFailure {
                    id: first.id.clone(),
                    reason: first.reason.clone(),
                });
            }
        }
        Ok(report)
    }

    /// Status of every image in upload order.
    pub fn records(&self, session: SessionId) -> SessionResult<Vec<RecordSummary>> {
        let handle = self.session(session)?;
        let state = handle.state.lock();
        Ok(state.summaries())
    }
}

// ============================================================================
// Request parsing
// ============================================================================

/// Parse `{"steps": [{"filterName": .., "params": {..}}, ..]}`.
///
/// Only the envelope is strict. A step without `filterName` is "None",
/// missing `params` is empty, and a parameter value that is neither a number
/// nor text is treated as absent.
pub fn parse_pipeline_body(body: &str) -> SessionResult<PipelineSpec> {
    let value: JsonValue =
        serde_json::from_str(body).map_err(|e| SessionError::InvalidPipeline(e.to_string()))?;
    parse_pipeline_value(&value)
}

/// Parse an already-decoded pipeline request.
pub fn parse_pipeline_value(value: &JsonValue) -> SessionResult<PipelineSpec> {
    let steps = value
        .get("steps")
        .and_then(JsonValue::as_array)
        .ok_or_else(|| SessionError::InvalidPipeline("missing 'steps' array".to_string()))?;

    steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let step = step
                .as_object()
                .ok_or_else(|| SessionError::InvalidPipeline(format!("step {} is not an object", i)))?;
            let name = step
                .get("filterName")
                .and_then(JsonValue::as_str)
                .unwrap_or("None");
            let params: RawParams = step
                .get("params")
                .and_then(JsonValue::as_object)
                .map(|map| map.iter().map(|(k, v)| (k.clone(), raw_from_json(v))).collect())
                .unwrap_or_default();
            Ok(FilterSpec {
                name: name.to_string(),
                params,
            })
        })
        .collect::<SessionResult<Vec<_>>>()
        .map(PipelineSpec::from)
}

fn raw_from_json(value: &JsonValue) -> RawValue {
    match value {
        JsonValue::Number(n) => n.as_f64().map(RawValue::Number).unwrap_or(RawValue::Null),
        JsonValue::String(s) => RawValue::Text(s.clone()),
        _ => RawValue::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{ErrorKind, StoreError, StoreResult};
    use crate::session::store::MemoryImageStore;
    use image::{DynamicImage, ImageFormat as Encoding, Rgb, RgbImage};
    use std::io::Cursor;

    fn encode(img: RgbImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img).write_to(&mut out, Encoding::Png).unwrap();
        out.into_inner()
    }

    fn solid(value: u8) -> Vec<u8> {
        encode(RgbImage::from_pixel(12, 10, Rgb([value; 3])))
    }

    fn textured() -> Vec<u8> {
        encode(RgbImage::from_fn(12, 10, |x, y| {
            Rgb([(x * 20) as u8, (y * 25) as u8, ((x + y) * 10) as u8])
        }))
    }

    fn setup() -> (SessionCoordinator, Arc<MemoryImageStore>, SessionId) {
        let store = Arc::new(MemoryImageStore::new());
        let coordinator = SessionCoordinator::with_builtins(store.clone());
        let session = coordinator.open_session();
        (coordinator, store, session)
    }

    fn upload_n(coordinator: &SessionCoordinator, session: SessionId, n: usize) -> Vec<ImageId> {
        let payloads: Vec<UploadPayload> = (0..n)
            .map(|i| UploadPayload::new(format!("img{}.png", i), textured()))
            .collect();
        coordinator.upload(session, &payloads).unwrap()
    }

    fn staged(store: &MemoryImageStore, artifact: &StagedArtifact) -> DynamicImage {
        store.load_staged(artifact).unwrap()
    }

    /// Memory store whose exports fail for names starting with "locked".
    #[derive(Default)]
    struct ReadOnlyExports {
        inner: MemoryImageStore,
    }

    impl ImageStore for ReadOnlyExports {
        fn accept_upload(&self, payload: &UploadPayload) -> StoreResult<ImageId> {
            self.inner.accept_upload(payload)
        }

        fn load_original(&self, id: &ImageId) -> StoreResult<DynamicImage> {
            self.inner.load_original(id)
        }

        fn save_staged(&self, id: &ImageId, image: &DynamicImage) -> StoreResult<StagedArtifact> {
            self.inner.save_staged(id, image)
        }

        fn load_staged(&self, artifact: &StagedArtifact) -> StoreResult<DynamicImage> {
            self.inner.load_staged(artifact)
        }

        fn persist_final(&self, id: &ImageId, image: &DynamicImage) -> StoreResult<()> {
            if id.display_name().starts_with("locked") {
                return Err(StoreError::Io {
                    path: id.to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
                });
            }
            self.inner.persist_final(id, image)
        }

        fn discard(&self, id: &ImageId) -> StoreResult<()> {
            self.inner.discard(id)
        }
    }

    fn confirm_all(coordinator: &SessionCoordinator, session: SessionId, n: usize) {
        for _ in 0..n {
            coordinator.preview_single(session, &FilterSpec::new("None")).unwrap();
            coordinator.confirm(session).unwrap();
            coordinator.next(session).unwrap();
        }
    }

    #[test]
    fn test_empty_session_errors() {
        let (coordinator, _, session) = setup();
        let kind = |r: SessionResult<()>| r.unwrap_err().kind();
        assert_eq!(kind(coordinator.current_image(session).map(|_| ())), ErrorKind::EmptySession);
        assert_eq!(
            kind(coordinator.preview_single(session, &FilterSpec::new("CLAHE")).map(|_| ())),
            ErrorKind::EmptySession
        );
        assert_eq!(kind(coordinator.confirm(session).map(|_| ())), ErrorKind::EmptySession);
        assert_eq!(kind(coordinator.next(session).map(|_| ())), ErrorKind::EmptySession);
        assert_eq!(kind(coordinator.prev(session).map(|_| ())), ErrorKind::EmptySession);
        assert_eq!(kind(coordinator.export(session).map(|_| ())), ErrorKind::NoConfirmedImages);
    }

    #[test]
    fn test_unknown_session() {
        let (coordinator, _, _) = setup();
        let stranger = SessionId::new();
        assert!(matches!(
            coordinator.current_image(stranger),
            Err(SessionError::UnknownSession(_))
        ));
    }

    #[test]
    fn test_sessions_are_isolated() {
        let (coordinator, _, first) = setup();
        let second = coordinator.open_session();
        upload_n(&coordinator, first, 2);
        assert!(coordinator.current_image(first).is_ok());
        assert!(matches!(coordinator.current_image(second), Err(SessionError::EmptySession)));

        assert!(coordinator.close_session(second));
        assert!(!coordinator.close_session(second));
        assert_eq!(coordinator.session_count(), 1);
    }

    #[test]
    fn test_upload_skips_rejected_files() {
        let (coordinator, _, session) = setup();
        let ids = coordinator
            .upload(
                session,
                &[
                    UploadPayload::new("notes.txt", b"hello".to_vec()),
                    UploadPayload::new("scan.JPG", solid(10)),
                ],
            )
            .unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(ids[0].display_name(), "scan.JPG");
    }

    #[test]
    fn test_upload_with_nothing_valid() {
        let (coordinator, _, session) = setup();
        upload_n(&coordinator, session, 2);
        let result = coordinator.upload(session, &[UploadPayload::new("a.gif", vec![1])]);
        assert!(matches!(result, Err(SessionError::NoValidImages)));
        assert!(matches!(coordinator.upload(session, &[]), Err(SessionError::NoValidImages)));
        // Previous batch is still there
        assert_eq!(coordinator.current_image(session).unwrap().total, 2);
    }

    #[test]
    fn test_upload_resets_prior_state() {
        let (coordinator, _, session) = setup();
        upload_n(&coordinator, session, 3);
        coordinator.next(session).unwrap();
        coordinator.preview_single(session, &FilterSpec::new("Median Blur")).unwrap();
        coordinator.confirm(session).unwrap();

        upload_n(&coordinator, session, 2);
        let current = coordinator.current_image(session).unwrap();
        assert_eq!(current.index, 0);
        assert_eq!(current.total, 2);
        assert_eq!(current.filter_name, "None");
        let records = coordinator.records(session).unwrap();
        assert!(records.iter().all(|r| r.status == ImageStatus::Untouched && !r.has_final));
        assert!(matches!(coordinator.export(session), Err(SessionError::NoConfirmedImages)));
    }

    #[test]
    fn test_three_image_scenario() {
        let (coordinator, store, session) = setup();
        let ids = upload_n(&coordinator, session, 3);

        coordinator.preview_single(session, &FilterSpec::new("Median Blur")).unwrap();
        assert_eq!(coordinator.confirm(session).unwrap(), ids[0]);
        assert_eq!(coordinator.next(session).unwrap(), 1);
        assert_eq!(coordinator.next(session).unwrap(), 2);
        assert!(matches!(coordinator.confirm(session), Err(SessionError::NoPendingPreview)));

        let report = coordinator.export(session).unwrap();
        assert_eq!(report.written, 1);
        assert!(report.is_complete());
        assert_eq!(store.exported(), vec![ids[0].clone()]);
    }

    #[test]
    fn test_navigation_saturates() {
        let (coordinator, _, session) = setup();
        upload_n(&coordinator, session, 3);
        assert_eq!(coordinator.prev(session).unwrap(), 0);
        coordinator.next(session).unwrap();
        coordinator.next(session).unwrap();
        assert_eq!(coordinator.next(session).unwrap(), 2);
        assert_eq!(coordinator.current_image(session).unwrap().index, 2);
    }

    #[test]
    fn test_gamma_then_otsu_is_binary() {
        let store = Arc::new(MemoryImageStore::new());
        let coordinator = SessionCoordinator::with_builtins(store.clone());
        let session = coordinator.open_session();
        coordinator
            .upload(session, &[UploadPayload::new("gray.png", solid(128))])
            .unwrap();

        let pipeline = PipelineSpec::new()
            .step(FilterSpec::new("Gamma Correction").with_param("gamma", 1.2))
            .step(FilterSpec::new("Otsu Threshold"));
        let artifact = coordinator.preview_pipeline(session, &pipeline).unwrap();
        let out = staged(&store, &artifact).to_rgb8();
        assert!(out.pixels().all(|p| p[0] == 0 || p[0] == 255));
        assert_eq!(coordinator.current_image(session).unwrap().filter_name, "Pipeline");
    }

    #[test]
    fn test_unknown_filter_is_identity() {
        let (coordinator, store, session) = setup();
        let ids = upload_n(&coordinator, session, 1);
        let artifact = coordinator
            .preview_single(session, &FilterSpec::new("NoSuchFilter123"))
            .unwrap();
        let original = store.load_original(&ids[0]).unwrap();
        assert_eq!(staged(&store, &artifact).as_bytes(), original.as_bytes());
        assert_eq!(coordinator.current_image(session).unwrap().filter_name, "NoSuchFilter123");
    }

    #[test]
    fn test_empty_pipeline_is_identity() {
        let (coordinator, store, session) = setup();
        let ids = upload_n(&coordinator, session, 1);
        let artifact = coordinator.preview_pipeline(session, &PipelineSpec::new()).unwrap();
        let original = store.load_original(&ids[0]).unwrap();
        assert_eq!(staged(&store, &artifact).as_bytes(), original.as_bytes());
    }

    #[test]
    fn test_preview_starts_from_original() {
        let (coordinator, store, session) = setup();
        upload_n(&coordinator, session, 1);
        let gamma = FilterSpec::new("Gamma Correction").with_param("gamma", 2.0);
        let first = staged(&store, &coordinator.preview_single(session, &gamma).unwrap());
        let second = staged(&store, &coordinator.preview_single(session, &gamma).unwrap());
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn test_confirm_is_idempotent() {
        let (coordinator, store, session) = setup();
        let ids = upload_n(&coordinator, session, 1);
        coordinator.preview_single(session, &FilterSpec::new("CLAHE")).unwrap();
        coordinator.confirm(session).unwrap();
        coordinator.export(session).unwrap();
        let once = store.exported_image(&ids[0]).unwrap();

        coordinator.confirm(session).unwrap();
        coordinator.export(session).unwrap();
        let twice = store.exported_image(&ids[0]).unwrap();
        assert_eq!(once.as_bytes(), twice.as_bytes());
    }

    #[test]
    fn test_repreview_keeps_final_until_confirm() {
        let (coordinator, store, session) = setup();
        let ids = upload_n(&coordinator, session, 1);
        coordinator
            .preview_single(session, &FilterSpec::new("Manual Threshold"))
            .unwrap();
        coordinator.confirm(session).unwrap();
        coordinator.preview_single(session, &FilterSpec::new("None")).unwrap();

        let current = coordinator.current_image(session).unwrap();
        assert_eq!(current.status, ImageStatus::Previewed);
        assert_eq!(current.filter_name, "None");

        coordinator.export(session).unwrap();
        let exported = store.exported_image(&ids[0]).unwrap().to_rgb8();
        assert!(exported.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn test_confirm_after_staged_loss() {
        let (coordinator, store, session) = setup();
        upload_n(&coordinator, session, 1);
        let artifact = coordinator.preview_single(session, &FilterSpec::new("None")).unwrap();
        store.discard_staged(&artifact);
        assert!(matches!(coordinator.confirm(session), Err(SessionError::NoPendingPreview)));
    }

    #[test]
    fn test_undecodable_original() {
        let (coordinator, _, session) = setup();
        coordinator
            .upload(session, &[UploadPayload::new("broken.png", b"garbage".to_vec())])
            .unwrap();
        let result = coordinator.preview_single(session, &FilterSpec::new("None"));
        assert!(matches!(result, Err(SessionError::ImageLoadFailure { .. })));
        assert_eq!(
            coordinator.current_image(session).unwrap().status,
            ImageStatus::Untouched
        );
    }

    #[test]
    fn test_export_with_nothing_confirmed_writes_nothing() {
        let (coordinator, store, session) = setup();
        upload_n(&coordinator, session, 2);
        coordinator.preview_single(session, &FilterSpec::new("None")).unwrap();
        assert!(matches!(coordinator.export(session), Err(SessionError::NoConfirmedImages)));
        assert!(store.exported().is_empty());
    }

    #[test]
    fn test_preview_pipeline_json() {
        let (coordinator, _, session) = setup();
        upload_n(&coordinator, session, 1);
        let body = r#"{"steps": [
            {"filterName": "Gamma Correction", "params": {"gamma": "1.2"}},
            {"filterName": "Manual Threshold", "params": {"threshold": "128.0"}}
        ]}"#;
        coordinator.preview_pipeline_json(session, body).unwrap();

        let bad = coordinator.preview_pipeline_json(session, r#"{"filters": []}"#);
        assert_eq!(bad.unwrap_err().kind(), ErrorKind::InvalidPipeline);
        let garbage = coordinator.preview_pipeline_json(session, "not json");
        assert_eq!(garbage.unwrap_err().kind(), ErrorKind::InvalidPipeline);
    }

    #[test]
    fn test_pipeline_json_checks_session_before_body() {
        let (coordinator, _, session) = setup();
        let empty = coordinator.preview_pipeline_json(session, r#"{"filters": []}"#);
        assert_eq!(empty.unwrap_err().kind(), ErrorKind::EmptySession);

        let stranger = coordinator.preview_pipeline_json(SessionId::new(), "not json");
        assert!(matches!(stranger, Err(SessionError::UnknownSession(_))));
    }

    #[test]
    fn test_replaced_and_closed_batches_are_released() {
        let (coordinator, store, session) = setup();
        for _ in 0..5 {
            upload_n(&coordinator, session, 1);
            coordinator.preview_single(session, &FilterSpec::new("None")).unwrap();
            assert_eq!(store.held(), (1, 1));
        }

        // A rejected upload keeps the current batch held
        assert!(coordinator.upload(session, &[UploadPayload::new("a.gif", vec![1])]).is_err());
        assert_eq!(store.held(), (1, 1));

        assert!(coordinator.close_session(session));
        assert_eq!(store.held(), (0, 0));
    }

    #[test]
    fn test_close_session_keeps_exports() {
        let (coordinator, store, session) = setup();
        let ids = upload_n(&coordinator, session, 1);
        confirm_all(&coordinator, session, 1);
        coordinator.export(session).unwrap();

        coordinator.close_session(session);
        assert_eq!(store.exported(), ids);
    }

    #[test]
    fn test_export_attempts_every_final() {
        let store = Arc::new(ReadOnlyExports::default());
        let coordinator = SessionCoordinator::with_builtins(store.clone());
        let session = coordinator.open_session();
        let ids = coordinator
            .upload(
                session,
                &[
                    UploadPayload::new("first.png", textured()),
                    UploadPayload::new("locked.png", textured()),
                    UploadPayload::new("last.png", textured()),
                ],
            )
            .unwrap();
        confirm_all(&coordinator, session, 3);

        let report = coordinator.export(session).unwrap();
        assert_eq!(report.written, 2);
        assert!(!report.is_complete());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].id, ids[1]);

        let mut written = vec![ids[0].clone(), ids[2].clone()];
        written.sort();
        assert_eq!(store.inner.exported(), written);
    }

    #[test]
    fn test_export_with_every_write_failing() {
        let coordinator = SessionCoordinator::with_builtins(Arc::new(ReadOnlyExports::default()));
        let session = coordinator.open_session();
        coordinator
            .upload(session, &[UploadPayload::new("locked.png", textured())])
            .unwrap();
        confirm_all(&coordinator, session, 1);

        let result = coordinator.export(session);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::PersistFailure);
    }

    #[test]
    fn test_parse_pipeline_is_lenient_inside_steps() {
        let pipeline = parse_pipeline_body(
            r#"{"steps": [{}, {"filterName": "CLAHE", "params": {"clipLimit": true, "x": null, "y": 3}}]}"#,
        )
        .unwrap();
        assert_eq!(pipeline.len(), 2);
        assert_eq!(pipeline.steps()[0].name, "None");
        assert!(pipeline.steps()[0].params.is_empty());
        assert_eq!(pipeline.steps()[1].params["clipLimit"], RawValue::Null);
        assert_eq!(pipeline.steps()[1].params["y"], RawValue::Number(3.0));

        assert!(parse_pipeline_body(r#"{"steps": [42]}"#).is_err());
        assert!(parse_pipeline_body(r#"{"steps": {}}"#).is_err());
    }
}
