//! The annotation controller.
//!
//! `Annotator` owns the session, the reference data and the tagging state,
//! and drives an attached `DrawingSurface`. Collaborators are injected:
//! the transport behind `AnnotationApi`, a `Notifier` for user-visible
//! messages and a `Navigator` for leaving the page after a save.
//!
//! Network work is split into a synchronous prepare step, the request
//! itself, and a synchronous finish step, so a host that shares the
//! controller through `Rc<RefCell<_>>` never holds a borrow across an
//! await. The `async` methods on `Annotator` chain the three for callers
//! that own the controller outright.

use std::rc::Rc;
use std::time::Duration;

use serde_json::Value;
use treatmark_canvas::{DrawingSurface, RasterExport, RasterImage};
use web_time::{SystemTime, UNIX_EPOCH};

use crate::api::{AnnotationApi, HistoryPage, ReferenceData, SaveAnnotationArgs};
use crate::config::AnnotatorConfig;
use crate::constants::{SAVED_MESSAGE, SAVED_TITLE};
use crate::data_url;
use crate::error::{AnnotatorError, Result};
use crate::handlers;
use crate::host::{Indicator, Navigator, Notifier};
use crate::message::{CanvasMessage, Command, Message, TreatmentMessage};
use crate::model::{
    HistoryEntry, SessionParams, TemplateCategory, TemplateLibrary, TreatmentCatalog, VariableSpec,
};
use crate::persistence::{SaveDraft, draft_save};
use crate::placement::{background_element, prepare_image, template_asset};
use crate::state::{PanelState, TaggingEvent, TaggingMachine, TaggingState};
use crate::transport::{RemoteError, Transport};

#[cfg(test)]
mod tests;

/// Result of the two startup fetches.
///
/// Each fetch fails independently; a failed one can be retried with
/// `Message::RetryReferenceData` / `Message::RetryHistory`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub reference_data: std::result::Result<(), RemoteError>,
    pub history: std::result::Result<(), RemoteError>,
}

impl LoadReport {
    /// True when both fetches succeeded.
    pub fn is_complete(&self) -> bool {
        self.reference_data.is_ok() && self.history.is_ok()
    }
}

/// Result of a save trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The annotation was stored and navigation was scheduled
    Saved,
    /// Another save was still running; this trigger was ignored
    AlreadyInFlight,
}

/// A save whose scene has been read, waiting for its preview image.
pub struct PendingSave {
    pub draft: SaveDraft,
    pub preview: RasterExport,
}

/// A template placement waiting for its image bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRequest {
    pub category: TemplateCategory,
    pub index: usize,
    /// Image source: `data:` URL or file URL
    pub image: String,
}

/// One field of the open treatment's variable panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableField {
    pub spec: VariableSpec,
    /// Current staged value
    pub value: String,
}

/// Milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// Fetch (or decode) the bytes of a template image.
pub async fn load_template_bytes(api: &AnnotationApi, image: &str) -> Result<Vec<u8>> {
    if data_url::is_data_url(image) {
        return data_url::decode(image)
            .map(|url| url.bytes)
            .map_err(AnnotatorError::asset_load);
    }
    api.fetch_image(image)
        .await
        .map_err(|e| AnnotatorError::asset_load(e.to_string()))
}

/// Interaction controller for one annotation page.
pub struct Annotator {
    config: AnnotatorConfig,
    session: Option<SessionParams>,
    api: Rc<AnnotationApi>,
    surface: Option<Box<dyn DrawingSurface>>,
    notifier: Box<dyn Notifier>,
    navigator: Box<dyn Navigator>,

    catalog: TreatmentCatalog,
    library: TemplateLibrary,
    history: Vec<HistoryEntry>,

    machine: TaggingMachine,
    panels: PanelState,
    /// Freehand element being drawn, committed when the pointer is released
    pending_stroke: Option<String>,
    /// Backend name of the last placed template
    annotation_template: Option<String>,
    save_in_flight: bool,
}

impl Annotator {
    /// Create a controller with no session and no surface.
    pub fn new(
        config: AnnotatorConfig,
        transport: Box<dyn Transport>,
        notifier: Box<dyn Notifier>,
        navigator: Box<dyn Navigator>,
    ) -> Self {
        let api = AnnotationApi::new(transport, config.procedures.clone());
        Self {
            config,
            session: None,
            api: Rc::new(api),
            surface: None,
            notifier,
            navigator,
            catalog: TreatmentCatalog::default(),
            library: TemplateLibrary::default(),
            history: Vec::new(),
            machine: TaggingMachine::new(),
            panels: PanelState::default(),
            pending_stroke: None,
            annotation_template: None,
            save_in_flight: false,
        }
    }

    // --- Accessors ---

    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&SessionParams> {
        self.session.as_ref()
    }

    pub fn api(&self) -> Rc<AnnotationApi> {
        Rc::clone(&self.api)
    }

    pub fn surface(&self) -> Option<&dyn DrawingSurface> {
        self.surface.as_deref()
    }

    pub fn catalog(&self) -> &TreatmentCatalog {
        &self.catalog
    }

    pub fn library(&self) -> &TemplateLibrary {
        &self.library
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn tagging_state(&self) -> &TaggingState {
        self.machine.state()
    }

    pub fn panels(&self) -> &PanelState {
        &self.panels
    }

    /// Backend name of the last placed template.
    pub fn annotation_template(&self) -> Option<&str> {
        self.annotation_template.as_deref()
    }

    pub fn is_saving(&self) -> bool {
        self.save_in_flight
    }

    /// Fields of the open treatment's variable panel, with staged values.
    pub fn variable_fields(&self) -> Vec<VariableField> {
        let Some(treatment) = self
            .machine
            .state()
            .treatment()
            .and_then(|id| self.catalog.get(id))
        else {
            return Vec::new();
        };
        treatment
            .variables
            .iter()
            .map(|spec| VariableField {
                value: self
                    .machine
                    .staging()
                    .value(&treatment.id, spec.name())
                    .unwrap_or_default()
                    .to_string(),
                spec: spec.clone(),
            })
            .collect()
    }

    // --- Failure reporting ---

    /// Surface an error to the user and hand it back.
    fn fail<T>(&self, error: AnnotatorError) -> Result<T> {
        log::error!("❌ {}", error);
        self.notifier.error(&error.to_string());
        Err(error)
    }

    /// Close out an action whose failure `fail` has already reported.
    fn settle(result: Result<()>) {
        if let Err(e) = result {
            log::trace!("Action ended after reporting: {}", e);
        }
    }

    pub(crate) fn require_session(&self) -> Result<&SessionParams> {
        match self.session.as_ref() {
            Some(session) => Ok(session),
            None => self.fail(AnnotatorError::MissingSession),
        }
    }

    // --- Mount ---

    /// Read the session from the page query string.
    pub fn bootstrap(&mut self, query: &str) -> Result<&SessionParams> {
        match SessionParams::from_query(query) {
            Ok(session) => {
                log::info!(
                    "📋 Annotating {} {}",
                    session.record_type(),
                    session.record_id()
                );
                Ok(&*self.session.insert(session))
            }
            Err(e) => self.fail(e),
        }
    }

    /// Attach the whiteboard once it has mounted.
    pub fn attach_surface(&mut self, surface: Box<dyn DrawingSurface>) {
        log::debug!("🎨 Drawing surface attached");
        self.surface = Some(surface);
    }

    /// Load reference data and history concurrently.
    ///
    /// Fails only when there is no session, in which case nothing is fetched.
    pub async fn start(&mut self) -> Result<LoadReport> {
        let session = self.require_session()?.clone();
        let api = Rc::clone(&self.api);
        let (reference, history) = futures::join!(
            api.annotations_records(),
            api.annotation_history(&session)
        );
        Ok(LoadReport {
            reference_data: self.apply_reference_data(reference),
            history: self.apply_history(history),
        })
    }

    /// Re-run the treatments/templates fetch.
    pub async fn load_reference_data(&mut self) -> std::result::Result<(), RemoteError> {
        let api = Rc::clone(&self.api);
        let result = api.annotations_records().await;
        self.apply_reference_data(result)
    }

    /// Re-run the history fetch.
    pub async fn load_history(&mut self) -> Result<()> {
        let session = self.require_session()?.clone();
        let api = Rc::clone(&self.api);
        let result = api.annotation_history(&session).await;
        Ok(self.apply_history(result)?)
    }

    /// Install fetched treatments and templates. Touches nothing else.
    pub fn apply_reference_data(
        &mut self,
        result: std::result::Result<ReferenceData, RemoteError>,
    ) -> std::result::Result<(), RemoteError> {
        match result {
            Ok(data) => {
                log::info!(
                    "📦 Loaded {} treatments and {} templates",
                    data.catalog.len(),
                    data.library.len()
                );
                self.machine.reset_staging(&data.catalog);
                self.catalog = data.catalog;
                self.library = data.library;
                Ok(())
            }
            Err(e) => {
                log::error!("❌ {}", e);
                self.notifier.error(&e.to_string());
                Err(e)
            }
        }
    }

    /// Install fetched history. Touches nothing else.
    ///
    /// Entries that could not be read are reported; the rest are installed.
    pub fn apply_history(
        &mut self,
        result: std::result::Result<HistoryPage, RemoteError>,
    ) -> std::result::Result<(), RemoteError> {
        match result {
            Ok(page) => {
                log::info!("📜 Loaded {} history entries", page.entries.len());
                self.history = page.entries;
                if !page.unreadable.is_empty() {
                    let error = AnnotatorError::UnreadableHistory {
                        names: page.unreadable,
                    };
                    log::error!("❌ {}", error);
                    self.notifier.error(&error.to_string());
                }
                Ok(())
            }
            Err(e) => {
                log::error!("❌ {}", e);
                self.notifier.error(&e.to_string());
                Err(e)
            }
        }
    }

    // --- Events ---

    /// Handle a page message. Failures are reported through the notifier.
    pub fn update(&mut self, message: Message) -> Command {
        match message {
            Message::Canvas(CanvasMessage::SceneChanged(change)) => {
                Self::settle(self.dispatch(TaggingEvent::ToolChanged(change.active_tool.clone())));
                if let Some(element) = handlers::track_stroke(&change, &mut self.pending_stroke) {
                    Self::settle(self.dispatch(TaggingEvent::StrokeFinished { element }));
                }
                Command::None
            }
            Message::Canvas(CanvasMessage::PointerDown(pointer)) => {
                Self::settle(self.dispatch(TaggingEvent::PointerDown(pointer)));
                Command::None
            }
            Message::Treatment(TreatmentMessage::Picked(treatment)) => {
                Self::settle(self.pick_treatment(&treatment));
                Command::None
            }
            Message::Treatment(TreatmentMessage::VariableEdited { name, value }) => {
                Self::settle(self.dispatch(TaggingEvent::VariableEdited { name, value }));
                Command::None
            }
            Message::Panel(msg) => {
                handlers::handle_panel(msg, &mut self.panels);
                Command::None
            }
            Message::TemplateSelected { category, index } => {
                Command::PlaceTemplate { category, index }
            }
            Message::HistorySelected(index) => {
                Self::settle(self.import_history(index));
                Command::None
            }
            Message::KeyDown(press) => handlers::handle_key(&press, &self.config.keybindings),
            Message::SaveRequested => Command::Save,
            Message::RetryReferenceData => Command::LoadReferenceData,
            Message::RetryHistory => Command::LoadHistory,
        }
    }

    /// Run a command returned by `update`.
    pub async fn run(&mut self, command: Command) -> Result<()> {
        match command {
            Command::None => Ok(()),
            Command::Save => self.save().await.map(|_| ()),
            Command::PlaceTemplate { category, index } => {
                self.place_template(category, index).await
            }
            Command::LoadReferenceData => Ok(self.load_reference_data().await?),
            Command::LoadHistory => self.load_history().await,
        }
    }

    /// Feed one event to the tagging machine and apply its effects.
    pub fn dispatch(&mut self, event: TaggingEvent) -> Result<()> {
        let effects = match self.machine.handle(event, &self.catalog) {
            Ok(effects) => effects,
            Err(e) => return self.fail(e),
        };
        if effects.is_empty() {
            return Ok(());
        }
        let Some(surface) = self.surface.as_deref_mut() else {
            return self.fail(AnnotatorError::SurfaceUnavailable);
        };
        match handlers::apply_effects(effects, surface, &mut self.panels) {
            Ok(()) => Ok(()),
            Err(e) => self.fail(e),
        }
    }

    /// Arm a treatment for the next freehand stroke.
    pub fn pick_treatment(&mut self, treatment_id: &str) -> Result<()> {
        if self.surface.is_none() {
            return self.fail(AnnotatorError::SurfaceUnavailable);
        }
        self.dispatch(TaggingEvent::TreatmentPicked(treatment_id.to_string()))
    }

    // --- Templates ---

    /// Validate a template click and return what must be loaded.
    pub fn template_request(
        &self,
        category: TemplateCategory,
        index: usize,
    ) -> Result<TemplateRequest> {
        if self.surface.is_none() {
            return self.fail(AnnotatorError::SurfaceUnavailable);
        }
        match self.library.get(category, index) {
            Some(template) => Ok(TemplateRequest {
                category,
                index,
                image: template.image.clone(),
            }),
            None => self.fail(AnnotatorError::OutOfRange {
                what: "template",
                index,
            }),
        }
    }

    /// Place a loaded template as the locked background, replacing the scene.
    pub fn finish_template(
        &mut self,
        request: &TemplateRequest,
        bytes: Result<Vec<u8>>,
    ) -> Result<()> {
        let prepared = match bytes.and_then(|bytes| prepare_image(&bytes)) {
            Ok(prepared) => prepared,
            Err(e) => return self.fail(e),
        };
        if self.surface.is_none() {
            return self.fail(AnnotatorError::SurfaceUnavailable);
        }
        let now = now_millis();
        let Some(assignment) = self
            .library
            .assign_file_id(request.category, request.index, now)
        else {
            return self.fail(AnnotatorError::OutOfRange {
                what: "template",
                index: request.index,
            });
        };
        let Some((name, label)) = self
            .library
            .get(request.category, request.index)
            .map(|t| (t.name.clone(), t.label.clone()))
        else {
            return self.fail(AnnotatorError::OutOfRange {
                what: "template",
                index: request.index,
            });
        };
        let Some(surface) = self.surface.as_deref_mut() else {
            return self.fail(AnnotatorError::SurfaceUnavailable);
        };

        if assignment.is_new {
            surface.add_files(vec![template_asset(&assignment.file_id, &prepared, now)]);
        }
        let element =
            background_element(&label, &assignment.file_id, &prepared, surface.viewport(), now);
        surface.replace_elements(vec![element]);
        surface.scroll_to_content();

        log::info!("🖼️ Placed template {} ({})", label, name);
        self.annotation_template = Some(name);
        self.pending_stroke = None;
        self.machine.scene_replaced();
        Ok(())
    }

    /// Load and place a background template.
    pub async fn place_template(&mut self, category: TemplateCategory, index: usize) -> Result<()> {
        let request = self.template_request(category, index)?;
        let api = Rc::clone(&self.api);
        let bytes = load_template_bytes(&api, &request.image).await;
        self.finish_template(&request, bytes)
    }

    // --- History ---

    /// Replace the scene with a saved annotation.
    pub fn import_history(&mut self, index: usize) -> Result<()> {
        let Some(entry) = self.history.get(index) else {
            return self.fail(AnnotatorError::OutOfRange {
                what: "history entry",
                index,
            });
        };
        let Some(surface) = self.surface.as_deref_mut() else {
            return self.fail(AnnotatorError::SurfaceUnavailable);
        };

        surface.load_scene(&entry.scene);
        log::info!("📜 Imported annotation {} ({})", entry.name, entry.created_at);
        self.panels.set_history_open(false);
        self.pending_stroke = None;
        self.machine.scene_replaced();
        Ok(())
    }

    // --- Save ---

    /// Check preconditions, read the scene and start the preview export.
    ///
    /// Returns None while another save is in flight. On success the
    /// in-flight flag is set until `attach_preview` fails or `finish_save`
    /// runs.
    pub fn prepare_save(&mut self) -> Result<Option<PendingSave>> {
        if self.save_in_flight {
            log::warn!("Save already in progress; ignoring trigger");
            return Ok(None);
        }
        let Some(surface) = self.surface.as_deref() else {
            return self.fail(AnnotatorError::SurfaceUnavailable);
        };
        let session = self.require_session()?;
        let draft = match draft_save(
            surface,
            session,
            self.annotation_template.as_deref(),
            self.config.save.raster_format,
        ) {
            Ok(draft) => draft,
            Err(e) => return self.fail(e),
        };
        let preview = surface.export_raster(draft.format);
        self.save_in_flight = true;
        Ok(Some(PendingSave { draft, preview }))
    }

    /// Join the exported preview with the draft into the save request.
    pub fn attach_preview(
        &mut self,
        draft: SaveDraft,
        preview: treatmark_canvas::Result<RasterImage>,
    ) -> Result<SaveAnnotationArgs> {
        match preview {
            Ok(raster) => Ok(draft.into_args(&raster)),
            Err(e) => {
                self.save_in_flight = false;
                self.fail(e.into())
            }
        }
    }

    /// Complete a save with the backend's answer.
    pub fn finish_save(
        &mut self,
        result: std::result::Result<Value, RemoteError>,
    ) -> Result<SaveOutcome> {
        self.save_in_flight = false;
        if let Err(e) = result {
            return self.fail(e.into());
        }
        let session = self.require_session()?;
        log::info!("💾 Saved annotation for {}", session.record_id());
        self.notifier
            .message(SAVED_TITLE, SAVED_MESSAGE, Indicator::Green);
        self.navigator.navigate_after(
            &session.form_link(),
            Duration::from_millis(self.config.save.redirect_delay_ms),
        );
        Ok(SaveOutcome::Saved)
    }

    /// Persist the drawing and navigate to the record.
    pub async fn save(&mut self) -> Result<SaveOutcome> {
        let Some(PendingSave { draft, preview }) = self.prepare_save()? else {
            return Ok(SaveOutcome::AlreadyInFlight);
        };
        let preview = preview.await;
        let args = self.attach_preview(draft, preview)?;
        let api = Rc::clone(&self.api);
        let result = api.save_annotation(&args).await;
        self.finish_save(result)
    }
}
