//! Browser entry point.
//!
//! The page constructs a `TreatmarkPage` with a whiteboard bridge object and
//! forwards whiteboard and panel events to it. Scene data crosses the
//! boundary as JSON strings in the whiteboard's own shape:
//!
//! ```js
//! const page = new TreatmarkPage({
//!   elementsJson: () => JSON.stringify(api.getSceneElementsIncludingDeleted()),
//!   filesJson: () => JSON.stringify(api.getFiles()),
//!   viewportWidth: () => api.getAppState().width,
//!   viewportHeight: () => api.getAppState().height,
//!   updateElements: (json) => api.updateScene({ elements: JSON.parse(json) }),
//!   addFiles: (json) => api.addFiles(JSON.parse(json)),
//!   setActiveTool: (type) => api.setActiveTool({ type }),
//!   setStrokeColor: (color) => api.updateScene({ appState: { currentItemStrokeColor: color } }),
//!   scrollToContent: () => api.scrollToContent(),
//!   exportImage: async (mimeType) => blobToDataURL(await exportToBlob({
//!     elements: api.getSceneElements(),
//!     appState: api.getAppState(),
//!     files: api.getFiles(),
//!     mimeType,
//!   })),
//! });
//! await page.start();
//! ```

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use futures::FutureExt;
use serde_json::{Value, json};
use treatmark_canvas::{
    CanvasError, DrawingElement, DrawingSurface, FileAsset, FileStore, PointerDown, RasterExport,
    RasterFormat, SceneChange, ToolKind, Viewport, parse_files, parse_live_elements,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::api::AnnotationApi;
use crate::app::{Annotator, PendingSave, load_template_bytes};
use crate::config::AnnotatorConfig;
use crate::error::{AnnotatorError, Result};
use crate::host::{Indicator, Navigator, Notifier};
use crate::keybindings::KeyPress;
use crate::logging;
use crate::message::{CanvasMessage, Command, Message, PanelMessage, TreatmentMessage};
use crate::model::{TemplateCategory, VariableSpec};
use crate::persistence::raster_from_data_url;
use crate::transport::HttpTransport;

#[wasm_bindgen]
extern "C" {
    /// Whiteboard bridge object supplied by the page.
    pub type WhiteboardBridge;

    #[wasm_bindgen(method, js_name = elementsJson)]
    fn elements_json(this: &WhiteboardBridge) -> String;

    #[wasm_bindgen(method, js_name = filesJson)]
    fn files_json(this: &WhiteboardBridge) -> String;

    #[wasm_bindgen(method, js_name = viewportWidth)]
    fn viewport_width(this: &WhiteboardBridge) -> f64;

    #[wasm_bindgen(method, js_name = viewportHeight)]
    fn viewport_height(this: &WhiteboardBridge) -> f64;

    #[wasm_bindgen(method, js_name = updateElements)]
    fn update_elements(this: &WhiteboardBridge, elements_json: &str);

    #[wasm_bindgen(method, js_name = addFiles)]
    fn add_files(this: &WhiteboardBridge, files_json: &str);

    #[wasm_bindgen(method, js_name = setActiveTool)]
    fn set_active_tool(this: &WhiteboardBridge, tool: &str);

    #[wasm_bindgen(method, js_name = setStrokeColor)]
    fn set_stroke_color(this: &WhiteboardBridge, color: &str);

    #[wasm_bindgen(method, js_name = scrollToContent)]
    fn scroll_to_content(this: &WhiteboardBridge);

    /// Resolves to the rendered scene as a `data:` URL.
    #[wasm_bindgen(method, catch, js_name = exportImage)]
    fn export_image(
        this: &WhiteboardBridge,
        mime_type: &str,
    ) -> std::result::Result<js_sys::Promise, JsValue>;
}

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = frappe, js_name = show_alert)]
    fn frappe_show_alert(options: &JsValue, seconds: f64) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch, js_namespace = frappe, js_name = msgprint)]
    fn frappe_msgprint(message: &str) -> std::result::Result<(), JsValue>;
}

/// `DrawingSurface` over the page's whiteboard bridge.
struct BridgeSurface {
    bridge: WhiteboardBridge,
}

impl DrawingSurface for BridgeSurface {
    fn elements(&self) -> treatmark_canvas::Result<Vec<DrawingElement>> {
        parse_live_elements(&self.bridge.elements_json())
    }

    fn files(&self) -> treatmark_canvas::Result<FileStore> {
        parse_files(&self.bridge.files_json())
    }

    fn viewport(&self) -> Viewport {
        Viewport {
            width: self.bridge.viewport_width(),
            height: self.bridge.viewport_height(),
        }
    }

    fn replace_elements(&mut self, elements: Vec<DrawingElement>) {
        match serde_json::to_string(&elements) {
            Ok(json) => self.bridge.update_elements(&json),
            Err(e) => log::error!("❌ Failed to serialize elements: {}", e),
        }
    }

    fn add_files(&mut self, files: Vec<FileAsset>) {
        match serde_json::to_string(&files) {
            Ok(json) => self.bridge.add_files(&json),
            Err(e) => log::error!("❌ Failed to serialize files: {}", e),
        }
    }

    fn set_active_tool(&mut self, tool: ToolKind) {
        self.bridge.set_active_tool(tool.as_str());
    }

    fn set_stroke_color(&mut self, color: &str) {
        self.bridge.set_stroke_color(color);
    }

    fn scroll_to_content(&mut self) {
        self.bridge.scroll_to_content();
    }

    fn export_raster(&self, format: RasterFormat) -> RasterExport {
        let started = self.bridge.export_image(format.mime_type());
        async move {
            let promise = started.map_err(export_error)?;
            let value = JsFuture::from(promise).await.map_err(export_error)?;
            let url = value
                .as_string()
                .ok_or_else(|| CanvasError::Export("exportImage did not return a string".into()))?;
            raster_from_data_url(&url)
        }
        .boxed_local()
    }
}

fn export_error(error: JsValue) -> CanvasError {
    CanvasError::Export(
        error
            .as_string()
            .unwrap_or_else(|| format!("{:?}", error)),
    )
}

/// Desk alerts, falling back to the console outside the desk.
struct DeskNotifier;

impl Notifier for DeskNotifier {
    fn message(&self, title: &str, message: &str, indicator: Indicator) {
        let options = js_sys::Object::new();
        let fields = [
            ("title", title),
            ("message", message),
            ("indicator", indicator.as_str()),
        ];
        for (key, value) in fields {
            if let Err(e) = js_sys::Reflect::set(&options, &key.into(), &value.into()) {
                log::warn!("Alert option {} not set: {:?}", key, e);
            }
        }
        if frappe_show_alert(&options, 5.0).is_err() {
            web_sys::console::log_1(&format!("{}: {}", title, message).into());
        }
    }

    fn error(&self, message: &str) {
        if frappe_msgprint(message).is_err() {
            web_sys::console::error_1(&message.into());
        }
    }
}

/// Navigates the window after a timeout.
struct WindowNavigator;

impl Navigator for WindowNavigator {
    fn navigate_after(&self, url: &str, delay: Duration) {
        let Some(window) = web_sys::window() else {
            log::warn!("No window to navigate");
            return;
        };
        let target = url.to_string();
        let callback = Closure::once_into_js(move || {
            if let Some(window) = web_sys::window() {
                if let Err(e) = window.location().set_href(&target) {
                    log::error!("❌ Navigation to {} failed: {:?}", target, e);
                }
            }
        });
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        if let Err(e) = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), millis)
        {
            log::error!("❌ Failed to schedule navigation: {:?}", e);
        }
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// Configuration from localStorage, pointed at the page's own site.
fn page_config(window: &web_sys::Window) -> AnnotatorConfig {
    let mut config = AnnotatorConfig::load_from_local_storage().unwrap_or_default();
    let location = window.location();
    let page_value = |key: &str| match key {
        "TREATMARK_BASE_URL" => location.origin().ok(),
        "TREATMARK_SITE_NAME" => location.hostname().ok(),
        "TREATMARK_CSRF_TOKEN" => js_sys::Reflect::get(window, &"csrf_token".into())
            .ok()
            .and_then(|token| token.as_string()),
        _ => None,
    };
    if let Err(e) = config.apply_overrides(page_value) {
        log::warn!("Ignoring page settings: {}", e);
    }
    config
}

fn to_js_error(error: AnnotatorError) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// One annotation page, shared with the JavaScript event handlers.
#[wasm_bindgen]
pub struct TreatmarkPage {
    inner: Rc<RefCell<Annotator>>,
}

#[wasm_bindgen]
impl TreatmarkPage {
    /// Mount the controller on the current page.
    ///
    /// A page opened without a record still mounts; the user is told and
    /// every later action fails the same way.
    #[wasm_bindgen(constructor)]
    pub fn new(bridge: WhiteboardBridge) -> std::result::Result<TreatmarkPage, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
        let config = page_config(&window);
        logging::init(config.log_level);
        log::info!("🚀 {} starting", config.app_name);

        let transport = HttpTransport::new(&config.server);
        let mut annotator = Annotator::new(
            config,
            Box::new(transport),
            Box::new(DeskNotifier),
            Box::new(WindowNavigator),
        );
        let query = window.location().search().unwrap_or_default();
        if let Err(e) = annotator.bootstrap(&query) {
            log::warn!("Mounted without a record: {}", e);
        }
        annotator.attach_surface(Box::new(BridgeSurface { bridge }));

        Ok(TreatmarkPage {
            inner: Rc::new(RefCell::new(annotator)),
        })
    }

    /// Fetch reference data and history.
    pub fn start(&self) -> js_sys::Promise {
        let inner = Rc::clone(&self.inner);
        wasm_bindgen_futures::future_to_promise(async move {
            load_all(&inner).await.map_err(to_js_error)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Forward the whiteboard's change notification:
    /// `{editingElement, cursorButton, activeTool}`.
    #[wasm_bindgen(js_name = sceneChanged)]
    pub fn scene_changed(&self, change_json: &str) {
        match serde_json::from_str::<SceneChange>(change_json) {
            Ok(change) => self.send(Message::Canvas(CanvasMessage::SceneChanged(change))),
            Err(e) => log::warn!("Ignoring malformed scene change: {}", e),
        }
    }

    /// Forward a pointer press: `{hit, tool}`.
    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&self, pointer_json: &str) {
        match serde_json::from_str::<PointerDown>(pointer_json) {
            Ok(pointer) => self.send(Message::Canvas(CanvasMessage::PointerDown(pointer))),
            Err(e) => log::warn!("Ignoring malformed pointer event: {}", e),
        }
    }

    #[wasm_bindgen(js_name = pickTreatment)]
    pub fn pick_treatment(&self, treatment: String) {
        self.send(Message::Treatment(TreatmentMessage::Picked(treatment)));
    }

    #[wasm_bindgen(js_name = editVariable)]
    pub fn edit_variable(&self, name: String, value: String) {
        self.send(Message::Treatment(TreatmentMessage::VariableEdited { name, value }));
    }

    #[wasm_bindgen(js_name = toggleTemplates)]
    pub fn toggle_templates(&self) {
        self.send(Message::Panel(PanelMessage::ToggleTemplates));
    }

    #[wasm_bindgen(js_name = toggleTreatments)]
    pub fn toggle_treatments(&self) {
        self.send(Message::Panel(PanelMessage::ToggleTreatments));
    }

    #[wasm_bindgen(js_name = setHistoryOpen)]
    pub fn set_history_open(&self, open: bool) {
        let msg = if open {
            PanelMessage::OpenHistory
        } else {
            PanelMessage::CloseHistory
        };
        self.send(Message::Panel(msg));
    }

    #[wasm_bindgen(js_name = selectCategory)]
    pub fn select_category(&self, category: &str) {
        match TemplateCategory::from_gender(category) {
            Some(category) => self.send(Message::Panel(PanelMessage::SelectCategory(category))),
            None => log::warn!("Unknown template category '{}'", category),
        }
    }

    /// Place a background template; resolves once it is on the canvas.
    #[wasm_bindgen(js_name = selectTemplate)]
    pub fn select_template(&self, category: &str, index: usize) -> js_sys::Promise {
        let command = match TemplateCategory::from_gender(category) {
            Some(category) => self.update(Message::TemplateSelected { category, index }),
            None => Command::None,
        };
        self.spawn(command)
    }

    #[wasm_bindgen(js_name = importHistory)]
    pub fn import_history(&self, index: usize) {
        self.send(Message::HistorySelected(index));
    }

    /// Handle a key press. Returns true when the page should suppress the
    /// browser default.
    #[wasm_bindgen(js_name = keyDown)]
    pub fn key_down(&self, event: web_sys::KeyboardEvent) -> bool {
        let press = KeyPress {
            key: event.key(),
            ctrl: event.ctrl_key(),
            shift: event.shift_key(),
            alt: event.alt_key(),
            meta: event.meta_key(),
        };
        let command = self.update(Message::KeyDown(press));
        if command.is_none() {
            return false;
        }
        let _ = self.spawn(command);
        true
    }

    pub fn save(&self) -> js_sys::Promise {
        let command = self.update(Message::SaveRequested);
        self.spawn(command)
    }

    #[wasm_bindgen(js_name = retryReferenceData)]
    pub fn retry_reference_data(&self) -> js_sys::Promise {
        let command = self.update(Message::RetryReferenceData);
        self.spawn(command)
    }

    #[wasm_bindgen(js_name = retryHistory)]
    pub fn retry_history(&self) -> js_sys::Promise {
        let command = self.update(Message::RetryHistory);
        self.spawn(command)
    }

    /// Everything the side panels render, as JSON.
    #[wasm_bindgen(js_name = viewJson)]
    pub fn view_json(&self) -> String {
        view(&self.inner.borrow()).to_string()
    }
}

impl TreatmarkPage {
    fn update(&self, message: Message) -> Command {
        self.inner.borrow_mut().update(message)
    }

    /// Handle a message whose command, if any, runs in the background.
    fn send(&self, message: Message) {
        let command = self.update(message);
        if !command.is_none() {
            let _ = self.spawn(command);
        }
    }

    fn spawn(&self, command: Command) -> js_sys::Promise {
        let inner = Rc::clone(&self.inner);
        wasm_bindgen_futures::future_to_promise(async move {
            run_command(&inner, command).await.map_err(to_js_error)?;
            Ok(JsValue::UNDEFINED)
        })
    }
}

fn api_of(inner: &Rc<RefCell<Annotator>>) -> Rc<AnnotationApi> {
    inner.borrow().api()
}

async fn load_all(inner: &Rc<RefCell<Annotator>>) -> Result<()> {
    let session = inner.borrow().require_session()?.clone();
    let api = api_of(inner);
    let (reference, history) = futures::join!(
        api.annotations_records(),
        api.annotation_history(&session)
    );
    let mut annotator = inner.borrow_mut();
    let reference = annotator.apply_reference_data(reference);
    let history = annotator.apply_history(history);
    reference?;
    history?;
    Ok(())
}

/// Run a command without holding the controller borrowed across an await.
async fn run_command(inner: &Rc<RefCell<Annotator>>, command: Command) -> Result<()> {
    match command {
        Command::None => Ok(()),
        Command::Save => {
            let Some(PendingSave { draft, preview }) = inner.borrow_mut().prepare_save()? else {
                return Ok(());
            };
            let preview = preview.await;
            let args = inner.borrow_mut().attach_preview(draft, preview)?;
            let result = api_of(inner).save_annotation(&args).await;
            inner.borrow_mut().finish_save(result).map(|_| ())
        }
        Command::PlaceTemplate { category, index } => {
            let request = inner.borrow().template_request(category, index)?;
            let bytes = load_template_bytes(&api_of(inner), &request.image).await;
            inner.borrow_mut().finish_template(&request, bytes)
        }
        Command::LoadReferenceData => {
            let result = api_of(inner).annotations_records().await;
            inner.borrow_mut().apply_reference_data(result)?;
            Ok(())
        }
        Command::LoadHistory => {
            let session = inner.borrow().require_session()?.clone();
            let result = api_of(inner).annotation_history(&session).await;
            inner.borrow_mut().apply_history(result)?;
            Ok(())
        }
    }
}

fn variable_view(spec: &VariableSpec, value: &str) -> Value {
    let kind = match spec {
        VariableSpec::Text { .. } => "Data",
        VariableSpec::Select { .. } => "Select",
    };
    json!({
        "name": spec.name(),
        "type": kind,
        "options": spec.options(),
        "value": value,
    })
}

fn view(annotator: &Annotator) -> Value {
    let panels = annotator.panels();
    let treatments: Vec<Value> = annotator
        .catalog()
        .iter()
        .map(|t| json!({ "id": t.id, "name": t.name, "color": t.color.hex() }))
        .collect();
    let templates: serde_json::Map<String, Value> = TemplateCategory::all()
        .iter()
        .map(|category| {
            let list: Vec<Value> = annotator
                .library()
                .category(*category)
                .iter()
                .map(|t| json!({ "label": t.label, "image": t.image, "kid": t.kid }))
                .collect();
            (category.name().to_string(), Value::from(list))
        })
        .collect();
    let history: Vec<Value> = annotator
        .history()
        .iter()
        .map(|h| {
            json!({
                "name": h.name,
                "template": h.template,
                "image": h.preview_image,
                "creation": h.created_at,
                "elements": h.element_count(),
            })
        })
        .collect();
    let variables: Vec<Value> = annotator
        .variable_fields()
        .iter()
        .map(|field| variable_view(&field.spec, &field.value))
        .collect();

    json!({
        "treatments": treatments,
        "templates": templates,
        "history": history,
        "activeTreatment": annotator.tagging_state().treatment(),
        "selectedElement": annotator.tagging_state().selected_element(),
        "variables": variables,
        "panels": {
            "templates": panels.templates_open,
            "treatments": panels.treatments_open,
            "history": panels.history_open,
            "category": panels.category_tab.name(),
        },
        "saving": annotator.is_saving(),
    })
}
