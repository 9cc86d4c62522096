use crate::layout::{
    compute_fit, compute_range, initial_range, next_spread_start, previous_spread_start,
    render_requests, Fit, PageExtent, PageRenderRequest, PagesPerSpread, RenderInputs,
    ScreenWidthClass,
};
use crate::minimap::{minimap_height, minimap_viewport, ViewportRect};
use crate::navigation::{
    map_key, map_slider, map_thumbnail_click_within, Intent, Key, KeyCommand, WheelNavigator,
};
use crate::observe::{Fullscreen, FullscreenChange, SizeObserver, Subscription};
use crate::thumbnails::{thumbnail_strip, ThumbnailSpread};
use crate::toolbar::{page_label, toolbar_model, ToolbarInputs, ToolbarModel};
use doc_model::{
    apply_viewer_action, ContainerSize, PdfDetails, ViewRange, ViewerAction, ViewerConfig,
    ViewerState,
};
use flipbook_scheduler::Debounced;
use pdf_engine::{
    DocumentHandle, OpenSource, PdfEngine, PdfEngineError, RenderRequest, RenderSize, RgbaImage,
};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
#[error("failed to load document {document}")]
pub struct DocumentLoadFailure {
    pub document: String,
    #[source]
    pub source: PdfEngineError,
}

#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("no document is loaded")]
    NotLoaded,
    #[error(transparent)]
    Engine(#[from] PdfEngineError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadState {
    Loading,
    Ready { details: PdfDetails },
    Failed { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Motion {
    /// Animated page-turn by one layout unit.
    Flip,
    /// Single page, no animation.
    Turn,
    /// Direct cut.
    Jump,
}

/// What the page-flip animation should do to reach the new page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlipCommand {
    pub from_index: u32,
    pub target_index: u32,
    pub motion: Motion,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewerSnapshot {
    pub load_state: LoadState,
    pub current_page_index: u32,
    pub zoom_scale: f32,
    pub is_fullscreen: bool,
    pub container: ContainerSize,
    pub pages_per_spread: PagesPerSpread,
    pub fit: Fit,
    pub view_range: ViewRange,
    pub page_label: Option<String>,
}

/// Geometry of the current spread.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpreadLayout {
    pub container: ContainerSize,
    pub pages_per_spread: PagesPerSpread,
    pub fit: Fit,
    /// Fitted box with the zoom transform applied.
    pub zoomed_width: f32,
    pub zoomed_height: f32,
    pub view_range: ViewRange,
}

/// Platform surfaces the viewer listens to.
#[derive(Clone)]
pub struct ViewerHost {
    pub size_observer: Rc<SizeObserver>,
    pub fullscreen: Rc<Fullscreen>,
    pub device_pixel_ratio: f32,
}

impl ViewerHost {
    pub fn new(fullscreen_enabled: bool, device_pixel_ratio: f32) -> Self {
        Self {
            size_observer: Rc::new(SizeObserver::new()),
            fullscreen: Rc::new(Fullscreen::new(fullscreen_enabled)),
            device_pixel_ratio,
        }
    }
}

struct ViewerModel {
    config: ViewerConfig,
    load_state: LoadState,
    state: ViewerState,
    container: ContainerSize,
    screen_width: Option<f32>,
    device_pixel_ratio: f32,
    is_fullscreen: bool,
    fit: Fit,
    range: ViewRange,
    wheel: WheelNavigator,
    size_refresh: Debounced<()>,
}

impl ViewerModel {
    fn new(config: ViewerConfig, device_pixel_ratio: f32) -> Self {
        let wheel = WheelNavigator::new(Duration::from_millis(config.wheel_debounce_ms));
        let size_refresh = Debounced::new(Duration::from_millis(config.fullscreen_settle_ms));
        let state = ViewerState { current_page_index: 0, zoom_scale: config.min_zoom };
        let device_pixel_ratio = capped_device_pixel_ratio(device_pixel_ratio, &config);

        Self {
            config,
            load_state: LoadState::Loading,
            state,
            container: ContainerSize::default(),
            screen_width: None,
            device_pixel_ratio,
            is_fullscreen: false,
            fit: Fit::NOT_READY,
            range: ViewRange::default(),
            wheel,
            size_refresh,
        }
    }

    fn details(&self) -> Option<PdfDetails> {
        match &self.load_state {
            LoadState::Ready { details } => Some(*details),
            _ => None,
        }
    }

    fn pages_per_spread(&self) -> PagesPerSpread {
        PagesPerSpread::for_width(self.container.width, self.config.narrow_breakpoint_px)
    }

    fn screen_class(&self) -> ScreenWidthClass {
        let width = self.screen_width.unwrap_or(self.container.width);
        ScreenWidthClass::from_width(width, self.config.narrow_breakpoint_px)
    }

    fn relayout(&mut self) {
        self.fit = match self.details() {
            Some(details) => {
                compute_fit(self.container, PageExtent::from(&details), self.pages_per_spread())
            }
            None => Fit::NOT_READY,
        };

        tracing::debug!(
            width = self.container.width,
            height = self.container.height,
            scale = self.fit.scale,
            "recomputed fit"
        );
    }

    fn refresh_range(&mut self) {
        let total_pages = self.details().map_or(0, |details| details.total_pages);
        self.range = compute_range(
            self.state.current_page_index,
            total_pages,
            self.config.view_range_radius,
        );
    }

    fn set_page(&mut self, page_index: u32) {
        let Some(details) = self.details() else {
            return;
        };

        apply_viewer_action(
            &mut self.state,
            ViewerAction::GoToPage(page_index),
            details.total_pages,
            &self.config,
        );
        self.refresh_range();
    }

    fn apply_intent(&mut self, intent: Intent) -> Option<FlipCommand> {
        let Some(details) = self.details() else {
            tracing::warn!(?intent, "ignoring navigation before the document is loaded");
            return None;
        };

        let total = details.total_pages;
        let current = self.state.current_page_index;
        let pages = self.pages_per_spread();

        let (target_index, motion) = match intent {
            Intent::None => return None,
            Intent::Next => (next_spread_start(current, total, pages)?, Motion::Flip),
            Intent::Previous => (previous_spread_start(current, pages)?, Motion::Flip),
            Intent::TurnNext => {
                let next = current + 1;
                if next >= total {
                    return None;
                }
                (next, Motion::Turn)
            }
            Intent::TurnPrevious => (current.checked_sub(1)?, Motion::Turn),
            Intent::JumpTo(index) => (index.min(details.last_page_index()), Motion::Jump),
        };

        if target_index == current {
            return None;
        }

        self.set_page(target_index);
        tracing::debug!(?intent, from = current, to = target_index, "navigated");

        Some(FlipCommand { from_index: current, target_index, motion })
    }

    fn on_resize(&mut self, size: ContainerSize) {
        self.container = size;
        self.relayout();
    }

    fn on_fullscreen(&mut self, change: FullscreenChange) {
        self.is_fullscreen = change.active;
        self.refresh_range();
        self.relayout();
        self.size_refresh.trigger(change.at, ());
    }

    fn zoom(&mut self, action: ViewerAction) {
        let total_pages = self.details().map_or(0, |details| details.total_pages);
        apply_viewer_action(&mut self.state, action, total_pages, &self.config);

        // Wheel input means something else once the zoom changes.
        self.wheel.cancel();
    }

    fn cancel_timers(&mut self) {
        self.wheel.cancel();
        self.size_refresh.cancel();
    }
}

/// Non-finite or non-positive ratios fall back to 1.
fn capped_device_pixel_ratio(device_pixel_ratio: f32, config: &ViewerConfig) -> f32 {
    if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
        device_pixel_ratio.min(config.max_device_pixel_ratio)
    } else {
        1.0
    }
}

/// Headless flipbook controller
///
/// Owns the document handle for its lifetime and listens to the host's size
/// and fullscreen observers. [`FlipbookViewer::unmount`] (or dropping the
/// viewer) releases the subscriptions, cancels pending timers and closes the
/// document.
pub struct FlipbookViewer<E: PdfEngine> {
    engine: E,
    handle: Option<DocumentHandle>,
    model: Rc<RefCell<ViewerModel>>,
    size_observer: Rc<SizeObserver>,
    fullscreen: Rc<Fullscreen>,
    subscriptions: Vec<Subscription>,
}

impl<E: PdfEngine> FlipbookViewer<E> {
    /// An invalid `config` is replaced by the defaults.
    pub fn new(engine: E, config: ViewerConfig, host: ViewerHost) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(error) => {
                tracing::warn!(%error, "invalid viewer config, using defaults");
                ViewerConfig::default()
            }
        };
        let model = Rc::new(RefCell::new(ViewerModel::new(config, host.device_pixel_ratio)));

        let resize = {
            let model = Rc::downgrade(&model);
            host.size_observer.subscribe(move |size| {
                if let Some(model) = model.upgrade() {
                    model.borrow_mut().on_resize(*size);
                }
            })
        };

        let fullscreen = {
            let model = Rc::downgrade(&model);
            host.fullscreen.subscribe(move |change| {
                if let Some(model) = model.upgrade() {
                    model.borrow_mut().on_fullscreen(*change);
                }
            })
        };

        {
            let mut model = model.borrow_mut();
            model.container = host.size_observer.size();
            model.is_fullscreen = host.fullscreen.is_fullscreen();
        }

        Self {
            engine,
            handle: None,
            model,
            size_observer: host.size_observer,
            fullscreen: host.fullscreen,
            subscriptions: vec![resize, fullscreen],
        }
    }

    /// Construct and load in one step; a load failure is kept in [`LoadState`].
    pub fn mount(engine: E, source: OpenSource, config: ViewerConfig, host: ViewerHost) -> Self {
        let mut viewer = Self::new(engine, config, host);
        let _ = viewer.load(source);
        viewer
    }

    /// Open a document, replacing any current one. Failures are not retried.
    pub fn load(&mut self, source: OpenSource) -> Result<PdfDetails, DocumentLoadFailure> {
        let document = source.describe();
        self.close_document();
        self.model.borrow_mut().load_state = LoadState::Loading;

        let handle = match self.engine.open(source) {
            Ok(handle) => handle,
            Err(source) => return Err(self.fail_load(document, source)),
        };

        let details = match self.engine.details(handle) {
            Ok(details) => details,
            Err(source) => {
                if let Err(error) = self.engine.close(handle) {
                    tracing::warn!(%error, "failed to close document");
                }
                return Err(self.fail_load(document, source));
            }
        };

        self.handle = Some(handle);

        let mut model = self.model.borrow_mut();
        model.load_state = LoadState::Ready { details };
        model.state =
            ViewerState { current_page_index: 0, zoom_scale: model.config.min_zoom };
        model.range = initial_range(details.total_pages);
        model.relayout();

        tracing::info!(
            document = %document,
            total_pages = details.total_pages,
            width = details.width,
            height = details.height,
            "document loaded"
        );

        Ok(details)
    }

    fn fail_load(&mut self, document: String, source: PdfEngineError) -> DocumentLoadFailure {
        let failure = DocumentLoadFailure { document, source };
        let message = format!("{failure}: {}", failure.source);

        tracing::error!(error = %message, "document load failed");

        let mut model = self.model.borrow_mut();
        model.load_state = LoadState::Failed { message };
        model.fit = Fit::NOT_READY;
        model.range = ViewRange::default();

        failure
    }

    fn close_document(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(error) = self.engine.close(handle) {
                tracing::warn!(%error, "failed to close document");
            }
        }
    }

    pub fn size_observer(&self) -> &Rc<SizeObserver> {
        &self.size_observer
    }

    pub fn fullscreen(&self) -> &Rc<Fullscreen> {
        &self.fullscreen
    }

    pub fn set_screen_width(&mut self, width_px: f32) {
        self.model.borrow_mut().screen_width = Some(width_px);
    }

    pub fn set_device_pixel_ratio(&mut self, device_pixel_ratio: f32) {
        let mut model = self.model.borrow_mut();
        model.device_pixel_ratio = capped_device_pixel_ratio(device_pixel_ratio, &model.config);
    }

    /// Returns `true` when the event was queued for a debounced page turn.
    pub fn handle_wheel(&mut self, delta_y: f32, now: Instant) -> bool {
        let mut model = self.model.borrow_mut();

        if model.details().is_none() {
            tracing::warn!("ignoring wheel before the document is loaded");
            return false;
        }

        if model.state.is_zoomed() {
            tracing::debug!(zoom = model.state.zoom_scale, "wheel pans while zoomed");
            return false;
        }

        model.wheel.on_wheel(delta_y, now);
        true
    }

    pub fn handle_key(&mut self, key: Key, now: Instant) -> Option<FlipCommand> {
        let command = {
            let model = self.model.borrow();
            map_key(key, model.screen_class(), self.fullscreen.is_fullscreen())?
        };

        match command {
            KeyCommand::Navigate(intent) => self.model.borrow_mut().apply_intent(intent),
            KeyCommand::ToggleFullscreen => {
                self.fullscreen.toggle(now);
                None
            }
            KeyCommand::ExitFullscreen => {
                self.fullscreen.exit(now);
                None
            }
        }
    }

    /// Click on a thumbnail spread, given the 0-based index of its first page.
    pub fn handle_thumbnail_click(&mut self, target_index: u32) -> Option<FlipCommand> {
        let mut model = self.model.borrow_mut();
        let intent = map_thumbnail_click_within(
            target_index,
            model.state.current_page_index,
            model.config.thumbnail_animate_distance,
        );

        model.apply_intent(intent)
    }

    pub fn handle_slider(&mut self, value: u32) -> Option<FlipCommand> {
        let mut model = self.model.borrow_mut();
        let total_pages = model.details()?.total_pages;

        model.apply_intent(map_slider(value, total_pages))
    }

    pub fn navigate(&mut self, intent: Intent) -> Option<FlipCommand> {
        self.model.borrow_mut().apply_intent(intent)
    }

    /// The animation reports the page it landed on, e.g. after a drag-flip.
    pub fn on_flip(&mut self, page_index: u32) {
        self.model.borrow_mut().set_page(page_index);
    }

    pub fn zoom_in(&mut self) {
        self.model.borrow_mut().zoom(ViewerAction::ZoomIn);
    }

    pub fn zoom_out(&mut self) {
        self.model.borrow_mut().zoom(ViewerAction::ZoomOut);
    }

    pub fn reset_zoom(&mut self) {
        self.model.borrow_mut().zoom(ViewerAction::ResetZoom);
    }

    pub fn set_zoom(&mut self, zoom_scale: f32) {
        self.model.borrow_mut().zoom(ViewerAction::SetZoom(zoom_scale));
    }

    /// Fire due timers; returns flips produced by debounced wheel input.
    pub fn poll_timers(&mut self, now: Instant) -> Vec<FlipCommand> {
        let (refresh, wheel) = {
            let mut model = self.model.borrow_mut();
            (model.size_refresh.poll(now).is_some(), model.wheel.poll(now))
        };

        if refresh {
            self.size_observer.refresh();
        }

        wheel.and_then(|intent| self.model.borrow_mut().apply_intent(intent)).into_iter().collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        let model = self.model.borrow();
        [model.wheel.next_deadline(), model.size_refresh.next_deadline()]
            .into_iter()
            .flatten()
            .min()
    }

    pub fn load_state(&self) -> LoadState {
        self.model.borrow().load_state.clone()
    }

    pub fn details(&self) -> Option<PdfDetails> {
        self.model.borrow().details()
    }

    pub fn state(&self) -> ViewerState {
        self.model.borrow().state
    }

    pub fn fit(&self) -> Fit {
        self.model.borrow().fit
    }

    pub fn view_range(&self) -> ViewRange {
        self.model.borrow().range
    }

    pub fn pages_per_spread(&self) -> PagesPerSpread {
        self.model.borrow().pages_per_spread()
    }

    pub fn layout(&self) -> SpreadLayout {
        let model = self.model.borrow();
        let (zoomed_width, zoomed_height) = model.fit.zoomed(model.state.zoom_scale);

        SpreadLayout {
            container: model.container,
            pages_per_spread: model.pages_per_spread(),
            fit: model.fit,
            zoomed_width,
            zoomed_height,
            view_range: model.range,
        }
    }

    pub fn render_requests(&self) -> Vec<PageRenderRequest> {
        let model = self.model.borrow();
        let Some(details) = model.details() else {
            return Vec::new();
        };

        render_requests(RenderInputs {
            range: model.range,
            fit: model.fit,
            current_page_index: model.state.current_page_index,
            total_pages: details.total_pages,
            pages: model.pages_per_spread(),
            zoom_scale: model.state.zoom_scale,
            device_pixel_ratio: model.device_pixel_ratio,
            config: &model.config,
        })
    }

    pub fn render_page(&self, request: &PageRenderRequest) -> Result<RgbaImage, ViewerError> {
        let handle = self.handle.ok_or(ViewerError::NotLoaded)?;

        let mut request = request.to_engine_request();
        request.device_pixel_ratio =
            capped_device_pixel_ratio(request.device_pixel_ratio, &self.model.borrow().config);

        Ok(self.engine.render_page(handle, request)?)
    }

    pub fn toolbar(&self) -> Option<ToolbarModel> {
        let model = self.model.borrow();
        let details = model.details()?;

        Some(toolbar_model(ToolbarInputs {
            state: model.state,
            total_pages: details.total_pages,
            pages: model.pages_per_spread(),
            screen: model.screen_class(),
            fullscreen_available: self.fullscreen.is_enabled(),
            is_fullscreen: model.is_fullscreen,
            config: &model.config,
        }))
    }

    pub fn thumbnails(&self) -> Vec<ThumbnailSpread> {
        let model = self.model.borrow();
        model
            .details()
            .map(|details| thumbnail_strip(details.total_pages, model.state.current_page_index))
            .unwrap_or_default()
    }

    /// Engine request for a thumbnail, pinned to the strip width.
    pub fn thumbnail_request(&self, page_index: u32) -> RenderRequest {
        let model = self.model.borrow();

        RenderRequest {
            page_index,
            size: RenderSize::Width(model.config.thumbnail_width_px as f32),
            device_pixel_ratio: model.device_pixel_ratio,
        }
    }

    pub fn minimap_height(&self) -> Option<f32> {
        let model = self.model.borrow();
        model.details().map(|details| minimap_height(model.config.minimap_width_px, &details))
    }

    pub fn minimap(&self, scroll_x: f32, scroll_y: f32) -> Option<ViewportRect> {
        let model = self.model.borrow();
        minimap_viewport(model.fit, model.state.zoom_scale, model.container, scroll_x, scroll_y)
    }

    pub fn snapshot(&self) -> ViewerSnapshot {
        let model = self.model.borrow();

        ViewerSnapshot {
            load_state: model.load_state.clone(),
            current_page_index: model.state.current_page_index,
            zoom_scale: model.state.zoom_scale,
            is_fullscreen: model.is_fullscreen,
            container: model.container,
            pages_per_spread: model.pages_per_spread(),
            fit: model.fit,
            view_range: model.range,
            page_label: model
                .details()
                .map(|details| page_label(model.state.current_page_index, details.total_pages)),
        }
    }

    /// Release subscriptions, cancel timers and close the document. Idempotent.
    pub fn unmount(&mut self) -> Result<(), PdfEngineError> {
        self.subscriptions.clear();
        self.model.borrow_mut().cancel_timers();

        if let Some(handle) = self.handle.take() {
            self.engine.close(handle)?;
            tracing::debug!(handle = handle.raw(), "viewer unmounted");
        }

        Ok(())
    }
}

impl<E: PdfEngine> Drop for FlipbookViewer<E> {
    fn drop(&mut self) {
        if let Err(error) = self.unmount() {
            tracing::warn!(%error, "failed to release viewer resources");
        }
    }
}
