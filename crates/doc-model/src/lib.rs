use serde::{Deserialize, Serialize};
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("document must have at least one page")]
    NoPages,
    #[error("page size must be positive (width={width}, height={height})")]
    InvalidPageSize { width: f32, height: f32 },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Intrinsic size of the first page, taken as representative of the document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PdfDetails {
    pub total_pages: u32,
    pub width: f32,
    pub height: f32,
}

impl PdfDetails {
    pub fn new(total_pages: u32, width: f32, height: f32) -> Result<Self, ModelError> {
        if total_pages == 0 {
            return Err(ModelError::NoPages);
        }

        if !(width > 0.0 && height > 0.0) || !width.is_finite() || !height.is_finite() {
            return Err(ModelError::InvalidPageSize { width, height });
        }

        Ok(Self { total_pages, width, height })
    }

    pub fn last_page_index(&self) -> u32 {
        self.total_pages.saturating_sub(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ContainerSize {
    pub width: f32,
    pub height: f32,
}

impl ContainerSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width: width.max(0.0), height: height.max(0.0) }
    }

    /// A container that has not been laid out yet reports zero on some axis.
    pub fn is_measured(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Half-open window of page indices permitted to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewRange {
    pub start: u32,
    pub end: u32,
}

impl ViewRange {
    pub fn contains(&self, page_index: u32) -> bool {
        (self.start..self.end).contains(&page_index)
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn pages(&self) -> Range<u32> {
        self.start..self.end
    }
}

/// Hand-tuned viewer constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub zoom_step: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub view_range_radius: u32,
    /// Thumbnail clicks within this many pages animate instead of jumping.
    pub thumbnail_animate_distance: u32,
    /// Pages in view are oversampled once zoom passes this factor.
    pub oversample_zoom_threshold: f32,
    pub max_device_pixel_ratio: f32,
    pub wheel_debounce_ms: u64,
    pub narrow_breakpoint_px: f32,
    pub fullscreen_settle_ms: u64,
    pub thumbnail_width_px: u32,
    pub minimap_width_px: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            zoom_step: 0.25,
            min_zoom: 1.0,
            max_zoom: 5.0,
            view_range_radius: 2,
            thumbnail_animate_distance: 2,
            oversample_zoom_threshold: 1.7,
            max_device_pixel_ratio: 5.0,
            wheel_debounce_ms: 100,
            narrow_breakpoint_px: 768.0,
            fullscreen_settle_ms: 100,
            thumbnail_width_px: 100,
            minimap_width_px: 120,
        }
    }
}

impl ViewerConfig {
    pub fn validate(&self) -> Result<(), ModelError> {
        if !self.min_zoom.is_finite() || !self.max_zoom.is_finite() {
            return Err(ModelError::InvalidConfig(format!(
                "zoom bounds must be finite, got {}..{}",
                self.min_zoom, self.max_zoom
            )));
        }

        if !(self.min_zoom > 0.0) {
            return Err(ModelError::InvalidConfig(format!(
                "min_zoom must be positive, got {}",
                self.min_zoom
            )));
        }

        if self.max_zoom < self.min_zoom {
            return Err(ModelError::InvalidConfig(format!(
                "max_zoom ({}) is below min_zoom ({})",
                self.max_zoom, self.min_zoom
            )));
        }

        if !(self.zoom_step > 0.0) {
            return Err(ModelError::InvalidConfig("zoom_step must be positive".to_owned()));
        }

        if !(self.max_device_pixel_ratio >= 1.0) {
            return Err(ModelError::InvalidConfig(
                "max_device_pixel_ratio must be at least 1".to_owned(),
            ));
        }

        Ok(())
    }

    pub fn clamp_zoom(&self, zoom: f32) -> f32 {
        if zoom.is_nan() {
            return self.min_zoom;
        }

        zoom.min(self.max_zoom).max(self.min_zoom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewerState {
    pub current_page_index: u32,
    pub zoom_scale: f32,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self { current_page_index: 0, zoom_scale: 1.0 }
    }
}

impl ViewerState {
    pub fn is_zoomed(&self) -> bool {
        self.zoom_scale > 1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerAction {
    ZoomIn,
    ZoomOut,
    ResetZoom,
    SetZoom(f32),
    StepPage(i64),
    GoToPage(u32),
}

pub fn apply_viewer_action(
    state: &mut ViewerState,
    action: ViewerAction,
    total_pages: u32,
    config: &ViewerConfig,
) {
    match action {
        ViewerAction::ZoomIn => {
            state.zoom_scale = config.clamp_zoom(state.zoom_scale + config.zoom_step);
        }
        ViewerAction::ZoomOut => {
            state.zoom_scale = config.clamp_zoom(state.zoom_scale - config.zoom_step);
        }
        ViewerAction::ResetZoom => state.zoom_scale = config.min_zoom,
        ViewerAction::SetZoom(zoom) => state.zoom_scale = config.clamp_zoom(zoom),
        ViewerAction::StepPage(step) => {
            let target = i64::from(state.current_page_index).saturating_add(step);
            state.current_page_index = clamp_page_index(target, total_pages);
        }
        ViewerAction::GoToPage(index) => {
            state.current_page_index = clamp_page_index(i64::from(index), total_pages);
        }
    }
}

fn clamp_page_index(target: i64, total_pages: u32) -> u32 {
    let last = i64::from(total_pages.saturating_sub(1));
    target.clamp(0, last) as u32
}
