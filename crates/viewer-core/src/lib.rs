//! Headless core of a two-page flipbook viewer.
//!
//! Layout math, input mapping and the [`FlipbookViewer`] state machine live
//! here; drawing and page-flip animation are left to the embedding UI.

mod layout;
mod minimap;
mod navigation;
mod observe;
mod thumbnails;
mod toolbar;
mod viewer;

pub use layout::{
    compute_fit, compute_range, device_pixel_ratio_for, initial_range, next_spread_start,
    previous_spread_start, render_requests, spread_pages, spread_start, Fit, PageExtent,
    PageRenderRequest, PagesPerSpread, RenderInputs, ScreenWidthClass,
};
pub use minimap::{minimap_height, minimap_viewport, ViewportRect};
pub use navigation::{
    map_arrow_key, map_key, map_slider, map_thumbnail_click, map_thumbnail_click_within,
    map_wheel_delta, Intent, Key, KeyCommand, UnknownKey, WheelNavigator,
    DEFAULT_ANIMATE_DISTANCE,
};
pub use observe::{Fullscreen, FullscreenChange, Notifier, SizeObserver, Subscription};
pub use thumbnails::{active_spread_index, thumbnail_spreads, thumbnail_strip, ThumbnailSpread};
pub use toolbar::{page_label, toolbar_model, ToolbarInputs, ToolbarModel};
pub use viewer::{
    DocumentLoadFailure, FlipCommand, FlipbookViewer, LoadState, Motion, SpreadLayout,
    ViewerError, ViewerHost, ViewerSnapshot,
};
