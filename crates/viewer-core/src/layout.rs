use doc_model::{ContainerSize, PdfDetails, ViewRange, ViewerConfig};
use pdf_engine::{RenderRequest, RenderSize};
use serde::Serialize;
use std::ops::Range;

/// Range mounted before the first navigation.
const INITIAL_RANGE_END: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenWidthClass {
    Narrow,
    Wide,
}

impl ScreenWidthClass {
    pub fn from_width(width_px: f32, breakpoint_px: f32) -> Self {
        if width_px < breakpoint_px {
            Self::Narrow
        } else {
            Self::Wide
        }
    }

    pub fn pages_per_spread(self) -> PagesPerSpread {
        match self {
            Self::Narrow => PagesPerSpread::One,
            Self::Wide => PagesPerSpread::Two,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PagesPerSpread {
    One,
    Two,
}

impl PagesPerSpread {
    pub fn for_width(width_px: f32, breakpoint_px: f32) -> Self {
        ScreenWidthClass::from_width(width_px, breakpoint_px).pages_per_spread()
    }

    pub fn count(self) -> u32 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageExtent {
    pub width: f32,
    pub height: f32,
}

impl From<&PdfDetails> for PageExtent {
    fn from(details: &PdfDetails) -> Self {
        Self { width: details.width, height: details.height }
    }
}

/// Scale and pixel box that fit a spread inside its container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Fit {
    pub scale: f32,
    pub box_width: f32,
    pub box_height: f32,
}

impl Fit {
    /// Container not measured yet; callers defer rendering.
    pub const NOT_READY: Self = Self { scale: 0.0, box_width: 0.0, box_height: 0.0 };

    pub fn is_ready(&self) -> bool {
        self.scale > 0.0
    }

    /// Box occupied by the spread once the zoom transform is applied.
    pub fn zoomed(&self, zoom_scale: f32) -> (f32, f32) {
        if zoom_scale > 1.0 {
            (self.box_width * zoom_scale, self.box_height * zoom_scale)
        } else {
            (self.box_width, self.box_height)
        }
    }
}

pub fn compute_fit(container: ContainerSize, page: PageExtent, pages: PagesPerSpread) -> Fit {
    if !container.is_measured() || !(page.width > 0.0) || !(page.height > 0.0) {
        return Fit::NOT_READY;
    }

    let per_spread = pages.count() as f32;
    let scale = (container.width / (per_spread * page.width)).min(container.height / page.height);

    Fit { scale, box_width: page.width * scale * per_spread, box_height: page.height * scale }
}

pub fn compute_range(current_page_index: u32, total_pages: u32, radius: u32) -> ViewRange {
    if total_pages == 0 {
        return ViewRange::default();
    }

    let current = current_page_index.min(total_pages - 1);

    ViewRange {
        start: current.saturating_sub(radius),
        end: current.saturating_add(radius).min(total_pages),
    }
}

pub fn initial_range(total_pages: u32) -> ViewRange {
    ViewRange { start: 0, end: INITIAL_RANGE_END.min(total_pages) }
}

// In a two-page layout the first page is a lone cover and every later spread
// starts on an odd index: [0], [1, 2], [3, 4], ...

pub fn spread_start(page_index: u32, pages: PagesPerSpread) -> u32 {
    match pages {
        PagesPerSpread::One => page_index,
        PagesPerSpread::Two if page_index == 0 => 0,
        PagesPerSpread::Two if page_index % 2 == 1 => page_index,
        PagesPerSpread::Two => page_index - 1,
    }
}

pub fn spread_pages(page_index: u32, total_pages: u32, pages: PagesPerSpread) -> Range<u32> {
    let start = spread_start(page_index, pages);
    let len = match pages {
        PagesPerSpread::Two if start != 0 => 2,
        _ => 1,
    };

    start.min(total_pages)..start.saturating_add(len).min(total_pages)
}

pub fn next_spread_start(page_index: u32, total_pages: u32, pages: PagesPerSpread) -> Option<u32> {
    let start = spread_start(page_index, pages);
    let next = match pages {
        PagesPerSpread::Two if start != 0 => start + 2,
        _ => start + 1,
    };

    (next < total_pages).then_some(next)
}

pub fn previous_spread_start(page_index: u32, pages: PagesPerSpread) -> Option<u32> {
    let start = spread_start(page_index, pages);
    let before = start.checked_sub(1)?;

    Some(spread_start(before, pages))
}

/// Pixel ratio for a page raster; pages in view are oversampled when zoomed.
pub fn device_pixel_ratio_for(
    in_view: bool,
    zoom_scale: f32,
    device_pixel_ratio: f32,
    config: &ViewerConfig,
) -> f32 {
    if in_view && zoom_scale > config.oversample_zoom_threshold {
        (zoom_scale * device_pixel_ratio).min(config.max_device_pixel_ratio)
    } else {
        device_pixel_ratio
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageRenderRequest {
    pub page_index: u32,
    pub height_px: f32,
    pub device_pixel_ratio: f32,
    pub in_view: bool,
}

impl PageRenderRequest {
    pub fn to_engine_request(&self) -> RenderRequest {
        RenderRequest {
            page_index: self.page_index,
            size: RenderSize::Height(self.height_px),
            device_pixel_ratio: self.device_pixel_ratio,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RenderInputs<'a> {
    pub range: ViewRange,
    pub fit: Fit,
    pub current_page_index: u32,
    pub total_pages: u32,
    pub pages: PagesPerSpread,
    pub zoom_scale: f32,
    pub device_pixel_ratio: f32,
    pub config: &'a ViewerConfig,
}

/// One request per page in the view range; nothing until the fit is ready.
pub fn render_requests(inputs: RenderInputs<'_>) -> Vec<PageRenderRequest> {
    if !inputs.fit.is_ready() {
        return Vec::new();
    }

    let in_view = spread_pages(inputs.current_page_index, inputs.total_pages, inputs.pages);

    inputs
        .range
        .pages()
        .filter(|page_index| *page_index < inputs.total_pages)
        .map(|page_index| {
            let visible = in_view.contains(&page_index);
            PageRenderRequest {
                page_index,
                height_px: inputs.fit.box_height,
                device_pixel_ratio: device_pixel_ratio_for(
                    visible,
                    inputs.zoom_scale,
                    inputs.device_pixel_ratio,
                    inputs.config,
                ),
                in_view: visible,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPSILON: f32 = 1e-3;

    fn letter() -> PageExtent {
        PageExtent { width: 612.0, height: 792.0 }
    }

    #[test]
    fn two_page_fit_is_width_bound_on_wide_containers() {
        let fit = compute_fit(
            ContainerSize::new(1000.0, 800.0),
            PageExtent { width: 500.0, height: 400.0 },
            PagesPerSpread::Two,
        );

        assert_eq!(fit.scale, 1.0);
        assert_eq!(fit.box_width, 1000.0);
        assert_eq!(fit.box_height, 400.0);
    }

    #[test]
    fn fit_uses_the_tighter_axis() {
        let fit = compute_fit(
            ContainerSize::new(1000.0, 800.0),
            PageExtent { width: 500.0, height: 2000.0 },
            PagesPerSpread::One,
        );

        assert_eq!(fit.scale, 0.4);
        assert_eq!(fit.box_width, 200.0);
        assert_eq!(fit.box_height, 800.0);
    }

    #[test]
    fn unmeasured_container_is_not_ready() {
        let fit = compute_fit(ContainerSize::new(0.0, 600.0), letter(), PagesPerSpread::Two);
        assert_eq!(fit, Fit::NOT_READY);
        assert!(!fit.is_ready());
    }

    #[test]
    fn zoomed_box_scales_only_past_one() {
        let fit = Fit { scale: 1.0, box_width: 100.0, box_height: 50.0 };
        assert_eq!(fit.zoomed(1.0), (100.0, 50.0));
        assert_eq!(fit.zoomed(2.0), (200.0, 100.0));
    }

    #[test]
    fn narrow_containers_show_one_page() {
        assert_eq!(PagesPerSpread::for_width(767.0, 768.0), PagesPerSpread::One);
        assert_eq!(PagesPerSpread::for_width(768.0, 768.0), PagesPerSpread::Two);
    }

    #[test]
    fn range_is_clamped_at_both_ends() {
        assert_eq!(compute_range(0, 10, 2), ViewRange { start: 0, end: 2 });
        assert_eq!(compute_range(5, 10, 2), ViewRange { start: 3, end: 7 });
        assert_eq!(compute_range(9, 10, 2), ViewRange { start: 7, end: 10 });
        assert_eq!(compute_range(40, 10, 2), ViewRange { start: 7, end: 10 });
        assert_eq!(compute_range(0, 0, 2), ViewRange::default());
    }

    #[test]
    fn initial_range_covers_first_pages() {
        assert_eq!(initial_range(10), ViewRange { start: 0, end: 4 });
        assert_eq!(initial_range(2), ViewRange { start: 0, end: 2 });
    }

    #[test]
    fn spreads_follow_cover_layout() {
        assert_eq!(spread_pages(0, 10, PagesPerSpread::Two), 0..1);
        assert_eq!(spread_pages(1, 10, PagesPerSpread::Two), 1..3);
        assert_eq!(spread_pages(2, 10, PagesPerSpread::Two), 1..3);
        assert_eq!(spread_pages(9, 10, PagesPerSpread::Two), 9..10);
        assert_eq!(spread_pages(4, 10, PagesPerSpread::One), 4..5);
    }

    #[test]
    fn spread_steps_walk_spread_starts() {
        assert_eq!(next_spread_start(0, 10, PagesPerSpread::Two), Some(1));
        assert_eq!(next_spread_start(2, 10, PagesPerSpread::Two), Some(3));
        assert_eq!(next_spread_start(9, 10, PagesPerSpread::Two), None);
        assert_eq!(next_spread_start(8, 10, PagesPerSpread::Two), Some(9));
        assert_eq!(next_spread_start(7, 9, PagesPerSpread::Two), None);

        assert_eq!(previous_spread_start(0, PagesPerSpread::Two), None);
        assert_eq!(previous_spread_start(2, PagesPerSpread::Two), Some(0));
        assert_eq!(previous_spread_start(4, PagesPerSpread::Two), Some(1));

        assert_eq!(next_spread_start(9, 10, PagesPerSpread::One), None);
        assert_eq!(previous_spread_start(3, PagesPerSpread::One), Some(2));
    }

    #[test]
    fn oversampling_kicks_in_past_threshold_for_pages_in_view() {
        let config = ViewerConfig::default();

        assert_eq!(device_pixel_ratio_for(true, 1.5, 2.0, &config), 2.0);
        assert_eq!(device_pixel_ratio_for(true, 2.0, 2.0, &config), 4.0);
        assert_eq!(device_pixel_ratio_for(true, 4.0, 2.0, &config), 5.0);
        assert_eq!(device_pixel_ratio_for(false, 4.0, 2.0, &config), 2.0);
    }

    #[test]
    fn render_requests_cover_range_and_mark_spread_in_view() {
        let config = ViewerConfig::default();
        let requests = render_requests(RenderInputs {
            range: compute_range(3, 10, 2),
            fit: Fit { scale: 0.5, box_width: 612.0, box_height: 396.0 },
            current_page_index: 3,
            total_pages: 10,
            pages: PagesPerSpread::Two,
            zoom_scale: 2.0,
            device_pixel_ratio: 1.0,
            config: &config,
        });

        let indices: Vec<u32> = requests.iter().map(|request| request.page_index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4]);

        let in_view: Vec<u32> = requests
            .iter()
            .filter(|request| request.in_view)
            .map(|request| request.page_index)
            .collect();
        assert_eq!(in_view, vec![3, 4]);
        assert_eq!(requests[2].device_pixel_ratio, 2.0);
        assert_eq!(requests[0].device_pixel_ratio, 1.0);
        assert!(requests.iter().all(|request| request.height_px == 396.0));
    }

    #[test]
    fn render_requests_wait_for_fit() {
        let config = ViewerConfig::default();
        let requests = render_requests(RenderInputs {
            range: initial_range(10),
            fit: Fit::NOT_READY,
            current_page_index: 0,
            total_pages: 10,
            pages: PagesPerSpread::Two,
            zoom_scale: 1.0,
            device_pixel_ratio: 1.0,
            config: &config,
        });

        assert!(requests.is_empty());
    }

    #[test]
    fn engine_request_pins_height() {
        let request = PageRenderRequest {
            page_index: 2,
            height_px: 300.0,
            device_pixel_ratio: 2.0,
            in_view: true,
        };

        let engine = request.to_engine_request();
        assert_eq!(engine.page_index, 2);
        assert_eq!(engine.size, RenderSize::Height(300.0));
        assert_eq!(engine.device_pixel_ratio, 2.0);
    }

    proptest! {
        #[test]
        fn fit_never_crops(
            width in 1.0f32..5000.0,
            height in 1.0f32..5000.0,
            page_width in 1.0f32..3000.0,
            page_height in 1.0f32..3000.0,
            two_up in any::<bool>(),
        ) {
            let pages = if two_up { PagesPerSpread::Two } else { PagesPerSpread::One };
            let fit = compute_fit(
                ContainerSize::new(width, height),
                PageExtent { width: page_width, height: page_height },
                pages,
            );

            prop_assert!(fit.is_ready());
            prop_assert!(fit.scale * pages.count() as f32 * page_width <= width * (1.0 + EPSILON));
            prop_assert!(fit.scale * page_height <= height * (1.0 + EPSILON));
        }

        #[test]
        fn range_brackets_current_page(total in 1u32..2000, seed in any::<u32>()) {
            let current = seed % total;
            let range = compute_range(current, total, 2);

            prop_assert!(range.start <= current);
            prop_assert!(current <= range.end);
            prop_assert!(range.end <= total);
        }

        #[test]
        fn spread_steps_stay_in_document(
            total in 1u32..500,
            seed in any::<u32>(),
            two_up in any::<bool>(),
        ) {
            let pages = if two_up { PagesPerSpread::Two } else { PagesPerSpread::One };
            let current = seed % total;

            if let Some(next) = next_spread_start(current, total, pages) {
                prop_assert!(next > current && next < total);
            }
            if let Some(previous) = previous_spread_start(current, pages) {
                prop_assert!(previous < current);
            }
        }
    }
}
