use crate::layout::Fit;
use doc_model::{ContainerSize, PdfDetails};
use serde::Serialize;

/// Visible part of a zoomed spread, as fractions of the spread.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewportRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// `None` while unzoomed; the minimap is only shown when zoomed in.
pub fn minimap_viewport(
    fit: Fit,
    zoom_scale: f32,
    viewport: ContainerSize,
    scroll_x: f32,
    scroll_y: f32,
) -> Option<ViewportRect> {
    if zoom_scale <= 1.0 || !fit.is_ready() || !viewport.is_measured() {
        return None;
    }

    let (content_width, content_height) = fit.zoomed(zoom_scale);
    let w = (viewport.width / content_width).min(1.0);
    let h = (viewport.height / content_height).min(1.0);

    let x = (scroll_x.max(0.0) / content_width).min(1.0 - w);
    let y = (scroll_y.max(0.0) / content_height).min(1.0 - h);

    Some(ViewportRect { x, y, w, h })
}

/// Minimap box height for a given width, keeping the page's aspect ratio.
pub fn minimap_height(width_px: u32, details: &PdfDetails) -> f32 {
    width_px as f32 * details.height / details.width
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fit() -> Fit {
        Fit { scale: 1.0, box_width: 400.0, box_height: 300.0 }
    }

    #[test]
    fn hidden_when_not_zoomed() {
        assert_eq!(minimap_viewport(fit(), 1.0, ContainerSize::new(400.0, 300.0), 0.0, 0.0), None);
    }

    #[test]
    fn zoom_two_shows_a_quarter() {
        let rect = minimap_viewport(fit(), 2.0, ContainerSize::new(400.0, 300.0), 200.0, 150.0)
            .expect("zoomed viewport");

        assert_eq!(rect, ViewportRect { x: 0.25, y: 0.25, w: 0.5, h: 0.5 });
    }

    #[test]
    fn scroll_is_clamped_to_content() {
        let rect = minimap_viewport(fit(), 4.0, ContainerSize::new(400.0, 300.0), 10_000.0, -50.0)
            .expect("zoomed viewport");

        assert_eq!(rect.w, 0.25);
        assert_eq!(rect.x, 0.75);
        assert_eq!(rect.y, 0.0);
    }

    #[test]
    fn height_follows_page_aspect() {
        let details = PdfDetails::new(3, 600.0, 800.0).expect("valid details");
        assert_eq!(minimap_height(120, &details), 160.0);
    }
}
