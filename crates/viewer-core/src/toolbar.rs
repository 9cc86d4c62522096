use crate::layout::{next_spread_start, PagesPerSpread, ScreenWidthClass};
use doc_model::{ViewerConfig, ViewerState};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolbarModel {
    pub page_label: String,
    pub previous_enabled: bool,
    pub next_enabled: bool,
    pub zoom_controls_visible: bool,
    pub zoom_in_enabled: bool,
    pub zoom_out_enabled: bool,
    pub fullscreen_available: bool,
    pub is_fullscreen: bool,
}

/// "4 - 5 of 10" while a spread is open, "1 of 10" for the cover or last page.
pub fn page_label(current_page_index: u32, total_pages: u32) -> String {
    let page_number = current_page_index + 1;

    if page_number % 2 == 0 && page_number != total_pages {
        format!("{} - {} of {}", page_number, page_number + 1, total_pages)
    } else {
        format!("{page_number} of {total_pages}")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ToolbarInputs<'a> {
    pub state: ViewerState,
    pub total_pages: u32,
    pub pages: PagesPerSpread,
    pub screen: ScreenWidthClass,
    pub fullscreen_available: bool,
    pub is_fullscreen: bool,
    pub config: &'a ViewerConfig,
}

pub fn toolbar_model(inputs: ToolbarInputs<'_>) -> ToolbarModel {
    let current = inputs.state.current_page_index;

    ToolbarModel {
        page_label: page_label(current, inputs.total_pages),
        previous_enabled: current > 0,
        next_enabled: next_spread_start(current, inputs.total_pages, inputs.pages).is_some(),
        zoom_controls_visible: inputs.screen == ScreenWidthClass::Wide,
        zoom_in_enabled: inputs.state.zoom_scale < inputs.config.max_zoom,
        zoom_out_enabled: inputs.state.zoom_scale > inputs.config.min_zoom,
        fullscreen_available: inputs.fullscreen_available,
        is_fullscreen: inputs.is_fullscreen,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_shows_open_spread() {
        assert_eq!(page_label(0, 10), "1 of 10");
        assert_eq!(page_label(1, 10), "2 - 3 of 10");
        assert_eq!(page_label(2, 10), "3 of 10");
        assert_eq!(page_label(9, 10), "10 of 10");
    }

    #[test]
    fn last_even_page_stands_alone() {
        assert_eq!(page_label(9, 10), "10 of 10");
        assert_eq!(page_label(7, 8), "8 of 8");
    }

    #[test]
    fn buttons_disable_at_document_edges() {
        let config = ViewerConfig::default();
        let inputs = ToolbarInputs {
            state: ViewerState::default(),
            total_pages: 10,
            pages: PagesPerSpread::Two,
            screen: ScreenWidthClass::Wide,
            fullscreen_available: true,
            is_fullscreen: false,
            config: &config,
        };

        let first = toolbar_model(inputs);
        assert!(!first.previous_enabled);
        assert!(first.next_enabled);
        assert!(!first.zoom_out_enabled);
        assert!(first.zoom_in_enabled);
        assert!(first.zoom_controls_visible);

        let last = toolbar_model(ToolbarInputs {
            state: ViewerState { current_page_index: 9, zoom_scale: 5.0 },
            ..inputs
        });
        assert!(last.previous_enabled);
        assert!(!last.next_enabled);
        assert!(!last.zoom_in_enabled);
        assert!(last.zoom_out_enabled);
    }

    #[test]
    fn narrow_screens_hide_zoom_controls() {
        let config = ViewerConfig::default();
        let model = toolbar_model(ToolbarInputs {
            state: ViewerState::default(),
            total_pages: 3,
            pages: PagesPerSpread::One,
            screen: ScreenWidthClass::Narrow,
            fullscreen_available: false,
            is_fullscreen: false,
            config: &config,
        });

        assert!(!model.zoom_controls_visible);
        assert!(!model.fullscreen_available);
    }
}
