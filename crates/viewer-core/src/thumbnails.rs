use serde::Serialize;

/// One entry of the thumbnail strip, holding 1-based page numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThumbnailSpread {
    pub pages: Vec<u32>,
    pub label: String,
    pub active: bool,
}

impl ThumbnailSpread {
    /// 0-based index a click on this spread navigates to.
    pub fn target_index(&self) -> u32 {
        self.pages.first().map_or(0, |page| page.saturating_sub(1))
    }
}

/// `[[1], [2, 3], [4, 5], ...]`: the cover alone, then facing pairs.
pub fn thumbnail_spreads(total_pages: u32) -> Vec<Vec<u32>> {
    if total_pages == 0 {
        return Vec::new();
    }

    let mut spreads = vec![vec![1]];
    let mut left = 2;

    while left <= total_pages {
        let mut spread = vec![left];
        if left < total_pages {
            spread.push(left + 1);
        }
        spreads.push(spread);
        left += 2;
    }

    spreads
}

pub fn active_spread_index(spreads: &[Vec<u32>], current_page_index: u32) -> Option<usize> {
    let page_number = current_page_index + 1;
    spreads.iter().position(|spread| spread.contains(&page_number))
}

pub fn thumbnail_strip(total_pages: u32, current_page_index: u32) -> Vec<ThumbnailSpread> {
    let spreads = thumbnail_spreads(total_pages);
    let active = active_spread_index(&spreads, current_page_index);

    spreads
        .into_iter()
        .enumerate()
        .map(|(index, pages)| {
            let label = pages.iter().map(u32::to_string).collect::<Vec<_>>().join("-");
            ThumbnailSpread { pages, label, active: active == Some(index) }
        })
        .collect()
}
