use crate::layout::ScreenWidthClass;
use flipbook_scheduler::{Debounced, TimerToken};
use serde::Serialize;
use std::str::FromStr;
use std::time::{Duration, Instant};

/// Thumbnail clicks at most this many pages away animate instead of jumping.
pub const DEFAULT_ANIMATE_DISTANCE: u32 = 2;

/// Navigation command, decoupled from the input that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "intent", content = "index", rename_all = "snake_case")]
pub enum Intent {
    None,
    /// Animated flip forward by one layout unit (a page or a spread).
    Next,
    /// Animated flip backward by one layout unit.
    Previous,
    /// Single physical page forward, no animation.
    TurnNext,
    TurnPrevious,
    /// Direct cut to a page index.
    JumpTo(u32),
}

pub fn map_wheel_delta(delta_y: f32) -> Intent {
    if delta_y > 0.0 {
        Intent::Next
    } else if delta_y < 0.0 {
        Intent::Previous
    } else {
        Intent::None
    }
}

pub fn map_thumbnail_click(target_index: u32, current_index: u32) -> Intent {
    map_thumbnail_click_within(target_index, current_index, DEFAULT_ANIMATE_DISTANCE)
}

/// The flip animation only handles single steps smoothly; anything farther
/// than `animate_distance` becomes a direct jump.
pub fn map_thumbnail_click_within(
    target_index: u32,
    current_index: u32,
    animate_distance: u32,
) -> Intent {
    let delta = i64::from(target_index) - i64::from(current_index);
    let distance = i64::from(animate_distance);

    if delta > 0 && delta <= distance {
        Intent::Next
    } else if delta < 0 && delta >= -distance {
        Intent::Previous
    } else {
        Intent::JumpTo(target_index)
    }
}

pub fn map_slider(value: u32, total_pages: u32) -> Intent {
    if total_pages == 0 {
        return Intent::None;
    }

    Intent::JumpTo(value.min(total_pages - 1))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowRight,
    ArrowLeft,
    Escape,
    Char(char),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown key {0:?}")]
pub struct UnknownKey(pub String);

impl FromStr for Key {
    type Err = UnknownKey;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "right" | "arrowright" => Ok(Self::ArrowRight),
            "left" | "arrowleft" => Ok(Self::ArrowLeft),
            "escape" | "esc" => Ok(Self::Escape),
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => Ok(Self::Char(ch.to_ascii_lowercase())),
                    _ => Err(UnknownKey(name.to_owned())),
                }
            }
        }
    }
}

/// Narrow screens turn one physical page; wide screens flip a whole spread.
pub fn map_arrow_key(key: Key, width_class: ScreenWidthClass) -> Intent {
    match (key, width_class) {
        (Key::ArrowRight, ScreenWidthClass::Narrow) => Intent::TurnNext,
        (Key::ArrowRight, ScreenWidthClass::Wide) => Intent::Next,
        (Key::ArrowLeft, ScreenWidthClass::Narrow) => Intent::TurnPrevious,
        (Key::ArrowLeft, ScreenWidthClass::Wide) => Intent::Previous,
        _ => Intent::None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Navigate(Intent),
    ToggleFullscreen,
    ExitFullscreen,
}

pub fn map_key(key: Key, width_class: ScreenWidthClass, is_fullscreen: bool) -> Option<KeyCommand> {
    match key {
        Key::ArrowRight | Key::ArrowLeft => {
            Some(KeyCommand::Navigate(map_arrow_key(key, width_class)))
        }
        Key::Char('f') => Some(KeyCommand::ToggleFullscreen),
        Key::Escape if is_fullscreen => Some(KeyCommand::ExitFullscreen),
        _ => None,
    }
}

/// Debounced wheel-to-page mapping
///
/// Only the trailing event of a burst turns a page. A zero delta still
/// replaces the pending event, so a burst ending on a neutral event does
/// nothing.
pub struct WheelNavigator {
    pending: Debounced<Intent>,
}

impl WheelNavigator {
    pub fn new(delay: Duration) -> Self {
        Self { pending: Debounced::new(delay) }
    }

    pub fn on_wheel(&mut self, delta_y: f32, now: Instant) -> TimerToken {
        self.pending.trigger(now, map_wheel_delta(delta_y))
    }

    pub fn poll(&mut self, now: Instant) -> Option<Intent> {
        self.pending.poll(now).filter(|intent| *intent != Intent::None)
    }

    pub fn cancel(&mut self) -> bool {
        self.pending.cancel()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_pending()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.next_deadline()
    }
}
