//! Input scripts for `flipbook-cli replay`
//!
//! One command per line; blank lines and `#` comments are skipped.
//!
//! ```text
//! wheel 40 @0       # wheel delta, optional absolute timestamp in ms
//! key right         # right, left, escape, or a single character
//! thumb 9           # thumbnail click on a 0-based page index
//! slider 0
//! zoom in           # in, out, reset
//! resize 1200x800
//! flip 3            # animation landed on a page
//! wait 150          # advance the clock
//! ```

use anyhow::{bail, Context, Result};
use std::str::FromStr;
use viewer_core::Key;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomStep {
    In,
    Out,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScriptCommand {
    Wheel { delta_y: f32, at_ms: Option<u64> },
    Key(Key),
    Thumb(u32),
    Slider(u32),
    Zoom(ZoomStep),
    Resize { width: f32, height: f32 },
    Flip(u32),
    Wait(u64),
}

impl FromStr for ScriptCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            bail!("empty command");
        };
        let args: Vec<&str> = words.collect();

        let command = match (verb, args.as_slice()) {
            ("wheel", [delta]) => {
                Self::Wheel { delta_y: parse_arg(delta, "wheel delta")?, at_ms: None }
            }
            ("wheel", [delta, at]) => {
                let at = at
                    .strip_prefix('@')
                    .with_context(|| format!("expected @<ms>, got {at:?}"))?;
                Self::Wheel {
                    delta_y: parse_arg(delta, "wheel delta")?,
                    at_ms: Some(parse_arg(at, "timestamp")?),
                }
            }
            ("key", [name]) => Self::Key(name.parse()?),
            ("thumb", [index]) => Self::Thumb(parse_arg(index, "page index")?),
            ("slider", [index]) => Self::Slider(parse_arg(index, "page index")?),
            ("zoom", ["in"]) => Self::Zoom(ZoomStep::In),
            ("zoom", ["out"]) => Self::Zoom(ZoomStep::Out),
            ("zoom", ["reset"]) => Self::Zoom(ZoomStep::Reset),
            ("resize", [size]) => {
                let (width, height) = size
                    .split_once('x')
                    .with_context(|| format!("expected <w>x<h>, got {size:?}"))?;
                Self::Resize {
                    width: parse_arg(width, "width")?,
                    height: parse_arg(height, "height")?,
                }
            }
            ("flip", [index]) => Self::Flip(parse_arg(index, "page index")?),
            ("wait", [ms]) => Self::Wait(parse_arg(ms, "duration")?),
            _ => bail!("unrecognized command {line:?}"),
        };

        Ok(command)
    }
}

fn parse_arg<T>(text: &str, what: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    text.parse().with_context(|| format!("invalid {what} {text:?}"))
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptLine {
    pub number: usize,
    pub text: String,
    pub command: ScriptCommand,
}

pub fn parse_script(source: &str) -> Result<Vec<ScriptLine>> {
    let mut lines = Vec::new();

    for (index, raw) in source.lines().enumerate() {
        let number = index + 1;
        let text = raw.split('#').next().unwrap_or_default().trim();
        if text.is_empty() {
            continue;
        }

        let command = text.parse().with_context(|| format!("script line {number}"))?;
        lines.push(ScriptLine { number, text: text.to_owned(), command });
    }

    Ok(lines)
}
