//! Colour palettes for the terminal UI

use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Palette selected by `[ui] theme` in the config
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ThemeKind {
    #[default]
    Dark,
    Light,
}

/// Concrete colours used by the widgets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub text: Color,
    pub muted: Color,
    pub faint: Color,
    pub user: Color,
    pub assistant: Color,
    pub system: Color,
    pub focus: Color,
    pub accent: Color,
    pub highlight_fg: Color,
    pub notice: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            text: Color::White,
            muted: Color::Gray,
            faint: Color::DarkGray,
            user: Color::Blue,
            assistant: Color::Green,
            system: Color::Yellow,
            focus: Color::Green,
            accent: Color::Cyan,
            highlight_fg: Color::Black,
            notice: Color::Yellow,
        }
    }

    // Dark text on a light background; yellow and cyan wash out there.
    pub fn light() -> Self {
        Self {
            text: Color::Black,
            muted: Color::DarkGray,
            faint: Color::Gray,
            user: Color::Blue,
            assistant: Color::Rgb(0, 110, 40),
            system: Color::Magenta,
            focus: Color::Blue,
            accent: Color::Blue,
            highlight_fg: Color::White,
            notice: Color::Red,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl From<ThemeKind> for Theme {
    fn from(kind: ThemeKind) -> Self {
        match kind {
            ThemeKind::Dark => Theme::dark(),
            ThemeKind::Light => Theme::light(),
        }
    }
}
