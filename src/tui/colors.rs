//! Color palettes for the terminal user interface.

use ratatui::style::Color;

use crate::fields::{Category, Priority};

pub const GOLD: Color = Color::Rgb(255, 215, 0);
pub const DARK_RED: Color = Color::Rgb(114, 0, 0);
pub const DARK_GREEN: Color = Color::Rgb(0, 80, 0);
pub const DARK_PURPLE: Color = Color::Rgb(86, 60, 92);

/// Colors used for one theme.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    pub fg: Color,
    pub bg: Color,
    pub muted: Color,
    pub accent: Color,
    pub highlight_fg: Color,
    pub highlight_bg: Color,
    pub status_fg: Color,
    pub status_bg: Color,
    pub overdue: Color,
    pub danger: Color,
}

pub const DARK: Palette = Palette {
    fg: Color::White,
    bg: Color::Rgb(24, 24, 28),
    muted: Color::DarkGray,
    accent: GOLD,
    highlight_fg: Color::Black,
    highlight_bg: Color::Gray,
    status_fg: Color::Rgb(20, 20, 20),
    status_bg: GOLD,
    overdue: Color::LightRed,
    danger: DARK_RED,
};

pub const LIGHT: Palette = Palette {
    fg: Color::Black,
    bg: Color::Rgb(250, 250, 245),
    muted: Color::Gray,
    accent: Color::Blue,
    highlight_fg: Color::White,
    highlight_bg: Color::Blue,
    status_fg: Color::White,
    status_bg: Color::Blue,
    overdue: Color::Red,
    danger: Color::LightRed,
};

impl Palette {
    pub fn for_mode(dark: bool) -> Self {
        if dark {
            DARK
        } else {
            LIGHT
        }
    }

    pub fn category(&self, category: Category) -> Color {
        match category {
            Category::Work => Color::Cyan,
            Category::School => DARK_PURPLE,
            Category::Personal => DARK_GREEN,
        }
    }

    pub fn priority(&self, priority: Priority) -> Color {
        match priority {
            Priority::High => self.overdue,
            Priority::Medium => self.accent,
            Priority::Low => self.muted,
        }
    }
}
