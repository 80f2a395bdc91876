//! Colour palettes for the terminal user interface.

use ratatui::style::Color;

use crate::fields::Theme;

// Two palettes back the persisted light/dark preference. Widgets never
// reference Color values directly, only the active palette.

/// Resolved colour set for one theme.
pub struct Palette {
    pub text: Color,
    pub dim: Color,
    pub accent: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,
    pub error: Color,
    pub overdue: Color,
    pub done: Color,
    pub high: Color,
    pub medium: Color,
    pub low: Color,
}

/// Used for the light theme accent
pub const TEAL: Color = Color::Rgb(0, 110, 110);
/// Used for the dark theme accent
pub const AMBER: Color = Color::Rgb(255, 191, 0);
/// Used for overdue rows
pub const DARK_RED: Color = Color::Rgb(180, 30, 30);

/// Resolve the palette for a theme.
pub fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Light => Palette {
            text: Color::Black,
            dim: Color::DarkGray,
            accent: TEAL,
            selection_bg: TEAL,
            selection_fg: Color::White,
            error: DARK_RED,
            overdue: DARK_RED,
            done: Color::DarkGray,
            high: Color::Red,
            medium: Color::Blue,
            low: Color::DarkGray,
        },
        Theme::Dark => Palette {
            text: Color::White,
            dim: Color::Gray,
            accent: AMBER,
            selection_bg: AMBER,
            selection_fg: Color::Black,
            error: Color::LightRed,
            overdue: Color::LightRed,
            done: Color::Gray,
            high: Color::LightRed,
            medium: Color::LightBlue,
            low: Color::Gray,
        },
    }
}
