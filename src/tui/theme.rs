// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cirrus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cirrus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::{env, error::Error, fmt};

use ratatui::style::{Color, Modifier, Style};

/// Colors used by the list view, resolvable from a `CIRRUS_PALETTE` override.
#[derive(Debug, Clone)]
pub(crate) struct TuiTheme {
    palette: Option<TuiPalette>,
}

impl Default for TuiTheme {
    fn default() -> Self {
        Self { palette: None }
    }
}

impl TuiTheme {
    pub(crate) fn from_env() -> Result<Self, ThemeError> {
        let palette = palette_override_from_env()?;
        Ok(Self { palette })
    }

    pub(crate) fn base_style(&self) -> Style {
        match &self.palette {
            Some(palette) => Style::default().fg(palette.fg).bg(palette.bg),
            None => Style::default(),
        }
    }

    fn accent(&self) -> Color {
        match &self.palette {
            Some(palette) => palette.accent,
            None => Color::Cyan,
        }
    }

    fn alert(&self) -> Color {
        match &self.palette {
            Some(palette) => palette.alert,
            None => Color::LightRed,
        }
    }

    fn muted(&self) -> Color {
        match &self.palette {
            Some(palette) => palette.muted,
            None => Color::DarkGray,
        }
    }

    pub(crate) fn header_style(&self) -> Style {
        self.base_style()
            .fg(self.accent())
            .add_modifier(Modifier::BOLD)
    }

    pub(crate) fn border_style(&self) -> Style {
        self.base_style().fg(self.muted())
    }

    pub(crate) fn selection_style(&self) -> Style {
        self.base_style()
            .add_modifier(Modifier::REVERSED | Modifier::BOLD)
    }

    /// Style for rows whose content changed within the recent-update window.
    pub(crate) fn recent_style(&self, selected: bool) -> Style {
        let base = self.base_style().fg(self.accent());
        if selected {
            base.add_modifier(Modifier::REVERSED | Modifier::BOLD)
        } else {
            base.add_modifier(Modifier::BOLD)
        }
    }

    pub(crate) fn error_style(&self) -> Style {
        self.base_style()
            .fg(self.alert())
            .add_modifier(Modifier::BOLD)
    }

    pub(crate) fn footer_label_style(&self) -> Style {
        self.base_style().fg(self.muted())
    }

    pub(crate) fn footer_key_style(&self) -> Style {
        self.base_style()
            .fg(self.accent())
            .add_modifier(Modifier::BOLD)
    }
}

#[derive(Debug, Clone)]
struct TuiPalette {
    fg: Color,
    bg: Color,
    accent: Color,
    alert: Color,
    muted: Color,
}

impl TuiPalette {
    const CSV_LEN: usize = 5;

    fn parse_csv(value: &str) -> Result<Self, String> {
        let parts: Vec<&str> = value.split(',').map(|part| part.trim()).collect();
        if parts.len() != Self::CSV_LEN {
            return Err(format!(
                "expected {} comma-separated colors (fg,bg,accent,alert,muted), got {}",
                Self::CSV_LEN,
                parts.len()
            ));
        }

        Ok(Self {
            fg: parse_palette_color(parts[0])?,
            bg: parse_palette_color(parts[1])?,
            accent: parse_palette_color(parts[2])?,
            alert: parse_palette_color(parts[3])?,
            muted: parse_palette_color(parts[4])?,
        })
    }
}

fn palette_override_from_env() -> Result<Option<TuiPalette>, ThemeError> {
    let value = match env::var("CIRRUS_PALETTE") {
        Ok(value) => value,
        Err(env::VarError::NotPresent) => return Ok(None),
        Err(env::VarError::NotUnicode(_)) => {
            return Err(ThemeError::InvalidEnv {
                name: "CIRRUS_PALETTE".to_string(),
                value: "<non-unicode>".to_string(),
            });
        }
    };

    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let parsed = TuiPalette::parse_csv(trimmed).map_err(|error| ThemeError::InvalidEnv {
        name: "CIRRUS_PALETTE".to_string(),
        value: format!("{trimmed} ({error})"),
    })?;

    Ok(Some(parsed))
}

fn parse_palette_color(value: &str) -> Result<Color, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("empty color".to_string());
    }

    let hex = trimmed
        .strip_prefix('#')
        .or_else(|| trimmed.strip_prefix("0x"))
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if hex.len() != 6 || !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return Err(format!("invalid hex color: {trimmed} (expected #RRGGBB)"));
    }
    let rgb = u32::from_str_radix(hex, 16).map_err(|_| format!("invalid hex color: {trimmed}"))?;
    let r = ((rgb >> 16) & 0xFF) as u8;
    let g = ((rgb >> 8) & 0xFF) as u8;
    let b = (rgb & 0xFF) as u8;
    Ok(Color::Rgb(r, g, b))
}

#[derive(Debug)]
pub(crate) enum ThemeError {
    InvalidEnv { name: String, value: String },
}

impl fmt::Display for ThemeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEnv { name, value } => {
                write!(f, "invalid {name} palette: {value}")
            }
        }
    }
}

impl Error for ThemeError {}
