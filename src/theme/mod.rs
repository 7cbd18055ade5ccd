//! Theme support for splitdiff
//!
//! Provides dark, light and Catppuccin themes as page CSS plus a matching
//! syntect theme for the highlight classes.

use std::fmt;

use syntect::html::{ClassStyle, css_for_theme_with_class_style};
use two_face::theme::EmbeddedThemeName;

use crate::error::{HighlightError, Result};

/// A CSS color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Complete color theme for the rendered page
#[derive(Debug, Clone)]
pub struct Theme {
    pub dark: bool,

    // Base colors
    pub page_bg: Rgb,
    pub panel_bg: Rgb,
    pub fg_primary: Rgb,
    pub fg_dim: Rgb,
    pub border: Rgb,

    // Diff colors
    pub diff_add_bg: Rgb,
    pub diff_del_bg: Rgb,
    pub diff_hunk_header: Rgb,
    pub spacer_bg: Rgb,

    // Changed-pair backgrounds and the stronger per-character marks
    pub changed_add_bg: Rgb,
    pub changed_del_bg: Rgb,
    pub char_add_bg: Rgb,
    pub char_del_bg: Rgb,

    // Overview strip marks
    pub mark_red: Rgb,
    pub mark_green: Rgb,
    pub mark_blue: Rgb,
    pub mark_purple: Rgb,

    // Syntect theme for the highlight classes
    pub syntect_theme: EmbeddedThemeName,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            dark: true,

            page_bg: Rgb(24, 24, 28),
            panel_bg: Rgb(30, 30, 30),
            fg_primary: Rgb(230, 230, 230),
            fg_dim: Rgb(160, 160, 160),
            border: Rgb(70, 70, 70),

            diff_add_bg: Rgb(0, 60, 20),
            diff_del_bg: Rgb(70, 0, 0),
            diff_hunk_header: Rgb(90, 200, 255),
            spacer_bg: Rgb(36, 36, 40),

            changed_add_bg: Rgb(0, 35, 12),
            changed_del_bg: Rgb(45, 0, 0),
            char_add_bg: Rgb(0, 100, 40),
            char_del_bg: Rgb(120, 20, 20),

            mark_red: Rgb(240, 90, 90),
            mark_green: Rgb(80, 220, 120),
            mark_blue: Rgb(90, 170, 255),
            mark_purple: Rgb(255, 140, 220),

            syntect_theme: EmbeddedThemeName::Base16EightiesDark,
        }
    }

    pub fn light() -> Self {
        Self {
            dark: false,

            page_bg: Rgb(255, 255, 255),
            panel_bg: Rgb(245, 243, 232),
            fg_primary: Rgb(0, 0, 0),
            fg_dim: Rgb(80, 80, 80),
            border: Rgb(200, 200, 220),

            // Backgrounds stay very light so dark text keeps its contrast
            diff_add_bg: Rgb(220, 255, 220),
            diff_del_bg: Rgb(255, 240, 240),
            diff_hunk_header: Rgb(0, 60, 140),
            spacer_bg: Rgb(240, 240, 240),

            changed_add_bg: Rgb(230, 255, 230),
            changed_del_bg: Rgb(255, 235, 235),
            char_add_bg: Rgb(170, 240, 170),
            char_del_bg: Rgb(255, 190, 190),

            mark_red: Rgb(160, 0, 0),
            mark_green: Rgb(0, 100, 0),
            mark_blue: Rgb(0, 60, 140),
            mark_purple: Rgb(100, 0, 100),

            syntect_theme: EmbeddedThemeName::Base16OceanLight,
        }
    }

    pub fn catppuccin_latte() -> Self {
        let flavor = CatppuccinFlavor {
            dark: false,
            text: Rgb(76, 79, 105),
            overlay0: Rgb(156, 160, 176),
            surface1: Rgb(188, 192, 204),
            base: Rgb(239, 241, 245),
            mantle: Rgb(230, 233, 239),
            red: Rgb(210, 15, 57),
            green: Rgb(64, 160, 43),
            blue: Rgb(30, 102, 245),
            pink: Rgb(234, 118, 203),
        };
        catppuccin_theme(flavor, EmbeddedThemeName::CatppuccinLatte)
    }

    pub fn catppuccin_frappe() -> Self {
        let flavor = CatppuccinFlavor {
            dark: true,
            text: Rgb(198, 208, 245),
            overlay0: Rgb(115, 121, 148),
            surface1: Rgb(81, 87, 109),
            base: Rgb(48, 52, 70),
            mantle: Rgb(41, 44, 60),
            red: Rgb(231, 130, 132),
            green: Rgb(166, 209, 137),
            blue: Rgb(140, 170, 238),
            pink: Rgb(244, 184, 228),
        };
        catppuccin_theme(flavor, EmbeddedThemeName::CatppuccinFrappe)
    }

    pub fn catppuccin_macchiato() -> Self {
        let flavor = CatppuccinFlavor {
            dark: true,
            text: Rgb(202, 211, 245),
            overlay0: Rgb(110, 115, 141),
            surface1: Rgb(73, 77, 100),
            base: Rgb(36, 39, 58),
            mantle: Rgb(30, 32, 48),
            red: Rgb(237, 135, 150),
            green: Rgb(166, 218, 149),
            blue: Rgb(138, 173, 244),
            pink: Rgb(245, 189, 230),
        };
        catppuccin_theme(flavor, EmbeddedThemeName::CatppuccinMacchiato)
    }

    pub fn catppuccin_mocha() -> Self {
        let flavor = CatppuccinFlavor {
            dark: true,
            text: Rgb(205, 214, 244),
            overlay0: Rgb(108, 112, 134),
            surface1: Rgb(69, 71, 90),
            base: Rgb(30, 30, 46),
            mantle: Rgb(24, 24, 37),
            red: Rgb(243, 139, 168),
            green: Rgb(166, 227, 161),
            blue: Rgb(137, 180, 250),
            pink: Rgb(245, 194, 231),
        };
        catppuccin_theme(flavor, EmbeddedThemeName::CatppuccinMocha)
    }

    /// Page stylesheet: diff layout and colors followed by the syntect
    /// classes for `syntect_theme`.
    pub fn css(&self) -> Result<String> {
        let themes = two_face::theme::extra();
        let syntax_css = css_for_theme_with_class_style(
            themes.get(self.syntect_theme),
            ClassStyle::Spaced,
        )
        .map_err(HighlightError::from)?;

        let color_scheme = if self.dark { "dark" } else { "light" };
        let diff_css = format!(
            r#":root {{ color-scheme: {color_scheme}; }}
body {{ margin: 0; background: {page_bg}; color: {fg}; font-family: ui-monospace, SFMono-Regular, Menlo, Consolas, monospace; font-size: 12px; }}
.file-header {{ padding: 8px 12px; background: {panel_bg}; border-bottom: 1px solid {border}; }}
.file-header .status {{ color: {hunk}; font-weight: bold; margin-right: 8px; }}
.layout {{ display: flex; align-items: flex-start; }}
.split-diff {{ flex: 1; border-collapse: collapse; table-layout: fixed; width: 100%; }}
.split-diff col.gutter {{ width: 4em; }}
.split-diff td {{ padding: 0 6px; vertical-align: top; white-space: pre-wrap; word-break: break-all; }}
.gutter {{ color: {dim}; text-align: right; user-select: none; cursor: pointer; border-right: 1px solid {border}; }}
.hunk-header td {{ color: {hunk}; background: {panel_bg}; padding: 4px 6px; }}
.code.spacer {{ background: {spacer}; }}
.code.inserted-new {{ background: {add}; }}
.code.deleted-original {{ background: {del}; }}
.code.changed-new {{ background: {changed_add}; }}
.code.changed-original {{ background: {changed_del}; }}
.code.changed-new .char-changed {{ background: {char_add}; }}
.code.changed-original .char-changed {{ background: {char_del}; }}
.minimap {{ position: sticky; top: 0; width: 12px; height: 100vh; flex: none; background: {panel_bg}; border-left: 1px solid {border}; }}
.minimap .mark {{ position: absolute; left: 2px; right: 2px; min-height: 2px; }}
.mark-red {{ background: {mark_red}; }}
.mark-green {{ background: {mark_green}; }}
.mark-blue {{ background: {mark_blue}; }}
.mark-purple {{ background: {mark_purple}; }}
"#,
            page_bg = self.page_bg,
            fg = self.fg_primary,
            panel_bg = self.panel_bg,
            border = self.border,
            hunk = self.diff_hunk_header,
            dim = self.fg_dim,
            spacer = self.spacer_bg,
            add = self.diff_add_bg,
            del = self.diff_del_bg,
            changed_add = self.changed_add_bg,
            changed_del = self.changed_del_bg,
            char_add = self.char_add_bg,
            char_del = self.char_del_bg,
            mark_red = self.mark_red,
            mark_green = self.mark_green,
            mark_blue = self.mark_blue,
            mark_purple = self.mark_purple,
        );

        Ok(diff_css + &syntax_css)
    }
}

#[derive(Clone, Copy)]
struct CatppuccinFlavor {
    dark: bool,
    text: Rgb,
    overlay0: Rgb,
    surface1: Rgb,
    base: Rgb,
    mantle: Rgb,
    red: Rgb,
    green: Rgb,
    blue: Rgb,
    pink: Rgb,
}

fn blend(base: Rgb, accent: Rgb, accent_percent: u8) -> Rgb {
    debug_assert!(accent_percent <= 100);
    let p = u16::from(accent_percent);
    let inv = 100_u16.saturating_sub(p);
    let mix = |b: u8, a: u8| -> u8 { ((u16::from(b) * inv + u16::from(a) * p) / 100) as u8 };
    Rgb(
        mix(base.0, accent.0),
        mix(base.1, accent.1),
        mix(base.2, accent.2),
    )
}

fn catppuccin_theme(flavor: CatppuccinFlavor, syntect_theme: EmbeddedThemeName) -> Theme {
    Theme {
        dark: flavor.dark,

        page_bg: flavor.base,
        panel_bg: flavor.mantle,
        fg_primary: flavor.text,
        fg_dim: flavor.overlay0,
        border: flavor.surface1,

        diff_add_bg: blend(flavor.base, flavor.green, 20),
        diff_del_bg: blend(flavor.base, flavor.red, 20),
        diff_hunk_header: flavor.blue,
        spacer_bg: flavor.mantle,

        changed_add_bg: blend(flavor.base, flavor.green, 12),
        changed_del_bg: blend(flavor.base, flavor.red, 12),
        char_add_bg: blend(flavor.base, flavor.green, 35),
        char_del_bg: blend(flavor.base, flavor.red, 35),

        mark_red: flavor.red,
        mark_green: flavor.green,
        mark_blue: flavor.blue,
        mark_purple: flavor.pink,

        syntect_theme,
    }
}

/// Theme selection from the command line or config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ThemeArg {
    #[default]
    Dark,
    Light,
    CatppuccinLatte,
    CatppuccinFrappe,
    CatppuccinMacchiato,
    CatppuccinMocha,
}

const THEME_CHOICES: [(&str, ThemeArg); 6] = [
    ("dark", ThemeArg::Dark),
    ("light", ThemeArg::Light),
    ("catppuccin-latte", ThemeArg::CatppuccinLatte),
    ("catppuccin-frappe", ThemeArg::CatppuccinFrappe),
    ("catppuccin-macchiato", ThemeArg::CatppuccinMacchiato),
    ("catppuccin-mocha", ThemeArg::CatppuccinMocha),
];

impl ThemeArg {
    fn choices() -> &'static [(&'static str, ThemeArg)] {
        &THEME_CHOICES
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::choices().iter().find_map(|(name, theme)| {
            if *name == normalized {
                Some(*theme)
            } else {
                None
            }
        })
    }

    pub fn valid_values_display() -> String {
        Self::choices()
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub fn resolve_theme(arg: ThemeArg) -> Theme {
    match arg {
        ThemeArg::Dark => Theme::dark(),
        ThemeArg::Light => Theme::light(),
        ThemeArg::CatppuccinLatte => Theme::catppuccin_latte(),
        ThemeArg::CatppuccinFrappe => Theme::catppuccin_frappe(),
        ThemeArg::CatppuccinMacchiato => Theme::catppuccin_macchiato(),
        ThemeArg::CatppuccinMocha => Theme::catppuccin_mocha(),
    }
}

pub fn resolve_theme_arg_with_config(
    cli_theme: Option<ThemeArg>,
    config_theme: Option<&str>,
) -> (ThemeArg, Vec<String>) {
    let mut warnings = Vec::new();

    if let Some(theme) = cli_theme {
        return (theme, warnings);
    }

    if let Some(config_theme) = config_theme {
        if let Some(theme) = ThemeArg::from_str(config_theme) {
            return (theme, warnings);
        }

        let valid_values = ThemeArg::valid_values_display();
        warnings.push(format!(
            "Warning: Unknown theme '{config_theme}' in config, using dark. Valid options: {valid_values}"
        ));
    }

    (ThemeArg::Dark, warnings)
}

pub fn resolve_theme_with_config(
    cli_theme: Option<ThemeArg>,
    config_theme: Option<&str>,
) -> (Theme, Vec<String>) {
    let (theme_arg, warnings) = resolve_theme_arg_with_config(cli_theme, config_theme);
    (resolve_theme(theme_arg), warnings)
}
