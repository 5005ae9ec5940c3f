//! Brand palette and typography.
//!
//! The palette is a process-wide constant ([`BRAND`]). Renderers and the markup
//! builder take it by reference; nothing may mutate or override it.

use serde::Serialize;

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Upper-case hex without `#`, as used by DrawingML (`005091`).
    pub fn hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }

    /// CSS hex notation (`#005091`).
    pub fn css(&self) -> String {
        format!("#{}", self.hex())
    }
}

/// Semantic color roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorRole {
    Primary,
    Secondary,
    Accent,
    Dark,
    Text,
    TextLight,
    Background,
    LightGray,
}

/// Semantic typeface roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontRole {
    Title,
    Body,
    Caption,
}

/// Fixed brand colors and typefaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrandPalette {
    /// Wordmark drawn on every slide.
    pub wordmark: &'static str,

    /// Line shown on the closing slide of the markup document.
    pub contact_line: &'static str,

    pub primary: Rgb,
    /// Also known as "blue bright"; section backgrounds.
    pub secondary: Rgb,
    /// Also known as "blue light"; rules and borders.
    pub accent: Rgb,
    /// Also known as "blue deep"; closing background and subtitles.
    pub dark: Rgb,
    pub text: Rgb,
    pub text_light: Rgb,
    pub background: Rgb,
    pub light_gray: Rgb,

    pub title_font: &'static str,
    pub body_font: &'static str,
    pub caption_font: &'static str,
}

/// The brand palette.
pub static BRAND: BrandPalette = BrandPalette {
    wordmark: "INFOTEL",
    contact_line: "contact@infotel.com • www.infotel.com",
    primary: Rgb(0, 80, 145),
    secondary: Rgb(2, 109, 196),
    accent: Rgb(110, 160, 195),
    dark: Rgb(0, 66, 123),
    text: Rgb(51, 51, 51),
    text_light: Rgb(102, 102, 102),
    background: Rgb(255, 255, 255),
    light_gray: Rgb(242, 242, 242),
    title_font: "Segoe UI Semibold",
    body_font: "Segoe UI",
    caption_font: "Segoe UI Semilight",
};

/// White, for text drawn on dark backgrounds.
pub const WHITE: Rgb = Rgb(255, 255, 255);

impl BrandPalette {
    /// Color for a semantic role.
    pub fn color(&self, role: ColorRole) -> Rgb {
        match role {
            ColorRole::Primary => self.primary,
            ColorRole::Secondary => self.secondary,
            ColorRole::Accent => self.accent,
            ColorRole::Dark => self.dark,
            ColorRole::Text => self.text,
            ColorRole::TextLight => self.text_light,
            ColorRole::Background => self.background,
            ColorRole::LightGray => self.light_gray,
        }
    }

    /// Color by role name, accepting the aliases used in payloads and prompts.
    pub fn color_by_name(&self, name: &str) -> Option<Rgb> {
        let role = match name.trim().to_lowercase().as_str() {
            "primary" => ColorRole::Primary,
            "secondary" | "blue_bright" => ColorRole::Secondary,
            "accent" | "blue_light" => ColorRole::Accent,
            "dark" | "blue_deep" | "blue_dark" => ColorRole::Dark,
            "text" => ColorRole::Text,
            "text_light" => ColorRole::TextLight,
            "background" => ColorRole::Background,
            "light_gray" => ColorRole::LightGray,
            _ => return None,
        };
        Some(self.color(role))
    }

    /// Typeface for a semantic role.
    pub fn font(&self, role: FontRole) -> &'static str {
        match role {
            FontRole::Title => self.title_font,
            FontRole::Body => self.body_font,
            FontRole::Caption => self.caption_font,
        }
    }
}
