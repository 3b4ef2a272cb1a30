//! Editor control state: slider values, style selection, and pending text entry.
//!
//! `EditorState` is an immutable value. Every control change goes through a
//! `with_*` method that validates the input and returns a fresh state, so any
//! render can be reproduced from a snapshot.

use std::fmt;
use std::str::FromStr;

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::error::{EditorError, EditorResult};
use crate::layers::{FilterSpec, FilterStack, StyleFilter};
use crate::ops::filters::normalize_slider;

pub const MIN_ADJUSTMENT: i32 = 0;
pub const MAX_ADJUSTMENT: i32 = 200;
/// Slider value at which brightness/contrast have no effect.
pub const NEUTRAL_ADJUSTMENT: u8 = 100;

pub const MIN_FONT_SIZE: u32 = 8;
pub const MAX_FONT_SIZE: u32 = 72;

// ============================================================================
// COLORS
// ============================================================================

/// An opaque RGB color written as `#RRGGBB`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl HexColor {
    pub const BLACK: HexColor = HexColor::rgb(0, 0, 0);
    pub const WHITE: HexColor = HexColor::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, 255])
    }
}

impl FromStr for HexColor {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EditorError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for HexColor {
    type Error = EditorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.to_string()
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

// ============================================================================
// FONTS
// ============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFamily {
    #[default]
    Arial,
    #[serde(rename = "Times New Roman")]
    TimesNewRoman,
    #[serde(rename = "Courier New")]
    CourierNew,
    Georgia,
    Verdana,
}

impl FontFamily {
    pub fn all() -> &'static [FontFamily] {
        &[
            FontFamily::Arial,
            FontFamily::TimesNewRoman,
            FontFamily::CourierNew,
            FontFamily::Georgia,
            FontFamily::Verdana,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            FontFamily::Arial => "Arial",
            FontFamily::TimesNewRoman => "Times New Roman",
            FontFamily::CourierNew => "Courier New",
            FontFamily::Georgia => "Georgia",
            FontFamily::Verdana => "Verdana",
        }
    }
}

impl FromStr for FontFamily {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FontFamily::all()
            .iter()
            .find(|f| f.name().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| EditorError::UnknownFont(s.to_string()))
    }
}

impl fmt::Display for FontFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// EDITOR STATE
// ============================================================================

/// Text-entry parameters waiting to be committed into a text layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextParams {
    pub value: String,
    pub size: u32,
    pub color: HexColor,
    pub font: FontFamily,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            value: String::new(),
            size: 16,
            color: HexColor::BLACK,
            font: FontFamily::Arial,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StateRecord")]
pub struct EditorState {
    brightness: u8,
    contrast: u8,
    filter: Option<StyleFilter>,
    text: TextParams,
}

impl Default for EditorState {
    fn default() -> Self {
        Self {
            brightness: NEUTRAL_ADJUSTMENT,
            contrast: NEUTRAL_ADJUSTMENT,
            filter: None,
            text: TextParams::default(),
        }
    }
}

impl EditorState {
    pub fn with_text_defaults(text: TextParams) -> EditorResult<Self> {
        Self::default().with_text(text)
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn contrast(&self) -> u8 {
        self.contrast
    }

    pub fn filter(&self) -> Option<StyleFilter> {
        self.filter
    }

    pub fn text(&self) -> &TextParams {
        &self.text
    }

    pub fn with_brightness(&self, value: i32) -> EditorResult<Self> {
        Ok(Self {
            brightness: check_adjustment("brightness", value)?,
            ..self.clone()
        })
    }

    pub fn with_contrast(&self, value: i32) -> EditorResult<Self> {
        Ok(Self {
            contrast: check_adjustment("contrast", value)?,
            ..self.clone()
        })
    }

    pub fn with_filter(&self, filter: Option<StyleFilter>) -> Self {
        Self {
            filter,
            ..self.clone()
        }
    }

    /// Brightness and contrast back to neutral, style filter cleared.
    /// Pending text is kept.
    pub fn reset_adjustments(&self) -> Self {
        Self {
            text: self.text.clone(),
            ..Self::default()
        }
    }

    pub fn with_text(&self, text: TextParams) -> EditorResult<Self> {
        check_font_size(text.size)?;
        Ok(Self {
            text,
            ..self.clone()
        })
    }

    pub fn with_text_value(&self, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.text.value = value.into();
        next
    }

    pub fn with_font_size(&self, size: u32) -> EditorResult<Self> {
        let mut next = self.clone();
        next.text.size = check_font_size(size)?;
        Ok(next)
    }

    pub fn with_text_color(&self, color: &str) -> EditorResult<Self> {
        let mut next = self.clone();
        next.text.color = color.parse()?;
        Ok(next)
    }

    pub fn with_font(&self, font: &str) -> EditorResult<Self> {
        let mut next = self.clone();
        next.text.font = font.parse()?;
        Ok(next)
    }

    /// Filters implied by the current controls. Neutral sliders contribute nothing.
    pub fn filter_stack(&self) -> FilterStack {
        let mut stack = FilterStack::default();
        stack.set_style(self.filter);
        stack.set(FilterSpec::Brightness {
            amount: normalize_slider(self.brightness),
        });
        stack.set(FilterSpec::Contrast {
            amount: normalize_slider(self.contrast),
        });
        stack
    }
}

/// Unvalidated wire form of `EditorState`; every field passes through the
/// same checks as the `with_*` builders.
#[derive(Deserialize)]
struct StateRecord {
    brightness: i32,
    contrast: i32,
    filter: Option<StyleFilter>,
    text: TextParams,
}

impl TryFrom<StateRecord> for EditorState {
    type Error = EditorError;

    fn try_from(record: StateRecord) -> Result<Self, Self::Error> {
        Ok(EditorState::with_text_defaults(record.text)?
            .with_brightness(record.brightness)?
            .with_contrast(record.contrast)?
            .with_filter(record.filter))
    }
}

fn check_adjustment(control: &'static str, value: i32) -> EditorResult<u8> {
    if !(MIN_ADJUSTMENT..=MAX_ADJUSTMENT).contains(&value) {
        return Err(EditorError::out_of_range(
            control,
            value,
            MIN_ADJUSTMENT as f64,
            MAX_ADJUSTMENT as f64,
        ));
    }
    Ok(value as u8)
}

fn check_font_size(size: u32) -> EditorResult<u32> {
    if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&size) {
        return Err(EditorError::out_of_range(
            "font size",
            size,
            MIN_FONT_SIZE as f64,
            MAX_FONT_SIZE as f64,
        ));
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_color_parse() {
        assert_eq!("#FF0000".parse::<HexColor>().unwrap(), HexColor::rgb(255, 0, 0));
        assert_eq!("#0a0B0c".parse::<HexColor>().unwrap(), HexColor::rgb(10, 11, 12));
        for bad in ["FF0000", "#FF00", "#GG0000", "#FF00001", ""] {
            assert!(matches!(bad.parse::<HexColor>(), Err(EditorError::InvalidColor(_))), "{bad}");
        }
        assert_eq!(HexColor::rgb(248, 249, 250).to_string(), "#F8F9FA");
    }

    #[test]
    fn test_font_family_parse() {
        assert_eq!("times new roman".parse::<FontFamily>().unwrap(), FontFamily::TimesNewRoman);
        assert!(matches!("Comic Sans".parse::<FontFamily>(), Err(EditorError::UnknownFont(_))));
        let json = serde_json::to_string(&FontFamily::CourierNew).unwrap();
        assert_eq!(json, "\"Courier New\"");
    }

    #[test]
    fn test_state_changes_return_new_values() {
        let state = EditorState::default();
        let brighter = state.with_brightness(150).unwrap();
        assert_eq!(state.brightness(), 100);
        assert_eq!(brighter.brightness(), 150);
        assert!(state.with_contrast(201).is_err());
        assert!(state.with_brightness(-1).is_err());
        assert!(state.with_font_size(7).is_err());
        assert!(state.with_text_color("red").is_err());
    }

    #[test]
    fn test_neutral_state_has_no_filters() {
        assert!(EditorState::default().filter_stack().is_empty());
    }

    #[test]
    fn test_filter_stack_tracks_latest_values() {
        let state = EditorState::default()
            .with_brightness(150)
            .unwrap()
            .with_brightness(120)
            .unwrap()
            .with_filter(Some(StyleFilter::Sepia))
            .with_filter(Some(StyleFilter::Vintage));
        assert_eq!(
            state.filter_stack().specs(),
            vec![FilterSpec::Vintage, FilterSpec::Brightness { amount: 0.2 }]
        );
    }

    #[test]
    fn test_state_deserialize_validates_ranges() {
        let state = EditorState::default()
            .with_brightness(140)
            .unwrap()
            .with_filter(Some(StyleFilter::Sepia));
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(serde_json::from_str::<EditorState>(&json).unwrap(), state);

        let text = r##"{"value":"","size":16,"color":"#000000","font":"Arial"}"##;
        let too_bright = format!(r#"{{"brightness":250,"contrast":100,"filter":null,"text":{text}}}"#);
        assert!(serde_json::from_str::<EditorState>(&too_bright).is_err());

        let tiny_font = r##"{"brightness":100,"contrast":100,"filter":null,
            "text":{"value":"","size":0,"color":"#000000","font":"Arial"}}"##;
        assert!(serde_json::from_str::<EditorState>(tiny_font).is_err());
    }

    #[test]
    fn test_reset_keeps_pending_text() {
        let state = EditorState::default()
            .with_text_value("hello")
            .with_contrast(30)
            .unwrap()
            .reset_adjustments();
        assert_eq!(state.contrast(), 100);
        assert_eq!(state.text().value, "hello");
    }
}
