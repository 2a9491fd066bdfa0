//! Styling of drawing elements.
//!
//! Every element carries a sparse [`Style`]; unset parameters fall back to
//! the drawing-wide style and finally to built-in defaults. A [`Theme`] is a
//! batch of parameter values keyed by element kind, an [`AdvancedTheme`] is
//! an ordered list of data-driven rules that can additionally select on
//! location.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::location::Location;

pub const DEFAULT_COLOR: Color = Color {
    r: 64,
    g: 64,
    b: 64,
};
pub const DEFAULT_LINE_WIDTH: f64 = 1.0;
pub const DEFAULT_LINE_SHIFT: f64 = 1.0;
pub const DEFAULT_OPACITY: u8 = 255;

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("invalid color {value:?}, expected #RRGGBB")]
    InvalidColor { value: String },
    #[error("invalid value {value:?} for {parameter}, expected a number")]
    InvalidNumber {
        parameter: StyleParameter,
        value: String,
    },
    #[error("invalid opacity {value:?}, expected an integer in 0..=255")]
    InvalidOpacity { value: String },
    #[error("invalid value {value:?} for fulldetails, expected true or false")]
    InvalidFlag { value: String },
}

// ── element kinds ───────────────────────────────────────────────────────────

/// The themable element kinds. `Full2D` addresses the whole drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    // snake_case would render this as "full2_d"
    #[serde(rename = "full_2d")]
    Full2D,
    Helix,
    Junction,
    SingleStrand,
    Residue,
    SecondaryInteraction,
    TertiaryInteraction,
    PhosphodiesterBond,
    InteractionSymbol,
    Pknot,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementKind::Full2D => "full_2d",
            ElementKind::Helix => "helix",
            ElementKind::Junction => "junction",
            ElementKind::SingleStrand => "single_strand",
            ElementKind::Residue => "residue",
            ElementKind::SecondaryInteraction => "secondary_interaction",
            ElementKind::TertiaryInteraction => "tertiary_interaction",
            ElementKind::PhosphodiesterBond => "phosphodiester_bond",
            ElementKind::InteractionSymbol => "interaction_symbol",
            ElementKind::Pknot => "pknot",
        };
        f.write_str(name)
    }
}

// ── parameters and values ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleParameter {
    FullDetails,
    Color,
    LineWidth,
    LineShift,
    Opacity,
}

impl fmt::Display for StyleParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StyleParameter::FullDetails => "fulldetails",
            StyleParameter::Color => "color",
            StyleParameter::LineWidth => "linewidth",
            StyleParameter::LineShift => "lineshift",
            StyleParameter::Opacity => "opacity",
        };
        f.write_str(name)
    }
}

impl StyleParameter {
    /// Rejects a value that the matching getter could not parse later.
    pub fn validate(&self, value: &str) -> Result<(), ThemeError> {
        match self {
            StyleParameter::Color => {
                Color::parse(value)?;
            }
            StyleParameter::LineWidth | StyleParameter::LineShift => {
                let parsed: f64 = value.parse().map_err(|_| ThemeError::InvalidNumber {
                    parameter: *self,
                    value: value.to_string(),
                })?;
                if !parsed.is_finite() || parsed < 0.0 {
                    return Err(ThemeError::InvalidNumber {
                        parameter: *self,
                        value: value.to_string(),
                    });
                }
            }
            StyleParameter::Opacity => {
                value
                    .parse::<u8>()
                    .map_err(|_| ThemeError::InvalidOpacity {
                        value: value.to_string(),
                    })?;
            }
            StyleParameter::FullDetails => {
                if value != "true" && value != "false" {
                    return Err(ThemeError::InvalidFlag {
                        value: value.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// An opaque RGB color, written as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn parse(value: &str) -> Result<Self, ThemeError> {
        let invalid = || ThemeError::InvalidColor {
            value: value.to_string(),
        };
        let hex = value.strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 {
            return Err(invalid());
        }
        let r = u8::from_str_radix(&hex[0..2], 16).map_err(|_| invalid())?;
        let g = u8::from_str_radix(&hex[2..4], 16).map_err(|_| invalid())?;
        let b = u8::from_str_radix(&hex[4..6], 16).map_err(|_| invalid())?;
        Ok(Color { r, g, b })
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

// ── per-element style ───────────────────────────────────────────────────────

/// Sparse parameter map held by every drawing element. Values are validated
/// before insertion, so the typed getters cannot fail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Style {
    params: BTreeMap<StyleParameter, String>,
}

impl Style {
    pub fn new() -> Self {
        Style::default()
    }

    pub fn set(&mut self, parameter: StyleParameter, value: &str) -> Result<(), ThemeError> {
        parameter.validate(value)?;
        self.params.insert(parameter, value.to_string());
        Ok(())
    }

    pub fn unset(&mut self, parameter: StyleParameter) {
        self.params.remove(&parameter);
    }

    pub fn is_set(&self, parameter: StyleParameter) -> bool {
        self.params.contains_key(&parameter)
    }

    fn get(&self, parameter: StyleParameter) -> Option<&str> {
        self.params.get(&parameter).map(String::as_str)
    }

    pub fn color(&self) -> Option<Color> {
        self.get(StyleParameter::Color)
            .and_then(|v| Color::parse(v).ok())
    }

    pub fn line_width(&self) -> Option<f64> {
        self.get(StyleParameter::LineWidth).and_then(|v| v.parse().ok())
    }

    pub fn line_shift(&self) -> Option<f64> {
        self.get(StyleParameter::LineShift).and_then(|v| v.parse().ok())
    }

    pub fn opacity(&self) -> Option<u8> {
        self.get(StyleParameter::Opacity).and_then(|v| v.parse().ok())
    }

    pub fn full_details(&self) -> Option<bool> {
        self.get(StyleParameter::FullDetails).map(|v| v == "true")
    }

    /// Overlays `other` on top of this style.
    pub fn merge(&mut self, other: &Style) {
        for (parameter, value) in &other.params {
            self.params.insert(*parameter, value.clone());
        }
    }
}

/// A style resolved against the drawing-wide style and the built-in defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedStyle {
    pub color: Color,
    pub line_width: f64,
    pub line_shift: f64,
    pub opacity: u8,
    pub full_details: bool,
}

impl ResolvedStyle {
    pub fn resolve(own: &Style, drawing: &Style, full_details_default: bool) -> Self {
        ResolvedStyle {
            color: own
                .color()
                .or_else(|| drawing.color())
                .unwrap_or(DEFAULT_COLOR),
            line_width: own
                .line_width()
                .or_else(|| drawing.line_width())
                .unwrap_or(DEFAULT_LINE_WIDTH),
            line_shift: own
                .line_shift()
                .or_else(|| drawing.line_shift())
                .unwrap_or(DEFAULT_LINE_SHIFT),
            opacity: own
                .opacity()
                .or_else(|| drawing.opacity())
                .unwrap_or(DEFAULT_OPACITY),
            full_details: own
                .full_details()
                .or_else(|| drawing.full_details())
                .unwrap_or(full_details_default),
        }
    }
}

// ── themes ──────────────────────────────────────────────────────────────────

/// Parameter values keyed by element kind. Application is a plain traversal,
/// later applications overwrite earlier ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Theme {
    pub configurations: BTreeMap<ElementKind, BTreeMap<StyleParameter, String>>,
}

impl Theme {
    pub fn new() -> Self {
        Theme::default()
    }

    pub fn set(
        &mut self,
        kind: ElementKind,
        parameter: StyleParameter,
        value: &str,
    ) -> Result<(), ThemeError> {
        parameter.validate(value)?;
        self.configurations
            .entry(kind)
            .or_default()
            .insert(parameter, value.to_string());
        Ok(())
    }

    pub fn parameters_for(&self, kind: ElementKind) -> Option<&BTreeMap<StyleParameter, String>> {
        self.configurations.get(&kind)
    }

    /// Re-validates every stored value, for themes read from a file.
    pub fn validate(&self) -> Result<(), ThemeError> {
        for parameters in self.configurations.values() {
            for (parameter, value) in parameters {
                parameter.validate(value)?;
            }
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.configurations.clear();
    }
}

/// One rule of an [`AdvancedTheme`]. An empty kind list matches every kind,
/// a missing location matches every element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeRule {
    #[serde(default)]
    pub kinds: Vec<ElementKind>,
    #[serde(default)]
    pub location: Option<Location>,
    pub parameter: StyleParameter,
    pub value: String,
}

impl ThemeRule {
    pub fn matches(&self, kind: ElementKind, location: &Location) -> bool {
        if !self.kinds.is_empty() && !self.kinds.contains(&kind) {
            return false;
        }
        match &self.location {
            Some(selector) => selector.intersects(location),
            None => true,
        }
    }
}

/// Ordered, data-driven styling rules selecting on element kind and location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdvancedTheme {
    pub rules: Vec<ThemeRule>,
}

impl AdvancedTheme {
    pub fn new() -> Self {
        AdvancedTheme::default()
    }

    pub fn add_rule(&mut self, rule: ThemeRule) -> Result<(), ThemeError> {
        rule.parameter.validate(&rule.value)?;
        self.rules.push(rule);
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ThemeError> {
        for rule in &self.rules {
            rule.parameter.validate(&rule.value)?;
        }
        Ok(())
    }

    /// Folds every matching rule into `style`, in rule order.
    pub fn apply_to(&self, style: &mut Style, kind: ElementKind, location: &Location) {
        for rule in &self.rules {
            if rule.matches(kind, location) {
                // Validated on insertion.
                let _ = style.set(rule.parameter, &rule.value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_round_trip() {
        let c = Color::parse("#1A2b3C").unwrap();
        assert_eq!(c, Color { r: 26, g: 43, b: 60 });
        assert_eq!(c.to_string(), "#1A2B3C");
        assert!(Color::parse("1A2B3C").is_err());
        assert!(Color::parse("#1A2B").is_err());
        assert!(Color::parse("#GGGGGG").is_err());
    }

    #[test]
    fn invalid_values_are_rejected_not_stored() {
        let mut style = Style::new();
        assert!(style.set(StyleParameter::Opacity, "300").is_err());
        assert!(style.set(StyleParameter::LineWidth, "-1").is_err());
        assert!(style.set(StyleParameter::FullDetails, "yes").is_err());
        assert!(!style.is_set(StyleParameter::Opacity));
        assert!(!style.is_set(StyleParameter::LineWidth));
    }

    #[test]
    fn resolution_falls_back_to_drawing_then_defaults() {
        let mut own = Style::new();
        own.set(StyleParameter::LineWidth, "2.5").unwrap();
        let mut drawing = Style::new();
        drawing.set(StyleParameter::Color, "#FF0000").unwrap();
        drawing.set(StyleParameter::LineWidth, "4.0").unwrap();

        let resolved = ResolvedStyle::resolve(&own, &drawing, true);
        assert_eq!(resolved.line_width, 2.5);
        assert_eq!(resolved.color, Color { r: 255, g: 0, b: 0 });
        assert_eq!(resolved.line_shift, DEFAULT_LINE_SHIFT);
        assert_eq!(resolved.opacity, DEFAULT_OPACITY);
        assert!(resolved.full_details);
    }

    #[test]
    fn theme_later_set_overwrites() {
        let mut theme = Theme::new();
        theme
            .set(ElementKind::Helix, StyleParameter::Color, "#000000")
            .unwrap();
        theme
            .set(ElementKind::Helix, StyleParameter::Color, "#00FF00")
            .unwrap();
        let params = theme.parameters_for(ElementKind::Helix).unwrap();
        assert_eq!(params[&StyleParameter::Color], "#00FF00");
    }

    #[test]
    fn rule_selects_on_kind_and_location() {
        let rule = ThemeRule {
            kinds: vec![ElementKind::Residue],
            location: Some(Location::range(5, 10)),
            parameter: StyleParameter::Color,
            value: "#0000FF".to_string(),
        };
        assert!(rule.matches(ElementKind::Residue, &Location::range(10, 12)));
        assert!(!rule.matches(ElementKind::Residue, &Location::range(11, 12)));
        assert!(!rule.matches(ElementKind::Helix, &Location::range(5, 10)));
    }

    #[test]
    fn advanced_theme_applies_in_order() {
        let mut theme = AdvancedTheme::new();
        theme
            .add_rule(ThemeRule {
                kinds: vec![],
                location: None,
                parameter: StyleParameter::Color,
                value: "#111111".to_string(),
            })
            .unwrap();
        theme
            .add_rule(ThemeRule {
                kinds: vec![ElementKind::Junction],
                location: None,
                parameter: StyleParameter::Color,
                value: "#222222".to_string(),
            })
            .unwrap();

        let mut style = Style::new();
        theme.apply_to(&mut style, ElementKind::Junction, &Location::empty());
        assert_eq!(style.color(), Some(Color::parse("#222222").unwrap()));

        let mut other = Style::new();
        theme.apply_to(&mut other, ElementKind::Helix, &Location::empty());
        assert_eq!(other.color(), Some(Color::parse("#111111").unwrap()));
    }

    #[test]
    fn element_kind_json_names_match_display() {
        for kind in [
            ElementKind::Full2D,
            ElementKind::Helix,
            ElementKind::SingleStrand,
            ElementKind::SecondaryInteraction,
            ElementKind::PhosphodiesterBond,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
            let back: ElementKind = serde_json::from_str(&json).unwrap();
            assert_eq!(back, kind);
        }
    }

    #[test]
    fn theme_deserializes_from_json() {
        let theme: Theme = serde_json::from_str(
            r##"{"configurations": {"full_2d": {"color": "#333333"}, "helix": {"color": "#AA0000", "line_width": "3.0"}}}"##,
        )
        .unwrap();
        theme.validate().unwrap();
        let params = theme.parameters_for(ElementKind::Helix).unwrap();
        assert_eq!(params[&StyleParameter::Color], "#AA0000");

        let rules: AdvancedTheme = serde_json::from_str(
            r##"{"rules": [{"kinds": ["residue"], "location": {"blocks": [{"start": 1, "end": 4}]}, "parameter": "opacity", "value": "128"}]}"##,
        )
        .unwrap();
        rules.validate().unwrap();
        assert_eq!(rules.rules.len(), 1);
        assert!(rules.rules[0].matches(ElementKind::Residue, &Location::range(4, 6)));
    }
}
