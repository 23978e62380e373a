//! Code generation options.
//!
//! These values are usually produced by `classgraph-config` from the
//! `[diagrams]` section of `classgraph.toml`; every enum has a `parse`
//! function for CLI use and a kebab-case serde representation behind the
//! `serde` feature.

use crate::model::Visibility;

/// How much detail a class diagram shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum DetailLevel {
    /// No diagrams at all.
    None,
    /// Boxes without members.
    #[default]
    Simple,
    /// Boxes with properties and methods.
    Detailed,
}

impl DetailLevel {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::None),
            "simple" => Some(Self::Simple),
            "detailed" => Some(Self::Detailed),
            _ => None,
        }
    }
}

/// How method parameters are written inside the parentheses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ParameterMode {
    /// `draw()`
    None,
    /// `draw(ctx, scale)`
    Names,
    /// `draw(Context, number)`
    Types,
    /// `draw(ctx: Context, scale: number)`
    #[default]
    Complete,
}

impl ParameterMode {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::None),
            "names" => Some(Self::Names),
            "types" => Some(Self::Types),
            "complete" => Some(Self::Complete),
            _ => None,
        }
    }
}

/// Ordering of member lines within a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum MemberOrder {
    #[default]
    Alphabetical,
    PublicFirst,
    PrivateFirst,
}

impl MemberOrder {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "alphabetical" => Some(Self::Alphabetical),
            "public-first" => Some(Self::PublicFirst),
            "private-first" => Some(Self::PrivateFirst),
            _ => None,
        }
    }

    /// Sort tier of a visibility; lower tiers come first.
    #[must_use]
    pub fn tier(self, visibility: Visibility) -> u8 {
        match (self, visibility) {
            (Self::Alphabetical, _) | (_, Visibility::Protected) => 1,
            (Self::PublicFirst, Visibility::Public) | (Self::PrivateFirst, Visibility::Private) => 0,
            (Self::PublicFirst, Visibility::Private) | (Self::PrivateFirst, Visibility::Public) => 2,
        }
    }
}

/// How member visibility is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum VisibilityStyle {
    /// Coloured icons (PlantUML default).
    #[default]
    Icon,
    /// Plain `+`/`#`/`-` characters.
    Text,
}

impl VisibilityStyle {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "icon" => Some(Self::Icon),
            "text" => Some(Self::Text),
            _ => None,
        }
    }
}

/// Font settings for one diagram element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FontStyle {
    pub name: Option<String>,
    pub size: Option<u32>,
    /// `plain`, `bold`, `italic`...
    pub style: Option<String>,
    pub color: Option<String>,
}

/// Global style directives. Values are passed verbatim as directive arguments.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StyleOptions {
    pub hide_empty_members: bool,
    pub hide_circled_char: bool,
    /// Switch to left-to-right layout when either sibling count exceeds this.
    pub top_down_max_siblings: usize,
    pub visibility_style: VisibilityStyle,
    pub hide_shadow: bool,
    pub background_color: Option<String>,
    pub box_background_color: Option<String>,
    pub box_border_color: Option<String>,
    pub box_border_radius: Option<u32>,
    pub box_border_width: Option<u32>,
    pub arrow_color: Option<String>,
    pub class_font: FontStyle,
    pub attribute_font: FontStyle,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            hide_empty_members: true,
            hide_circled_char: false,
            top_down_max_siblings: 6,
            visibility_style: VisibilityStyle::Icon,
            hide_shadow: true,
            background_color: None,
            box_background_color: None,
            box_border_color: None,
            box_border_radius: None,
            box_border_width: None,
            arrow_color: None,
            class_font: FontStyle::default(),
            attribute_font: FontStyle::default(),
        }
    }
}

/// Everything that shapes the generated markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CodeGenOptions {
    pub detail: DetailLevel,
    pub method_parameters: ParameterMode,
    pub member_order: MemberOrder,
    pub style: StyleOptions,
}
