//! Image formats produced by the rendering processes.

/// Output format for rendered diagrams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RenderFormat {
    /// Vector output (default).
    #[default]
    Svg,
    /// Raster output.
    Png,
}

impl RenderFormat {
    /// Parse format from a configuration or CLI value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "svg" => Some(Self::Svg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    /// Return format as string representation (also the file extension).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }

    /// PlantUML command line flag selecting this format.
    #[must_use]
    pub fn plantuml_flag(self) -> &'static str {
        match self {
            Self::Svg => "-tsvg",
            Self::Png => "-tpng",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(RenderFormat::parse("svg"), Some(RenderFormat::Svg));
        assert_eq!(RenderFormat::parse("png"), Some(RenderFormat::Png));
        assert_eq!(RenderFormat::parse("pdf"), None);
    }

    #[test]
    fn test_default_is_svg() {
        assert_eq!(RenderFormat::default(), RenderFormat::Svg);
        assert_eq!(RenderFormat::default().as_str(), "svg");
    }

    #[test]
    fn test_plantuml_flag() {
        assert_eq!(RenderFormat::Png.plantuml_flag(), "-tpng");
    }
}
