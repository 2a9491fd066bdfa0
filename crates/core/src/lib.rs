pub mod booquet;
pub mod connector;
pub mod drawing;
pub mod geometry;
pub mod interpolate;
pub mod location;
pub mod model;
pub mod parser;
pub mod skeleton;
pub mod svg;
pub mod symbols;
pub mod theme;
pub mod viewport;

use thiserror::Error;

pub use booquet::{booquet, BooquetOptions};
pub use drawing::Drawing;
pub use location::{Block, Location};
pub use model::{BasePair, Edge, Orientation, SecondaryStructure, StructureError};
pub use skeleton::{DrawingError, LayoutOptions, Skeleton};
pub use svg::SvgOptions;
pub use theme::{AdvancedTheme, Theme, ThemeError};
pub use viewport::WorkingSession;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Structure(#[from] StructureError),
    #[error(transparent)]
    Drawing(#[from] DrawingError),
    #[error(transparent)]
    Theme(#[from] ThemeError),
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Main entry point: build the full 2D drawing of a molecule given in
/// dot-bracket notation.
pub fn draw(name: &str, seq: &str, bracket: &str) -> Result<Drawing, Error> {
    let ss = SecondaryStructure::from_bracket_notation(name, seq, bracket)?;
    let drawing = Drawing::new(ss, &LayoutOptions::default())?;
    Ok(drawing)
}

/// Render dot-bracket notation as an SVG document.
pub fn draw_svg(
    name: &str,
    seq: &str,
    bracket: &str,
    opts: &SvgOptions,
) -> Result<String, Error> {
    let drawing = draw(name, seq, bracket)?;
    Ok(svg::render(&drawing, &WorkingSession::default(), opts))
}

/// Export the scene graph of a drawing as JSON.
pub fn draw_json(name: &str, seq: &str, bracket: &str) -> Result<String, Error> {
    let drawing = draw(name, seq, bracket)?;
    Ok(serde_json::to_string_pretty(&svg::export(&drawing))?)
}

/// Render the booquet overview of a molecule as an SVG document.
pub fn draw_booquet(
    name: &str,
    seq: &str,
    bracket: &str,
    opts: &BooquetOptions,
) -> Result<String, Error> {
    let ss = SecondaryStructure::from_bracket_notation(name, seq, bracket)?;
    Ok(booquet::booquet(&ss, opts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_svg_hairpin() {
        let svg = draw_svg(
            "hairpin",
            "GGGGAAAACCCC",
            "((((....))))",
            &SvgOptions::default(),
        )
        .unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("<circle"));
    }

    #[test]
    fn draw_json_exports_the_scene() {
        let json = draw_json("hairpin", "GGGGAAAACCCC", "((((....))))").unwrap();
        assert!(json.contains("\"residues\""));
        assert!(json.contains("\"helices\""));
    }

    #[test]
    fn draw_rejects_mismatched_lengths() {
        assert!(draw("bad", "GGG", "((((....))))").is_err());
    }
}
