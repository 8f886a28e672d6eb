//! Font lookup for raster text.
//!
//! Custom faces come from the scene's font assets; everything else is looked
//! up in a fontdb database (normally the system fonts).

use std::sync::Arc;

use ab_glyph::{FontArc, FontVec};
use usvg::fontdb;

use crate::error::{RenderError, RenderResult};

/// Weight and slant parsed from a CSS-like `font-weight` / `font-style` mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontVariant {
    /// Numeric weight, 100..=900.
    pub weight: u16,
    /// Italic or oblique.
    pub italic: bool,
}

impl Default for FontVariant {
    fn default() -> Self {
        Self {
            weight: 400,
            italic: false,
        }
    }
}

impl FontVariant {
    /// Parse values such as `bold`, `italic`, `300`, `bold italic`.
    /// Unknown words are ignored.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let mut variant = Self::default();
        for word in input.split_whitespace() {
            match word.to_ascii_lowercase().as_str() {
                "bold" | "bolder" => variant.weight = 700,
                "lighter" => variant.weight = 300,
                "normal" | "regular" => {}
                "italic" | "oblique" => variant.italic = true,
                other => {
                    if let Ok(weight) = other.parse::<u16>() {
                        variant.weight = weight.clamp(1, 1000);
                    }
                }
            }
        }
        variant
    }
}

/// Faces available to the raster exporter.
#[derive(Clone)]
pub struct FontBook {
    database: Arc<fontdb::Database>,
    custom: Vec<(String, FontArc)>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("database_faces", &self.database.len())
            .field(
                "custom",
                &self.custom.iter().map(|(family, _)| family).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Default for FontBook {
    fn default() -> Self {
        Self::empty()
    }
}

impl FontBook {
    /// No faces at all.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_database(fontdb::Database::new())
    }

    /// The fonts installed on this machine.
    #[must_use]
    pub fn system() -> Self {
        let mut database = fontdb::Database::new();
        database.load_system_fonts();
        tracing::debug!("Loaded {} system font face(s)", database.len());
        Self::from_database(database)
    }

    /// Use an existing database.
    #[must_use]
    pub fn from_database(database: fontdb::Database) -> Self {
        Self {
            database: Arc::new(database),
            custom: Vec::new(),
        }
    }

    /// Whether no face could ever be resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.database.is_empty() && self.custom.is_empty()
    }

    /// Whether a custom face is registered under `family`.
    #[must_use]
    pub fn has_custom(&self, family: &str) -> bool {
        self.custom_face(family).is_some()
    }

    /// Register font file bytes under `family`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ExportDecodeFailure`] if the bytes are not a
    /// font.
    pub fn register(&mut self, family: &str, src: &str, bytes: Vec<u8>) -> RenderResult<()> {
        let font = FontVec::try_from_vec(bytes).map_err(|e| RenderError::decode(src, e))?;
        tracing::debug!("Registered custom font {:?}", family);
        self.custom.retain(|(f, _)| !f.eq_ignore_ascii_case(family));
        self.custom.push((family.to_string(), FontArc::new(font)));
        Ok(())
    }

    /// Find the face for a family and weight/style.
    ///
    /// Custom faces win. Generic families fall back to any available face
    /// when the database has no match; a named family that is not found is
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::AssetUnavailable`] if nothing suitable exists,
    /// or [`RenderError::ExportDecodeFailure`] if the matched face is
    /// unreadable.
    pub fn resolve(&self, family: &str, weight_or_style: &str) -> RenderResult<FontArc> {
        let family = family.trim().trim_matches(|c: char| c == '"' || c == '\'');
        if let Some(font) = self.custom_face(family) {
            return Ok(font.clone());
        }

        let variant = FontVariant::parse(weight_or_style);
        let generic = generic_family(family);
        let families = [generic.unwrap_or(fontdb::Family::Name(family))];
        let query = fontdb::Query {
            families: &families,
            weight: fontdb::Weight(variant.weight),
            stretch: fontdb::Stretch::Normal,
            style: if variant.italic {
                fontdb::Style::Italic
            } else {
                fontdb::Style::Normal
            },
        };

        let id = match (self.database.query(&query), generic) {
            (Some(id), _) => id,
            (None, Some(_)) => {
                let first = self.database.faces().next().ok_or_else(|| {
                    RenderError::AssetUnavailable(format!("no font available for {family}"))
                })?;
                tracing::warn!(
                    "No face configured for generic family {}, using {:?}",
                    family,
                    first.families.first().map(|(name, _)| name)
                );
                first.id
            }
            (None, None) => {
                return Err(RenderError::AssetUnavailable(format!("font family {family}")));
            }
        };

        self.database
            .with_face_data(id, |data, index| {
                FontVec::try_from_vec_and_index(data.to_vec(), index)
            })
            .ok_or_else(|| RenderError::AssetUnavailable(format!("font data for {family}")))?
            .map(FontArc::new)
            .map_err(|e| RenderError::decode(family, e))
    }

    fn custom_face(&self, family: &str) -> Option<&FontArc> {
        self.custom
            .iter()
            .find(|(f, _)| f.eq_ignore_ascii_case(family))
            .map(|(_, font)| font)
    }
}

fn generic_family(family: &str) -> Option<fontdb::Family<'static>> {
    let lower = family.to_ascii_lowercase();
    match lower.as_str() {
        "sans-serif" => Some(fontdb::Family::SansSerif),
        "serif" => Some(fontdb::Family::Serif),
        "monospace" => Some(fontdb::Family::Monospace),
        "cursive" => Some(fontdb::Family::Cursive),
        "fantasy" => Some(fontdb::Family::Fantasy),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TUFFY: &[u8] = include_bytes!("../tests/fonts/Tuffy.ttf");

    #[test]
    fn test_variant_parsing() {
        assert_eq!(FontVariant::parse("normal"), FontVariant::default());
        assert_eq!(FontVariant::parse("bold").weight, 700);
        assert_eq!(FontVariant::parse("lighter").weight, 300);
        let v = FontVariant::parse("600 italic");
        assert_eq!((v.weight, v.italic), (600, true));
        assert_eq!(FontVariant::parse("wobbly").weight, 400);
    }

    #[test]
    fn test_empty_book_reports_unavailable() {
        let book = FontBook::empty();
        assert!(book.is_empty());
        assert!(matches!(
            book.resolve("sans-serif", "normal"),
            Err(RenderError::AssetUnavailable(_))
        ));
        assert!(matches!(
            book.resolve("Brand", "bold"),
            Err(RenderError::AssetUnavailable(_))
        ));
    }

    #[test]
    fn test_register_rejects_garbage() {
        let mut book = FontBook::empty();
        assert!(matches!(
            book.register("Brand", "brand.ttf", b"not a font".to_vec()),
            Err(RenderError::ExportDecodeFailure { .. })
        ));
        assert!(!book.has_custom("Brand"));
    }

    #[test]
    fn test_generic_family_names() {
        assert!(matches!(generic_family("Sans-Serif"), Some(fontdb::Family::SansSerif)));
        assert!(matches!(generic_family("monospace"), Some(fontdb::Family::Monospace)));
        assert!(generic_family("CustomFont_1").is_none());
    }

    #[test]
    fn test_registered_face_wins_for_any_weight() {
        let mut book = FontBook::empty();
        book.register("Brand", "brand.ttf", TUFFY.to_vec()).unwrap();
        assert!(book.has_custom("brand"));
        assert!(book.resolve("Brand", "bold italic").is_ok());
        assert!(book.resolve("'Brand'", "normal").is_ok());
        assert!(matches!(
            book.resolve("Other", "normal"),
            Err(RenderError::AssetUnavailable(_))
        ));
    }

    #[test]
    fn test_generic_family_falls_back_to_any_face() {
        let mut database = fontdb::Database::new();
        database.load_font_data(TUFFY.to_vec());
        let book = FontBook::from_database(database);
        assert!(!book.is_empty());
        assert!(book.resolve("sans-serif", "bold").is_ok());
        assert!(book.resolve("Tuffy", "normal").is_ok());
        assert!(matches!(
            book.resolve("Missing Family", "normal"),
            Err(RenderError::AssetUnavailable(_))
        ));
    }
}
