//! Decoding fetched bytes into something drawable.

use tiny_skia::{FilterQuality, IntSize, Pixmap, PixmapMut, PixmapPaint, Transform};

use crate::assets::data_uri_media_type;
use crate::error::{RenderError, RenderResult};

/// A decoded image: raster pixels or a parsed SVG document.
pub enum Picture {
    /// Premultiplied RGBA pixels.
    Raster(Pixmap),
    /// SVG document.
    Vector(Box<usvg::Tree>),
}

impl std::fmt::Debug for Picture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (w, h) = self.size();
        match self {
            Self::Raster(_) => write!(f, "Picture::Raster({w}x{h})"),
            Self::Vector(_) => write!(f, "Picture::Vector({w}x{h})"),
        }
    }
}

impl Picture {
    /// Natural size in pixels.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn size(&self) -> (f32, f32) {
        match self {
            Self::Raster(pixmap) => (pixmap.width() as f32, pixmap.height() as f32),
            Self::Vector(tree) => (tree.size().width(), tree.size().height()),
        }
    }

    /// Draw stretched into the `width × height` box whose top-left corner
    /// `transform` maps from the origin.
    pub fn draw(&self, target: &mut PixmapMut<'_>, transform: Transform, width: f32, height: f32) {
        let (natural_w, natural_h) = self.size();
        let fit = transform.pre_scale(width / natural_w, height / natural_h);
        match self {
            Self::Raster(pixmap) => {
                let paint = PixmapPaint {
                    quality: FilterQuality::Bilinear,
                    ..PixmapPaint::default()
                };
                target.draw_pixmap(0, 0, pixmap.as_ref(), &paint, fit, None);
            }
            Self::Vector(tree) => resvg::render(tree, fit, target),
        }
    }
}

/// Decode an image fetched from `src`.
///
/// SVG content (by media type or by sniffing) is parsed with usvg;
/// everything else goes through the image crate.
///
/// # Errors
///
/// Returns [`RenderError::ExportDecodeFailure`] if the bytes are not a
/// supported image.
pub fn decode_picture(src: &str, bytes: &[u8]) -> RenderResult<Picture> {
    let is_svg = data_uri_media_type(src).is_some_and(|m| m == "image/svg+xml")
        || src.to_ascii_lowercase().ends_with(".svg")
        || looks_like_svg(bytes);
    if is_svg {
        return decode_svg(src, bytes);
    }

    let image = image::load_from_memory(bytes).map_err(|e| RenderError::decode(src, e))?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let size = IntSize::from_wh(width, height).ok_or_else(|| RenderError::decode(src, "empty image"))?;

    let mut data = rgba.into_raw();
    for px in data.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        for c in &mut px[..3] {
            #[allow(clippy::cast_possible_truncation)]
            let premultiplied = ((u16::from(*c) * a + 127) / 255) as u8;
            *c = premultiplied;
        }
    }
    let pixmap = Pixmap::from_vec(data, size).ok_or_else(|| RenderError::decode(src, "pixel buffer mismatch"))?;
    Ok(Picture::Raster(pixmap))
}

/// Parse SVG bytes (an image asset or a prepared icon).
///
/// # Errors
///
/// Returns [`RenderError::ExportDecodeFailure`] if usvg rejects the
/// document or it has no size.
pub fn decode_svg(src: &str, bytes: &[u8]) -> RenderResult<Picture> {
    let tree = usvg::Tree::from_data(bytes, &usvg::Options::default()).map_err(|e| RenderError::decode(src, e))?;
    if tree.size().width() <= 0.0 || tree.size().height() <= 0.0 {
        return Err(RenderError::decode(src, "SVG has no size"));
    }
    Ok(Picture::Vector(Box::new(tree)))
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(512)];
    let text = String::from_utf8_lossy(head);
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    trimmed.starts_with('<') && text.contains("<svg")
}
