//! Raster output: paints a [`PreviewTree`] onto a tiny-skia pixmap.
//!
//! Nodes are painted strictly in order. Each node that needs external
//! content awaits its fetch before anything later is touched, so the
//! compositing order never depends on fetch timing.

use std::collections::HashMap;

use image::ImageEncoder;
use overlay_core::Color;
use tiny_skia::{
    FillRule, LineJoin, Paint, Pixmap, PixmapMut, PixmapPaint, Stroke, Transform,
};

use crate::assets::AssetSource;
use crate::decode::{decode_picture, decode_svg, Picture};
use crate::error::{abbreviate, RenderError, RenderResult};
use crate::fonts::FontBook;
use crate::placement::centered_origin;
use crate::preview::{BackgroundNode, NodeContent, PreviewNode, PreviewTree};
use crate::text::layout_line;

/// A finished bitmap, exactly canvas-sized.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pixmap: Pixmap,
}

impl RasterImage {
    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Straight-alpha color of one pixel.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        let px = self.pixmap.pixel(x, y)?.demultiply();
        Some(Color::rgba(px.red(), px.green(), px.blue(), px.alpha()))
    }

    /// Straight-alpha RGBA pixels.
    #[must_use]
    pub fn to_rgba8(&self) -> image::RgbaImage {
        let mut data = Vec::with_capacity(self.pixmap.data().len());
        for px in self.pixmap.pixels() {
            let c = px.demultiply();
            data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        image::RgbaImage::from_raw(self.width(), self.height(), data)
            .unwrap_or_else(|| image::RgbaImage::new(self.width(), self.height()))
    }

    /// Encode as PNG.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Encode`] if the encoder fails.
    pub fn encode_png(&self) -> RenderResult<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| RenderError::Encode(format!("PNG encoding failed: {e}")))
    }

    /// Encode as JPEG, compositing any transparency over `matte`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Encode`] if the encoder fails.
    pub fn encode_jpeg(&self, quality: u8, matte: Color) -> RenderResult<Vec<u8>> {
        let (width, height) = (self.width(), self.height());
        let matte = [matte.r, matte.g, matte.b];
        let mut rgb_data = Vec::with_capacity(self.pixmap.data().len() / 4 * 3);
        // Premultiplied source over an opaque matte: src + matte * (1 - a)
        for pixel in self.pixmap.data().chunks_exact(4) {
            let inv = 255 - u16::from(pixel[3]);
            for (channel, bg) in pixel[..3].iter().zip(matte) {
                let blended = u16::from(*channel) + (u16::from(bg) * inv + 127) / 255;
                rgb_data.push(u8::try_from(blended.min(255)).unwrap_or(u8::MAX));
            }
        }

        let mut buf = std::io::Cursor::new(Vec::new());
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
        encoder
            .write_image(&rgb_data, width, height, image::ColorType::Rgb8.into())
            .map_err(|e| RenderError::Encode(format!("JPEG encoding failed: {e}")))?;
        Ok(buf.into_inner())
    }
}

/// Paint a tree into a new canvas-sized bitmap.
///
/// Custom font faces listed by the tree are fetched through `source` the
/// first time a text node uses them and registered on a copy of `fonts`.
///
/// # Errors
///
/// Returns the first fetch, decode or font failure; no partial bitmap is
/// produced.
pub async fn paint(tree: &PreviewTree, source: &dyn AssetSource, fonts: &FontBook) -> RenderResult<RasterImage> {
    let mut painter = Painter {
        source,
        fonts: fonts.clone(),
        pictures: HashMap::new(),
    };
    let mut canvas = Pixmap::new(tree.width, tree.height)
        .ok_or_else(|| RenderError::Surface(format!("cannot allocate {}x{} canvas", tree.width, tree.height)))?;

    painter.paint_background(tree, &mut canvas.as_mut()).await?;
    for node in &tree.nodes {
        painter.paint_node(tree, node, &mut canvas).await?;
    }

    tracing::debug!(
        "Painted {} node(s) onto {}x{} canvas",
        tree.nodes.len(),
        tree.width,
        tree.height
    );
    Ok(RasterImage { pixmap: canvas })
}

struct Painter<'a> {
    source: &'a dyn AssetSource,
    fonts: FontBook,
    pictures: HashMap<String, Picture>,
}

impl Painter<'_> {
    async fn paint_background(&mut self, tree: &PreviewTree, canvas: &mut PixmapMut<'_>) -> RenderResult<()> {
        match &tree.background {
            BackgroundNode::Fill { color } => {
                canvas.fill(skia_color(*color));
            }
            BackgroundNode::Image { src } => {
                #[allow(clippy::cast_precision_loss)]
                let (w, h) = (tree.width as f32, tree.height as f32);
                let picture = self.picture(src).await?;
                picture.draw(canvas, Transform::identity(), w, h);
            }
        }
        Ok(())
    }

    async fn paint_node(&mut self, tree: &PreviewTree, node: &PreviewNode, canvas: &mut Pixmap) -> RenderResult<()> {
        if node.opacity <= 0.0 {
            // invisible nodes still load, so a broken asset fails the export
            return self.prepare(tree, node).await;
        }
        if node.opacity >= 1.0 {
            return self.draw_content(tree, node, &mut canvas.as_mut()).await;
        }

        let mut layer = Pixmap::new(canvas.width(), canvas.height())
            .ok_or_else(|| RenderError::Surface("cannot allocate opacity layer".into()))?;
        self.draw_content(tree, node, &mut layer.as_mut()).await?;
        let paint = PixmapPaint {
            opacity: node.opacity,
            ..PixmapPaint::default()
        };
        canvas.draw_pixmap(0, 0, layer.as_ref(), &paint, Transform::identity(), None);
        Ok(())
    }

    async fn draw_content(&mut self, tree: &PreviewTree, node: &PreviewNode, target: &mut PixmapMut<'_>) -> RenderResult<()> {
        let transform = node.placement.to_transform();
        match &node.content {
            NodeContent::Text {
                content,
                font_family,
                font_weight_or_style,
                font_size_px,
                fill,
                stroke,
            } => {
                self.ensure_custom_font(tree, font_family).await?;
                let font = self.fonts.resolve(font_family, font_weight_or_style)?;
                let line = layout_line(&font, content, *font_size_px);
                let Some(path) = line.path else {
                    return Ok(());
                };
                if let Some(stroke) = stroke {
                    let style = Stroke {
                        width: stroke.width,
                        line_join: LineJoin::Round,
                        ..Stroke::default()
                    };
                    target.stroke_path(&path, &solid(stroke.color), &style, transform, None);
                }
                target.fill_path(&path, &solid(*fill), FillRule::Winding, transform, None);
            }
            NodeContent::Image { src, width, height } => {
                let (ox, oy) = centered_origin(*width, *height);
                let picture = self.picture(src).await?;
                picture.draw(target, transform.pre_translate(ox, oy), *width, *height);
            }
            NodeContent::Icon { markup, width, height } => {
                let (ox, oy) = centered_origin(*width, *height);
                let picture = decode_svg(node.id.as_str(), markup.as_bytes())?;
                picture.draw(target, transform.pre_translate(ox, oy), *width, *height);
            }
        }
        Ok(())
    }

    /// Fetch and decode whatever `node` draws with, without drawing it.
    async fn prepare(&mut self, tree: &PreviewTree, node: &PreviewNode) -> RenderResult<()> {
        match &node.content {
            NodeContent::Text {
                font_family,
                font_weight_or_style,
                ..
            } => {
                self.ensure_custom_font(tree, font_family).await?;
                self.fonts.resolve(font_family, font_weight_or_style)?;
            }
            NodeContent::Image { src, .. } => {
                self.picture(src).await?;
            }
            NodeContent::Icon { markup, .. } => {
                decode_svg(node.id.as_str(), markup.as_bytes())?;
            }
        }
        Ok(())
    }

    async fn picture(&mut self, src: &str) -> RenderResult<&Picture> {
        if !self.pictures.contains_key(src) {
            let bytes = self.source.fetch(src).await?;
            let picture = decode_picture(src, &bytes)?;
            tracing::trace!("Decoded {} as {:?}", abbreviate(src), picture);
            self.pictures.insert(src.to_string(), picture);
        }
        self.pictures
            .get(src)
            .ok_or_else(|| RenderError::AssetUnavailable(abbreviate(src)))
    }

    async fn ensure_custom_font(&mut self, tree: &PreviewTree, family: &str) -> RenderResult<()> {
        if self.fonts.has_custom(family.trim()) {
            return Ok(());
        }
        let Some(face) = tree
            .font_faces
            .iter()
            .find(|face| face.family.eq_ignore_ascii_case(family.trim()))
        else {
            return Ok(());
        };
        let bytes = self.source.fetch(&face.src).await?;
        self.fonts.register(&face.family, &face.src, bytes)
    }
}

fn skia_color(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

fn solid(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(skia_color(color));
    paint.anti_alias = true;
    paint
}
