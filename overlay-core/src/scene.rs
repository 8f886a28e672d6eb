//! The scene: canvas size, background, asset table and ordered elements.

use crate::{
    Asset, AssetContent, AssetId, Background, Element, ElementId, ElementPatch, SceneError,
    SceneResult, TextContent,
};

/// Canvas width used for new projects and after the background is removed.
pub const DEFAULT_CANVAS_WIDTH: u32 = 1920;

/// Canvas height used for new projects and after the background is removed.
pub const DEFAULT_CANVAS_HEIGHT: u32 = 1080;

/// Project name used when none is given.
pub const DEFAULT_PROJECT_NAME: &str = "Untitled";

/// A complete composition.
///
/// `elements` is the paint order, bottom to top. Every mutation goes through
/// a method that validates first and commits second, so a failed call never
/// leaves a partial edit behind.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    name: String,
    canvas_width: u32,
    canvas_height: u32,
    background: Option<Background>,
    assets: Vec<Asset>,
    elements: Vec<Element>,
    revision: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROJECT_NAME.to_string(),
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
            background: None,
            assets: Vec::new(),
            elements: Vec::new(),
            revision: 0,
        }
    }
}

impl Scene {
    /// Create a new empty scene with the given canvas size.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::InvalidGeometry`] if either dimension is zero.
    pub fn new(width: u32, height: u32) -> SceneResult<Self> {
        check_canvas(width, height)?;
        Ok(Self {
            canvas_width: width,
            canvas_height: height,
            ..Self::default()
        })
    }

    /// Project name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the project.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    /// Canvas width in scene units (and export pixels).
    #[must_use]
    pub fn canvas_width(&self) -> u32 {
        self.canvas_width
    }

    /// Canvas height in scene units (and export pixels).
    #[must_use]
    pub fn canvas_height(&self) -> u32 {
        self.canvas_height
    }

    /// Canvas size as `(width, height)`.
    #[must_use]
    pub fn canvas_size(&self) -> (u32, u32) {
        (self.canvas_width, self.canvas_height)
    }

    /// Change the canvas size without touching elements.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::InvalidGeometry`] if either dimension is zero.
    pub fn resize_canvas(&mut self, width: u32, height: u32) -> SceneResult<()> {
        check_canvas(width, height)?;
        self.canvas_width = width;
        self.canvas_height = height;
        self.touch();
        Ok(())
    }

    /// Counter bumped by every committed mutation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // ------------------------------------------------------------------
    // Background
    // ------------------------------------------------------------------

    /// The background image, if any.
    #[must_use]
    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    /// Set the background and adopt its natural size as the canvas size.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::InvalidGeometry`] if the background has a zero
    /// dimension.
    pub fn set_background(&mut self, background: Background) -> SceneResult<()> {
        check_canvas(background.width, background.height)?;
        self.canvas_width = background.width;
        self.canvas_height = background.height;
        tracing::debug!(
            "Background set, canvas now {}x{}",
            self.canvas_width,
            self.canvas_height
        );
        self.background = Some(background);
        self.touch();
        Ok(())
    }

    /// Remove the background and reset the canvas to the default size.
    pub fn clear_background(&mut self) {
        self.background = None;
        self.canvas_width = DEFAULT_CANVAS_WIDTH;
        self.canvas_height = DEFAULT_CANVAS_HEIGHT;
        self.touch();
    }

    // ------------------------------------------------------------------
    // Assets
    // ------------------------------------------------------------------

    /// All assets in insertion order.
    #[must_use]
    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    /// Look up an asset by id.
    #[must_use]
    pub fn asset(&self, id: &AssetId) -> Option<&Asset> {
        self.assets.iter().find(|a| &a.id == id)
    }

    /// Add an asset to the table.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::DuplicateId`] if the id is taken, or a
    /// validation error from [`Asset::validate`].
    pub fn add_asset(&mut self, asset: Asset) -> SceneResult<AssetId> {
        asset.validate()?;
        if self.asset(&asset.id).is_some() {
            return Err(SceneError::DuplicateId(asset.id.to_string()));
        }
        let id = asset.id.clone();
        tracing::debug!("Asset added: {} ({})", id, asset.name);
        self.assets.push(asset);
        self.touch();
        Ok(id)
    }

    /// Remove an asset and every element that references it.
    ///
    /// Returns the removed elements in their former paint order.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::AssetUnavailable`] if the asset does not exist.
    pub fn remove_asset(&mut self, id: &AssetId) -> SceneResult<Vec<Element>> {
        let index = self
            .assets
            .iter()
            .position(|a| &a.id == id)
            .ok_or_else(|| SceneError::AssetUnavailable(id.to_string()))?;
        self.assets.remove(index);

        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.elements)
            .into_iter()
            .partition(|e| e.asset_id() == Some(id));
        self.elements = kept;
        if !removed.is_empty() {
            tracing::warn!(
                "Removing asset {} cascaded to {} element(s)",
                id,
                removed.len()
            );
        }
        self.renumber();
        self.touch();
        Ok(removed)
    }

    /// Font family names registered by font assets.
    pub fn custom_font_families(&self) -> impl Iterator<Item = &str> {
        self.assets.iter().filter_map(|a| match &a.content {
            AssetContent::Font { family, .. } => Some(family.as_str()),
            _ => None,
        })
    }

    // ------------------------------------------------------------------
    // Elements
    // ------------------------------------------------------------------

    /// Elements in paint order (bottom to top).
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Get an element by ID.
    #[must_use]
    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| &e.id == id)
    }

    /// Sequence position of an element.
    #[must_use]
    pub fn index_of(&self, id: &ElementId) -> Option<usize> {
        self.elements.iter().position(|e| &e.id == id)
    }

    /// Get the number of elements in the scene.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Check if the scene has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Append an element on top of the stack.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::DuplicateId`] if the id is already used,
    /// [`SceneError::AssetUnavailable`] if an image references a missing
    /// asset, or a validation error from [`Element::validate`].
    pub fn add_element(&mut self, mut element: Element) -> SceneResult<ElementId> {
        element.validate()?;
        element.rotation_degrees = crate::element::normalize_degrees(element.rotation_degrees);
        if self.element(&element.id).is_some() {
            return Err(SceneError::DuplicateId(element.id.to_string()));
        }
        if let Some(asset_id) = element.asset_id() {
            if self.asset(asset_id).is_none() {
                return Err(SceneError::AssetUnavailable(asset_id.to_string()));
            }
        }
        let id = element.id.clone();
        tracing::debug!("Element added: {} ({})", id, element.kind.name());
        self.elements.push(element);
        self.renumber();
        self.touch();
        Ok(id)
    }

    /// Add a text element with the default style at the canvas center.
    ///
    /// # Errors
    ///
    /// See [`Scene::add_element`].
    pub fn add_text(&mut self, content: impl Into<String>) -> SceneResult<ElementId> {
        let (cx, cy) = self.center();
        self.add_element(Element::text(TextContent::new(content)).with_position(cx, cy))
    }

    /// Place an image or vector icon asset at the canvas center at its
    /// natural size.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::AssetUnavailable`] if the asset is missing and
    /// [`SceneError::InvalidStyle`] if it is a font.
    pub fn add_image(&mut self, asset_id: &AssetId) -> SceneResult<ElementId> {
        let asset = self
            .asset(asset_id)
            .ok_or_else(|| SceneError::AssetUnavailable(asset_id.to_string()))?;
        let (w, h) = asset.natural_size().ok_or_else(|| {
            SceneError::InvalidStyle(format!("font asset {asset_id} cannot be placed"))
        })?;
        let (cx, cy) = self.center();
        self.add_element(Element::image(asset_id.clone(), w, h).with_position(cx, cy))
    }

    /// Apply a patch to an element, replacing the record as a whole.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::ElementNotFound`] if the element is missing, or
    /// the validation error from [`ElementPatch::apply_to`]; in both cases
    /// the element is unchanged.
    pub fn update_element(&mut self, id: &ElementId, patch: &ElementPatch) -> SceneResult<()> {
        let index = self
            .index_of(id)
            .ok_or_else(|| SceneError::ElementNotFound(id.to_string()))?;
        let next = patch.apply_to(&self.elements[index])?;
        self.elements[index] = next;
        self.touch();
        Ok(())
    }

    /// Move an element's anchor.
    ///
    /// # Errors
    ///
    /// See [`Scene::update_element`].
    pub fn set_position(&mut self, id: &ElementId, x: f32, y: f32) -> SceneResult<()> {
        self.update_element(id, &ElementPatch::position(x, y))
    }

    /// Remove an element, keeping the rest in order.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::ElementNotFound`] if the element is missing.
    pub fn remove_element(&mut self, id: &ElementId) -> SceneResult<Element> {
        let index = self
            .index_of(id)
            .ok_or_else(|| SceneError::ElementNotFound(id.to_string()))?;
        let removed = self.elements.remove(index);
        self.renumber();
        self.touch();
        tracing::debug!("Element removed: {}", id);
        Ok(removed)
    }

    /// Find the topmost element whose box contains the scene-space point.
    #[must_use]
    pub fn element_at(&self, x: f32, y: f32) -> Option<&ElementId> {
        self.elements
            .iter()
            .rev()
            .find(|e| e.contains_point(x, y))
            .map(|e| &e.id)
    }

    // ------------------------------------------------------------------
    // Internal
    // ------------------------------------------------------------------

    /// Assemble a scene from already-validated parts.
    pub(crate) fn from_parts(
        name: String,
        canvas_width: u32,
        canvas_height: u32,
        background: Option<Background>,
        assets: Vec<Asset>,
        elements: Vec<Element>,
    ) -> Self {
        let mut scene = Self {
            name,
            canvas_width,
            canvas_height,
            background,
            assets,
            elements,
            revision: 0,
        };
        scene.renumber();
        scene
    }

    /// Mutable access to the element sequence for reordering.
    pub(crate) fn elements_mut(&mut self) -> &mut Vec<Element> {
        &mut self.elements
    }

    /// Rewrite cached ranks to match sequence positions.
    pub(crate) fn renumber(&mut self) {
        for (rank, element) in self.elements.iter_mut().enumerate() {
            element.rank = rank;
        }
    }

    /// Record a committed mutation.
    pub(crate) fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    #[allow(clippy::cast_precision_loss)]
    fn center(&self) -> (f32, f32) {
        (
            self.canvas_width as f32 / 2.0,
            self.canvas_height as f32 / 2.0,
        )
    }
}

fn check_canvas(width: u32, height: u32) -> SceneResult<()> {
    if width == 0 || height == 0 {
        return Err(SceneError::InvalidGeometry(format!(
            "canvas must be at least 1x1, got {width}x{height}"
        )));
    }
    Ok(())
}
