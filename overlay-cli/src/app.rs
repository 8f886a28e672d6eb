//! Project loading, export and inspection.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use overlay_core::{AssetContent, ElementKind, LoadReport, ProjectDocument, Scene};
use overlay_renderer::{DataUriSource, ExportFormat, SceneExporter};
use serde::Serialize;

use crate::{CliArgs, Command, ExportArgs, InfoArgs};

/// Run a parsed command line.
///
/// # Errors
///
/// Returns an error if the project cannot be read or parsed, or the export
/// fails.
pub async fn run(args: CliArgs) -> Result<()> {
    match args.command {
        Command::Export(export) => {
            let written = export_project(&export).await?;
            println!("{}", written.display());
        }
        Command::Info(InfoArgs { project, json }) => {
            let (scene, report) = load_project(&project).await?;
            let summary = summarize(&scene, &report);
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{summary}");
            }
        }
    }
    Ok(())
}

/// Read and parse a project document. Elements dropped during load are
/// logged and returned in the report.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a usable project.
pub async fn load_project(path: &Path) -> Result<(Scene, LoadReport)> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read project {}", path.display()))?;
    let (scene, report) = ProjectDocument::from_json(&json)
        .and_then(ProjectDocument::into_scene)
        .with_context(|| format!("Failed to load project {}", path.display()))?;

    for id in &report.dropped_elements {
        tracing::warn!("Dropped element {} (its asset is missing)", id);
    }
    tracing::debug!(
        "Loaded {:?}: {}x{}, {} element(s)",
        scene.name(),
        scene.canvas_width(),
        scene.canvas_height(),
        scene.element_count()
    );
    Ok((scene, report))
}

/// Export the project named by `args` and return the written path.
///
/// # Errors
///
/// Returns an error if loading, rendering or writing fails. Nothing is
/// written for a failed render.
pub async fn export_project(args: &ExportArgs) -> Result<PathBuf> {
    let (scene, _) = load_project(&args.project).await?;
    let format = args.resolved_format();

    let asset_dir = args.asset_dir.clone().unwrap_or_else(|| {
        args.project
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    });
    let exporter =
        SceneExporter::new(args.export_config()).with_source(Arc::new(DataUriSource::with_base_dir(asset_dir)));

    let bytes = exporter
        .export(&scene, format)
        .await
        .with_context(|| format!("Failed to export {} as {format}", args.project.display()))?;

    let out = args.out.clone().unwrap_or_else(|| output_path(&scene, format));
    tokio::fs::write(&out, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", out.display()))?;

    tracing::info!("Wrote {} ({} bytes)", out.display(), bytes.len());
    Ok(out)
}

/// Default output file: the project name with path separators replaced.
#[must_use]
pub fn output_path(scene: &Scene, format: ExportFormat) -> PathBuf {
    let stem: String = scene
        .name()
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    let stem = if stem.is_empty() { "Untitled".to_string() } else { stem };
    PathBuf::from(format!("{stem}.{}", format.extension()))
}

/// One row of `overlay info`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSummary {
    /// Element id.
    pub id: String,
    /// `text` or `image`.
    pub kind: &'static str,
    /// Text content or asset name.
    pub label: String,
    /// Anchor X.
    pub x: f32,
    /// Anchor Y.
    pub y: f32,
    /// Rotation in degrees.
    pub rotation_degrees: f32,
    /// Uniform scale.
    pub scale: f32,
}

/// What `overlay info` prints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneSummary {
    /// Project name.
    pub name: String,
    /// Canvas width.
    pub canvas_width: u32,
    /// Canvas height.
    pub canvas_height: u32,
    /// Whether a background image is set.
    pub has_background: bool,
    /// Raster image assets.
    pub image_assets: usize,
    /// Vector icon assets.
    pub icon_assets: usize,
    /// Font assets.
    pub font_assets: usize,
    /// Elements bottom to top.
    pub elements: Vec<ElementSummary>,
    /// Elements skipped during load.
    pub dropped_elements: Vec<String>,
}

/// Summarize a loaded scene.
#[must_use]
pub fn summarize(scene: &Scene, report: &LoadReport) -> SceneSummary {
    let count = |f: fn(&AssetContent) -> bool| scene.assets().iter().filter(|a| f(&a.content)).count();

    let elements = scene
        .elements()
        .iter()
        .map(|element| {
            let label = match &element.kind {
                ElementKind::Text(text) => text.content.clone(),
                ElementKind::Image(image) => scene
                    .asset(&image.asset_id)
                    .map_or_else(|| image.asset_id.to_string(), |asset| asset.name.clone()),
            };
            ElementSummary {
                id: element.id.to_string(),
                kind: element.kind.name(),
                label,
                x: element.x,
                y: element.y,
                rotation_degrees: element.rotation_degrees,
                scale: element.scale,
            }
        })
        .collect();

    SceneSummary {
        name: scene.name().to_string(),
        canvas_width: scene.canvas_width(),
        canvas_height: scene.canvas_height(),
        has_background: scene.background().is_some(),
        image_assets: count(|c| matches!(c, AssetContent::Image { .. })),
        icon_assets: count(|c| matches!(c, AssetContent::VectorIcon { .. })),
        font_assets: count(|c| matches!(c, AssetContent::Font { .. })),
        elements,
        dropped_elements: report.dropped_elements.iter().map(ToString::to_string).collect(),
    }
}

impl fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(
            f,
            "  canvas:     {}x{}{}",
            self.canvas_width,
            self.canvas_height,
            if self.has_background { " (background image)" } else { "" }
        )?;
        writeln!(
            f,
            "  assets:     {} image(s), {} icon(s), {} font(s)",
            self.image_assets, self.icon_assets, self.font_assets
        )?;
        writeln!(f, "  layers:     {} (bottom to top)", self.elements.len())?;
        for (index, element) in self.elements.iter().enumerate() {
            writeln!(
                f,
                "    {index:>3}  {:<5}  {:<24}  at ({}, {})  rot {}  scale {}",
                element.kind, element.label, element.x, element.y, element.rotation_degrees, element.scale
            )?;
        }
        if !self.dropped_elements.is_empty() {
            writeln!(f, "  dropped:    {}", self.dropped_elements.join(", "))?;
        }
        Ok(())
    }
}
