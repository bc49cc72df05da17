//! Manifest parsing and build orchestration
//!
//! Parses mhfc.toml and exports every model, skeleton and animation it lists.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use mhfc_common::{
    format_template, mask_uuid, AnimationVersion, ModelVersion, SkeletonVersion, DEFAULT_MOD_ID,
};

use crate::animation::{convert_animation, AnimationOptions};
use crate::mesh::{convert_model, ModelOptions, TextureLocator};
use crate::output::resolve_output;
use crate::report::ExportReport;
use crate::scene::SceneSnapshot;
use crate::skeleton::{convert_skeleton, SkeletonOptions};

/// Root manifest structure
#[derive(Debug, Deserialize, Default)]
pub struct Manifest {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub paths: PathTemplates,
    #[serde(default)]
    pub models: BTreeMap<String, ModelEntry>,
    #[serde(default)]
    pub skeletons: BTreeMap<String, SkeletonEntry>,
    #[serde(default)]
    pub animations: BTreeMap<String, AnimationEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    #[serde(default = "default_mod_id")]
    pub mod_id: String,
    #[serde(default = "default_project_name")]
    pub project_name: String,
    #[serde(default)]
    pub artist: String,
    /// Signed values are accepted and masked to 32 bits
    #[serde(default)]
    pub uuid: Option<[i64; 4]>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            mod_id: default_mod_id(),
            project_name: default_project_name(),
            artist: String::new(),
            uuid: None,
            output_dir: default_output_dir(),
        }
    }
}

fn default_mod_id() -> String {
    DEFAULT_MOD_ID.to_string()
}

fn default_project_name() -> String {
    "project".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Resource location templates
#[derive(Debug, Deserialize)]
pub struct PathTemplates {
    #[serde(default = "default_model_path")]
    pub model: String,
    #[serde(default = "default_skeleton_path")]
    pub skeleton: String,
    #[serde(default = "default_animation_path")]
    pub animation: String,
    #[serde(default = "default_texture_path")]
    pub texture: String,
}

impl Default for PathTemplates {
    fn default() -> Self {
        Self {
            model: default_model_path(),
            skeleton: default_skeleton_path(),
            animation: default_animation_path(),
            texture: default_texture_path(),
        }
    }
}

fn default_model_path() -> String {
    "{modid}:models/{projectname}/{modelname}.mcmd".to_string()
}

fn default_skeleton_path() -> String {
    "{modid}:models/{projectname}/{skeletonname}.mcskl".to_string()
}

fn default_animation_path() -> String {
    "{modid}:models/{projectname}/{animname}.mcanm".to_string()
}

fn default_texture_path() -> String {
    "{modid}:textures/models/{modelname}/{texname}.png".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ModelEntry {
    pub scene: PathBuf,
    #[serde(default)]
    pub version: Option<String>,
    /// Overrides the project artist
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default = "default_group")]
    pub default_group: String,
    #[serde(default = "default_image")]
    pub default_image: String,
}

fn default_group() -> String {
    "Default".to_string()
}

fn default_image() -> String {
    "missing".to_string()
}

#[derive(Debug, Deserialize)]
pub struct SkeletonEntry {
    pub scene: PathBuf,
    #[serde(default)]
    pub artist: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnimationEntry {
    pub scene: PathBuf,
    /// Action inside the scene, the first one when absent
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub offset: f32,
}

/// Load and parse a manifest file
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {:?}", path))?;
    let manifest: Manifest = toml::from_str(&content)
        .with_context(|| format!("Failed to parse manifest: {:?}", path))?;
    Ok(manifest)
}

/// Validate a manifest without building
///
/// Scene paths are resolved against `base_dir`, the manifest's directory.
pub fn validate(manifest: &Manifest, base_dir: &Path) -> Result<()> {
    let project = &manifest.project;

    for (name, entry) in &manifest.models {
        check_scene("Model", name, &base_dir.join(&entry.scene))?;
        model_version(name, entry)?;
        output_location(&manifest.paths.model, project, "modelname", name)?;
        TextureLocator::new(&manifest.paths.texture, &project.mod_id, name)
            .with_context(|| format!("Invalid texture path template for model '{}'", name))?;
    }
    for (name, entry) in &manifest.skeletons {
        check_scene("Skeleton", name, &base_dir.join(&entry.scene))?;
        output_location(&manifest.paths.skeleton, project, "skeletonname", name)?;
    }
    for (name, entry) in &manifest.animations {
        check_scene("Animation", name, &base_dir.join(&entry.scene))?;
        output_location(&manifest.paths.animation, project, "animname", name)?;
    }
    Ok(())
}

fn check_scene(kind: &str, name: &str, scene: &Path) -> Result<()> {
    if !scene.exists() {
        anyhow::bail!("{} '{}' scene not found: {:?}", kind, name, scene);
    }
    Ok(())
}

fn model_version(name: &str, entry: &ModelEntry) -> Result<ModelVersion> {
    match &entry.version {
        Some(version) => version
            .parse()
            .with_context(|| format!("Invalid version for model '{}'", name)),
        None => Ok(ModelVersion::default()),
    }
}

/// Format an output template for one entry
fn output_location(template: &str, project: &ProjectConfig, key: &str, name: &str) -> Result<String> {
    format_template(
        template,
        &[
            ("modid", project.mod_id.as_str()),
            ("projectname", project.project_name.as_str()),
            (key, name),
        ],
    )
    .with_context(|| format!("Invalid output path template {:?}", template))
}

/// Build all assets from a manifest
///
/// Every entry is exported even when an earlier one failed; the first error
/// is returned after the rest finished.
pub fn build_all(
    manifest: &Manifest,
    base_dir: &Path,
    output_override: Option<&Path>,
) -> Result<ExportReport> {
    let project = &manifest.project;
    let output_dir = match output_override {
        Some(dir) => dir.to_path_buf(),
        None => base_dir.join(&project.output_dir),
    };
    let uuid = match project.uuid {
        Some(raw) => mask_uuid(raw),
        None => {
            let uuid = rand::random::<[u32; 4]>();
            tracing::warn!(
                "No uuid in [project], generated {:?}; add it to the manifest to keep exports stable",
                uuid
            );
            uuid
        }
    };

    let mut report = ExportReport::new();
    let mut failures: Vec<anyhow::Error> = Vec::new();

    for (name, entry) in &manifest.models {
        let result = build_model(manifest, base_dir, &output_dir, uuid, name, entry, &mut report);
        if let Err(e) = result {
            tracing::error!("Model '{}' failed: {:#}", name, e);
            failures.push(e);
        }
    }
    for (name, entry) in &manifest.skeletons {
        let result = build_skeleton(manifest, base_dir, &output_dir, uuid, name, entry, &mut report);
        if let Err(e) = result {
            tracing::error!("Skeleton '{}' failed: {:#}", name, e);
            failures.push(e);
        }
    }
    for (name, entry) in &manifest.animations {
        let result = build_animation(manifest, base_dir, &output_dir, name, entry, &mut report);
        if let Err(e) = result {
            tracing::error!("Animation '{}' failed: {:#}", name, e);
            failures.push(e);
        }
    }

    let total = manifest.models.len() + manifest.skeletons.len() + manifest.animations.len();
    match failures.len() {
        0 => Ok(report),
        n => {
            report.emit();
            let first = failures.swap_remove(0);
            Err(first.context(format!("{} of {} exports failed", n, total)))
        }
    }
}

fn artist<'a>(project: &'a ProjectConfig, entry: &'a Option<String>) -> &'a str {
    entry.as_deref().unwrap_or(project.artist.as_str())
}

fn build_model(
    manifest: &Manifest,
    base_dir: &Path,
    output_dir: &Path,
    uuid: [u32; 4],
    name: &str,
    entry: &ModelEntry,
    report: &mut ExportReport,
) -> Result<()> {
    let project = &manifest.project;
    let location = output_location(&manifest.paths.model, project, "modelname", name)?;
    let output = resolve_output(output_dir, &location)?;
    tracing::info!("Exporting model: {} -> {:?}", name, output);

    let scene = SceneSnapshot::load(&base_dir.join(&entry.scene))?;
    let options = ModelOptions {
        version: model_version(name, entry)?,
        uuid,
        artist: artist(project, &entry.artist).to_string(),
        default_group: entry.default_group.clone(),
        default_image: entry.default_image.clone(),
        textures: TextureLocator::new(&manifest.paths.texture, &project.mod_id, name)?,
    };
    convert_model(&scene, &output, &options, report)
        .with_context(|| format!("Failed to export model '{}'", name))
}

fn build_skeleton(
    manifest: &Manifest,
    base_dir: &Path,
    output_dir: &Path,
    uuid: [u32; 4],
    name: &str,
    entry: &SkeletonEntry,
    report: &mut ExportReport,
) -> Result<()> {
    let project = &manifest.project;
    let location = output_location(&manifest.paths.skeleton, project, "skeletonname", name)?;
    let output = resolve_output(output_dir, &location)?;
    tracing::info!("Exporting skeleton: {} -> {:?}", name, output);

    let scene = SceneSnapshot::load(&base_dir.join(&entry.scene))?;
    let options = SkeletonOptions {
        version: SkeletonVersion::V1,
        uuid,
        artist: artist(project, &entry.artist).to_string(),
    };
    convert_skeleton(&scene, &output, &options, report)
        .with_context(|| format!("Failed to export skeleton '{}'", name))
}

fn build_animation(
    manifest: &Manifest,
    base_dir: &Path,
    output_dir: &Path,
    name: &str,
    entry: &AnimationEntry,
    report: &mut ExportReport,
) -> Result<()> {
    let project = &manifest.project;
    let location = output_location(&manifest.paths.animation, project, "animname", name)?;
    let output = resolve_output(output_dir, &location)?;
    tracing::info!("Exporting animation: {} -> {:?}", name, output);

    let scene = SceneSnapshot::load(&base_dir.join(&entry.scene))?;
    let options = AnimationOptions {
        version: AnimationVersion::V1,
        artist: artist(project, &entry.artist).to_string(),
        action: entry.action.clone(),
        offset: entry.offset,
    };
    convert_animation(&scene, &output, &options, report)
        .with_context(|| format!("Failed to export animation '{}'", name))
}
