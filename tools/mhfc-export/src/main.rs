//! mhfc-export - MHFC asset export tool
//!
//! Converts editor scene snapshots (JSON) to the binary formats read by the
//! MHFC runtime (.mcmd, .mcskl, .mcanm)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use mhfc_common::{mask_uuid, DEFAULT_MOD_ID};
use mhfc_export::{
    animation, manifest, mesh, skeleton, AnimationOptions, AnimationVersion, ExportReport,
    ModelOptions, ModelVersion, SceneSnapshot, SkeletonOptions, SkeletonVersion, TextureLocator,
    ANIMATION_EXT, MODEL_EXT, SKELETON_EXT,
};

#[derive(Parser)]
#[command(name = "mhfc-export")]
#[command(about = "MHFC asset export tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build assets from a manifest file
    Build {
        /// Path to mhfc.toml manifest
        #[arg(default_value = "mhfc.toml")]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate manifest without building
    Check {
        /// Path to mhfc.toml manifest
        #[arg(default_value = "mhfc.toml")]
        manifest: PathBuf,
    },

    /// Export the mesh of a scene snapshot
    Model {
        /// Input scene snapshot
        input: PathBuf,

        /// Output .mcmd file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Body version (V1 or V2)
        #[arg(long, default_value = "V2")]
        version: ModelVersion,

        #[command(flatten)]
        header: HeaderArgs,

        /// Mod id used in texture locations
        #[arg(long, default_value = DEFAULT_MOD_ID)]
        mod_id: String,

        /// Texture location template
        #[arg(long, default_value = "{modid}:textures/models/{modelname}/{texname}.png")]
        textures: String,

        /// Part name for faces without a render group
        #[arg(long, default_value = "Default")]
        default_group: String,

        /// Image for the default group and groups with an invalid image
        #[arg(long, default_value = "missing")]
        default_image: String,
    },

    /// Export the armature of a scene snapshot
    Skeleton {
        /// Input scene snapshot
        input: PathBuf,

        /// Output .mcskl file
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        header: HeaderArgs,
    },

    /// Export an action of a scene snapshot
    Animation {
        /// Input scene snapshot
        input: PathBuf,

        /// Output .mcanm file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Action name (default: first action)
        #[arg(short, long)]
        action: Option<String>,

        /// Frame subtracted from every keyframe
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        offset: f32,

        /// Author written into the file header
        #[arg(long, default_value = "")]
        artist: String,
    },
}

#[derive(clap::Args)]
struct HeaderArgs {
    /// Author written into the file header
    #[arg(long, default_value = "")]
    artist: String,

    /// UUID as four comma separated integers (default: random)
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    uuid: Option<Vec<i64>>,
}

impl HeaderArgs {
    fn uuid(&self) -> Result<[u32; 4]> {
        match &self.uuid {
            Some(values) => {
                let raw: [i64; 4] = values
                    .as_slice()
                    .try_into()
                    .context("--uuid takes exactly four values")?;
                Ok(mask_uuid(raw))
            }
            None => Ok(rand::random()),
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build { manifest, output } => {
            tracing::info!("Building assets from {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            let report = manifest::build_all(&config, base_dir(&manifest), output.as_deref())?;
            report.emit();
            tracing::info!("Build complete! ({} warnings)", report.warnings().count());
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            manifest::validate(&config, base_dir(&manifest))?;
            tracing::info!("Manifest is valid!");
        }

        Commands::Model {
            input,
            output,
            version,
            header,
            mod_id,
            textures,
            default_group,
            default_image,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension(MODEL_EXT));
            tracing::info!("Converting {:?} -> {:?}", input, output);

            let scene = SceneSnapshot::load(&input)?;
            let options = ModelOptions {
                version,
                uuid: header.uuid()?,
                artist: header.artist,
                default_group,
                default_image,
                textures: TextureLocator::new(textures, mod_id, file_stem(&output))?,
            };
            let mut report = ExportReport::new();
            let result = mesh::convert_model(&scene, &output, &options, &mut report);
            report.emit();
            result?;
            tracing::info!("Done!");
        }

        Commands::Skeleton {
            input,
            output,
            header,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension(SKELETON_EXT));
            tracing::info!("Exporting skeleton {:?} -> {:?}", input, output);

            let scene = SceneSnapshot::load(&input)?;
            let options = SkeletonOptions {
                version: SkeletonVersion::V1,
                uuid: header.uuid()?,
                artist: header.artist,
            };
            let mut report = ExportReport::new();
            let result = skeleton::convert_skeleton(&scene, &output, &options, &mut report);
            report.emit();
            result?;
            tracing::info!("Done!");
        }

        Commands::Animation {
            input,
            output,
            action,
            offset,
            artist,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension(ANIMATION_EXT));
            tracing::info!("Exporting animation {:?} -> {:?}", input, output);

            let scene = SceneSnapshot::load(&input)?;
            let options = AnimationOptions {
                version: AnimationVersion::V1,
                artist,
                action,
                offset,
            };
            let mut report = ExportReport::new();
            let result = animation::convert_animation(&scene, &output, &options, &mut report);
            report.emit();
            result?;
            tracing::info!("Done!");
        }
    }

    Ok(())
}

/// Scene paths in a manifest are relative to the manifest itself
fn base_dir(manifest: &Path) -> &Path {
    manifest.parent().unwrap_or(Path::new("."))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
