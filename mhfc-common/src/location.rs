//! Asset locations
//!
//! Files and textures are addressed by resource strings of the form
//! `modid:path/inside/assets` which map onto `assets/<modid>/<path>` on disk.

use std::path::{Path, PathBuf};

/// Mod id assumed for bare resource strings
pub const DEFAULT_MOD_ID: &str = "minecraft";

/// Extensions stripped when deriving a material stem
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tga", "bmp"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("asset string can't be empty")]
    Empty,

    #[error("asset string {0:?}: mod id and path mustn't be empty")]
    EmptyComponent(String),

    #[error("asset string {0:?} can't contain more than one ':'")]
    TooManySeparators(String),

    #[error("template {template:?} uses unknown placeholder {{{name}}}")]
    UnknownPlaceholder { template: String, name: String },

    #[error("template {0:?} has an unclosed '{{'")]
    UnclosedPlaceholder(String),
}

/// Translate a resource string to a path relative to the output directory
pub fn asset_to_dir(asset: &str) -> Result<PathBuf, LocationError> {
    if asset.is_empty() {
        return Err(LocationError::Empty);
    }
    let mut split = asset.split(':');
    let first = split.next().unwrap_or_default();
    match (split.next(), split.next()) {
        (None, _) => Ok(Path::new("assets").join(DEFAULT_MOD_ID).join(first)),
        (Some(path), None) => {
            if first.is_empty() || path.is_empty() {
                return Err(LocationError::EmptyComponent(asset.to_string()));
            }
            Ok(Path::new("assets").join(first).join(path))
        }
        _ => Err(LocationError::TooManySeparators(asset.to_string())),
    }
}

/// Fill `{name}` placeholders of a path template
///
/// `{{` and `}}` produce literal braces. Placeholders not in `values` are an error.
pub fn format_template(template: &str, values: &[(&str, &str)]) -> Result<String, LocationError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => name.push(ch),
                        None => {
                            return Err(LocationError::UnclosedPlaceholder(template.to_string()))
                        }
                    }
                }
                let value = values
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| *value)
                    .ok_or_else(|| LocationError::UnknownPlaceholder {
                        template: template.to_string(),
                        name: name.clone(),
                    })?;
                out.push_str(value);
            }
            other => out.push(other),
        }
    }

    Ok(out)
}

/// Canonical stem of an image path: directory and known image extension removed
///
/// Both `/` and `\` count as separators since editors on either platform
/// hand out their native paths.
pub fn image_stem(path: &str) -> &str {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && IMAGE_EXTENSIONS
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext)) =>
        {
            stem
        }
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_to_dir() {
        assert_eq!(
            asset_to_dir("mhfc:models/rathalos.mcmd").unwrap(),
            Path::new("assets/mhfc/models/rathalos.mcmd")
        );
        assert_eq!(
            asset_to_dir("textures/a.png").unwrap(),
            Path::new("assets/minecraft/textures/a.png")
        );
    }

    #[test]
    fn test_asset_to_dir_errors() {
        assert_eq!(asset_to_dir(""), Err(LocationError::Empty));
        assert!(matches!(
            asset_to_dir(":path"),
            Err(LocationError::EmptyComponent(_))
        ));
        assert!(matches!(
            asset_to_dir("mod:"),
            Err(LocationError::EmptyComponent(_))
        ));
        assert!(matches!(
            asset_to_dir("a:b:c"),
            Err(LocationError::TooManySeparators(_))
        ));
    }

    #[test]
    fn test_format_template() {
        let s = format_template(
            "{modid}:textures/models/{modelname}/{texname}.png",
            &[("modid", "mhfc"), ("modelname", "tigrex"), ("texname", "body")],
        )
        .unwrap();
        assert_eq!(s, "mhfc:textures/models/tigrex/body.png");

        assert_eq!(format_template("{{x}}", &[]).unwrap(), "{x}");
    }

    #[test]
    fn test_format_template_errors() {
        assert!(matches!(
            format_template("{nope}", &[("modid", "x")]),
            Err(LocationError::UnknownPlaceholder { ref name, .. }) if name == "nope"
        ));
        assert!(matches!(
            format_template("abc{modid", &[("modid", "x")]),
            Err(LocationError::UnclosedPlaceholder(_))
        ));
    }

    #[test]
    fn test_image_stem() {
        assert_eq!(image_stem("//textures/body.png"), "body");
        assert_eq!(image_stem("C:\\tex\\wing.JPG"), "wing");
        assert_eq!(image_stem("plain"), "plain");
        assert_eq!(image_stem("archive.tar"), "archive.tar");
        assert_eq!(image_stem(".png"), ".png");
    }
}
