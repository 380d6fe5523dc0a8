use super::{AssetError, PendingLoad, TextureImage, TextureLoader, TextureOptions};
use std::path::{Path, PathBuf};

/// Decodes PNG/JPEG textures with the `image` crate on a worker thread.
#[derive(Debug, Clone, Default)]
pub struct ImageTextureLoader {
    base_dir: PathBuf,
}

impl ImageTextureLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl TextureLoader for ImageTextureLoader {
    fn load(&self, path: &Path, options: TextureOptions) -> PendingLoad<TextureImage> {
        let full_path = self.base_dir.join(path);
        let label = path.display().to_string();
        log::info!("Loading texture {}", full_path.display());
        PendingLoad::spawn(label, move || decode_texture(&full_path, options))
    }
}

pub(crate) fn decode_texture(
    path: &Path,
    options: TextureOptions,
) -> Result<TextureImage, AssetError> {
    let bytes = std::fs::read(path).map_err(|source| AssetError::Read {
        path: path.display().to_string(),
        source,
    })?;
    decode_texture_bytes(&bytes, &path.display().to_string(), options)
}

pub(crate) fn decode_texture_bytes(
    bytes: &[u8],
    label: &str,
    options: TextureOptions,
) -> Result<TextureImage, AssetError> {
    let decoded = image::load_from_memory(bytes).map_err(|source| AssetError::Decode {
        path: label.to_string(),
        source,
    })?;
    let mut rgba = decoded.to_rgba8();
    if options.flip_y {
        image::imageops::flip_vertical_in_place(&mut rgba);
    }
    let (width, height) = rgba.dimensions();
    Ok(TextureImage {
        label: label.to_string(),
        width,
        height,
        pixels: rgba.into_raw(),
        options,
    })
}
