//! Image textures
//!
//! Decodes images with the `image` crate and uploads them as RGBA8 textures.
//! Rows are flipped on upload so texture coordinate (0, 0) is the bottom-left
//! corner of the image, matching the shape generators.

use std::path::Path;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::gpu::{
    GraphicsContext, TextureDescriptor, TextureFilter, TextureFormat, TextureId, TextureWrap,
};
use crate::render::{RenderError, RenderResult};

/// Sampling options for an image texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextureSettings {
    /// Magnification filter
    pub mag_filter: TextureFilter,
    /// Minification filter
    pub min_filter: TextureFilter,
    /// Coordinate wrapping
    pub wrap: TextureWrap,
}

/// A texture living in a graphics context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Texture {
    id: TextureId,
    width: u32,
    height: u32,
}

impl Texture {
    /// Decode an image file and upload it
    pub fn from_file(
        ctx: &mut dyn GraphicsContext,
        path: impl AsRef<Path>,
        settings: TextureSettings,
    ) -> RenderResult<Self> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|source| RenderError::TextureLoad {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("Loaded texture {} ({}x{})", path.display(), image.width(), image.height());
        Self::from_image(ctx, &image.to_rgba8(), settings)
    }

    /// Upload an already decoded image
    pub fn from_image(
        ctx: &mut dyn GraphicsContext,
        image: &RgbaImage,
        settings: TextureSettings,
    ) -> RenderResult<Self> {
        let flipped = image::imageops::flip_vertical(image);
        let descriptor = TextureDescriptor {
            width: image.width(),
            height: image.height(),
            format: TextureFormat::Rgba8,
            mag_filter: settings.mag_filter,
            min_filter: settings.min_filter,
            wrap: settings.wrap,
        };
        let id = ctx.create_texture(&descriptor, Some(flipped.as_raw().as_slice()))?;
        Ok(Self {
            id,
            width: descriptor.width,
            height: descriptor.height,
        })
    }

    /// Wrap a texture created elsewhere, e.g. a render target attachment
    pub const fn from_raw(id: TextureId, width: u32, height: u32) -> Self {
        Self { id, width, height }
    }

    /// Context handle
    pub const fn id(&self) -> TextureId {
        self.id
    }

    /// Width in texels
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in texels
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Release the texture
    pub fn release(self, ctx: &mut dyn GraphicsContext) {
        ctx.delete_texture(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::HeadlessContext;

    #[test]
    fn test_from_image_uploads_rgba() {
        let mut ctx = HeadlessContext::new(8, 8);
        let image = RgbaImage::from_pixel(4, 2, image::Rgba([255, 0, 0, 255]));

        let texture = Texture::from_image(&mut ctx, &image, TextureSettings::default()).unwrap();
        assert_eq!((texture.width(), texture.height()), (4, 2));
        assert!(ctx.has_texture(texture.id()));

        texture.release(&mut ctx);
        assert!(!ctx.has_texture(texture.id()));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let mut ctx = HeadlessContext::new(8, 8);
        let err = Texture::from_file(&mut ctx, "does/not/exist.png", TextureSettings::default())
            .unwrap_err();
        assert!(err.to_string().contains("does/not/exist.png"));
    }
}
