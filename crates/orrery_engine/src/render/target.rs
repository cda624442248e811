//! Offscreen render target

use crate::gpu::{
    FramebufferId, GraphicsContext, TextureDescriptor, TextureFilter, TextureFormat, TextureWrap,
};
use crate::texture::Texture;

use super::RenderResult;

/// Framebuffer with a color texture and a depth texture
///
/// Used for the shadow map and for rendering a frame into a texture.
#[derive(Debug)]
pub struct RenderTarget {
    framebuffer: FramebufferId,
    color: Texture,
    depth: Texture,
}

impl RenderTarget {
    /// Allocate both attachments and the framebuffer
    ///
    /// Attachments created before a failure are released before the error
    /// is returned.
    pub fn new(ctx: &mut dyn GraphicsContext, width: u32, height: u32) -> RenderResult<Self> {
        let color_descriptor = TextureDescriptor {
            wrap: TextureWrap::ClampToEdge,
            ..TextureDescriptor::rgba8(width, height)
        };
        let depth_descriptor = TextureDescriptor {
            format: TextureFormat::Depth32F,
            mag_filter: TextureFilter::Nearest,
            min_filter: TextureFilter::Nearest,
            ..color_descriptor
        };

        let color = ctx.create_texture(&color_descriptor, None)?;
        let depth = match ctx.create_texture(&depth_descriptor, None) {
            Ok(depth) => depth,
            Err(err) => {
                ctx.delete_texture(color);
                return Err(err.into());
            }
        };
        let framebuffer = match ctx.create_framebuffer(color, Some(depth)) {
            Ok(framebuffer) => framebuffer,
            Err(err) => {
                ctx.delete_texture(depth);
                ctx.delete_texture(color);
                return Err(err.into());
            }
        };

        log::debug!("Render target {framebuffer:?} created ({width}x{height})");
        Ok(Self {
            framebuffer,
            color: Texture::from_raw(color, width, height),
            depth: Texture::from_raw(depth, width, height),
        })
    }

    /// Framebuffer handle
    pub const fn framebuffer(&self) -> FramebufferId {
        self.framebuffer
    }

    /// Width in texels
    pub const fn width(&self) -> u32 {
        self.color.width()
    }

    /// Height in texels
    pub const fn height(&self) -> u32 {
        self.color.height()
    }

    /// Color attachment, sampleable once rendering is done
    pub const fn color_texture(&self) -> Texture {
        self.color
    }

    /// Depth attachment
    pub const fn depth_texture(&self) -> Texture {
        self.depth
    }

    /// Release the framebuffer and both attachments
    pub fn release(self, ctx: &mut dyn GraphicsContext) {
        ctx.delete_framebuffer(self.framebuffer);
        self.color.release(ctx);
        self.depth.release(ctx);
    }
}
