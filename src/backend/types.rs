//! Common types shared between backends

use bitflags::bitflags;
use glam::UVec3;
use half::f16;

/// Texture format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    R8Unorm,
    R16Float,
    R32Float,
    Rg16Float,
    Rgba8Unorm,
    Rgba16Float,
    Rgba32Float,
}

impl TextureFormat {
    /// Size of one texel in bytes.
    pub fn block_size(&self) -> u32 {
        match self {
            TextureFormat::R8Unorm => 1,
            TextureFormat::R16Float => 2,
            TextureFormat::R32Float | TextureFormat::Rg16Float | TextureFormat::Rgba8Unorm => 4,
            TextureFormat::Rgba16Float => 8,
            TextureFormat::Rgba32Float => 16,
        }
    }

    pub fn channel_count(&self) -> usize {
        match self {
            TextureFormat::R8Unorm | TextureFormat::R16Float | TextureFormat::R32Float => 1,
            TextureFormat::Rg16Float => 2,
            TextureFormat::Rgba8Unorm | TextureFormat::Rgba16Float | TextureFormat::Rgba32Float => {
                4
            }
        }
    }

    /// Encode a color as the bytes of a single texel in this format.
    ///
    /// Channels the format does not carry are dropped.
    pub fn encode_color(&self, color: ClearColor) -> Vec<u8> {
        let channels = &color.0[..self.channel_count()];
        match self {
            TextureFormat::R8Unorm | TextureFormat::Rgba8Unorm => channels
                .iter()
                .map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
                .collect(),
            TextureFormat::R16Float | TextureFormat::Rg16Float | TextureFormat::Rgba16Float => {
                let halves: Vec<f16> = channels.iter().map(|&c| f16::from_f32(c)).collect();
                bytemuck::cast_slice::<f16, u8>(&halves).to_vec()
            }
            TextureFormat::R32Float | TextureFormat::Rgba32Float => {
                bytemuck::cast_slice::<f32, u8>(channels).to_vec()
            }
        }
    }
}

/// Shape of a texture resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    D2,
    D3,
    D2Array,
    /// Six-layer 2D array standing in for a cube texture.
    ///
    /// Native cube textures cannot be bound for random write on every backend.
    EmulatedCube,
}

impl TextureDimension {
    /// Whether the third extent component counts array layers rather than depth.
    pub fn is_layered(&self) -> bool {
        matches!(self, TextureDimension::D2Array | TextureDimension::EmulatedCube)
    }
}

bitflags! {
    /// Usage flags for textures.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        /// Texture can be copied from.
        const COPY_SRC = 1 << 0;
        /// Texture can be copied to.
        const COPY_DST = 1 << 1;
        /// Texture can be sampled in a shader.
        const TEXTURE_BINDING = 1 << 2;
        /// Texture can be bound for random write (storage texture).
        const STORAGE_BINDING = 1 << 3;
        /// Texture can be used as a render attachment.
        const RENDER_ATTACHMENT = 1 << 4;
    }
}

bitflags! {
    /// Usage flags for buffers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        const COPY_SRC = 1 << 0;
        const COPY_DST = 1 << 1;
        const UNIFORM = 1 << 2;
        const STORAGE = 1 << 3;
    }
}

/// Texture descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureDescriptor {
    pub label: String,
    pub width: u32,
    pub height: u32,
    /// Depth for 3D textures, layer count for arrays and emulated cubes, 1 for 2D.
    pub depth_or_layers: u32,
    pub dimension: TextureDimension,
    pub format: TextureFormat,
    pub mip_level_count: u32,
    /// Mips were requested. They are never generated automatically.
    pub use_mip_map: bool,
    pub auto_generate_mips: bool,
    pub usage: TextureUsage,
}

impl TextureDescriptor {
    pub fn extent(&self) -> UVec3 {
        UVec3::new(self.width, self.height, self.depth_or_layers)
    }

    /// Whether shaders may write this texture at arbitrary texels.
    pub fn random_write(&self) -> bool {
        self.usage.contains(TextureUsage::STORAGE_BINDING)
    }

    /// Extent of a given mip level. Array layers do not shrink.
    pub fn mip_extent(&self, level: u32) -> UVec3 {
        let shrink = |v: u32| (v >> level).max(1);
        let depth = if self.dimension == TextureDimension::D3 {
            shrink(self.depth_or_layers)
        } else {
            self.depth_or_layers
        };
        UVec3::new(shrink(self.width), shrink(self.height), depth)
    }

    /// Number of texels in a given mip level, counted without `u32` overflow.
    pub fn mip_texel_count(&self, level: u32) -> usize {
        let extent = self.mip_extent(level);
        extent.x as usize * extent.y as usize * extent.z as usize
    }
}

/// Buffer descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BufferDescriptor {
    pub label: String,
    pub element_count: u64,
    pub stride: u64,
    pub usage: BufferUsage,
}

impl BufferDescriptor {
    pub fn size(&self) -> u64 {
        self.element_count * self.stride
    }
}

/// Linear RGBA color used for render target clears
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearColor(pub [f32; 4]);

impl ClearColor {
    pub const WHITE: Self = Self([1.0, 1.0, 1.0, 1.0]);
    pub const BLACK: Self = Self([0.0, 0.0, 0.0, 0.0]);
}
