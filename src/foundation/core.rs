use crate::foundation::error::{ImagoError, ImagoResult};

pub use glam::Mat4;
use glam::Vec3;

/// Width and height of an image, texture or surface, in pixels.
///
/// Both axes are greater than zero once a value has been constructed
/// through [`Dimensions::new`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> ImagoResult<Self> {
        if width == 0 || height == 0 {
            return Err(ImagoError::validation(format!(
                "dimensions must be positive, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    pub fn aspect_ratio(self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Byte length of an RGBA8 buffer covering these dimensions.
    pub fn byte_len(self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    /// Scales the dimensions down to fit inside `container` while
    /// preserving the aspect ratio. Returns `self` unchanged when it
    /// already fits in both axes. The scaled axis is clamped to 1 so an
    /// extreme ratio cannot truncate it to zero.
    pub fn fit_inside(self, container: Dimensions) -> Dimensions {
        if container.width >= self.width && container.height >= self.height {
            return self;
        }

        let aspect_ratio = self.aspect_ratio();
        let container_ratio = container.aspect_ratio();

        if container_ratio > aspect_ratio {
            Dimensions {
                width: ((self.width as f32 * container.height as f32 / self.height as f32) as u32)
                    .max(1),
                height: container.height,
            }
        } else {
            Dimensions {
                width: container.width,
                height: ((self.height as f32 * container.width as f32 / self.width as f32) as u32)
                    .max(1),
            }
        }
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A 3-axis scale matrix.
pub fn scale_matrix(x: f32, y: f32, z: f32) -> Mat4 {
    Mat4::from_scale(Vec3::new(x, y, z))
}

/// Transform that letterboxes an image of one aspect ratio into a
/// container of another: exactly one axis is scaled down to <= 1, the
/// other stays at 1. Equal ratios yield the identity scale.
pub fn aspect_fit_matrix(image_ratio: f32, container_ratio: f32) -> Mat4 {
    scale_matrix(
        if image_ratio > container_ratio {
            1.0
        } else {
            image_ratio / container_ratio
        },
        if image_ratio < container_ratio {
            1.0
        } else {
            container_ratio / image_ratio
        },
        1.0,
    )
}

/// Vertical flip, applied exactly once at the point scanlines first
/// enter the pipeline (source textures store them bottom-up).
pub fn invert_y_matrix() -> Mat4 {
    scale_matrix(1.0, -1.0, 1.0)
}

/// A decoded RGBA8 image: top-down scanlines, 4 bytes per pixel.
///
/// Used both for source images handed in by an
/// [`ImageProvider`](crate::ImageProvider) and for exported output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    pub dimensions: Dimensions,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(dimensions: Dimensions, data: Vec<u8>) -> ImagoResult<Self> {
        if data.len() != dimensions.byte_len() {
            return Err(ImagoError::validation(format!(
                "pixel buffer of {} bytes does not cover {dimensions} (expected {})",
                data.len(),
                dimensions.byte_len()
            )));
        }
        Ok(Self { dimensions, data })
    }

    /// Converts the buffer into an [`image::RgbaImage`], e.g. to encode
    /// an exported frame to disk.
    pub fn into_rgba_image(self) -> ImagoResult<image::RgbaImage> {
        let Dimensions { width, height } = self.dimensions;
        image::RgbaImage::from_raw(width, height, self.data)
            .ok_or_else(|| ImagoError::validation("pixel buffer does not match its dimensions"))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
