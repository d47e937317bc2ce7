use image::imageops::FilterType;
use image::DynamicImage;

/// Network input: a `1x3xSxS` planar tensor with values scaled to `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct InputBlob {
    pub size: u32,
    pub data: Vec<f32>,
}

impl InputBlob {
    pub fn shape(&self) -> [usize; 4] {
        let side = self.size as usize;
        [1, 3, side, side]
    }
}

/// Stretch `image` to `size x size` (no letterboxing) and lay it out channel-first.
pub fn to_blob(image: &DynamicImage, size: u32, swap_rb: bool) -> InputBlob {
    let resized = image.resize_exact(size, size, FilterType::Triangle).to_rgb8();
    let plane = (size as usize) * (size as usize);
    let mut data = vec![0f32; plane * 3];

    for (idx, pixel) in resized.pixels().enumerate() {
        let [r, g, b] = pixel.0;
        let (first, third) = if swap_rb { (b, r) } else { (r, b) };
        data[idx] = f32::from(first) / 255.0;
        data[plane + idx] = f32::from(g) / 255.0;
        data[2 * plane + idx] = f32::from(third) / 255.0;
    }

    InputBlob { size, data }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn solid(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
    }

    #[test]
    fn blob_is_planar_and_normalized() {
        let blob = to_blob(&solid(64, 48, [255, 0, 51]), 32, false);
        assert_eq!(blob.shape(), [1, 3, 32, 32]);
        assert_eq!(blob.data.len(), 3 * 32 * 32);

        let plane = 32 * 32;
        assert!((blob.data[0] - 1.0).abs() < 1e-6);
        assert!(blob.data[plane].abs() < 1e-6);
        assert!((blob.data[2 * plane] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn swap_rb_reorders_channels() {
        let blob = to_blob(&solid(8, 8, [255, 0, 0]), 32, true);
        let plane = 32 * 32;
        assert!(blob.data[0].abs() < 1e-6);
        assert!((blob.data[2 * plane] - 1.0).abs() < 1e-6);
    }
}
