use image::RgbImage;

/// Gray the reference image is composited onto where the mask is clear.
pub const MASK_BACKGROUND: f32 = 0.5;

/// Host image tensor: `height x width x channels` floats in `[0, 1]`, row 0
/// at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatImage {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    pub data: Vec<f32>,
}

impl FloatImage {
    pub fn new(width: u32, height: u32, channels: u32, data: Vec<f32>) -> Result<Self, String> {
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(format!(
                "image {width}x{height}x{channels} needs {expected} values, got {}",
                data.len()
            ));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    pub fn filled(width: u32, height: u32, channels: u32, value: f32) -> Self {
        let len = width as usize * height as usize * channels as usize;
        Self {
            width,
            height,
            channels,
            data: vec![value; len],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> &[f32] {
        let stride = self.channels as usize;
        let start = (y as usize * self.width as usize + x as usize) * stride;
        &self.data[start..start + stride]
    }

    pub fn from_rgb8(image: &RgbImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            channels: 3,
            data: image
                .as_raw()
                .iter()
                .map(|&value| value as f32 / 255.0)
                .collect(),
        }
    }

    /// Quantizes the first three channels to 8 bits.
    pub fn to_rgb8(&self) -> Result<RgbImage, String> {
        if self.channels < 3 {
            return Err(format!(
                "expected an RGB image, got {} channel(s)",
                self.channels
            ));
        }
        Ok(RgbImage::from_fn(self.width, self.height, |x, y| {
            let pixel = self.pixel(x, y);
            image::Rgb([quantize(pixel[0]), quantize(pixel[1]), quantize(pixel[2])])
        }))
    }
}

/// `[0, 1]` float to 8 bits, truncating like a float-to-byte cast.
pub fn quantize(value: f32) -> u8 {
    (value * 255.0).clamp(0.0, 255.0) as u8
}

/// Composites the reference image over [`MASK_BACKGROUND`] using `mask` as
/// alpha: `out = fg * mask + bg * (1 - mask)`.
///
/// Both inputs are quantized to 8 bits first, as the model input is.
pub fn composite_on_background(image: &FloatImage, mask: &FloatImage) -> Result<RgbImage, String> {
    if image.channels < 3 {
        return Err(format!(
            "reference image needs 3 channels, got {}",
            image.channels
        ));
    }
    if mask.channels != 1 {
        return Err(format!(
            "reference mask needs 1 channel, got {}",
            mask.channels
        ));
    }
    if mask.width != image.width || mask.height != image.height {
        return Err(format!(
            "reference mask is {}x{} but reference image is {}x{}",
            mask.width, mask.height, image.width, image.height
        ));
    }

    Ok(RgbImage::from_fn(image.width, image.height, |x, y| {
        let alpha = quantize(mask.pixel(x, y)[0]) as f32 / 255.0;
        let rgb = image.pixel(x, y);
        let mut out = [0u8; 3];
        for (slot, &value) in out.iter_mut().zip(rgb) {
            let fg = quantize(value) as f32 / 255.0;
            *slot = quantize(fg * alpha + (1.0 - alpha) * MASK_BACKGROUND);
        }
        image::Rgb(out)
    }))
}
