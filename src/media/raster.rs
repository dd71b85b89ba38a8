#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    Rgb8,
    Rgba8,
}

impl PixelLayout {
    pub fn channels(&self) -> usize {
        match self {
            PixelLayout::Rgb8 => 3,
            PixelLayout::Rgba8 => 4,
        }
    }
}

/// A single uncompressed frame as handed over by a camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    pub pixels: Vec<u8>,
}

impl Raster {
    pub fn new(width: u32, height: u32, layout: PixelLayout, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            layout,
            pixels,
        }
    }

    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * 3);
        for _ in 0..count {
            pixels.extend_from_slice(&rgb);
        }
        Self::new(width, height, PixelLayout::Rgb8, pixels)
    }

    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.layout.channels()
    }
}
