use image::{DynamicImage, GenericImageView, GrayImage, RgbImage, RgbaImage};

/// Read-only 2D grid of color samples.
///
/// Detection only needs dimensions and per-pixel RGB, so any pixel source
/// can be analyzed without conversion. Implementations for the common
/// `image` buffer types are provided.
pub trait Raster {
    /// Width in pixels.
    fn width(&self) -> u32;

    /// Height in pixels.
    fn height(&self) -> u32;

    /// RGB sample at `(x, y)`.
    ///
    /// Callers guarantee `x < width()` and `y < height()`.
    fn rgb(&self, x: u32, y: u32) -> [u8; 3];

    /// Whether the raster holds no pixels.
    fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

impl Raster for RgbImage {
    fn width(&self) -> u32 {
        self.dimensions().0
    }

    fn height(&self) -> u32 {
        self.dimensions().1
    }

    #[inline]
    fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
        self.get_pixel(x, y).0
    }
}

impl Raster for RgbaImage {
    fn width(&self) -> u32 {
        self.dimensions().0
    }

    fn height(&self) -> u32 {
        self.dimensions().1
    }

    #[inline]
    fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
        let [r, g, b, _] = self.get_pixel(x, y).0;
        [r, g, b]
    }
}

impl Raster for GrayImage {
    fn width(&self) -> u32 {
        self.dimensions().0
    }

    fn height(&self) -> u32 {
        self.dimensions().1
    }

    #[inline]
    fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
        let [l] = self.get_pixel(x, y).0;
        [l, l, l]
    }
}

impl Raster for DynamicImage {
    fn width(&self) -> u32 {
        GenericImageView::width(self)
    }

    fn height(&self) -> u32 {
        GenericImageView::height(self)
    }

    fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
        let [r, g, b, _] = GenericImageView::get_pixel(self, x, y).0;
        [r, g, b]
    }
}

/// Weighted luminance `0.299 R + 0.587 G + 0.114 B`, truncated.
#[inline]
pub fn luminance([r, g, b]: [u8; 3]) -> u8 {
    (0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64) as u8
}

/// Per-pixel luminance in row-major order.
pub fn luminance_plane<R: Raster + ?Sized>(raster: &R) -> Vec<u8> {
    let (w, h) = (raster.width(), raster.height());
    let mut out = Vec::with_capacity(w as usize * h as usize);
    for y in 0..h {
        for x in 0..w {
            out.push(luminance(raster.rgb(x, y)));
        }
    }
    out
}

/// 256-bin histogram of luminance values.
pub fn histogram(luma: &[u8]) -> [u64; 256] {
    let mut bins = [0u64; 256];
    for &v in luma {
        bins[v as usize] += 1;
    }
    bins
}
