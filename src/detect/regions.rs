//! Binary tissue masks and connected-region extraction.
//!
//! Regions are 4-connected components of tissue pixels. Each component is
//! reported as its bounding rectangle in mask pixels, with exclusive max
//! edges: a component covering columns 100..=899 spans `x` 100 to 900.

use image::{GrayImage, Luma};

use crate::geometry::BoundingBox;

/// Row-major tissue/background mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    width: u32,
    height: u32,
    data: Vec<bool>,
}

impl BinaryMask {
    /// All-background mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![false; width as usize * height as usize],
        }
    }

    /// Build a mask by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Whether `(x, y)` is tissue. Out-of-range coordinates are background.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.data[self.offset(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, tissue: bool) {
        if x < self.width && y < self.height {
            let i = self.offset(x, y);
            self.data[i] = tissue;
        }
    }

    /// Number of tissue pixels.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&t| t).count()
    }

    /// Render as a greyscale image: tissue black, background white.
    pub fn to_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            if self.get(x, y) {
                Luma([0])
            } else {
                Luma([255])
            }
        })
    }
}

/// Size filter applied to connected components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionFilter {
    /// Components whose bounding-box area is at most this are discarded.
    pub min_area: u64,
    /// Components narrower or shorter than this are discarded.
    pub min_dimension: Option<u32>,
}

impl RegionFilter {
    fn accepts(&self, width: u32, height: u32) -> bool {
        let area = width as u64 * height as u64;
        if area <= self.min_area {
            return false;
        }
        match self.min_dimension {
            Some(min) => width >= min && height >= min,
            None => true,
        }
    }
}

/// Find 4-connected tissue components and return the bounding boxes of
/// those passing `filter`, in scan order of their first pixel.
pub fn find_regions(mask: &BinaryMask, filter: &RegionFilter) -> Vec<BoundingBox> {
    let (w, h) = (mask.width, mask.height);
    let mut visited = vec![false; mask.data.len()];
    let mut worklist: Vec<(u32, u32)> = Vec::new();
    let mut regions = Vec::new();

    for y in 0..h {
        for x in 0..w {
            let start = mask.offset(x, y);
            if visited[start] || !mask.data[start] {
                continue;
            }

            let (mut min_x, mut max_x, mut min_y, mut max_y) = (x, x, y, y);
            visited[start] = true;
            worklist.push((x, y));

            while let Some((px, py)) = worklist.pop() {
                min_x = min_x.min(px);
                max_x = max_x.max(px);
                min_y = min_y.min(py);
                max_y = max_y.max(py);

                let neighbors = [
                    (px.checked_add(1), Some(py)),
                    (px.checked_sub(1), Some(py)),
                    (Some(px), py.checked_add(1)),
                    (Some(px), py.checked_sub(1)),
                ];
                for (nx, ny) in neighbors {
                    let (Some(nx), Some(ny)) = (nx, ny) else {
                        continue;
                    };
                    if nx >= w || ny >= h {
                        continue;
                    }
                    let i = mask.offset(nx, ny);
                    if !visited[i] && mask.data[i] {
                        visited[i] = true;
                        worklist.push((nx, ny));
                    }
                }
            }

            let width = max_x - min_x + 1;
            let height = max_y - min_y + 1;
            if filter.accepts(width, height) {
                regions.push(BoundingBox::from_origin_size(
                    min_x as f64,
                    min_y as f64,
                    width as f64,
                    height as f64,
                ));
            }
        }
    }

    regions
}

/// Union of region boxes, or the 1×1 box at the origin when there are none.
pub fn union_bounds(regions: &[BoundingBox]) -> BoundingBox {
    regions
        .iter()
        .copied()
        .reduce(|acc, r| acc.union(&r))
        .unwrap_or_else(|| BoundingBox::new(0.0, 0.0, 1.0, 1.0))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn no_filter() -> RegionFilter {
        RegionFilter {
            min_area: 0,
            min_dimension: None,
        }
    }

    fn rect_mask(w: u32, h: u32, rects: &[(u32, u32, u32, u32)]) -> BinaryMask {
        BinaryMask::from_fn(w, h, |x, y| {
            rects
                .iter()
                .any(|&(x0, y0, x1, y1)| x >= x0 && x < x1 && y >= y0 && y < y1)
        })
    }

    #[test]
    fn test_single_blob_bounds() {
        let mask = rect_mask(50, 40, &[(10, 5, 20, 25)]);
        let regions = find_regions(&mask, &no_filter());
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0], BoundingBox::new(10.0, 5.0, 20.0, 25.0));
    }

    #[test]
    fn test_diagonal_pixels_are_separate() {
        let mut mask = BinaryMask::new(4, 4);
        mask.set(0, 0, true);
        mask.set(1, 1, true);
        let regions = find_regions(&mask, &no_filter());
        assert_eq!(regions.len(), 2);
    }

    #[test]
    fn test_u_shape_is_one_region() {
        let mask = rect_mask(30, 30, &[(0, 0, 5, 30), (25, 0, 30, 30), (0, 25, 30, 30)]);
        let regions = find_regions(&mask, &no_filter());
        assert_eq!(regions, vec![BoundingBox::new(0.0, 0.0, 30.0, 30.0)]);
    }

    #[test]
    fn test_area_filter_is_strict() {
        // 10x10 = 100 pixels of bounding area
        let mask = rect_mask(40, 40, &[(0, 0, 10, 10), (20, 20, 40, 40)]);
        let filter = RegionFilter {
            min_area: 100,
            min_dimension: None,
        };
        let regions = find_regions(&mask, &filter);
        assert_eq!(regions, vec![BoundingBox::new(20.0, 20.0, 40.0, 40.0)]);
    }

    #[test]
    fn test_min_dimension_filter() {
        // Long thin scratch
        let mask = rect_mask(300, 50, &[(0, 10, 300, 12), (0, 20, 40, 50)]);
        let filter = RegionFilter {
            min_area: 0,
            min_dimension: Some(5),
        };
        let regions = find_regions(&mask, &filter);
        assert_eq!(regions, vec![BoundingBox::new(0.0, 20.0, 40.0, 50.0)]);
    }

    #[test]
    fn test_large_component_does_not_recurse() {
        let mask = BinaryMask::from_fn(2000, 2000, |_, _| true);
        let regions = find_regions(&mask, &no_filter());
        assert_eq!(regions, vec![BoundingBox::new(0.0, 0.0, 2000.0, 2000.0)]);
    }

    #[test]
    fn test_union_bounds() {
        let regions = [
            BoundingBox::new(10.0, 10.0, 20.0, 20.0),
            BoundingBox::new(50.0, 5.0, 60.0, 15.0),
        ];
        assert_eq!(union_bounds(&regions), BoundingBox::new(10.0, 5.0, 60.0, 20.0));
        assert_eq!(union_bounds(&[]), BoundingBox::new(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn test_mask_image_colors() {
        let mut mask = BinaryMask::new(2, 1);
        mask.set(0, 0, true);
        let img = mask.to_image();
        assert_eq!(img.get_pixel(0, 0).0, [0]);
        assert_eq!(img.get_pixel(1, 0).0, [255]);
        assert_eq!(mask.count(), 1);
    }
}
