//! Enhancement filters: denoising, local contrast, gamma, sharpening.

use crate::core::param::{ParamMap, ParameterDefinition};
use crate::core::transform::{Category, FilterMetadata, Transform};
use crate::filters::builtin::utility::{clamp_coord, gray_to_rgb, par_rows};
use crate::filters::registry::FilterRegistry;
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};

/// Register enhancement filters.
pub fn register(registry: &mut FilterRegistry) {
    registry.register(NonLocalMeans::default());
    registry.register(Clahe::default());
    registry.register(GammaCorrection);
    registry.register(UnsharpMask);
}

/// Patch-similarity denoising.
///
/// Each pixel becomes a weighted mean of the pixels in its search window,
/// weighted by how similar their surrounding patches are.
#[derive(Debug, Clone, Copy)]
pub struct NonLocalMeans {
    /// Patch radius (patch side is `2r + 1`).
    pub patch_radius: i64,
    /// Search window radius.
    pub search_radius: i64,
}

impl Default for NonLocalMeans {
    fn default() -> Self {
        Self {
            patch_radius: 1,
            search_radius: 3,
        }
    }
}

impl NonLocalMeans {
    fn patch_distance(&self, src: &RgbImage, (ax, ay): (i64, i64), (bx, by): (i64, i64)) -> f32 {
        let (w, h) = src.dimensions();
        let r = self.patch_radius;
        let mut sum = 0f32;
        let mut count = 0u32;
        for dy in -r..=r {
            for dx in -r..=r {
                let a = src.get_pixel(clamp_coord(ax + dx, w), clamp_coord(ay + dy, h));
                let b = src.get_pixel(clamp_coord(bx + dx, w), clamp_coord(by + dy, h));
                for c in 0..3 {
                    let d = a[c] as f32 - b[c] as f32;
                    sum += d * d;
                }
                count += 3;
            }
        }
        sum / count as f32
    }
}

impl Transform for NonLocalMeans {
    fn metadata(&self) -> FilterMetadata {
        FilterMetadata::builder("Non-Local Means")
            .description("Denoise by averaging pixels with similar neighbourhoods")
            .category(Category::Noise)
            .parameter(
                ParameterDefinition::real("hStrength", 10.0)
                    .with_description("Filter strength; higher removes more noise and detail")
                    .with_range(0.1, 100.0),
            )
            .build()
    }

    fn apply(&self, image: &DynamicImage, params: &ParamMap) -> DynamicImage {
        let src = image.to_rgb8();
        let (w, h) = src.dimensions();
        let strength = params.real("hStrength", 10.0).max(0.1) as f32;
        let h2 = strength * strength;
        let s = self.search_radius;

        let out = par_rows(w, h, |y, row| {
            for x in 0..w {
                let center = (x as i64, y as i64);
                let mut sum = [0f32; 3];
                let mut norm = 0f32;
                for dy in -s..=s {
                    for dx in -s..=s {
                        let nx = clamp_coord(x as i64 + dx, w);
                        let ny = clamp_coord(y as i64 + dy, h);
                        let d2 = self.patch_distance(&src, center, (nx as i64, ny as i64));
                        let weight = (-d2 / h2).exp();
                        let p = src.get_pixel(nx, ny);
                        for c in 0..3 {
                            sum[c] += p[c] as f32 * weight;
                        }
                        norm += weight;
                    }
                }
                let base = x as usize * 3;
                for c in 0..3 {
                    row[base + c] = (sum[c] / norm).round().clamp(0.0, 255.0) as u8;
                }
            }
        });

        DynamicImage::ImageRgb8(out)
    }
}

/// Contrast-limited adaptive histogram equalisation.
#[derive(Debug, Clone, Copy)]
pub struct Clahe {
    /// Tiles per axis.
    pub grid: u32,
}

impl Default for Clahe {
    fn default() -> Self {
        Self { grid: 8 }
    }
}

impl Clahe {
    /// Equalise a gray image with the given clip limit.
    pub fn equalize(&self, gray: &GrayImage, clip_limit: f64) -> GrayImage {
        let (w, h) = gray.dimensions();
        if w == 0 || h == 0 {
            return gray.clone();
        }
        let tiles_x = self.grid.clamp(1, w) as usize;
        let tiles_y = self.grid.clamp(1, h) as usize;
        let tile_of = |v: u32, len: u32, tiles: usize| ((v as usize * tiles) / len as usize).min(tiles - 1);

        let mut histograms = vec![[0u32; 256]; tiles_x * tiles_y];
        let mut areas = vec![0u32; tiles_x * tiles_y];
        for (x, y, px) in gray.enumerate_pixels() {
            let t = tile_of(y, h, tiles_y) * tiles_x + tile_of(x, w, tiles_x);
            histograms[t][px[0] as usize] += 1;
            areas[t] += 1;
        }

        let luts: Vec<[u8; 256]> = histograms
            .iter()
            .zip(&areas)
            .map(|(hist, &area)| Self::tile_lut(hist, area, clip_limit))
            .collect();

        let tile_w = w as f32 / tiles_x as f32;
        let tile_h = h as f32 / tiles_y as f32;
        let neighbours = |pos: f32, size: f32, tiles: usize| {
            let f = (pos / size - 0.5).max(0.0);
            let lo = (f.floor() as usize).min(tiles - 1);
            let hi = (lo + 1).min(tiles - 1);
            (lo, hi, (f - lo as f32).clamp(0.0, 1.0))
        };

        GrayImage::from_fn(w, h, |x, y| {
            let v = gray.get_pixel(x, y)[0] as usize;
            let (x0, x1, ax) = neighbours(x as f32 + 0.5, tile_w, tiles_x);
            let (y0, y1, ay) = neighbours(y as f32 + 0.5, tile_h, tiles_y);
            let lut = |tx: usize, ty: usize| luts[ty * tiles_x + tx][v] as f32;
            let top = lut(x0, y0) * (1.0 - ax) + lut(x1, y0) * ax;
            let bottom = lut(x0, y1) * (1.0 - ax) + lut(x1, y1) * ax;
            Luma([(top * (1.0 - ay) + bottom * ay).round().clamp(0.0, 255.0) as u8])
        })
    }

    fn tile_lut(hist: &[u32; 256], area: u32, clip_limit: f64) -> [u8; 256] {
        let mut lut = [0u8; 256];
        if area == 0 {
            return lut;
        }
        let clip = ((clip_limit * area as f64 / 256.0) as u32).max(1);
        let mut clipped = *hist;
        let mut excess = 0u32;
        for bin in clipped.iter_mut() {
            if *bin > clip {
                excess += *bin - clip;
                *bin = clip;
            }
        }
        let share = excess / 256;
        let remainder = (excess % 256) as usize;
        for (i, bin) in clipped.iter_mut().enumerate() {
            *bin += share + u32::from(i < remainder);
        }

        let scale = 255.0 / area as f64;
        let mut cdf = 0u32;
        for (i, &count) in clipped.iter().enumerate() {
            cdf += count;
            lut[i] = (cdf as f64 * scale).round().min(255.0) as u8;
        }
        lut
    }
}

impl Transform for Clahe {
    fn metadata(&self) -> FilterMetadata {
        FilterMetadata::builder("CLAHE")
            .description("Equalise local contrast on an 8x8 tile grid (grayscale output)")
            .category(Category::Adjust)
            .parameter(
                ParameterDefinition::real("clipLimit", 2.0)
                    .with_description("Histogram clip limit; higher allows more contrast")
                    .with_range(0.1, 40.0),
            )
            .build()
    }

    fn apply(&self, image: &DynamicImage, params: &ParamMap) -> DynamicImage {
        let clip_limit = params.real("clipLimit", 2.0);
        gray_to_rgb(&self.equalize(&image.to_luma8(), clip_limit))
    }
}

/// Power-law tone curve.
#[derive(Debug, Clone, Copy)]
pub struct GammaCorrection;

impl GammaCorrection {
    /// Lookup table mapping `i` to `255 * (i / 255)^(1 / gamma)`.
    pub fn lut(gamma: f64) -> [u8; 256] {
        let mut lut = [0u8; 256];
        let exponent = 1.0 / gamma;
        for (i, entry) in lut.iter_mut().enumerate() {
            *entry = ((i as f64 / 255.0).powf(exponent) * 255.0).clamp(0.0, 255.0) as u8;
        }
        lut
    }
}

impl Transform for GammaCorrection {
    fn metadata(&self) -> FilterMetadata {
        FilterMetadata::builder("Gamma Correction")
            .description("Brighten (gamma > 1) or darken (gamma < 1) mid-tones")
            .category(Category::Adjust)
            .parameter(
                ParameterDefinition::real("gamma", 1.5)
                    .with_description("Gamma value")
                    .with_range(0.01, 10.0),
            )
            .build()
    }

    fn apply(&self, image: &DynamicImage, params: &ParamMap) -> DynamicImage {
        let lut = Self::lut(params.real("gamma", 1.5).max(0.01));
        let mut rgb = image.to_rgb8();
        for px in rgb.pixels_mut() {
            for c in px.0.iter_mut() {
                *c = lut[*c as usize];
            }
        }
        DynamicImage::ImageRgb8(rgb)
    }
}

/// Sharpen by subtracting a blurred copy.
#[derive(Debug, Clone, Copy)]
pub struct UnsharpMask;

impl Transform for UnsharpMask {
    fn metadata(&self) -> FilterMetadata {
        FilterMetadata::builder("Unsharp Mask")
            .description("Sharpen as image * (1 + strength) - blur * strength")
            .category(Category::Sharpen)
            .parameter(
                ParameterDefinition::real("sigma", 3.0)
                    .with_description("Blur radius of the mask")
                    .with_range(0.1, 50.0),
            )
            .parameter(
                ParameterDefinition::real("strength", 1.5)
                    .with_description("How much of the detail layer to add back")
                    .with_range(0.0, 10.0),
            )
            .build()
    }

    fn apply(&self, image: &DynamicImage, params: &ParamMap) -> DynamicImage {
        let sigma = params.real("sigma", 3.0).max(0.1) as f32;
        let strength = params.real("strength", 1.5) as f32;
        let src = image.to_rgb8();
        let blurred = imageproc::filter::gaussian_blur_f32(&src, sigma);

        let out = RgbImage::from_fn(src.width(), src.height(), |x, y| {
            let s = src.get_pixel(x, y);
            let b = blurred.get_pixel(x, y);
            let mix = |c: usize| {
                (s[c] as f32 * (1.0 + strength) - b[c] as f32 * strength)
                    .round()
                    .clamp(0.0, 255.0) as u8
            };
            Rgb([mix(0), mix(1), mix(2)])
        });
        DynamicImage::ImageRgb8(out)
    }
}
