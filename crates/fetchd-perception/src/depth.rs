//! Robust scalar depth estimation around a target pixel.
//!
//! The depth sensor flickers: single frames drop out (zero readings) or spike.
//! The sampler absorbs both without discarding a detection outright:
//!
//! 1. Per read, take the median of a small pixel window, excluding zeros.
//! 2. Across repeated reads, reject outliers by interquartile range.
//! 3. Return the median of the survivors.

use fetchd_hal::DepthImage;
use tracing::warn;

/// Windowed-median depth sampler with IQR outlier rejection.
#[derive(Debug, Clone, Copy)]
pub struct DepthSampler {
    /// Side length of the square pixel window (default 3).
    pub region: u32,
    /// Number of repeated depth-image reads per request (default 1).
    pub repeats: usize,
    /// IQR multiplier for the outlier bounds (default 1.0).
    pub iqr_k: f32,
}

impl Default for DepthSampler {
    fn default() -> Self {
        Self {
            region: 3,
            repeats: 1,
            iqr_k: 1.0,
        }
    }
}

impl DepthSampler {
    /// Median of the `region × region` window centred at `(x, y)`, clamped
    /// to image bounds, in metres. Zero readings (sensor dropout) are
    /// excluded; a window with no valid reading yields `None`.
    pub fn window_median(&self, image: &DepthImage, x: i32, y: i32) -> Option<f32> {
        let half = (self.region / 2) as i32;
        let x_start = (x - half).max(0);
        let x_end = ((x + half + 1).min(image.width as i32)).max(0);
        let y_start = (y - half).max(0);
        let y_end = ((y + half + 1).min(image.height as i32)).max(0);

        let mut readings: Vec<u16> = Vec::with_capacity((self.region * self.region) as usize);
        for py in y_start..y_end {
            for px in x_start..x_end {
                if let Some(raw) = image.at(px as u32, py as u32) {
                    if raw > 0 {
                        readings.push(raw);
                    }
                }
            }
        }

        if readings.is_empty() {
            warn!(x, y, "no valid depth readings in window");
            return None;
        }

        readings.sort_unstable();
        let mid = readings.len() / 2;
        let median_mm = if readings.len() % 2 == 1 {
            readings[mid] as f32
        } else {
            (readings[mid - 1] as f32 + readings[mid] as f32) / 2.0
        };
        Some(median_mm / 1000.0)
    }

    /// Robust depth estimate at `(x, y)` in metres.
    ///
    /// `fetch` is called once per repeat and yields a fresh depth frame (or
    /// `None` when the sensor read fails). Returns `None` when no repeat
    /// produced a valid window median.
    pub fn sample<F>(&self, mut fetch: F, x: i32, y: i32) -> Option<f32>
    where
        F: FnMut() -> Option<DepthImage>,
    {
        let repeats = self.repeats.max(1);
        let mut samples: Vec<f32> = Vec::with_capacity(repeats);
        for _ in 0..repeats {
            if let Some(image) = fetch() {
                if let Some(depth) = self.window_median(&image, x, y) {
                    samples.push(depth);
                }
            }
        }

        if samples.is_empty() {
            return None;
        }

        let filtered = iqr_filter(&samples, self.iqr_k);
        let required = (repeats / 2).max(2);
        if filtered.len() < required {
            warn!(
                surviving = filtered.len(),
                required, "depth estimate has degraded confidence"
            );
        }
        median(&filtered)
    }
}

/// Keep only the samples inside `[Q1 − k·IQR, Q3 + k·IQR]`.
///
/// Sets of fewer than 4 samples bypass filtering entirely – the quartiles
/// are meaningless that small.
fn iqr_filter(samples: &[f32], k: f32) -> Vec<f32> {
    if samples.len() < 4 {
        return samples.to_vec();
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(f32::total_cmp);
    let q1 = percentile(&sorted, 0.25);
    let q3 = percentile(&sorted, 0.75);
    let iqr = q3 - q1;
    let lower = q1 - k * iqr;
    let upper = q3 + k * iqr;
    samples
        .iter()
        .copied()
        .filter(|&s| s >= lower && s <= upper)
        .collect()
}

/// Linear-interpolated percentile of pre-sorted data, `p` in `[0, 1]`.
fn percentile(sorted: &[f32], p: f32) -> f32 {
    let idx = p * (sorted.len() - 1) as f32;
    let lo = idx.floor() as usize;
    let hi = idx.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = idx - lo as f32;
        sorted[lo] + frac * (sorted[hi] - sorted[lo])
    }
}

fn median(samples: &[f32]) -> Option<f32> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(f32::total_cmp);
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_from(width: u32, height: u32, data: Vec<u16>) -> DepthImage {
        assert_eq!(data.len(), (width * height) as usize);
        DepthImage {
            width,
            height,
            data,
        }
    }

    #[test]
    fn constant_window_returns_exact_median() {
        let sampler = DepthSampler::default();
        let image = DepthImage::constant(320, 240, 1200);
        let depth = sampler.window_median(&image, 160, 120).unwrap();
        assert_eq!(depth, 1.2);
    }

    #[test]
    fn zero_readings_are_excluded() {
        let sampler = DepthSampler::default();
        // 3×3 image: one valid reading among dropouts.
        let image = image_from(3, 3, vec![0, 0, 0, 0, 800, 0, 0, 0, 0]);
        let depth = sampler.window_median(&image, 1, 1).unwrap();
        assert_eq!(depth, 0.8);
    }

    #[test]
    fn all_zero_window_is_none() {
        let sampler = DepthSampler::default();
        let image = DepthImage::constant(10, 10, 0);
        assert!(sampler.window_median(&image, 5, 5).is_none());
    }

    #[test]
    fn window_clamps_to_image_edge() {
        let sampler = DepthSampler::default();
        let image = DepthImage::constant(10, 10, 1500);
        // Corner pixel: only the in-bounds 2×2 portion of the window exists.
        let depth = sampler.window_median(&image, 0, 0).unwrap();
        assert_eq!(depth, 1.5);
    }

    #[test]
    fn even_window_median_averages_middles() {
        let sampler = DepthSampler::default();
        // 2×2 image, all in one window: sorted [1000, 1000, 2000, 2000].
        let image = image_from(2, 2, vec![1000, 2000, 2000, 1000]);
        let depth = sampler.window_median(&image, 0, 0).unwrap();
        assert_eq!(depth, 1.5);
    }

    #[test]
    fn sample_single_repeat_matches_window_median() {
        let sampler = DepthSampler::default();
        let depth = sampler
            .sample(|| Some(DepthImage::constant(320, 240, 1200)), 160, 120)
            .unwrap();
        assert_eq!(depth, 1.2);
    }

    #[test]
    fn sample_all_dropout_is_none() {
        let sampler = DepthSampler::default();
        assert!(
            sampler
                .sample(|| Some(DepthImage::constant(320, 240, 0)), 160, 120)
                .is_none()
        );
    }

    #[test]
    fn sample_fetch_failure_is_none() {
        let sampler = DepthSampler {
            repeats: 3,
            ..Default::default()
        };
        assert!(sampler.sample(|| None, 160, 120).is_none());
    }

    #[test]
    fn iqr_filter_is_noop_below_four_samples() {
        let samples = vec![1.0, 1.1, 99.0];
        assert_eq!(iqr_filter(&samples, 1.0), samples);
    }

    #[test]
    fn iqr_filter_rejects_spike() {
        // Five consistent readings plus one sensor spike.
        let samples = vec![1.20, 1.21, 1.19, 1.20, 1.22, 4.00];
        let filtered = iqr_filter(&samples, 1.0);
        assert!(!filtered.contains(&4.00));
        assert_eq!(filtered.len(), 5);
    }

    #[test]
    fn sample_with_repeats_rejects_flicker_frame() {
        let sampler = DepthSampler {
            repeats: 5,
            ..Default::default()
        };
        let frames = [1200u16, 1210, 1190, 1200, 4000];
        let mut i = 0;
        let depth = sampler
            .sample(
                || {
                    let frame = DepthImage::constant(320, 240, frames[i]);
                    i += 1;
                    Some(frame)
                },
                160,
                120,
            )
            .unwrap();
        // The 4.0 m spike is filtered; median of the rest is 1.2.
        assert_eq!(depth, 1.2);
    }

    #[test]
    fn percentile_interpolates_linearly() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&sorted, 0.25), 1.75);
        assert_eq!(percentile(&sorted, 0.75), 3.25);
        assert_eq!(percentile(&sorted, 0.0), 1.0);
        assert_eq!(percentile(&sorted, 1.0), 4.0);
    }
}
