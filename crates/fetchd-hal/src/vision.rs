//! `VisionService` trait and the image types it returns.

use fetchd_types::FetchError;

/// Identifies one of the robot's two independently calibrated cameras.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraId {
    /// The wide-angle RGB camera the detector runs on (320×240 contract).
    Wide,
    /// The depth sensor.
    Depth,
}

/// A raw video frame from the wide camera.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Raw pixel data (RGB24).
    pub data: Vec<u8>,
}

/// One depth frame. Readings are millimetre integers; zero means sensor
/// dropout and must be excluded from any estimate.
#[derive(Debug, Clone)]
pub struct DepthImage {
    pub width: u32,
    pub height: u32,
    /// Row-major, `width * height` readings.
    pub data: Vec<u16>,
}

impl DepthImage {
    /// Build an image of constant depth, mostly useful in tests.
    pub fn constant(width: u32, height: u32, value_mm: u16) -> Self {
        Self {
            width,
            height,
            data: vec![value_mm; (width * height) as usize],
        }
    }

    /// Bounds-checked read of the reading at pixel `(x, y)`.
    pub fn at(&self, x: u32, y: u32) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get((y * self.width + x) as usize).copied()
    }
}

/// The robot's vision service.
///
/// Implementations must be safe for concurrent read access: the streaming
/// activity and the tracking loop both hold a handle.
pub trait VisionService: Send + Sync {
    /// Convert a normalized image position (both axes in `[0, 1]`) into an
    /// angular ray `(yaw, pitch)` in radians from the named camera's optical
    /// center.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::HardwareFault`] if the service call fails.
    fn angular_position(
        &self,
        camera: CameraId,
        norm_x: f32,
        norm_y: f32,
    ) -> Result<(f32, f32), FetchError>;

    /// Capture the next depth frame.
    fn depth_image(&self) -> Result<DepthImage, FetchError>;

    /// Capture the next wide-camera video frame.
    fn video_frame(&self) -> Result<CameraFrame, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_image_at_in_bounds() {
        let img = DepthImage::constant(4, 3, 1200);
        assert_eq!(img.at(0, 0), Some(1200));
        assert_eq!(img.at(3, 2), Some(1200));
    }

    #[test]
    fn depth_image_at_out_of_bounds_is_none() {
        let img = DepthImage::constant(4, 3, 1200);
        assert_eq!(img.at(4, 0), None);
        assert_eq!(img.at(0, 3), None);
    }

    #[test]
    fn depth_image_row_major_layout() {
        let mut img = DepthImage::constant(3, 2, 0);
        img.data[1 * 3 + 2] = 777; // (x=2, y=1)
        assert_eq!(img.at(2, 1), Some(777));
        assert_eq!(img.at(1, 2), None);
    }
}
