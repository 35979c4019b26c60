//! Pixel coordinates to body-frame positions.
//!
//! The wide camera sees the object; the depth camera measures how far away
//! it is.  [`SpatialMapper`] bridges the two: it projects the detection's
//! pixel into the depth camera's pixel space through the calibration
//! intrinsics, asks the vision service for the angular ray, samples a robust
//! depth, and combines ray and depth into a [`SpatialPosition`].
//!
//! With no calibration loaded the pixel mapping degrades to identity – the
//! two cameras are close enough that tracking keeps working, just less
//! accurately.  That fallback is an explicit mode, not an error.

use std::sync::Arc;

use fetchd_calib::CalibrationData;
use fetchd_hal::{CameraId, VisionService};
use fetchd_types::{Detection, SpatialPosition};
use tracing::{debug, warn};

use crate::depth::DepthSampler;

/// Fixed wide-camera resolution the detector must resample to.
pub const WIDE_IMAGE_WIDTH: f32 = 320.0;
pub const WIDE_IMAGE_HEIGHT: f32 = 240.0;

/// Resolves detections into body-frame positions.
///
/// Owns the calibration data for the process lifetime and borrows the
/// vision-service handle.
pub struct SpatialMapper {
    vision: Arc<dyn VisionService>,
    calibration: Option<CalibrationData>,
    sampler: DepthSampler,
}

impl SpatialMapper {
    /// `calibration` is `None` when the artifact failed to load; the mapper
    /// then runs in identity-fallback mode.
    pub fn new(
        vision: Arc<dyn VisionService>,
        calibration: Option<CalibrationData>,
        sampler: DepthSampler,
    ) -> Self {
        if calibration.is_none() {
            warn!("no calibration data; wide-to-depth pixel mapping degrades to identity");
        }
        Self {
            vision,
            calibration,
            sampler,
        }
    }

    /// `true` when running without calibration data.
    pub fn is_degraded(&self) -> bool {
        self.calibration.is_none()
    }

    /// Project a wide-camera pixel into depth-camera pixel space.
    ///
    /// Applies the wide-camera intrinsic matrix as a homogeneous transform
    /// and truncates to integer pixel indices. Without calibration the input
    /// is returned unchanged.
    pub fn map_pixel_to_depth(&self, x_wide: f32, y_wide: f32) -> (i32, i32) {
        let Some(calib) = &self.calibration else {
            return (x_wide as i32, y_wide as i32);
        };
        let m = &calib.wide_intrinsics;
        let tx = m[0][0] * x_wide + m[0][1] * y_wide + m[0][2];
        let ty = m[1][0] * x_wide + m[1][1] * y_wide + m[1][2];
        let tw = m[2][0] * x_wide + m[2][1] * y_wide + m[2][2];
        if tw.abs() < f32::EPSILON {
            warn!(x_wide, y_wide, "degenerate homogeneous coordinate; keeping raw pixel");
            return (x_wide as i32, y_wide as i32);
        }
        ((tx / tw) as i32, (ty / tw) as i32)
    }

    /// Angular ray `(yaw, pitch)` for a wide-camera pixel.
    ///
    /// Normalises by the fixed 320×240 resolution and delegates to the
    /// vision service. Malformed angular output (service fault, non-finite
    /// values) is logged and yields `None` – never a panic.
    pub fn pixel_to_angle(&self, camera: CameraId, x: f32, y: f32) -> Option<(f32, f32)> {
        let norm_x = x / WIDE_IMAGE_WIDTH;
        let norm_y = y / WIDE_IMAGE_HEIGHT;
        match self.vision.angular_position(camera, norm_x, norm_y) {
            Ok((yaw, pitch)) if yaw.is_finite() && pitch.is_finite() => Some((yaw, pitch)),
            Ok((yaw, pitch)) => {
                warn!(yaw, pitch, "non-finite angular position");
                None
            }
            Err(e) => {
                warn!(error = %e, "angular position lookup failed");
                None
            }
        }
    }

    /// Spherical-to-planar position from a ray and a depth reading.
    pub fn position_from_depth(&self, yaw: f32, pitch: f32, depth: f32) -> SpatialPosition {
        SpatialPosition::from_depth_and_angles(yaw, pitch, depth)
    }

    /// Resolve a detection into `(depth, position)`.
    ///
    /// `None` when any stage is absent: no angular ray, no depth frame, or
    /// no valid depth reading around the target pixel.
    pub fn resolve(&self, detection: &Detection) -> Option<(f32, SpatialPosition)> {
        let (yaw, pitch) =
            self.pixel_to_angle(CameraId::Wide, detection.x_center, detection.y_center)?;

        let (depth_x, depth_y) = self.map_pixel_to_depth(detection.x_center, detection.y_center);

        let vision = Arc::clone(&self.vision);
        let depth = self.sampler.sample(
            || match vision.depth_image() {
                Ok(image) => Some(image),
                Err(e) => {
                    warn!(error = %e, "depth image read failed");
                    None
                }
            },
            depth_x,
            depth_y,
        )?;

        let position = self.position_from_depth(yaw, pitch, depth);
        debug!(
            category = %detection.category,
            depth,
            x_forward = position.x_forward,
            y_lateral = position.y_lateral,
            theta = position.theta,
            "detection resolved"
        );
        Some((depth, position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetchd_hal::sim::SimVision;
    use fetchd_hal::{CameraFrame, DepthImage};
    use fetchd_types::FetchError;

    fn detection(x: f32, y: f32) -> Detection {
        Detection {
            x_center: x,
            y_center: y,
            category: "bottle".to_string(),
            timestamp: 0.0,
        }
    }

    fn mapper_with(calibration: Option<CalibrationData>) -> SpatialMapper {
        SpatialMapper::new(
            Arc::new(SimVision::new()),
            calibration,
            DepthSampler::default(),
        )
    }

    #[test]
    fn identity_fallback_keeps_pixel() {
        let mapper = mapper_with(None);
        assert!(mapper.is_degraded());
        assert_eq!(mapper.map_pixel_to_depth(160.7, 120.2), (160, 120));
    }

    #[test]
    fn identity_calibration_keeps_pixel() {
        let mapper = mapper_with(Some(CalibrationData::identity()));
        assert!(!mapper.is_degraded());
        assert_eq!(mapper.map_pixel_to_depth(160.0, 120.0), (160, 120));
    }

    #[test]
    fn scaling_intrinsics_transform_pixel() {
        let mut calib = CalibrationData::identity();
        calib.wide_intrinsics = [[2.0, 0.0, 10.0], [0.0, 2.0, 20.0], [0.0, 0.0, 1.0]];
        let mapper = mapper_with(Some(calib));
        assert_eq!(mapper.map_pixel_to_depth(100.0, 50.0), (210, 120));
    }

    #[test]
    fn pixel_to_angle_center_is_zero_ray() {
        let mapper = mapper_with(None);
        let (yaw, pitch) = mapper.pixel_to_angle(CameraId::Wide, 160.0, 120.0).unwrap();
        assert!(yaw.abs() < 1e-6);
        assert!(pitch.abs() < 1e-6);
    }

    #[test]
    fn resolve_centre_detection_with_constant_depth() {
        let mapper = mapper_with(None);
        let (depth, position) = mapper.resolve(&detection(160.0, 120.0)).unwrap();
        assert_eq!(depth, 1.2);
        // Zero ray: straight ahead.
        assert!((position.x_forward - 1.2).abs() < 1e-6);
        assert!(position.y_lateral.abs() < 1e-6);
        assert!((position.theta - position.y_lateral.atan2(position.x_forward)).abs() < 1e-6);
    }

    #[test]
    fn resolve_off_centre_theta_is_consistent() {
        let mapper = mapper_with(None);
        let (_, position) = mapper.resolve(&detection(80.0, 120.0)).unwrap();
        // Target left of centre: positive yaw, positive lateral offset.
        assert!(position.y_lateral > 0.0);
        assert!((position.theta - position.y_lateral.atan2(position.x_forward)).abs() < 1e-6);
    }

    #[test]
    fn resolve_without_depth_frame_is_none() {
        let vision = Arc::new(SimVision::new());
        vision.set_depth_image(None);
        let mapper = SpatialMapper::new(vision, None, DepthSampler::default());
        assert!(mapper.resolve(&detection(160.0, 120.0)).is_none());
    }

    #[test]
    fn resolve_with_all_dropout_depth_is_none() {
        let vision = Arc::new(SimVision::new());
        vision.set_depth_image(Some(DepthImage::constant(320, 240, 0)));
        let mapper = SpatialMapper::new(vision, None, DepthSampler::default());
        assert!(mapper.resolve(&detection(160.0, 120.0)).is_none());
    }

    struct NanVision;

    impl VisionService for NanVision {
        fn angular_position(
            &self,
            _camera: CameraId,
            _norm_x: f32,
            _norm_y: f32,
        ) -> Result<(f32, f32), FetchError> {
            Ok((f32::NAN, 0.0))
        }

        fn depth_image(&self) -> Result<DepthImage, FetchError> {
            Ok(DepthImage::constant(320, 240, 1200))
        }

        fn video_frame(&self) -> Result<CameraFrame, FetchError> {
            Ok(CameraFrame {
                width: 320,
                height: 240,
                data: Vec::new(),
            })
        }
    }

    #[test]
    fn malformed_angular_output_is_none_not_panic() {
        let mapper = SpatialMapper::new(Arc::new(NanVision), None, DepthSampler::default());
        assert!(mapper.resolve(&detection(160.0, 120.0)).is_none());
    }
}
