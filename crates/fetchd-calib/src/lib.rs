//! `fetchd-calib` – the calibration store.
//!
//! Loads the persisted stereo-calibration artifact (rotation, translation,
//! per-camera intrinsic matrices and distortion coefficients) produced by
//! the offline calibration procedure.  The load is fail-soft: any read or
//! parse error logs a warning and yields `None`, and callers fall back to an
//! identity pixel mapping.  Calibration is loaded once at startup and never
//! hot-reloaded.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// A 3×3 row-major matrix.
pub type Matrix3 = [[f32; 3]; 3];

/// The immutable calibration artifact relating the wide camera to the depth
/// camera.
///
/// Owned exclusively by the coordinate mapper after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationData {
    /// Rotation from the wide-camera frame to the depth-camera frame.
    pub r: Matrix3,
    /// Translation from the wide-camera frame to the depth-camera frame.
    pub t: [f32; 3],
    /// Intrinsic matrix of the wide-angle camera.
    pub wide_intrinsics: Matrix3,
    /// Intrinsic matrix of the depth camera.
    pub depth_intrinsics: Matrix3,
    /// Distortion coefficients of the wide-angle camera.
    pub wide_distortion: Vec<f32>,
    /// Distortion coefficients of the depth camera.
    pub depth_distortion: Vec<f32>,
}

impl CalibrationData {
    /// An identity calibration: unit intrinsics, no rotation, no offset.
    /// Pixel mapping through it is a no-op; used in tests and as a reference
    /// for the degraded mode.
    pub fn identity() -> Self {
        let eye = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        Self {
            r: eye,
            t: [0.0; 3],
            wide_intrinsics: eye,
            depth_intrinsics: eye,
            wide_distortion: vec![0.0; 5],
            depth_distortion: vec![0.0; 5],
        }
    }
}

/// Load the calibration artifact from `path`.
///
/// Returns `None` on any failure – a missing or corrupt artifact is a valid,
/// degraded state, not a fatal error. No retries.
pub fn load(path: impl AsRef<Path>) -> Option<CalibrationData> {
    let path = path.as_ref();
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "calibration artifact unreadable; falling back to identity pixel mapping");
            return None;
        }
    };
    match serde_json::from_str::<CalibrationData>(&raw) {
        Ok(data) => {
            info!(path = %path.display(), "calibration data loaded");
            Some(data)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "calibration artifact unparsable; falling back to identity pixel mapping");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_artifact(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("tmp file");
        file.write_all(contents.as_bytes()).expect("write");
        file
    }

    #[test]
    fn load_valid_artifact() {
        let data = CalibrationData::identity();
        let json = serde_json::to_string(&data).unwrap();
        let file = write_artifact(&json);

        let loaded = load(file.path()).expect("artifact should load");
        assert_eq!(loaded, data);
    }

    #[test]
    fn load_missing_file_is_none() {
        assert!(load("/nonexistent/camera_transformation.json").is_none());
    }

    #[test]
    fn load_corrupt_artifact_is_none() {
        let file = write_artifact("{ not json ");
        assert!(load(file.path()).is_none());
    }

    #[test]
    fn load_wrong_shape_is_none() {
        // Valid JSON, wrong schema.
        let file = write_artifact(r#"{"r": [1, 2, 3]}"#);
        assert!(load(file.path()).is_none());
    }

    #[test]
    fn identity_intrinsics_are_unit_diagonal() {
        let data = CalibrationData::identity();
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_eq!(data.wide_intrinsics[i][j], expected);
            }
        }
    }
}
