//! `fetchd-perception` – from pixels to body-frame positions.
//!
//! Turns a detection's pixel coordinates plus a noisy depth stream into a
//! single [`SpatialPosition`][fetchd_types::SpatialPosition] estimate.
//!
//! # Modules
//!
//! - [`depth`] – [`DepthSampler`][depth::DepthSampler]: windowed median depth
//!   with millimetre-to-metre conversion and interquartile-range outlier
//!   rejection across repeated reads.
//! - [`spatial`] – [`SpatialMapper`][spatial::SpatialMapper]: wide-to-depth
//!   pixel mapping through the calibration intrinsics, pixel-to-angle
//!   delegation, and the spherical-to-planar position approximation.

pub mod depth;
pub mod spatial;

pub use depth::DepthSampler;
pub use spatial::SpatialMapper;
