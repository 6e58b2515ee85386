//! Utility functions for the zone detection pipeline.
//!
//! This module provides image loading and cropping helpers, the optional
//! export of results to disk, and logging setup.

pub mod image;
#[cfg(feature = "visualization")]
pub mod visualization;

// Re-export image processing functions
pub use image::{crop_gray, crop_rgb, crop_with_margin, dynamic_to_rgb, load_image, rgb_to_gray};

/// Initializes the tracing subscriber for logging.
///
/// This function sets up the tracing subscriber with environment filter and formatting layer.
/// It's typically called at the start of an application to enable logging.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
