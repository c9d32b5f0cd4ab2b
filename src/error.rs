//! Error types for portal planning.
//!
//! Every failure is local to one invocation; the session never keeps
//! partial portal state after an error.

use thiserror::Error;

/// Errors that can occur while loading a map or placing portals.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// The map image could not be read or decoded.
    #[error("Failed to load map image: {0}")]
    ImageLoad(String),

    /// The working image has no readable pixel data.
    #[error("Cannot read map pixels: {0}")]
    PixelAccess(String),

    /// Classification produced no land points, so there is nothing to cluster.
    #[error("No land found")]
    EmptyLandSet,

    /// A portal count below one was requested.
    #[error("Invalid portal count {0}: at least one portal is required")]
    InvalidPortalCount(usize),

    /// Writing an overlay, mask, or report failed.
    #[error("Export error: {0}")]
    Export(String),

    /// Planner parameters were unreadable or out of range.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<image::ImageError> for PlannerError {
    fn from(e: image::ImageError) -> Self {
        PlannerError::ImageLoad(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PlannerError>;
