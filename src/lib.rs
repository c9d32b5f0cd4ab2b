//! Portal network planner library
//!
//! Classifies a map image into land and water, then places portals with a
//! k-means variant whose centers always sit on land.

pub mod clustering;
pub mod error;
pub mod export;
pub mod params;
pub mod portal;
pub mod render;
pub mod seeds;
pub mod session;
pub mod source;
pub mod spatial;
pub mod terrain;
pub mod tilemap;

pub use clustering::{constrained_kmeans, ClusterOutcome};
pub use error::{PlannerError, Result};
pub use params::PlannerParams;
pub use portal::{normalize, NormalizedCoord, Portal};
pub use session::{Phase, Placement, PlannerSession, RunHandle, RunTicket};
pub use source::MapSource;
pub use terrain::{scan_terrain, LandPoint, TerrainScan};
