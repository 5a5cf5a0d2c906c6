//! group-trip-planner core
//!
//! Per-passenger fare estimates and one optimized shared route for a group
//! of passengers travelling to or from a common workplace.

pub mod model;
pub mod error;
pub mod traits;
pub mod address;
pub mod fare;
pub mod estimator;
pub mod planner;
pub mod osrm;
pub mod haversine;
pub mod draft;
