//! Collaborator interfaces consumed by the planner.
//!
//! Implement them over a real mapping service, a stub for tests, or a
//! storage backend. The planner never reaches past these traits.

use crate::error::RouteUnavailable;
use crate::model::{Address, TripPlan};

/// Raw provider measurement for one leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawLeg {
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

impl RawLeg {
    pub fn new(distance_meters: f64, duration_seconds: f64) -> Self {
        Self {
            distance_meters,
            duration_seconds,
        }
    }
}

/// Multi-stop route as returned by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointRoute {
    /// One leg per consecutive pair of visited points.
    pub legs: Vec<RawLeg>,
    /// Optimized permutation of the `stops` passed in (indices into it).
    pub visit_order: Vec<usize>,
}

/// Computes distances and durations between addresses.
///
/// Implementations must be reentrant: the planner calls `route` from several
/// threads at once. Retries and rate limiting belong in the implementation.
pub trait RoutingProvider: Sync {
    fn route(&self, origin: &Address, destination: &Address) -> Result<RawLeg, RouteUnavailable>;

    /// Route from `origin` through every stop to `destination`.
    ///
    /// Origin and destination are fixed; the provider picks the visiting
    /// order of `stops`.
    fn route_with_waypoints(
        &self,
        origin: &Address,
        destination: &Address,
        stops: &[Address],
    ) -> Result<WaypointRoute, RouteUnavailable>;
}

impl<P: RoutingProvider + ?Sized> RoutingProvider for &P {
    fn route(&self, origin: &Address, destination: &Address) -> Result<RawLeg, RouteUnavailable> {
        (**self).route(origin, destination)
    }

    fn route_with_waypoints(
        &self,
        origin: &Address,
        destination: &Address,
        stops: &[Address],
    ) -> Result<WaypointRoute, RouteUnavailable> {
        (**self).route_with_waypoints(origin, destination, stops)
    }
}

/// Persists in-progress group plans between operator sessions.
pub trait DraftStore {
    type Error: std::error::Error;

    fn save(&self, draft_id: &str, plan: &TripPlan) -> Result<(), Self::Error>;

    fn load(&self, draft_id: &str) -> Result<Option<TripPlan>, Self::Error>;

    /// Returns whether a draft was removed.
    fn discard(&self, draft_id: &str) -> Result<bool, Self::Error>;
}
