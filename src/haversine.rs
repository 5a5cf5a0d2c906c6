//! Haversine routing provider (fallback when OSRM unavailable).
//!
//! Uses great-circle distance stretched by a detour factor and an assumed
//! speed. Less accurate than OSRM (ignores roads) but always available.

use crate::error::RouteUnavailable;
use crate::model::{Address, Coordinates};
use crate::traits::{RawLeg, RoutingProvider, WaypointRoute};

/// Average driving speed assumption for time estimation.
const DEFAULT_SPEED_KMH: f64 = 40.0;

/// Ratio between road distance and straight-line distance.
const DEFAULT_DETOUR_FACTOR: f64 = 1.3;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Crow-flies routing provider.
///
/// Orders intermediate stops greedily by nearest neighbour from the origin.
#[derive(Debug, Clone)]
pub struct HaversineRouter {
    /// Assumed average driving speed in km/h.
    pub speed_kmh: f64,
    pub detour_factor: f64,
}

impl Default for HaversineRouter {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_SPEED_KMH,
            detour_factor: DEFAULT_DETOUR_FACTOR,
        }
    }
}

impl HaversineRouter {
    pub fn new(speed_kmh: f64, detour_factor: f64) -> Self {
        Self {
            speed_kmh,
            detour_factor,
        }
    }

    /// Calculate haversine distance between two points in kilometers.
    fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
        let lat1_rad = from.lat.to_radians();
        let lat2_rad = to.lat.to_radians();
        let delta_lat = (to.lat - from.lat).to_radians();
        let delta_lng = (to.lng - from.lng).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_KM * c
    }

    fn leg(&self, from: Coordinates, to: Coordinates) -> RawLeg {
        let km = Self::haversine_km(from, to) * self.detour_factor;
        RawLeg::new(km * 1000.0, km / self.speed_kmh * 3600.0)
    }
}

fn coordinates(address: &Address) -> Result<Coordinates, RouteUnavailable> {
    address.coordinates.ok_or_else(|| {
        RouteUnavailable::new(format!("address {} has no coordinates", address.id))
    })
}

impl RoutingProvider for HaversineRouter {
    fn route(&self, origin: &Address, destination: &Address) -> Result<RawLeg, RouteUnavailable> {
        Ok(self.leg(coordinates(origin)?, coordinates(destination)?))
    }

    fn route_with_waypoints(
        &self,
        origin: &Address,
        destination: &Address,
        stops: &[Address],
    ) -> Result<WaypointRoute, RouteUnavailable> {
        let start = coordinates(origin)?;
        let end = coordinates(destination)?;
        let points = stops
            .iter()
            .map(coordinates)
            .collect::<Result<Vec<_>, _>>()?;

        let mut remaining: Vec<usize> = (0..points.len()).collect();
        let mut visit_order = Vec::with_capacity(points.len());
        let mut legs = Vec::with_capacity(points.len() + 1);
        let mut current = start;

        while !remaining.is_empty() {
            let (slot, _) = remaining
                .iter()
                .enumerate()
                .map(|(slot, &stop)| (slot, Self::haversine_km(current, points[stop])))
                .fold((0, f64::INFINITY), |best, candidate| {
                    if candidate.1 < best.1 { candidate } else { best }
                });
            let stop = remaining.remove(slot);
            legs.push(self.leg(current, points[stop]));
            visit_order.push(stop);
            current = points[stop];
        }
        legs.push(self.leg(current, end));

        Ok(WaypointRoute { legs, visit_order })
    }
}
