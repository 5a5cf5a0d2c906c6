//! Turns provider measurements into priced estimates.

use tracing::{debug, warn};

use crate::error::{EstimateError, RouteUnavailable};
use crate::fare::FareTable;
use crate::model::{Address, GroupRoute, RouteEstimate};
use crate::traits::{RawLeg, RoutingProvider};

#[derive(Debug, Clone)]
pub struct RouteEstimator<P> {
    provider: P,
    fares: FareTable,
}

impl<P: RoutingProvider> RouteEstimator<P> {
    pub fn new(provider: P, fares: FareTable) -> Self {
        Self { provider, fares }
    }

    pub fn fares(&self) -> &FareTable {
        &self.fares
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Direct estimate between two addresses.
    ///
    /// A provider failure yields a degraded estimate instead of an error so a
    /// single unreachable leg never aborts a batch.
    pub fn estimate_leg(&self, origin: &Address, destination: &Address) -> RouteEstimate {
        match self.try_estimate_leg(origin, destination) {
            Ok(estimate) => estimate,
            Err(err) => {
                warn!(origin = %origin.id, destination = %destination.id, "{err}");
                RouteEstimate::degraded(
                    Some(origin.formatted.clone()),
                    Some(destination.formatted.clone()),
                )
            }
        }
    }

    /// Like [`estimate_leg`](Self::estimate_leg) but surfaces the provider error.
    pub fn try_estimate_leg(
        &self,
        origin: &Address,
        destination: &Address,
    ) -> Result<RouteEstimate, RouteUnavailable> {
        let leg = self.provider.route(origin, destination)?;
        let distance_km = meters_to_km(leg.distance_meters);
        let duration_minutes = seconds_to_minutes(leg.duration_seconds);
        let price = self.fares.price(distance_km, duration_minutes);

        debug!(
            origin = %origin.id,
            destination = %destination.id,
            distance_km,
            duration_minutes,
            price,
            "estimated leg"
        );

        Ok(RouteEstimate {
            distance_km: Some(distance_km),
            duration_minutes: Some(duration_minutes),
            price,
            origin: Some(origin.formatted.clone()),
            destination: Some(destination.formatted.clone()),
        })
    }

    /// Optimized shared route over `ordered_waypoints`.
    ///
    /// The first and last waypoints stay fixed; the provider reorders the
    /// ones in between. The fare is applied to the route totals.
    pub fn estimate_group_route(
        &self,
        ordered_waypoints: &[Address],
    ) -> Result<GroupRoute, EstimateError> {
        let [origin, stops @ .., destination] = ordered_waypoints else {
            return Err(EstimateError::InvalidWaypointSet {
                count: ordered_waypoints.len(),
            });
        };

        let route = self
            .provider
            .route_with_waypoints(origin, destination, stops)?;

        if route.legs.is_empty() {
            return Err(RouteUnavailable::new("provider returned no legs").into());
        }

        let order = if is_permutation(&route.visit_order, stops.len()) {
            route.visit_order
        } else {
            warn!(
                visit_order = ?route.visit_order,
                stops = stops.len(),
                "ignoring invalid visit order"
            );
            (0..stops.len()).collect()
        };

        let mut waypoints = Vec::with_capacity(ordered_waypoints.len());
        waypoints.push(origin.clone());
        waypoints.extend(order.iter().map(|&i| stops[i].clone()));
        waypoints.push(destination.clone());

        let totals = route.legs.iter().fold(RawLeg::new(0.0, 0.0), |acc, leg| {
            RawLeg::new(
                acc.distance_meters + leg.distance_meters,
                acc.duration_seconds + leg.duration_seconds,
            )
        });
        let distance_km = meters_to_km(totals.distance_meters);
        let duration_minutes = seconds_to_minutes(totals.duration_seconds);
        let price = self.fares.price(distance_km, duration_minutes);

        debug!(
            waypoints = waypoints.len(),
            legs = route.legs.len(),
            distance_km,
            duration_minutes,
            price,
            "estimated group route"
        );

        Ok(GroupRoute {
            waypoints,
            distance_km,
            duration_minutes,
            price,
        })
    }
}

fn meters_to_km(meters: f64) -> f64 {
    meters.max(0.0) / 1000.0
}

fn seconds_to_minutes(seconds: f64) -> u32 {
    (seconds.max(0.0) / 60.0).round() as u32
}

fn is_permutation(order: &[usize], len: usize) -> bool {
    if order.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    for &i in order {
        if i >= len || seen[i] {
            return false;
        }
        seen[i] = true;
    }
    true
}
