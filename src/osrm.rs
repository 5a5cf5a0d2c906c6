//! OSRM HTTP adapter for leg and multi-stop routing.

use serde::Deserialize;
use tracing::debug;

use crate::error::RouteUnavailable;
use crate::model::Address;
use crate::traits::{RawLeg, RoutingProvider, WaypointRoute};

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn url(&self, service: &str, addresses: &[&Address]) -> Result<String, RouteUnavailable> {
        let coords = addresses
            .iter()
            .map(|address| coordinate_param(address))
            .collect::<Result<Vec<_>, _>>()?
            .join(";");

        Ok(format!(
            "{}/{}/v1/{}/{}",
            self.config.base_url, service, self.config.profile, coords
        ))
    }

    fn get<T: for<'de> Deserialize<'de>>(
        &self,
        url: String,
        query: &[(&str, &str)],
    ) -> Result<T, RouteUnavailable> {
        debug!(%url, "osrm request");
        self.client
            .get(url)
            .query(query)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<T>())
            .map_err(|err| RouteUnavailable::new(format!("osrm request failed: {err}")))
    }
}

impl RoutingProvider for OsrmClient {
    fn route(&self, origin: &Address, destination: &Address) -> Result<RawLeg, RouteUnavailable> {
        let url = self.url("route", &[origin, destination])?;
        let body: OsrmRouteResponse = self.get(url, &[("overview", "false")])?;
        leg_from_route(body)
    }

    fn route_with_waypoints(
        &self,
        origin: &Address,
        destination: &Address,
        stops: &[Address],
    ) -> Result<WaypointRoute, RouteUnavailable> {
        let mut addresses = Vec::with_capacity(stops.len() + 2);
        addresses.push(origin);
        addresses.extend(stops);
        addresses.push(destination);

        let url = self.url("trip", &addresses)?;
        let body: OsrmTripResponse = self.get(
            url,
            &[
                ("source", "first"),
                ("destination", "last"),
                ("roundtrip", "false"),
                ("overview", "false"),
            ],
        )?;
        route_from_trip(body, stops.len())
    }
}

fn coordinate_param(address: &Address) -> Result<String, RouteUnavailable> {
    address
        .coordinates
        .map(|c| format!("{:.6},{:.6}", c.lng, c.lat))
        .ok_or_else(|| {
            RouteUnavailable::new(format!("address {} has no coordinates", address.id))
        })
}

fn check_code(code: &str, message: Option<String>) -> Result<(), RouteUnavailable> {
    if code == "Ok" {
        Ok(())
    } else {
        Err(RouteUnavailable::new(match message {
            Some(message) => format!("osrm {code}: {message}"),
            None => format!("osrm {code}"),
        }))
    }
}

fn leg_from_route(body: OsrmRouteResponse) -> Result<RawLeg, RouteUnavailable> {
    check_code(&body.code, body.message)?;
    body.routes
        .into_iter()
        .next()
        .map(|route| RawLeg::new(route.distance, route.duration))
        .ok_or_else(|| RouteUnavailable::new("osrm returned no route"))
}

/// `waypoints` come back in input order, each carrying its position in the
/// trip. Stops are inputs `1..=stop_count`.
fn route_from_trip(
    body: OsrmTripResponse,
    stop_count: usize,
) -> Result<WaypointRoute, RouteUnavailable> {
    check_code(&body.code, body.message)?;
    let trip = body
        .trips
        .into_iter()
        .next()
        .ok_or_else(|| RouteUnavailable::new("osrm returned no trip"))?;

    if body.waypoints.len() != stop_count + 2 {
        return Err(RouteUnavailable::new(format!(
            "osrm returned {} waypoints for {} inputs",
            body.waypoints.len(),
            stop_count + 2
        )));
    }

    let mut visit_order: Vec<usize> = (0..stop_count).collect();
    visit_order.sort_by_key(|&stop| body.waypoints[stop + 1].waypoint_index);

    Ok(WaypointRoute {
        legs: trip
            .legs
            .into_iter()
            .map(|leg| RawLeg::new(leg.distance, leg.duration))
            .collect(),
        visit_order,
    })
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct OsrmTripResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    trips: Vec<OsrmTrip>,
    #[serde(default)]
    waypoints: Vec<OsrmTripWaypoint>,
}

#[derive(Debug, Deserialize)]
struct OsrmTrip {
    legs: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmTripWaypoint {
    waypoint_index: usize,
}
