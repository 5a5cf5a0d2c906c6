//! Test fixtures for group-trip-planner.
//!
//! Provides:
//! - Roster builders around one shared office
//! - A scripted `RoutingProvider` that records what it was asked
//! - A few real Las Vegas / Henderson coordinates (from OpenStreetMap)

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use group_trip_planner::error::RouteUnavailable;
use group_trip_planner::model::{Address, AddressKind, Passenger};
use group_trip_planner::planner::CancelToken;
use group_trip_planner::traits::{RawLeg, RoutingProvider, WaypointRoute};

// ============================================================================
// Addresses and rosters
// ============================================================================

pub const OFFICE_ID: &str = "office";

pub fn office() -> Address {
    Address::new(OFFICE_ID, AddressKind::Office, "3570 S Las Vegas Blvd")
        .with_label("Head office")
        .with_coordinates(36.1162, -115.1745)
}

pub fn home(id: &str) -> Address {
    Address::new(id, AddressKind::Home, format!("{id} street"))
}

/// Passenger with `{id}-home` and the shared office.
pub fn passenger(id: &str) -> Passenger {
    Passenger::new(id, id.to_uppercase())
        .with_address(home(&format!("{id}-home")))
        .with_address(office())
}

pub fn passenger_with_home(id: &str, home_address: Address) -> Passenger {
    Passenger::new(id, id.to_uppercase())
        .with_address(home_address)
        .with_address(office())
}

pub fn passenger_without_home(id: &str) -> Passenger {
    Passenger::new(id, id.to_uppercase()).with_address(office())
}

// ============================================================================
// Scripted routing provider
// ============================================================================

/// Deterministic provider answering from a table keyed by address ids.
#[derive(Default)]
pub struct StubRouter {
    legs: HashMap<(String, String), RawLeg>,
    delays: HashMap<String, Duration>,
    gates: HashMap<String, String>,
    panics_on: Option<String>,
    group: Option<WaypointRoute>,
    group_error: Option<String>,
    cancel_on_call: Option<CancelToken>,
    calls: AtomicUsize,
    completed: Mutex<Vec<String>>,
    completed_changed: Condvar,
    group_requests: Mutex<Vec<Vec<String>>>,
}

impl StubRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn leg(mut self, from: &str, to: &str, meters: f64, seconds: f64) -> Self {
        self.legs
            .insert((from.to_string(), to.to_string()), RawLeg::new(meters, seconds));
        self
    }

    /// Delay answering any leg that starts at `origin`.
    pub fn delay(mut self, origin: &str, delay: Duration) -> Self {
        self.delays.insert(origin.to_string(), delay);
        self
    }

    /// Hold legs from `origin` until a leg from `prerequisite` has been answered.
    /// Gives up after five seconds so a sequential run finishes, out of order.
    pub fn after(mut self, origin: &str, prerequisite: &str) -> Self {
        self.gates.insert(origin.to_string(), prerequisite.to_string());
        self
    }

    /// Panic when asked for a leg from `origin`.
    pub fn panic_on(mut self, origin: &str) -> Self {
        self.panics_on = Some(origin.to_string());
        self
    }

    pub fn group_route(mut self, legs: &[(f64, f64)], visit_order: &[usize]) -> Self {
        self.group = Some(WaypointRoute {
            legs: legs.iter().map(|&(m, s)| RawLeg::new(m, s)).collect(),
            visit_order: visit_order.to_vec(),
        });
        self
    }

    pub fn group_fails(mut self, reason: &str) -> Self {
        self.group_error = Some(reason.to_string());
        self
    }

    pub fn cancel_on_call(mut self, token: CancelToken) -> Self {
        self.cancel_on_call = Some(token);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Origins of answered legs, in completion order.
    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }

    /// Address ids of each multi-stop request: origin, stops, destination.
    pub fn group_requests(&self) -> Vec<Vec<String>> {
        self.group_requests.lock().unwrap().clone()
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = &self.cancel_on_call {
            token.cancel();
        }
    }
}

impl RoutingProvider for StubRouter {
    fn route(&self, origin: &Address, destination: &Address) -> Result<RawLeg, RouteUnavailable> {
        self.touch();
        if self.panics_on.as_deref() == Some(origin.id.as_str()) {
            panic!("router exploded at {}", origin.id);
        }
        if let Some(delay) = self.delays.get(&origin.id) {
            std::thread::sleep(*delay);
        }
        if let Some(prerequisite) = self.gates.get(&origin.id) {
            let done = self.completed.lock().unwrap();
            let _ = self
                .completed_changed
                .wait_timeout_while(done, Duration::from_secs(5), |done| {
                    !done.contains(prerequisite)
                })
                .unwrap();
        }
        let leg = self
            .legs
            .get(&(origin.id.clone(), destination.id.clone()))
            .copied()
            .ok_or_else(|| RouteUnavailable::new(format!("no road from {}", origin.id)));
        self.completed.lock().unwrap().push(origin.id.clone());
        self.completed_changed.notify_all();
        leg
    }

    fn route_with_waypoints(
        &self,
        origin: &Address,
        destination: &Address,
        stops: &[Address],
    ) -> Result<WaypointRoute, RouteUnavailable> {
        self.touch();
        let mut ids = vec![origin.id.clone()];
        ids.extend(stops.iter().map(|stop| stop.id.clone()));
        ids.push(destination.id.clone());
        self.group_requests.lock().unwrap().push(ids);

        if let Some(reason) = &self.group_error {
            return Err(RouteUnavailable::new(reason.clone()));
        }
        Ok(self.group.clone().unwrap_or_else(|| WaypointRoute {
            legs: (0..=stops.len()).map(|_| RawLeg::new(1000.0, 60.0)).collect(),
            visit_order: (0..stops.len()).collect(),
        }))
    }
}

// ============================================================================
// Real locations
// ============================================================================

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn address(&self, id: &str, kind: AddressKind) -> Address {
        Address::new(id, kind, self.name).with_coordinates(self.lat, self.lng)
    }
}

pub const CAESARS_PALACE: Location = Location::new("Caesars Palace", 36.1162, -115.1745);

pub const HENDERSON_HOMES: &[Location] = &[
    Location::new("Islander's Grill", 36.0335058, -114.9856162),
    Location::new("Buffalo Wild Wings Henderson", 36.0090449, -114.9917034),
    Location::new("Sunset Station Area", 36.0614, -115.0631),
];
