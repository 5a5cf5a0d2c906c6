//! Value types flowing through a planning request.
//!
//! Everything here is created fresh for one `plan` call and never mutated
//! after the planner hands it back.

use serde::{Deserialize, Serialize};

use crate::error::AddressNotFound;

/// Geographic coordinates in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Who owns an address and what role it usually plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AddressKind {
    Home,
    Office,
    Custom,
    Organization,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: String,
    pub label: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub coordinates: Option<Coordinates>,
    pub kind: AddressKind,
    /// Human-readable one-line form, also what providers geocode when
    /// `coordinates` is missing.
    pub formatted: String,
}

impl Address {
    /// Minimal address with only an id, kind and formatted line.
    pub fn new(id: impl Into<String>, kind: AddressKind, formatted: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: String::new(),
            street: String::new(),
            city: String::new(),
            postal_code: String::new(),
            country: String::new(),
            coordinates: None,
            kind,
            formatted: formatted.into(),
        }
    }

    pub fn with_coordinates(mut self, lat: f64, lng: f64) -> Self {
        self.coordinates = Some(Coordinates::new(lat, lng));
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passenger {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub addresses: Vec<Address>,
    /// Explicit departure override; falls back to the direction default.
    pub selected_departure_address_id: Option<String>,
    /// Explicit arrival override; falls back to the direction default.
    pub selected_arrival_address_id: Option<String>,
}

impl Passenger {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            phone: String::new(),
            addresses: Vec::new(),
            selected_departure_address_id: None,
            selected_arrival_address_id: None,
        }
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.addresses.push(address);
        self
    }

    pub fn select(&mut self, role: AddressRole, address_id: impl Into<String>) {
        match role {
            AddressRole::Departure => self.selected_departure_address_id = Some(address_id.into()),
            AddressRole::Arrival => self.selected_arrival_address_id = Some(address_id.into()),
        }
    }

    pub fn selection(&self, role: AddressRole) -> Option<&str> {
        match role {
            AddressRole::Departure => self.selected_departure_address_id.as_deref(),
            AddressRole::Arrival => self.selected_arrival_address_id.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripDirection {
    HomeToOffice,
    OfficeToHome,
}

impl TripDirection {
    /// Address kind a passenger uses for `role` when nothing is selected.
    pub fn default_kind(self, role: AddressRole) -> AddressKind {
        match (self, role) {
            (TripDirection::HomeToOffice, AddressRole::Departure) => AddressKind::Home,
            (TripDirection::HomeToOffice, AddressRole::Arrival) => AddressKind::Office,
            (TripDirection::OfficeToHome, AddressRole::Departure) => AddressKind::Office,
            (TripDirection::OfficeToHome, AddressRole::Arrival) => AddressKind::Home,
        }
    }

    /// The role played by the shared workplace end of the trip.
    pub fn anchor_role(self) -> AddressRole {
        match self {
            TripDirection::HomeToOffice => AddressRole::Arrival,
            TripDirection::OfficeToHome => AddressRole::Departure,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AddressRole {
    Departure,
    Arrival,
}

impl AddressRole {
    pub fn other(self) -> Self {
        match self {
            AddressRole::Departure => AddressRole::Arrival,
            AddressRole::Arrival => AddressRole::Departure,
        }
    }
}

/// Point-to-point estimate for one passenger.
///
/// `distance_km` and `duration_minutes` are `None` for a degraded estimate,
/// in which case `price` is `0.0` and must not be shown as a real fare.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteEstimate {
    pub distance_km: Option<f64>,
    pub duration_minutes: Option<u32>,
    pub price: f64,
    pub origin: Option<String>,
    pub destination: Option<String>,
}

impl RouteEstimate {
    pub fn degraded(origin: Option<String>, destination: Option<String>) -> Self {
        Self {
            distance_km: None,
            duration_minutes: None,
            price: 0.0,
            origin,
            destination,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.distance_km.is_none() || self.duration_minutes.is_none()
    }
}

/// Shared multi-stop route, origin first and destination last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRoute {
    pub waypoints: Vec<Address>,
    pub distance_km: f64,
    pub duration_minutes: u32,
    pub price: f64,
}

impl GroupRoute {
    pub fn origin(&self) -> Option<&Address> {
        self.waypoints.first()
    }

    pub fn destination(&self) -> Option<&Address> {
        self.waypoints.last()
    }
}

/// Non-fatal problems collected while planning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlanWarning {
    AddressNotFound(AddressNotFound),
    RouteUnavailable {
        passenger_id: String,
        reason: String,
    },
    GroupRouteUnavailable {
        reason: String,
    },
    AnchorMismatch {
        passenger_id: String,
        expected: String,
        found: String,
    },
}

impl PlanWarning {
    /// Passenger the warning is about, if it concerns a single passenger.
    pub fn passenger_id(&self) -> Option<&str> {
        match self {
            PlanWarning::AddressNotFound(err) => Some(&err.passenger_id),
            PlanWarning::RouteUnavailable { passenger_id, .. }
            | PlanWarning::AnchorMismatch { passenger_id, .. } => Some(passenger_id),
            PlanWarning::GroupRouteUnavailable { .. } => None,
        }
    }
}

/// Confirmation-ready result of a group planning request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripPlan {
    pub direction: TripDirection,
    /// One entry per roster passenger, in roster order.
    pub per_passenger: Vec<RouteEstimate>,
    pub group_route: Option<GroupRoute>,
    /// Fare of the shared route; `None` when no group route could be built.
    pub total_price: Option<f64>,
    /// Sum of the non-degraded individual fares.
    pub individual_total: f64,
    pub warnings: Vec<PlanWarning>,
}

impl TripPlan {
    /// How much cheaper the shared ride is than everyone riding alone.
    pub fn savings(&self) -> Option<f64> {
        self.total_price
            .map(|total| crate::fare::round2(self.individual_total - total))
    }

    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty() && self.group_route.is_some()
    }

    pub fn degraded_count(&self) -> usize {
        self.per_passenger.iter().filter(|e| e.is_degraded()).count()
    }
}
