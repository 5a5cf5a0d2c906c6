use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::AddressRole;

/// No explicit selection and no default address kind for a passenger role.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("no {role:?} address for passenger {passenger_id}")]
pub struct AddressNotFound {
    pub passenger_id: String,
    pub role: AddressRole,
    /// Selected address id that was not in the catalog, if any.
    pub selected_id: Option<String>,
}

/// The routing provider could not compute a route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("route unavailable: {reason}")]
pub struct RouteUnavailable {
    pub reason: String,
}

impl RouteUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimateError {
    #[error("group route needs at least 2 waypoints, got {count}")]
    InvalidWaypointSet { count: usize },

    #[error(transparent)]
    RouteUnavailable(#[from] RouteUnavailable),
}

/// Failures that reject a whole `plan` call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("roster is empty")]
    EmptyRoster,

    #[error("plan cancelled")]
    Cancelled,

    /// A background plan panicked or dropped its result channel.
    #[error("plan worker failed: {message}")]
    WorkerFailed { message: String },

    #[error("passenger {passenger_id} uses anchor {found}, group anchor is {expected}")]
    AnchorMismatch {
        passenger_id: String,
        expected: String,
        found: String,
    },
}
