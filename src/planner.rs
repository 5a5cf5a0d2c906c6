//! Group trip planning: individual estimates plus one shared route.

use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{error, info, warn};

use crate::address::AddressResolver;
use crate::error::PlanError;
use crate::estimator::RouteEstimator;
use crate::fare::{round2, FareTable};
use crate::model::{
    Address, AddressRole, Passenger, PlanWarning, RouteEstimate, TripDirection, TripPlan,
};
use crate::traits::RoutingProvider;

#[derive(Debug, Clone)]
pub struct PlannerOptions {
    pub fare_table: FareTable,
    /// Reject rosters whose passengers do not share one anchor address.
    /// When false the first anchor wins and mismatches become warnings.
    pub require_common_anchor: bool,
    /// Estimate passengers concurrently on the rayon pool.
    pub parallel: bool,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            fare_table: FareTable::default(),
            require_common_anchor: false,
            parallel: true,
        }
    }
}

/// Cooperative cancellation shared between a caller and a running plan.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    fn check(&self) -> Result<(), PlanError> {
        if self.is_cancelled() {
            Err(PlanError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Owned inputs for a plan run in the background.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub roster: Vec<Passenger>,
    pub direction: TripDirection,
    pub organization_addresses: Vec<Address>,
}

/// A plan running on the rayon pool.
#[derive(Debug)]
pub struct PlanHandle {
    cancel: CancelToken,
    receiver: Receiver<Result<TripPlan, PlanError>>,
    result: Option<Result<TripPlan, PlanError>>,
}

impl PlanHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&mut self) -> bool {
        if self.result.is_some() {
            return true;
        }
        match self.receiver.try_recv() {
            Ok(result) => {
                self.result = Some(result);
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => true,
        }
    }

    /// Blocks until the plan completes or observes cancellation.
    pub fn join(self) -> Result<TripPlan, PlanError> {
        match self.result {
            Some(result) => result,
            None => self.receiver.recv().unwrap_or_else(|_| {
                Err(PlanError::WorkerFailed {
                    message: "worker exited without a result".to_string(),
                })
            }),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Per-passenger outcome before the shared route is assembled.
struct PassengerLeg<'a> {
    passenger_id: &'a str,
    estimate: RouteEstimate,
    resolved: Option<(&'a Address, &'a Address)>,
    warnings: Vec<PlanWarning>,
}

pub struct GroupTripPlanner<P> {
    estimator: RouteEstimator<P>,
    options: PlannerOptions,
}

impl<P: RoutingProvider> GroupTripPlanner<P> {
    pub fn new(provider: P, options: PlannerOptions) -> Self {
        Self {
            estimator: RouteEstimator::new(provider, options.fare_table),
            options,
        }
    }

    pub fn estimator(&self) -> &RouteEstimator<P> {
        &self.estimator
    }

    pub fn options(&self) -> &PlannerOptions {
        &self.options
    }

    /// Estimates every passenger's own trip and the shared group route.
    ///
    /// Per-passenger failures degrade that passenger's entry and are reported
    /// in `TripPlan::warnings`. Only an empty roster, cancellation, or a
    /// strict anchor mismatch reject the call.
    pub fn plan(
        &self,
        roster: &[Passenger],
        direction: TripDirection,
        organization_addresses: &[Address],
        cancel: &CancelToken,
    ) -> Result<TripPlan, PlanError> {
        if roster.is_empty() {
            return Err(PlanError::EmptyRoster);
        }
        cancel.check()?;

        let legs: Vec<PassengerLeg<'_>> = if self.options.parallel {
            roster
                .par_iter()
                .map(|p| self.plan_passenger(p, direction, organization_addresses, cancel))
                .collect::<Result<Vec<_>, PlanError>>()?
        } else {
            roster
                .iter()
                .map(|p| self.plan_passenger(p, direction, organization_addresses, cancel))
                .collect::<Result<Vec<_>, PlanError>>()?
        };

        let mut warnings: Vec<PlanWarning> = legs
            .iter()
            .flat_map(|leg| leg.warnings.iter().cloned())
            .collect();

        let waypoints = self.shared_waypoints(&legs, direction, &mut warnings)?;

        cancel.check()?;
        let group_route = match self.estimator.estimate_group_route(&waypoints) {
            Ok(route) => Some(route),
            Err(err) => {
                warn!(waypoints = waypoints.len(), "group route unavailable: {err}");
                warnings.push(PlanWarning::GroupRouteUnavailable {
                    reason: err.to_string(),
                });
                None
            }
        };
        cancel.check()?;

        let per_passenger: Vec<RouteEstimate> = legs.into_iter().map(|leg| leg.estimate).collect();
        let individual_total = round2(
            per_passenger
                .iter()
                .filter(|estimate| !estimate.is_degraded())
                .map(|estimate| estimate.price)
                .sum(),
        );
        let total_price = group_route.as_ref().map(|route| route.price);

        info!(
            passengers = per_passenger.len(),
            warnings = warnings.len(),
            ?total_price,
            individual_total,
            "group trip planned"
        );

        Ok(TripPlan {
            direction,
            per_passenger,
            group_route,
            total_price,
            individual_total,
            warnings,
        })
    }

    /// Runs [`plan`](Self::plan) on the rayon pool.
    pub fn spawn(self: Arc<Self>, request: PlanRequest, cancel: CancelToken) -> PlanHandle
    where
        P: Send + 'static,
    {
        let (sender, receiver) = mpsc::sync_channel(1);
        let token = cancel.clone();
        rayon::spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                self.plan(
                    &request.roster,
                    request.direction,
                    &request.organization_addresses,
                    &token,
                )
            }))
            .unwrap_or_else(|payload| {
                let message = panic_message(payload.as_ref());
                error!(%message, "plan worker panicked");
                Err(PlanError::WorkerFailed { message })
            });
            // The handle may already be gone.
            let _ = sender.send(result);
        });

        PlanHandle {
            cancel,
            receiver,
            result: None,
        }
    }

    fn plan_passenger<'a>(
        &self,
        passenger: &'a Passenger,
        direction: TripDirection,
        organization_addresses: &'a [Address],
        cancel: &CancelToken,
    ) -> Result<PassengerLeg<'a>, PlanError> {
        cancel.check()?;

        let catalog = AddressResolver::build_catalog(passenger, organization_addresses);
        let departure =
            AddressResolver::resolve_role(passenger, AddressRole::Departure, direction, &catalog);
        let arrival =
            AddressResolver::resolve_role(passenger, AddressRole::Arrival, direction, &catalog);

        let (departure, arrival) = match (departure, arrival) {
            (Ok(departure), Ok(arrival)) => (departure, arrival),
            (departure, arrival) => {
                let origin = departure.as_ref().ok().map(|a| a.formatted.clone());
                let destination = arrival.as_ref().ok().map(|a| a.formatted.clone());
                let warnings: Vec<PlanWarning> = [departure.err(), arrival.err()]
                    .into_iter()
                    .flatten()
                    .inspect(|err| warn!(passenger = %passenger.id, "{err}"))
                    .map(PlanWarning::AddressNotFound)
                    .collect();

                return Ok(PassengerLeg {
                    passenger_id: &passenger.id,
                    estimate: RouteEstimate::degraded(origin, destination),
                    resolved: None,
                    warnings,
                });
            }
        };

        cancel.check()?;
        let (estimate, warnings) = match self.estimator.try_estimate_leg(departure, arrival) {
            Ok(estimate) => (estimate, Vec::new()),
            Err(err) => {
                warn!(passenger = %passenger.id, "{err}");
                (
                    RouteEstimate::degraded(
                        Some(departure.formatted.clone()),
                        Some(arrival.formatted.clone()),
                    ),
                    vec![PlanWarning::RouteUnavailable {
                        passenger_id: passenger.id.clone(),
                        reason: err.reason,
                    }],
                )
            }
        };

        Ok(PassengerLeg {
            passenger_id: &passenger.id,
            estimate,
            resolved: Some((departure, arrival)),
            warnings,
        })
    }

    /// Anchor plus the distinct passenger-side stops, in travel order.
    ///
    /// Only passengers whose departure and arrival both resolved contribute.
    /// Stops keep first-occurrence roster order.
    fn shared_waypoints(
        &self,
        legs: &[PassengerLeg<'_>],
        direction: TripDirection,
        warnings: &mut Vec<PlanWarning>,
    ) -> Result<Vec<Address>, PlanError> {
        let anchor_role = direction.anchor_role();

        let mut anchor: Option<&Address> = None;
        let mut seen: HashSet<&str> = HashSet::new();
        let mut stops: Vec<Address> = Vec::new();

        for leg in legs {
            let Some(resolved) = leg.resolved else {
                continue;
            };
            let own_anchor = address_for(resolved, anchor_role);
            match anchor {
                None => {
                    anchor = Some(own_anchor);
                    seen.insert(own_anchor.id.as_str());
                }
                Some(expected) if expected.id != own_anchor.id => {
                    if self.options.require_common_anchor {
                        return Err(PlanError::AnchorMismatch {
                            passenger_id: leg.passenger_id.to_string(),
                            expected: expected.id.clone(),
                            found: own_anchor.id.clone(),
                        });
                    }
                    warn!(
                        passenger = leg.passenger_id,
                        expected = %expected.id,
                        found = %own_anchor.id,
                        "anchor mismatch, keeping first anchor"
                    );
                    warnings.push(PlanWarning::AnchorMismatch {
                        passenger_id: leg.passenger_id.to_string(),
                        expected: expected.id.clone(),
                        found: own_anchor.id.clone(),
                    });
                }
                Some(_) => {}
            }

            let stop = address_for(resolved, anchor_role.other());
            if seen.insert(stop.id.as_str()) {
                stops.push(stop.clone());
            }
        }

        let Some(anchor) = anchor else {
            return Ok(Vec::new());
        };

        let waypoints = match direction {
            TripDirection::HomeToOffice => {
                stops.push(anchor.clone());
                stops
            }
            TripDirection::OfficeToHome => {
                let mut waypoints = Vec::with_capacity(stops.len() + 1);
                waypoints.push(anchor.clone());
                waypoints.extend(stops);
                waypoints
            }
        };
        Ok(waypoints)
    }
}

fn address_for<'a>(resolved: (&'a Address, &'a Address), role: AddressRole) -> &'a Address {
    match role {
        AddressRole::Departure => resolved.0,
        AddressRole::Arrival => resolved.1,
    }
}
