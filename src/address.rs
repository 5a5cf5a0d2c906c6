//! Address lookup and role resolution for passengers.

use std::collections::HashMap;

use crate::error::AddressNotFound;
use crate::model::{Address, AddressRole, Passenger, TripDirection};

/// Where a catalog address came from.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogEntry<'a> {
    Passenger(&'a Address),
    Organization(&'a Address),
}

impl<'a> CatalogEntry<'a> {
    pub fn address(&self) -> &'a Address {
        match self {
            CatalogEntry::Passenger(address) | CatalogEntry::Organization(address) => address,
        }
    }

    pub fn is_organization(&self) -> bool {
        matches!(self, CatalogEntry::Organization(_))
    }
}

/// Addresses a single passenger may travel from or to, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct AddressCatalog<'a> {
    entries: HashMap<&'a str, CatalogEntry<'a>>,
}

impl<'a> AddressCatalog<'a> {
    pub fn get(&self, id: &str) -> Option<&CatalogEntry<'a>> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AddressResolver;

impl AddressResolver {
    /// Merges the passenger's own addresses with organization-wide ones.
    ///
    /// Passenger addresses win on id collision.
    pub fn build_catalog<'a>(
        passenger: &'a Passenger,
        organization_addresses: &'a [Address],
    ) -> AddressCatalog<'a> {
        let mut entries = HashMap::with_capacity(
            passenger.addresses.len() + organization_addresses.len(),
        );
        for address in organization_addresses {
            entries.insert(address.id.as_str(), CatalogEntry::Organization(address));
        }
        for address in &passenger.addresses {
            entries.insert(address.id.as_str(), CatalogEntry::Passenger(address));
        }
        AddressCatalog { entries }
    }

    /// Concrete address playing `role` for `passenger` on a trip in `direction`.
    ///
    /// An explicit selection that is not in the catalog falls through to the
    /// direction default.
    pub fn resolve_role<'a>(
        passenger: &'a Passenger,
        role: AddressRole,
        direction: TripDirection,
        catalog: &AddressCatalog<'a>,
    ) -> Result<&'a Address, AddressNotFound> {
        let selected = passenger.selection(role);

        if let Some(entry) = selected.and_then(|id| catalog.get(id)) {
            return Ok(entry.address());
        }

        let kind = direction.default_kind(role);
        passenger
            .addresses
            .iter()
            .find(|address| address.kind == kind)
            .ok_or_else(|| AddressNotFound {
                passenger_id: passenger.id.clone(),
                role,
                selected_id: selected.map(str::to_string),
            })
    }

    /// Departure and arrival for one passenger.
    pub fn resolve_trip<'a>(
        passenger: &'a Passenger,
        direction: TripDirection,
        catalog: &AddressCatalog<'a>,
    ) -> Result<(&'a Address, &'a Address), AddressNotFound> {
        let departure = Self::resolve_role(passenger, AddressRole::Departure, direction, catalog)?;
        let arrival = Self::resolve_role(passenger, AddressRole::Arrival, direction, catalog)?;
        Ok((departure, arrival))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AddressKind;

    fn alice() -> Passenger {
        Passenger::new("alice", "Alice")
            .with_address(Address::new("a-home", AddressKind::Home, "1 Elm St"))
            .with_address(Address::new("a-office", AddressKind::Office, "9 Main St"))
            .with_address(Address::new("a-gym", AddressKind::Custom, "3 Oak Ave"))
    }

    fn branches() -> Vec<Address> {
        vec![
            Address::new("branch-north", AddressKind::Organization, "100 North Rd"),
            Address::new("a-gym", AddressKind::Organization, "Shadowed Gym"),
        ]
    }

    #[test]
    fn test_catalog_merges_and_prefers_passenger() {
        let passenger = alice();
        let org = branches();
        let catalog = AddressResolver::build_catalog(&passenger, &org);

        assert_eq!(catalog.len(), 4);
        let gym = catalog.get("a-gym").unwrap();
        assert!(!gym.is_organization());
        assert_eq!(gym.address().formatted, "3 Oak Ave");
        assert!(catalog.get("branch-north").unwrap().is_organization());
    }

    #[test]
    fn test_defaults_follow_direction() {
        let passenger = alice();
        let catalog = AddressResolver::build_catalog(&passenger, &[]);

        let (dep, arr) =
            AddressResolver::resolve_trip(&passenger, TripDirection::HomeToOffice, &catalog)
                .unwrap();
        assert_eq!((dep.id.as_str(), arr.id.as_str()), ("a-home", "a-office"));

        let (dep, arr) =
            AddressResolver::resolve_trip(&passenger, TripDirection::OfficeToHome, &catalog)
                .unwrap();
        assert_eq!((dep.id.as_str(), arr.id.as_str()), ("a-office", "a-home"));
    }

    #[test]
    fn test_explicit_selection_wins() {
        let mut passenger = alice();
        passenger.select(AddressRole::Departure, "a-gym");
        let catalog = AddressResolver::build_catalog(&passenger, &[]);

        let dep = AddressResolver::resolve_role(
            &passenger,
            AddressRole::Departure,
            TripDirection::HomeToOffice,
            &catalog,
        )
        .unwrap();
        assert_eq!(dep.id, "a-gym");
    }

    #[test]
    fn test_selection_may_point_at_organization_address() {
        let mut passenger = alice();
        passenger.select(AddressRole::Arrival, "branch-north");
        let org = branches();
        let catalog = AddressResolver::build_catalog(&passenger, &org);

        let arr = AddressResolver::resolve_role(
            &passenger,
            AddressRole::Arrival,
            TripDirection::HomeToOffice,
            &catalog,
        )
        .unwrap();
        assert_eq!(arr.formatted, "100 North Rd");
    }

    #[test]
    fn test_unknown_selection_falls_back_to_default() {
        let mut passenger = alice();
        passenger.select(AddressRole::Departure, "nowhere");
        let catalog = AddressResolver::build_catalog(&passenger, &[]);

        let dep = AddressResolver::resolve_role(
            &passenger,
            AddressRole::Departure,
            TripDirection::HomeToOffice,
            &catalog,
        )
        .unwrap();
        assert_eq!(dep.id, "a-home");
    }

    #[test]
    fn test_missing_default_is_error() {
        let mut passenger = Passenger::new("bob", "Bob")
            .with_address(Address::new("b-office", AddressKind::Office, "9 Main St"));
        passenger.select(AddressRole::Departure, "gone");
        let catalog = AddressResolver::build_catalog(&passenger, &[]);

        let err = AddressResolver::resolve_role(
            &passenger,
            AddressRole::Departure,
            TripDirection::HomeToOffice,
            &catalog,
        )
        .unwrap_err();
        assert_eq!(err.passenger_id, "bob");
        assert_eq!(err.role, AddressRole::Departure);
        assert_eq!(err.selected_id.as_deref(), Some("gone"));
    }

    #[test]
    fn test_default_keeps_kind_when_ids_collide() {
        let passenger = Passenger::new("carol", "Carol")
            .with_address(Address::new("dup", AddressKind::Home, "1 Home Rd"))
            .with_address(Address::new("dup", AddressKind::Custom, "2 Custom Rd"))
            .with_address(Address::new("c-office", AddressKind::Office, "9 Main St"));
        let catalog = AddressResolver::build_catalog(&passenger, &[]);

        let dep = AddressResolver::resolve_role(
            &passenger,
            AddressRole::Departure,
            TripDirection::HomeToOffice,
            &catalog,
        )
        .unwrap();
        assert_eq!(dep.kind, AddressKind::Home);
        assert_eq!(dep.formatted, "1 Home Rd");
    }
}
