//! Apartment occupancy: deriving the free/partial/full status from capacity and guest count and
//! gating guest assignments
//!
//! The gate functions [ensure_guest_list_editable] and [ensure_capacity] are used by all data
//! store implementations within their mutation transactions, so the rules are enforced at one
//! place, whatever the user interface has shown before.

use crate::data_store::models::{ApartmentOccupancy, EventStatus};
use crate::data_store::StoreError;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccupancyStatus {
    Free,
    Partial,
    Full,
}

impl OccupancyStatus {
    /// Classify an apartment with the given capacity and current number of assigned guests.
    pub fn of(capacity: i32, guests: i64) -> Self {
        if guests <= 0 {
            Self::Free
        } else if guests >= capacity as i64 {
            Self::Full
        } else {
            Self::Partial
        }
    }

    /// CSS class name, used for colouring the floor plan and status badges
    pub fn css_class(&self) -> &'static str {
        match self {
            OccupancyStatus::Free => "free",
            OccupancyStatus::Partial => "partial",
            OccupancyStatus::Full => "full",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OccupancyStatus::Free => "Free",
            OccupancyStatus::Partial => "Partially occupied",
            OccupancyStatus::Full => "Full",
        }
    }
}

impl From<OccupancyStatus> for villa_planner_api_types::OccupancyStatus {
    fn from(value: OccupancyStatus) -> Self {
        match value {
            OccupancyStatus::Free => Self::Free,
            OccupancyStatus::Partial => Self::Partial,
            OccupancyStatus::Full => Self::Full,
        }
    }
}

/// Reject any guest mutation if the event's guest list is not a draft anymore.
pub fn ensure_guest_list_editable(status: EventStatus) -> Result<(), StoreError> {
    if status == EventStatus::Draft {
        Ok(())
    } else {
        Err(StoreError::EventLocked { status })
    }
}

/// Reject assigning one more guest to an apartment that has reached its capacity.
pub fn ensure_capacity(apartment_id: &str, capacity: i32, guests: i64) -> Result<(), StoreError> {
    if guests >= capacity as i64 {
        Err(StoreError::ApartmentFull {
            apartment_id: apartment_id.to_owned(),
            capacity,
        })
    } else {
        Ok(())
    }
}

/// Human readable name of an apartment
pub fn apartment_label(apartment_id: &str) -> String {
    if apartment_id == "apt_wc" {
        "Woodcutter's House".to_owned()
    } else {
        format!(
            "Apartment {}",
            apartment_id.strip_prefix("apt_").unwrap_or(apartment_id)
        )
    }
}

impl ApartmentOccupancy {
    pub fn status(&self) -> OccupancyStatus {
        OccupancyStatus::of(self.capacity, self.guests_count)
    }

    pub fn label(&self) -> String {
        apartment_label(&self.apartment_id)
    }

    /// Whether one more guest may be assigned to the apartment
    pub fn has_free_bed(&self) -> bool {
        self.guests_count < self.capacity as i64
    }

    /// Label for apartment select boxes, e.g. "Lakehouse • Apartment 3 • 2/4"
    pub fn option_label(&self) -> String {
        let mut label = format!(
            "{} • {} • {}/{}",
            self.structure,
            self.label(),
            self.guests_count,
            self.capacity
        );
        if !self.has_free_bed() {
            label.push_str(" • FULL");
        }
        label
    }
}

impl From<ApartmentOccupancy> for villa_planner_api_types::ApartmentOccupancy {
    fn from(value: ApartmentOccupancy) -> Self {
        Self {
            label: value.label(),
            status: value.status().into(),
            apartment_id: value.apartment_id,
            structure: value.structure,
            floor: value.floor,
            capacity: value.capacity,
            guests_count: value.guests_count,
        }
    }
}

/// The occupancy of all apartments of one event, in display order (structure, floor, apartment id)
#[derive(Debug, Clone)]
pub struct OccupancyMap {
    apartments: Vec<ApartmentOccupancy>,
    index: HashMap<String, usize>,
}

impl OccupancyMap {
    pub fn new(mut apartments: Vec<ApartmentOccupancy>) -> Self {
        apartments.sort_by(|a, b| {
            a.structure
                .cmp(&b.structure)
                .then(a.floor.cmp(&b.floor))
                .then(a.apartment_id.cmp(&b.apartment_id))
        });
        let index = apartments
            .iter()
            .enumerate()
            .map(|(i, a)| (a.apartment_id.clone(), i))
            .collect();
        Self { apartments, index }
    }

    pub fn get(&self, apartment_id: &str) -> Option<&ApartmentOccupancy> {
        self.index.get(apartment_id).map(|i| &self.apartments[*i])
    }

    /// Status of the apartment. Apartments without occupancy information are reported as free.
    pub fn status_of(&self, apartment_id: &str) -> OccupancyStatus {
        self.get(apartment_id)
            .map(|a| a.status())
            .unwrap_or(OccupancyStatus::Free)
    }

    /// Pre-check for assigning a guest to the apartment, based on the occupancy data at hand.
    ///
    /// The authoritative check happens in the data store's transaction.
    pub fn check_assignable(&self, apartment_id: &str) -> Result<(), StoreError> {
        match self.get(apartment_id) {
            Some(a) => ensure_capacity(&a.apartment_id, a.capacity, a.guests_count),
            None => Ok(()),
        }
    }

    /// The first apartment (in display order) that can take one more guest. Used as the default
    /// choice when assigning unassigned guests.
    pub fn first_assignable(&self) -> Option<&ApartmentOccupancy> {
        self.apartments
            .iter()
            .find(|a| a.has_free_bed())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ApartmentOccupancy> {
        self.apartments.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.apartments.is_empty()
    }

    /// Total number of guests assigned to any apartment
    pub fn assigned_guests(&self) -> i64 {
        self.apartments.iter().map(|a| a.guests_count).sum()
    }

    pub fn total_capacity(&self) -> i64 {
        self.apartments.iter().map(|a| a.capacity as i64).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occupancy(
        apartment_id: &str,
        structure: &str,
        floor: i32,
        capacity: i32,
        guests: i64,
    ) -> ApartmentOccupancy {
        ApartmentOccupancy {
            event_id: uuid::Uuid::nil(),
            apartment_id: apartment_id.to_owned(),
            capacity,
            guests_count: guests,
            structure: structure.to_owned(),
            floor,
        }
    }

    #[test]
    fn test_status_boundaries() {
        assert_eq!(OccupancyStatus::of(4, 0), OccupancyStatus::Free);
        assert_eq!(OccupancyStatus::of(4, 1), OccupancyStatus::Partial);
        assert_eq!(OccupancyStatus::of(4, 3), OccupancyStatus::Partial);
        assert_eq!(OccupancyStatus::of(4, 4), OccupancyStatus::Full);
        assert_eq!(OccupancyStatus::of(4, 5), OccupancyStatus::Full);
        // Inconsistent data from the database must not yield a negative "partial" state
        assert_eq!(OccupancyStatus::of(4, -1), OccupancyStatus::Free);
        assert_eq!(OccupancyStatus::of(0, 0), OccupancyStatus::Free);
    }

    #[test]
    fn test_ensure_capacity() {
        assert!(ensure_capacity("apt_1", 2, 0).is_ok());
        assert!(ensure_capacity("apt_1", 2, 1).is_ok());
        assert!(matches!(
            ensure_capacity("apt_1", 2, 2),
            Err(StoreError::ApartmentFull { capacity: 2, ref apartment_id }) if apartment_id == "apt_1"
        ));
        assert!(ensure_capacity("apt_1", 2, 3).is_err());
        // An apartment without beds never takes a guest
        assert!(ensure_capacity("apt_1", 0, 0).is_err());
    }

    #[test]
    fn test_apartment_without_capacity() {
        let closed = occupancy("apt_3", "Lakehouse", 0, 0, 0);
        assert_eq!(closed.status(), OccupancyStatus::Free);
        assert!(!closed.has_free_bed());
        assert!(closed.option_label().ends_with("FULL"));
        let map = OccupancyMap::new(vec![closed, occupancy("apt_4", "Lakehouse", 0, 2, 1)]);
        assert!(map.check_assignable("apt_3").is_err());
        assert_eq!(
            map.first_assignable().map(|a| a.apartment_id.as_str()),
            Some("apt_4")
        );
    }

    #[test]
    fn test_ensure_guest_list_editable() {
        assert!(ensure_guest_list_editable(EventStatus::Draft).is_ok());
        assert!(matches!(
            ensure_guest_list_editable(EventStatus::Submitted),
            Err(StoreError::EventLocked {
                status: EventStatus::Submitted
            })
        ));
        assert!(ensure_guest_list_editable(EventStatus::Final).is_err());
    }

    #[test]
    fn test_apartment_labels() {
        assert_eq!(apartment_label("apt_wc"), "Woodcutter's House");
        assert_eq!(apartment_label("apt_12"), "Apartment 12");
        let full = occupancy("apt_3", "Lakehouse", 1, 2, 2);
        assert_eq!(full.option_label(), "Lakehouse • Apartment 3 • 2/2 • FULL");
        let partial = occupancy("apt_4", "Lakehouse", 1, 4, 1);
        assert_eq!(partial.option_label(), "Lakehouse • Apartment 4 • 1/4");
    }

    #[test]
    fn test_occupancy_map_order_and_default_choice() {
        let map = OccupancyMap::new(vec![
            occupancy("apt_wc", "Woodcutter", 0, 6, 0),
            occupancy("apt_5", "Lakehouse", 1, 4, 1),
            occupancy("apt_2", "Lakehouse", 0, 2, 2),
            occupancy("apt_1", "Lakehouse", 0, 3, 3),
        ]);
        let order: Vec<&str> = map.iter().map(|a| a.apartment_id.as_str()).collect();
        assert_eq!(order, vec!["apt_1", "apt_2", "apt_5", "apt_wc"]);
        assert_eq!(map.first_assignable().unwrap().apartment_id, "apt_5");
        assert!(map.check_assignable("apt_1").is_err());
        assert!(map.check_assignable("apt_5").is_ok());
        assert!(map.check_assignable("apt_unknown").is_ok());
        assert_eq!(map.status_of("apt_2"), OccupancyStatus::Full);
        assert_eq!(map.status_of("apt_wc"), OccupancyStatus::Free);
        assert_eq!(map.status_of("apt_unknown"), OccupancyStatus::Free);
        assert_eq!(map.assigned_guests(), 6);
        assert_eq!(map.total_capacity(), 15);
    }

    #[test]
    fn test_no_assignable_apartment() {
        let map = OccupancyMap::new(vec![occupancy("apt_1", "Lakehouse", 0, 1, 1)]);
        assert!(map.first_assignable().is_none());
    }
}
