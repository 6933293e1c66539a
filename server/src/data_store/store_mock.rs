use crate::auth_session::SessionToken;
use crate::data_store::auth_token::{AccessRole, Privilege};
use crate::data_store::models::{
    Apartment, ApartmentOccupancy, Event, EventStatus, Guest, NewEvent, NewGuest, Profile,
};
use crate::data_store::{
    ApartmentId, AuthToken, EventFilter, EventId, GlobalAuthToken, GuestFilter, GuestId,
    GuestOrder, GuestPlanStore, GuestPlanStoreFacade, StoreError, UserId,
};
use crate::occupancy;
use std::sync::Mutex;

/**
 * A mock [GuestPlanStore] implementation for testing.
 *
 * The simulated database consists of the [StoreMockData] structure with vectors of entities. These
 * can be directly modified by the tests.
 *
 * Access roles are derived from the mock data like the real database would do. The interface
 * functions check privileges, the event's lifecycle status and the apartments' capacities, so the
 * web layer can be tested against the same rules. In addition, the [StoreMockData.next_error]
 * attribute can be set to simulate a database error.
 */
#[derive(Default)]
pub struct StoreMock {
    pub data: Mutex<StoreMockData>,
}

impl GuestPlanStore for StoreMock {
    fn get_facade<'a>(&'a self) -> Result<Box<dyn GuestPlanStoreFacade + 'a>, StoreError> {
        Ok(Box::new(StoreMockFacade { store: self }))
    }
}

#[derive(Default)]
pub struct StoreMockData {
    pub events: Vec<Event>,
    /// (event_id, user_id) pairs of the event_members table
    pub members: Vec<(EventId, UserId)>,
    pub profiles: Vec<Profile>,
    pub apartments: Vec<Apartment>,
    pub guests: Vec<Guest>,
    /// If not none, the next call to a store facade method will return this error.
    pub next_error: Option<StoreError>,
}

impl StoreMockData {
    fn is_admin(&self, user_id: UserId) -> bool {
        self.profiles.iter().any(|p| p.id == user_id && p.is_admin)
    }

    fn event_mut(&mut self, event_id: EventId) -> Result<&mut Event, StoreError> {
        self.events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or(StoreError::NotExisting)
    }

    fn event_status(&self, event_id: EventId) -> Result<EventStatus, StoreError> {
        self.events
            .iter()
            .find(|e| e.id == event_id)
            .map(|e| e.status)
            .ok_or(StoreError::NotExisting)
    }

    fn check_apartment_capacity(
        &self,
        event_id: EventId,
        apartment_id: &str,
    ) -> Result<(), StoreError> {
        let apartment = self
            .apartments
            .iter()
            .find(|a| a.id == apartment_id)
            .ok_or_else(|| {
                StoreError::InvalidInputData(format!("Unknown apartment '{}'", apartment_id))
            })?;
        occupancy::ensure_capacity(
            apartment_id,
            apartment.capacity,
            self.guests_count(event_id, apartment_id),
        )
    }

    fn guests_count(&self, event_id: EventId, apartment_id: &str) -> i64 {
        self.guests
            .iter()
            .filter(|g| g.event_id == event_id && g.apartment_id.as_deref() == Some(apartment_id))
            .count() as i64
    }
}

struct StoreMockFacade<'a> {
    store: &'a StoreMock,
}

impl<'a> GuestPlanStoreFacade for StoreMockFacade<'a> {
    fn get_profile(&mut self, session_token: &SessionToken) -> Result<Profile, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        data.profiles
            .iter()
            .find(|p| p.id == session_token.user_id())
            .cloned()
            .ok_or(StoreError::NotExisting)
    }

    fn get_auth_token_for_session(
        &mut self,
        session_token: &SessionToken,
        event_id: EventId,
    ) -> Result<AuthToken, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let user_id = session_token.user_id();
        let mut roles = Vec::new();
        if data
            .events
            .iter()
            .any(|e| e.id == event_id && e.created_by == user_id)
        {
            roles.push(AccessRole::Owner);
        }
        if data.members.contains(&(event_id, user_id)) {
            roles.push(AccessRole::Member);
        }
        if data.is_admin(user_id) {
            roles.push(AccessRole::Admin);
        }
        Ok(AuthToken::create_for_session(event_id, user_id, roles))
    }

    fn get_global_auth_token_for_session(
        &mut self,
        session_token: &SessionToken,
    ) -> Result<GlobalAuthToken, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let roles = if data.is_admin(session_token.user_id()) {
            vec![AccessRole::Admin]
        } else {
            vec![]
        };
        Ok(GlobalAuthToken::create_for_session(roles))
    }

    fn get_events(
        &mut self,
        auth_token: &GlobalAuthToken,
        filter: EventFilter,
    ) -> Result<Vec<Event>, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        auth_token.check_privilege(Privilege::ListAllEvents)?;
        let mut result: Vec<Event> = data
            .events
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    fn get_own_event(&mut self, session_token: &SessionToken) -> Result<Option<Event>, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        let user_id = session_token.user_id();
        let owned = data
            .events
            .iter()
            .filter(|e| e.created_by == user_id)
            .max_by_key(|e| e.created_at);
        if let Some(event) = owned {
            return Ok(Some(event.clone()));
        }
        // The mock has no membership timestamps; the last inserted membership wins.
        Ok(data
            .members
            .iter()
            .rev()
            .filter(|(_, member)| *member == user_id)
            .find_map(|(event_id, _)| data.events.iter().find(|e| e.id == *event_id))
            .cloned())
    }

    fn get_event(&mut self, auth_token: &AuthToken, event_id: EventId) -> Result<Event, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        auth_token.check_privilege(event_id, Privilege::ShowGuestList)?;
        data.events
            .iter()
            .find(|e| e.id == event_id)
            .cloned()
            .ok_or(StoreError::NotExisting)
    }

    fn create_client_event(
        &mut self,
        auth_token: &GlobalAuthToken,
        event: NewEvent,
    ) -> Result<EventId, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        auth_token.check_privilege(Privilege::CreateEvents)?;
        if data.events.iter().any(|e| e.id == event.id) {
            return Err(StoreError::ConflictEntityExists);
        }
        data.members.push((event.id, event.created_by));
        data.events.push(Event {
            id: event.id,
            name: event.name,
            start_date: event.start_date,
            end_date: event.end_date,
            status: event.status,
            created_at: chrono::Utc::now(),
            created_by: event.created_by,
            submitted_at: None,
            submitted_by: None,
        });
        Ok(event.id)
    }

    fn update_profile_name(
        &mut self,
        auth_token: &GlobalAuthToken,
        user_id: UserId,
        full_name: &str,
    ) -> Result<(), StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        auth_token.check_privilege(Privilege::CreateEvents)?;
        let profile = data
            .profiles
            .iter_mut()
            .find(|p| p.id == user_id)
            .ok_or(StoreError::NotExisting)?;
        profile.full_name = Some(full_name.to_owned());
        Ok(())
    }

    fn submit_event(&mut self, auth_token: &AuthToken, event_id: EventId) -> Result<(), StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        auth_token.check_privilege(event_id, Privilege::SubmitGuestList)?;
        let event = data.event_mut(event_id)?;
        occupancy::ensure_guest_list_editable(event.status)?;
        event.status = EventStatus::Submitted;
        event.submitted_at = Some(chrono::Utc::now());
        event.submitted_by = auth_token.user_id();
        Ok(())
    }

    fn set_event_status(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
        status: EventStatus,
    ) -> Result<(), StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        auth_token.check_privilege(event_id, Privilege::ManageEventStatus)?;
        data.event_mut(event_id)?.status = status;
        Ok(())
    }

    fn get_apartment_occupancy(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
    ) -> Result<Vec<ApartmentOccupancy>, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        auth_token.check_privilege(event_id, Privilege::ShowGuestList)?;
        Ok(data
            .apartments
            .iter()
            .map(|a| ApartmentOccupancy {
                event_id,
                apartment_id: a.id.clone(),
                capacity: a.capacity,
                guests_count: data.guests_count(event_id, &a.id),
                structure: a.structure.clone(),
                floor: a.floor,
            })
            .collect())
    }

    fn get_guests(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
        filter: GuestFilter,
    ) -> Result<Vec<Guest>, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        auth_token.check_privilege(event_id, Privilege::ShowGuestList)?;
        let mut result: Vec<Guest> = data
            .guests
            .iter()
            .filter(|g| g.event_id == event_id && filter.matches(g))
            .cloned()
            .collect();
        match filter.order {
            GuestOrder::LastName => result.sort_by(|a, b| {
                (&a.last_name, &a.first_name).cmp(&(&b.last_name, &b.first_name))
            }),
            GuestOrder::CreatedAt => result.sort_by_key(|g| g.created_at),
        }
        if let Some(limit) = filter.limit {
            result.truncate(limit.max(0) as usize);
        }
        Ok(result)
    }

    fn get_guest(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
        guest_id: GuestId,
    ) -> Result<Guest, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        auth_token.check_privilege(event_id, Privilege::ShowGuestList)?;
        data.guests
            .iter()
            .find(|g| g.id == guest_id && g.event_id == event_id)
            .cloned()
            .ok_or(StoreError::NotExisting)
    }

    fn create_guest(&mut self, auth_token: &AuthToken, guest: NewGuest) -> Result<(), StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        auth_token.check_privilege(guest.event_id, Privilege::EditGuestList)?;
        guest
            .check_consistency()
            .map_err(StoreError::InvalidInputData)?;
        occupancy::ensure_guest_list_editable(data.event_status(guest.event_id)?)?;
        if let Some(apartment_id) = &guest.apartment_id {
            data.check_apartment_capacity(guest.event_id, apartment_id)?;
        }
        if data.guests.iter().any(|g| g.id == guest.id) {
            return Err(StoreError::ConflictEntityExists);
        }
        data.guests.push(guest.into_guest(chrono::Utc::now()));
        Ok(())
    }

    fn assign_guest(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
        guest_id: GuestId,
        apartment_id: Option<ApartmentId>,
    ) -> Result<(), StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        auth_token.check_privilege(event_id, Privilege::EditGuestList)?;
        occupancy::ensure_guest_list_editable(data.event_status(event_id)?)?;
        let current = data
            .guests
            .iter()
            .find(|g| g.id == guest_id && g.event_id == event_id)
            .map(|g| g.apartment_id.clone())
            .ok_or(StoreError::NotExisting)?;
        if current == apartment_id {
            return Ok(());
        }
        if let Some(target) = &apartment_id {
            data.check_apartment_capacity(event_id, target)?;
        }
        if let Some(guest) = data.guests.iter_mut().find(|g| g.id == guest_id) {
            guest.apartment_id = apartment_id;
        }
        Ok(())
    }

    fn delete_guest(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
        guest_id: GuestId,
    ) -> Result<(), StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        auth_token.check_privilege(event_id, Privilege::EditGuestList)?;
        occupancy::ensure_guest_list_editable(data.event_status(event_id)?)?;
        let count_before = data.guests.len();
        data.guests
            .retain(|g| !(g.id == guest_id && g.event_id == event_id));
        if data.guests.len() == count_before {
            return Err(StoreError::NotExisting);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_store::models::GuestType;
    use uuid::Uuid;

    fn setup() -> (StoreMock, EventId, SessionToken) {
        let owner = Uuid::now_v7();
        let event_id = Uuid::now_v7();
        let store = StoreMock::default();
        {
            let mut data = store.data.lock().unwrap();
            data.events.push(Event {
                id: event_id,
                name: "Anna & Marco".to_owned(),
                start_date: None,
                end_date: None,
                status: EventStatus::Draft,
                created_at: chrono::Utc::now(),
                created_by: owner,
                submitted_at: None,
                submitted_by: None,
            });
            data.apartments.push(Apartment {
                id: "apt_1".to_owned(),
                structure: "Lakehouse".to_owned(),
                floor: 0,
                capacity: 1,
            });
        }
        (store, event_id, SessionToken::new(owner))
    }

    fn new_guest(event_id: EventId, apartment_id: Option<&str>) -> NewGuest {
        NewGuest {
            id: Uuid::now_v7(),
            event_id,
            apartment_id: apartment_id.map(|a| a.to_owned()),
            first_name: "Anna".to_owned(),
            last_name: "Rossi".to_owned(),
            guest_type: GuestType::Adult,
            child_age: None,
            arrival_mode: None,
            checkin_date: None,
            checkout_date: None,
            extra_nights: 0,
            allergies: None,
            notes: None,
        }
    }

    #[test]
    fn test_capacity_and_lock_gates() {
        let (store, event_id, session) = setup();
        let mut facade = store.get_facade().unwrap();
        let auth = facade
            .get_auth_token_for_session(&session, event_id)
            .unwrap();

        facade
            .create_guest(&auth, new_guest(event_id, Some("apt_1")))
            .unwrap();
        assert!(matches!(
            facade.create_guest(&auth, new_guest(event_id, Some("apt_1"))),
            Err(StoreError::ApartmentFull { .. })
        ));

        let unassigned = new_guest(event_id, None);
        let unassigned_id = unassigned.id;
        facade.create_guest(&auth, unassigned).unwrap();
        assert!(matches!(
            facade.assign_guest(&auth, event_id, unassigned_id, Some("apt_1".to_owned())),
            Err(StoreError::ApartmentFull { .. })
        ));

        facade.submit_event(&auth, event_id).unwrap();
        assert!(matches!(
            facade.delete_guest(&auth, event_id, unassigned_id),
            Err(StoreError::EventLocked {
                status: EventStatus::Submitted
            })
        ));
        assert!(matches!(
            facade.submit_event(&auth, event_id),
            Err(StoreError::EventLocked { .. })
        ));
    }

    #[test]
    fn test_locked_event_rejects_guest_changes() {
        let (store, event_id, session) = setup();
        let mut facade = store.get_facade().unwrap();
        let auth = facade
            .get_auth_token_for_session(&session, event_id)
            .unwrap();
        let assigned = new_guest(event_id, Some("apt_1"));
        let assigned_id = assigned.id;
        facade.create_guest(&auth, assigned).unwrap();
        facade.submit_event(&auth, event_id).unwrap();

        assert!(matches!(
            facade.create_guest(&auth, new_guest(event_id, None)),
            Err(StoreError::EventLocked {
                status: EventStatus::Submitted
            })
        ));
        assert!(matches!(
            facade.assign_guest(&auth, event_id, assigned_id, None),
            Err(StoreError::EventLocked {
                status: EventStatus::Submitted
            })
        ));
        assert!(matches!(
            facade.assign_guest(&auth, event_id, assigned_id, Some("apt_1".to_owned())),
            Err(StoreError::EventLocked {
                status: EventStatus::Submitted
            })
        ));

        let data = store.data.lock().unwrap();
        assert_eq!(data.guests.len(), 1);
        assert_eq!(data.guests[0].apartment_id.as_deref(), Some("apt_1"));
    }

    #[test]
    fn test_reassign_to_own_full_apartment_is_noop() {
        let (store, event_id, session) = setup();
        let mut facade = store.get_facade().unwrap();
        let auth = facade
            .get_auth_token_for_session(&session, event_id)
            .unwrap();
        let guest = new_guest(event_id, Some("apt_1"));
        let guest_id = guest.id;
        facade.create_guest(&auth, guest).unwrap();

        facade
            .assign_guest(&auth, event_id, guest_id, Some("apt_1".to_owned()))
            .unwrap();
        let data = store.data.lock().unwrap();
        assert_eq!(data.guests[0].apartment_id.as_deref(), Some("apt_1"));
    }

    #[test]
    fn test_stranger_has_no_access() {
        let (store, event_id, _) = setup();
        let mut facade = store.get_facade().unwrap();
        let auth = facade
            .get_auth_token_for_session(&SessionToken::new(Uuid::now_v7()), event_id)
            .unwrap();
        assert!(matches!(
            facade.get_event(&auth, event_id),
            Err(StoreError::PermissionDenied { .. })
        ));
    }
}
