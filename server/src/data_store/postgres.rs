use super::{
    models, schema, ApartmentFilter, ApartmentId, EventFilter, EventId, GuestFilter, GuestId,
    GuestOrder, GuestPlanStore, GuestPlanStoreFacade, StoreError, UserId,
};
use crate::auth_session::SessionToken;
use crate::data_store::auth_token::{AccessRole, AuthToken, GlobalAuthToken, Privilege};
use crate::data_store::models::EventStatus;
use crate::occupancy;
use diesel::dsl::exists;
use diesel::pg::PgConnection;
use diesel::prelude::*;

#[derive(Clone)]
pub struct PgDataStore {
    pool: diesel::r2d2::Pool<diesel::r2d2::ConnectionManager<PgConnection>>,
}

impl PgDataStore {
    pub fn new(database_url: &str) -> Result<Self, StoreError> {
        let connection_manager = diesel::r2d2::ConnectionManager::<PgConnection>::new(database_url);
        Ok(Self {
            pool: diesel::r2d2::Pool::builder()
                .test_on_check_out(true)
                .min_idle(Some(2))
                .build(connection_manager)?,
        })
    }
}

impl GuestPlanStore for PgDataStore {
    fn get_facade<'a>(&'a self) -> Result<Box<dyn GuestPlanStoreFacade + 'a>, StoreError> {
        Ok(Box::new(PgDataStoreFacade::with_pooled_connection(
            self.pool.get()?,
        )))
    }
}

pub struct PgDataStoreFacade {
    connection: diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<PgConnection>>,
}

impl PgDataStoreFacade {
    pub fn with_pooled_connection(
        connection: diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<PgConnection>>,
    ) -> Self {
        Self { connection }
    }
}

/// Build an ILIKE pattern for a substring search, escaping the LIKE wildcard characters in the
/// search string.
fn substring_like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Get the status of the event and lock the event's row until the end of the current transaction.
///
/// All guest mutations take this lock first, so capacity checks and status checks of concurrent
/// transactions for the same event are serialized.
fn lock_event_status(
    connection: &mut PgConnection,
    the_event_id: EventId,
) -> Result<EventStatus, StoreError> {
    use schema::events::dsl::*;

    Ok(events
        .filter(id.eq(the_event_id))
        .select(status)
        .for_update()
        .first::<EventStatus>(connection)?)
}

/// Check that one more guest of the event fits into the apartment
fn check_apartment_capacity(
    connection: &mut PgConnection,
    the_event_id: EventId,
    the_apartment_id: &str,
) -> Result<(), StoreError> {
    let apartment = schema::apartments::table
        .filter(schema::apartments::id.eq(the_apartment_id))
        .select(models::Apartment::as_select())
        .first::<models::Apartment>(connection)
        .optional()?
        .ok_or_else(|| {
            StoreError::InvalidInputData(format!("Unknown apartment '{}'", the_apartment_id))
        })?;
    let guests_count: i64 = schema::guests::table
        .filter(schema::guests::event_id.eq(the_event_id))
        .filter(schema::guests::apartment_id.eq(the_apartment_id))
        .count()
        .get_result(connection)?;
    occupancy::ensure_capacity(&apartment.id, apartment.capacity, guests_count)
}

fn is_admin(connection: &mut PgConnection, user_id: UserId) -> Result<bool, StoreError> {
    use schema::profiles::dsl::*;

    Ok(profiles
        .filter(id.eq(user_id))
        .select(is_admin)
        .first::<bool>(connection)
        .optional()?
        .unwrap_or(false))
}

impl GuestPlanStoreFacade for PgDataStoreFacade {
    fn get_profile(&mut self, session_token: &SessionToken) -> Result<models::Profile, StoreError> {
        use schema::profiles::dsl::*;

        profiles
            .filter(id.eq(session_token.user_id()))
            .select(models::Profile::as_select())
            .first::<models::Profile>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn get_auth_token_for_session(
        &mut self,
        session_token: &SessionToken,
        the_event_id: EventId,
    ) -> Result<AuthToken, StoreError> {
        let user_id = session_token.user_id();
        let connection = &mut self.connection;

        let mut roles = Vec::new();
        let is_owner: bool = diesel::select(exists(
            schema::events::table
                .filter(schema::events::id.eq(the_event_id))
                .filter(schema::events::created_by.eq(user_id)),
        ))
        .get_result(connection)?;
        if is_owner {
            roles.push(AccessRole::Owner);
        }
        let is_member: bool = diesel::select(exists(
            schema::event_members::table
                .filter(schema::event_members::event_id.eq(the_event_id))
                .filter(schema::event_members::user_id.eq(user_id)),
        ))
        .get_result(connection)?;
        if is_member {
            roles.push(AccessRole::Member);
        }
        if is_admin(connection, user_id)? {
            roles.push(AccessRole::Admin);
        }
        Ok(AuthToken::create_for_session(the_event_id, user_id, roles))
    }

    fn get_global_auth_token_for_session(
        &mut self,
        session_token: &SessionToken,
    ) -> Result<GlobalAuthToken, StoreError> {
        let roles = if is_admin(&mut self.connection, session_token.user_id())? {
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
    ) -> Result<Vec<models::Event>, StoreError> {
        use schema::events::dsl::*;
        auth_token.check_privilege(Privilege::ListAllEvents)?;

        let mut query = events.select(models::Event::as_select()).into_boxed();
        if let Some(the_status) = filter.status {
            query = query.filter(status.eq(the_status));
        }
        if let Some(search) = filter.name_contains {
            query = query.filter(name.ilike(substring_like_pattern(&search)));
        }
        query
            .order_by((created_at.desc(), id.asc()))
            .load::<models::Event>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn get_own_event(
        &mut self,
        session_token: &SessionToken,
    ) -> Result<Option<models::Event>, StoreError> {
        let user_id = session_token.user_id();
        let connection = &mut self.connection;

        let owned_event = schema::events::table
            .filter(schema::events::created_by.eq(user_id))
            .order_by(schema::events::created_at.desc())
            .select(models::Event::as_select())
            .first::<models::Event>(connection)
            .optional()?;
        if owned_event.is_some() {
            return Ok(owned_event);
        }

        Ok(schema::event_members::table
            .inner_join(schema::events::table)
            .filter(schema::event_members::user_id.eq(user_id))
            .order_by(schema::event_members::created_at.desc())
            .select(models::Event::as_select())
            .first::<models::Event>(connection)
            .optional()?)
    }

    fn get_event(
        &mut self,
        auth_token: &AuthToken,
        the_event_id: EventId,
    ) -> Result<models::Event, StoreError> {
        use schema::events::dsl::*;
        auth_token.check_privilege(the_event_id, Privilege::ShowGuestList)?;

        events
            .filter(id.eq(the_event_id))
            .select(models::Event::as_select())
            .first::<models::Event>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn create_client_event(
        &mut self,
        auth_token: &GlobalAuthToken,
        event: models::NewEvent,
    ) -> Result<EventId, StoreError> {
        auth_token.check_privilege(Privilege::CreateEvents)?;

        self.connection.transaction(|connection| {
            let new_event_id = diesel::insert_into(schema::events::table)
                .values(&event)
                .returning(schema::events::id)
                .get_result::<EventId>(connection)?;
            diesel::insert_into(schema::event_members::table)
                .values(&models::NewEventMember {
                    event_id: new_event_id,
                    user_id: event.created_by,
                    role: models::EVENT_MEMBER_ROLE_CLIENT.to_owned(),
                })
                .execute(connection)?;
            Ok(new_event_id)
        })
    }

    fn update_profile_name(
        &mut self,
        auth_token: &GlobalAuthToken,
        user_id: UserId,
        the_full_name: &str,
    ) -> Result<(), StoreError> {
        use schema::profiles::dsl::*;
        auth_token.check_privilege(Privilege::CreateEvents)?;

        let count = diesel::update(profiles)
            .filter(id.eq(user_id))
            .set(full_name.eq(Some(the_full_name)))
            .execute(&mut self.connection)?;
        if count == 0 {
            return Err(StoreError::NotExisting);
        }
        Ok(())
    }

    fn submit_event(
        &mut self,
        auth_token: &AuthToken,
        the_event_id: EventId,
    ) -> Result<(), StoreError> {
        use schema::events::dsl::*;
        auth_token.check_privilege(the_event_id, Privilege::SubmitGuestList)?;

        self.connection.transaction(|connection| {
            occupancy::ensure_guest_list_editable(lock_event_status(connection, the_event_id)?)?;
            diesel::update(events)
                .filter(id.eq(the_event_id))
                .set((
                    status.eq(EventStatus::Submitted),
                    submitted_at.eq(Some(chrono::Utc::now())),
                    submitted_by.eq(auth_token.user_id()),
                ))
                .execute(connection)?;
            Ok(())
        })
    }

    fn set_event_status(
        &mut self,
        auth_token: &AuthToken,
        the_event_id: EventId,
        new_status: EventStatus,
    ) -> Result<(), StoreError> {
        use schema::events::dsl::*;
        auth_token.check_privilege(the_event_id, Privilege::ManageEventStatus)?;

        let count = diesel::update(events)
            .filter(id.eq(the_event_id))
            .set(status.eq(new_status))
            .execute(&mut self.connection)?;
        if count == 0 {
            return Err(StoreError::NotExisting);
        }
        Ok(())
    }

    fn get_apartment_occupancy(
        &mut self,
        auth_token: &AuthToken,
        the_event_id: EventId,
    ) -> Result<Vec<models::ApartmentOccupancy>, StoreError> {
        use schema::apartment_occupancy::dsl::*;
        auth_token.check_privilege(the_event_id, Privilege::ShowGuestList)?;

        apartment_occupancy
            .filter(event_id.eq(the_event_id))
            .order_by((structure.asc(), floor.asc(), apartment_id.asc()))
            .select(models::ApartmentOccupancy::as_select())
            .load::<models::ApartmentOccupancy>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn get_guests(
        &mut self,
        auth_token: &AuthToken,
        the_event_id: EventId,
        filter: GuestFilter,
    ) -> Result<Vec<models::Guest>, StoreError> {
        use schema::guests::dsl::*;
        auth_token.check_privilege(the_event_id, Privilege::ShowGuestList)?;

        let mut query = guests
            .filter(event_id.eq(the_event_id))
            .select(models::Guest::as_select())
            .into_boxed();
        match filter.apartment {
            ApartmentFilter::Any => {}
            ApartmentFilter::Unassigned => {
                query = query.filter(apartment_id.is_null());
            }
            ApartmentFilter::Apartment(the_apartment_id) => {
                query = query.filter(apartment_id.eq(the_apartment_id));
            }
        }
        if let Some(search) = filter.name_contains {
            let pattern = substring_like_pattern(&search);
            query = query.filter(first_name.ilike(pattern.clone()).or(last_name.ilike(pattern)));
        }
        query = match filter.order {
            GuestOrder::LastName => query.order_by((last_name.asc(), first_name.asc(), id.asc())),
            GuestOrder::CreatedAt => query.order_by((created_at.asc(), id.asc())),
        };
        if let Some(max_count) = filter.limit {
            query = query.limit(max_count);
        }
        query
            .load::<models::Guest>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn get_guest(
        &mut self,
        auth_token: &AuthToken,
        the_event_id: EventId,
        guest_id: GuestId,
    ) -> Result<models::Guest, StoreError> {
        use schema::guests::dsl::*;
        auth_token.check_privilege(the_event_id, Privilege::ShowGuestList)?;

        guests
            .filter(id.eq(guest_id))
            .filter(event_id.eq(the_event_id))
            .select(models::Guest::as_select())
            .first::<models::Guest>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn create_guest(
        &mut self,
        auth_token: &AuthToken,
        guest: models::NewGuest,
    ) -> Result<(), StoreError> {
        auth_token.check_privilege(guest.event_id, Privilege::EditGuestList)?;
        guest
            .check_consistency()
            .map_err(StoreError::InvalidInputData)?;

        self.connection.transaction(|connection| {
            occupancy::ensure_guest_list_editable(lock_event_status(connection, guest.event_id)?)?;
            if let Some(the_apartment_id) = &guest.apartment_id {
                check_apartment_capacity(connection, guest.event_id, the_apartment_id)?;
            }
            diesel::insert_into(schema::guests::table)
                .values(&guest)
                .execute(connection)?;
            Ok(())
        })
    }

    fn assign_guest(
        &mut self,
        auth_token: &AuthToken,
        the_event_id: EventId,
        guest_id: GuestId,
        new_apartment_id: Option<ApartmentId>,
    ) -> Result<(), StoreError> {
        use schema::guests::dsl::*;
        auth_token.check_privilege(the_event_id, Privilege::EditGuestList)?;

        self.connection.transaction(|connection| {
            occupancy::ensure_guest_list_editable(lock_event_status(connection, the_event_id)?)?;
            let current_apartment_id = guests
                .filter(id.eq(guest_id))
                .filter(event_id.eq(the_event_id))
                .select(apartment_id)
                .first::<Option<String>>(connection)?;
            if current_apartment_id == new_apartment_id {
                return Ok(());
            }
            if let Some(target) = &new_apartment_id {
                check_apartment_capacity(connection, the_event_id, target)?;
            }
            diesel::update(guests)
                .filter(id.eq(guest_id))
                .filter(event_id.eq(the_event_id))
                .set(apartment_id.eq(new_apartment_id))
                .execute(connection)?;
            Ok(())
        })
    }

    fn delete_guest(
        &mut self,
        auth_token: &AuthToken,
        the_event_id: EventId,
        guest_id: GuestId,
    ) -> Result<(), StoreError> {
        use schema::guests::dsl::*;
        auth_token.check_privilege(the_event_id, Privilege::EditGuestList)?;

        self.connection.transaction(|connection| {
            occupancy::ensure_guest_list_editable(lock_event_status(connection, the_event_id)?)?;
            let count = diesel::delete(guests)
                .filter(id.eq(guest_id))
                .filter(event_id.eq(the_event_id))
                .execute(connection)?;
            if count == 0 {
                return Err(StoreError::NotExisting);
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::substring_like_pattern;

    #[test]
    fn test_substring_like_pattern_escapes_wildcards() {
        assert_eq!(substring_like_pattern("ros"), "%ros%");
        assert_eq!(substring_like_pattern("50%_x"), "%50\\%\\_x%");
        assert_eq!(substring_like_pattern("a\\b"), "%a\\\\b%");
    }
}
