//! The database interface
//!
//! The primary entry point to this module is the function [get_store_from_env], which returns an
//! object implementing the [GuestPlanStore] trait. This object can be shared between threads in a
//! global application state and be used to create [GuestPlanStoreFacade] instances for
//! interaction with the database. These provide a CRUD-like interface, using the data models from
//! the [models] module.
//!
//! The database belongs to the managed backend platform. We only read and write the rows of its
//! tables; the schema is migrated by the platform. Authorization is checked here, in each facade
//! method, using the [AuthToken] and [GlobalAuthToken] types. Guest mutations are additionally
//! checked against the event's lifecycle status and the apartments' capacities within one database
//! transaction.
//!
//! The primary implementation of [GuestPlanStore] ([postgres::PgDataStore]) wraps a PostgreSQL
//! connection pool. There is also a mock implementation for unittests.

use crate::auth_session::SessionToken;
use crate::cli_error::CliError;
use crate::data_store::auth_token::Privilege;
use crate::data_store::models::EventStatus;
use crate::setup;
use auth_token::{AuthToken, GlobalAuthToken};
use std::fmt::Debug;

pub mod auth_token;
pub mod models;
mod postgres;
mod schema;
#[cfg(test)]
pub mod store_mock;
mod util;

/// Get a [GuestPlanStore] instance, according the "DATABASE_URL" environment variable.
///
/// The DATABASE_URL must be a PosgreSQL connection url of the managed backend's database,
/// following the schema "postgres://{user}:{password}@{host}/{database}".
pub fn get_store_from_env() -> Result<impl GuestPlanStore, CliError> {
    Ok(postgres::PgDataStore::new(
        &setup::get_database_url_from_env()?,
    )?)
}

pub type EventId = uuid::Uuid;
pub type GuestId = uuid::Uuid;
pub type UserId = uuid::Uuid;
pub type ApartmentId = String;

pub trait GuestPlanStoreFacade {
    /// Get the profile of the user of the given session.
    ///
    /// Returns [StoreError::NotExisting] if the user has no profile (e.g. the account has been
    /// deleted in the meantime).
    fn get_profile(&mut self, session_token: &SessionToken) -> Result<models::Profile, StoreError>;

    /// Get an [AuthToken] instance for the user of the given session, representing the user's
    /// access roles for the given event
    fn get_auth_token_for_session(
        &mut self,
        session_token: &SessionToken,
        event_id: EventId,
    ) -> Result<AuthToken, StoreError>;

    /// Get a [GlobalAuthToken] instance for the user of the given session
    fn get_global_auth_token_for_session(
        &mut self,
        session_token: &SessionToken,
    ) -> Result<GlobalAuthToken, StoreError>;

    /// Get a filtered list of all events, newest first
    fn get_events(
        &mut self,
        auth_token: &GlobalAuthToken,
        filter: EventFilter,
    ) -> Result<Vec<models::Event>, StoreError>;

    /// Get the event of the client of the given session: the most recently created event, the user
    /// owns, or else the event of the user's most recent event membership.
    fn get_own_event(
        &mut self,
        session_token: &SessionToken,
    ) -> Result<Option<models::Event>, StoreError>;

    fn get_event(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
    ) -> Result<models::Event, StoreError>;

    /// Create a new event for a client and register the client as member of the event, atomically.
    fn create_client_event(
        &mut self,
        auth_token: &GlobalAuthToken,
        event: models::NewEvent,
    ) -> Result<EventId, StoreError>;

    /// Set the full name in the profile of the given user (typically a newly created client).
    fn update_profile_name(
        &mut self,
        auth_token: &GlobalAuthToken,
        user_id: UserId,
        full_name: &str,
    ) -> Result<(), StoreError>;

    /// Submit the guest list of the event: the status changes from draft to submitted and the
    /// submitting user and time are recorded.
    ///
    /// Returns [StoreError::EventLocked] if the event is not in draft status.
    fn submit_event(&mut self, auth_token: &AuthToken, event_id: EventId)
        -> Result<(), StoreError>;

    /// Administrative change of the event's lifecycle status (in any direction)
    fn set_event_status(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
        status: EventStatus,
    ) -> Result<(), StoreError>;

    /// Get the occupancy of all apartments for the event
    fn get_apartment_occupancy(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
    ) -> Result<Vec<models::ApartmentOccupancy>, StoreError>;

    /// Get a filtered list of the guests of the event
    fn get_guests(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
        filter: GuestFilter,
    ) -> Result<Vec<models::Guest>, StoreError>;

    fn get_guest(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
        guest_id: GuestId,
    ) -> Result<models::Guest, StoreError>;

    /// Add a new guest to the event's guest list, optionally assigned to an apartment.
    ///
    /// # errors
    /// - [StoreError::EventLocked] if the event is not in draft status
    /// - [StoreError::ApartmentFull] if the guest shall be assigned to an apartment which has
    ///   reached its capacity
    /// - [StoreError::InvalidInputData] if the guest's data is inconsistent
    fn create_guest(&mut self, auth_token: &AuthToken, guest: models::NewGuest)
        -> Result<(), StoreError>;

    /// Move a guest to another apartment (`Some`) or make them unassigned (`None`).
    ///
    /// Assigning a guest to the apartment they are already assigned to is a no-op and succeeds.
    ///
    /// # errors
    /// - [StoreError::EventLocked] if the event is not in draft status
    /// - [StoreError::ApartmentFull] if the target apartment has reached its capacity
    fn assign_guest(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
        guest_id: GuestId,
        apartment_id: Option<ApartmentId>,
    ) -> Result<(), StoreError>;

    /// Remove a guest from the guest list
    ///
    /// Returns [StoreError::EventLocked] if the event is not in draft status.
    fn delete_guest(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
        guest_id: GuestId,
    ) -> Result<(), StoreError>;
}

pub trait GuestPlanStore: Send + Sync {
    fn get_facade<'a>(&'a self) -> Result<Box<dyn GuestPlanStoreFacade + 'a>, StoreError>;
}

/// Filter options for retrieving events via [GuestPlanStoreFacade::get_events]
#[derive(Default, Debug, Clone)]
pub struct EventFilter {
    /// Only include events with this lifecycle status
    pub status: Option<EventStatus>,
    /// Only include events, whose name contains this string (case-insensitive)
    pub name_contains: Option<String>,
}

impl EventFilter {
    /// Checks if a given event matches the filter
    ///
    /// Usually, filtering should be done by the database. This function can be used for separate
    /// checks of individual events in software.
    pub fn matches(&self, event: &models::Event) -> bool {
        if let Some(status) = self.status {
            if event.status != status {
                return false;
            }
        }
        if let Some(name) = &self.name_contains {
            if !event.name.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

#[derive(Default, Debug, Clone, PartialEq)]
pub enum ApartmentFilter {
    #[default]
    Any,
    /// Only guests without an apartment
    Unassigned,
    /// Only guests assigned to the given apartment
    Apartment(ApartmentId),
}

#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub enum GuestOrder {
    /// Order by (last_name, first_name)
    #[default]
    LastName,
    /// Order by time of creation, oldest first
    CreatedAt,
}

/// Filter options for retrieving guests via [GuestPlanStoreFacade::get_guests]
///
/// Can be constructed through the [GuestFilterBuilder]
#[derive(Default, Debug, Clone)]
pub struct GuestFilter {
    pub apartment: ApartmentFilter,
    /// Only include guests whose first or last name contains this string (case-insensitive)
    pub name_contains: Option<String>,
    pub order: GuestOrder,
    /// Maximum number of guests to return
    pub limit: Option<i64>,
}

impl GuestFilter {
    pub fn builder() -> GuestFilterBuilder {
        GuestFilterBuilder::new()
    }

    /// Checks if a given guest matches the filter (ignoring order and limit)
    pub fn matches(&self, guest: &models::Guest) -> bool {
        match &self.apartment {
            ApartmentFilter::Any => {}
            ApartmentFilter::Unassigned => {
                if guest.apartment_id.is_some() {
                    return false;
                }
            }
            ApartmentFilter::Apartment(apartment_id) => {
                if guest.apartment_id.as_ref() != Some(apartment_id) {
                    return false;
                }
            }
        }
        if let Some(search) = &self.name_contains {
            let search = search.to_lowercase();
            if !guest.first_name.to_lowercase().contains(&search)
                && !guest.last_name.to_lowercase().contains(&search)
            {
                return false;
            }
        }
        true
    }
}

/// Builder for constructing GuestFilter objects
pub struct GuestFilterBuilder {
    result: GuestFilter,
}

impl GuestFilterBuilder {
    pub fn new() -> Self {
        Self {
            result: GuestFilter::default(),
        }
    }

    /// Add filter to only include guests without an apartment
    pub fn unassigned(mut self) -> Self {
        self.result.apartment = ApartmentFilter::Unassigned;
        self
    }

    /// Add filter to only include guests of the given apartment
    pub fn in_apartment(mut self, apartment_id: ApartmentId) -> Self {
        self.result.apartment = ApartmentFilter::Apartment(apartment_id);
        self
    }

    /// Add filter to only include guests with the given string in their first or last name
    pub fn name_contains(mut self, search: String) -> Self {
        self.result.name_contains = Some(search);
        self
    }

    pub fn order_by_creation(mut self) -> Self {
        self.result.order = GuestOrder::CreatedAt;
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.result.limit = Some(limit);
        self
    }

    /// Create the GuestFilter object
    pub fn build(self) -> GuestFilter {
        self.result
    }
}

impl Default for GuestFilterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub enum StoreError {
    /// Connection the database failed. See string description for details.
    ConnectionError(String),
    /// The query could not be executed because of some error not covered by the other members (see
    /// string description)
    QueryError(diesel::result::Error),
    /// Database transaction could not be commited due to a conflicting concurrent transaction
    TransactionConflict,
    /// The requested entity does not exist
    NotExisting,
    /// The entity could not be created because it already exists.
    ConflictEntityExists,
    /// The guest list cannot be changed, because the event is not in draft status anymore.
    EventLocked { status: EventStatus },
    /// The guest cannot be assigned to the apartment, because the apartment has reached its
    /// capacity.
    ApartmentFull {
        apartment_id: ApartmentId,
        capacity: i32,
    },
    /// The client is not authorized for this action. It would need one of the access roles
    /// qualifying for the `required_privilege` on the `event` (or globally if `event_id` is
    /// None).
    PermissionDenied {
        required_privilege: Privilege,
        event_id: Option<EventId>,
    },
    /// The provided data is invalid, i.e. it does not match the expected ranges or violates a
    /// SQL constraint. See string description for details.
    InvalidInputData(String),
    /// Some data queried from the database could not be deserialized. See string description for
    /// details.
    InvalidDataInDatabase(String),
}

impl From<diesel::result::Error> for StoreError {
    fn from(error: diesel::result::Error) -> Self {
        match error {
            diesel::result::Error::NotFound => Self::NotExisting,
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => Self::ConflictEntityExists,
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::SerializationFailure,
                _,
            ) => Self::TransactionConflict,
            diesel::result::Error::DatabaseError(
                e @ diesel::result::DatabaseErrorKind::ForeignKeyViolation
                | e @ diesel::result::DatabaseErrorKind::CheckViolation,
                _,
            ) => Self::InvalidInputData(format!("{:?}", e)),
            diesel::result::Error::SerializationError(e) => Self::InvalidInputData(e.to_string()),
            diesel::result::Error::DeserializationError(e) => {
                Self::InvalidDataInDatabase(e.to_string())
            }
            _ => Self::QueryError(error),
        }
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(error: r2d2::Error) -> Self {
        Self::ConnectionError(error.to_string())
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Error connecting to database: {}", e),
            Self::QueryError(e) => write!(f, "Error while executing database query: {}", e),
            Self::TransactionConflict => f.write_str("Database transaction could not be commited due to a conflicting concurrent transaction"),
            Self::NotExisting => f.write_str("Database record does not exist."),
            Self::ConflictEntityExists => f.write_str("Database record exists already."),
            Self::EventLocked { status } => write!(
                f,
                "The guest list has been {} and cannot be changed anymore.",
                status.name().to_lowercase()
            ),
            Self::ApartmentFull { apartment_id, capacity } => write!(
                f,
                "Apartment {} is full (capacity {}).",
                apartment_id, capacity
            ),
            Self::PermissionDenied {
                required_privilege,
                event_id: Some(event_id),
            } => {
                write!(f, "Client is not authorized to perform this action. {:?} privilege on event {} required.", required_privilege, event_id)
            }
            Self::PermissionDenied {
                required_privilege,
                event_id: None,
            } => {
                write!(f, "Client is not authorized to perform this action. Global {:?} privilege required.", required_privilege)
            }
            Self::InvalidInputData(e) => {
                write!(f, "Data to be stored in database is not valid: {}", e)
            }
            StoreError::InvalidDataInDatabase(e) => {
                write!(f, "Data queried from database could not be deserialized: {}", e)
            },
        }
    }
}

impl std::error::Error for StoreError {}
