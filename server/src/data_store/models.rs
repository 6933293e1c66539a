use super::util::text_enum_sql_conversion;
use crate::data_store::{EventId, GuestId, UserId};
use chrono::{naive::NaiveDate, DateTime, Utc};
use diesel::prelude::*;
use diesel::{AsExpression, FromSqlRow};
use uuid::Uuid;

#[derive(Clone, Debug, Queryable, Selectable)]
#[diesel(table_name=super::schema::events)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    pub created_by: UserId,
    pub submitted_at: Option<DateTime<Utc>>,
    pub submitted_by: Option<UserId>,
}

impl Event {
    /// Guests of the event may only be created, moved or deleted while the guest list is a draft.
    pub fn is_locked(&self) -> bool {
        self.status != EventStatus::Draft
    }

    /// Human readable date range of the event, e.g. "12.06.2026 – 14.06.2026"
    pub fn dates_label(&self) -> String {
        let format = |d: NaiveDate| d.format("%d.%m.%Y").to_string();
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if start == end => format(start),
            (Some(start), Some(end)) => format!("{} – {}", format(start), format(end)),
            (Some(start), None) => format!("from {}", format(start)),
            (None, Some(end)) => format!("until {}", format(end)),
            (None, None) => "dates not set".to_owned(),
        }
    }
}

impl From<Event> for villa_planner_api_types::Event {
    fn from(value: Event) -> Self {
        Self {
            id: value.id,
            name: value.name,
            start_date: value.start_date,
            end_date: value.end_date,
            status: value.status.into(),
            created_at: value.created_at,
            submitted_at: value.submitted_at,
        }
    }
}

/// A new event, created by an administrator for a client. The client becomes the owner (creator)
/// and a member of the event.
#[derive(Clone, Debug, Insertable)]
#[diesel(table_name=super::schema::events)]
pub struct NewEvent {
    pub id: EventId,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: EventStatus,
    pub created_by: UserId,
}

#[derive(Clone, Debug, Insertable)]
#[diesel(table_name=super::schema::event_members)]
pub struct NewEventMember {
    pub event_id: EventId,
    pub user_id: UserId,
    pub role: String,
}

pub const EVENT_MEMBER_ROLE_CLIENT: &str = "client";

#[derive(Debug, PartialEq, Eq, FromSqlRow, AsExpression, Clone, Copy)]
#[diesel(sql_type = diesel::sql_types::Text)]
pub enum EventStatus {
    Draft,
    Submitted,
    Final,
}

impl EventStatus {
    pub const ALL: [EventStatus; 3] = [Self::Draft, Self::Submitted, Self::Final];

    pub fn as_db_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "draft",
            EventStatus::Submitted => "submitted",
            EventStatus::Final => "final",
        }
    }

    pub fn from_db_str(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(Self::Draft),
            "submitted" => Some(Self::Submitted),
            "final" => Some(Self::Final),
            _ => None,
        }
    }

    /// Human readable name of the status
    pub fn name(&self) -> &'static str {
        match self {
            EventStatus::Draft => "Draft",
            EventStatus::Submitted => "Submitted",
            EventStatus::Final => "Final",
        }
    }
}

impl std::str::FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s).ok_or_else(|| format!("Unknown event status '{}'", s))
    }
}

text_enum_sql_conversion!(EventStatus);

impl From<EventStatus> for villa_planner_api_types::EventStatus {
    fn from(value: EventStatus) -> Self {
        match value {
            EventStatus::Draft => Self::Draft,
            EventStatus::Submitted => Self::Submitted,
            EventStatus::Final => Self::Final,
        }
    }
}

#[derive(Clone, Debug, Queryable, Selectable)]
#[diesel(table_name=super::schema::guests)]
pub struct Guest {
    pub id: GuestId,
    pub event_id: EventId,
    pub apartment_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub guest_type: GuestType,
    pub child_age: Option<i32>,
    pub arrival_mode: Option<ArrivalMode>,
    pub checkin_date: Option<NaiveDate>,
    pub checkout_date: Option<NaiveDate>,
    pub extra_nights: i32,
    pub allergies: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Guest {
    /// Short description of the guest for lists, e.g. "Anna Rossi (child, 7)"
    pub fn display_label(&self) -> String {
        match (self.guest_type, self.child_age) {
            (GuestType::Child, Some(age)) => {
                format!("{} {} (child, {})", self.first_name, self.last_name, age)
            }
            (GuestType::Child, None) => format!("{} {} (child)", self.first_name, self.last_name),
            (GuestType::Adult, _) => format!("{} {} (adult)", self.first_name, self.last_name),
        }
    }
}

impl From<Guest> for villa_planner_api_types::Guest {
    fn from(value: Guest) -> Self {
        Self {
            id: value.id,
            apartment_id: value.apartment_id,
            first_name: value.first_name,
            last_name: value.last_name,
            guest_type: value.guest_type.into(),
            child_age: value.child_age,
            arrival_mode: value.arrival_mode.map(|m| m.into()),
            checkin_date: value.checkin_date,
            checkout_date: value.checkout_date,
            extra_nights: value.extra_nights,
            allergies: value.allergies,
            notes: value.notes,
        }
    }
}

#[derive(Clone, Debug, Insertable)]
#[diesel(table_name=super::schema::guests)]
pub struct NewGuest {
    pub id: GuestId,
    pub event_id: EventId,
    pub apartment_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub guest_type: GuestType,
    pub child_age: Option<i32>,
    pub arrival_mode: Option<ArrivalMode>,
    pub checkin_date: Option<NaiveDate>,
    pub checkout_date: Option<NaiveDate>,
    pub extra_nights: i32,
    pub allergies: Option<String>,
    pub notes: Option<String>,
}

impl NewGuest {
    /// Check the consistency of the guest's data, which cannot be expressed by the types alone.
    pub fn check_consistency(&self) -> Result<(), String> {
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err("First and last name are required".to_owned());
        }
        match (self.guest_type, self.child_age) {
            (GuestType::Child, None) => return Err("Age of child is required".to_owned()),
            (GuestType::Child, Some(age)) if !(0..=17).contains(&age) => {
                return Err(format!("Age of child must be between 0 and 17, got {}", age))
            }
            (GuestType::Adult, Some(_)) => {
                return Err("Adults must not have a child age".to_owned())
            }
            _ => {}
        }
        if self.extra_nights < 0 {
            return Err("Extra nights must not be negative".to_owned());
        }
        if let (Some(checkin), Some(checkout)) = (self.checkin_date, self.checkout_date) {
            if checkout < checkin {
                return Err("Check-out must not be before check-in".to_owned());
            }
        }
        Ok(())
    }

    /// Create the stored guest record from this new guest.
    pub fn into_guest(self, created_at: DateTime<Utc>) -> Guest {
        Guest {
            id: self.id,
            event_id: self.event_id,
            apartment_id: self.apartment_id,
            first_name: self.first_name,
            last_name: self.last_name,
            guest_type: self.guest_type,
            child_age: self.child_age,
            arrival_mode: self.arrival_mode,
            checkin_date: self.checkin_date,
            checkout_date: self.checkout_date,
            extra_nights: self.extra_nights,
            allergies: self.allergies,
            notes: self.notes,
            created_at,
        }
    }
}

#[derive(Debug, PartialEq, Eq, FromSqlRow, AsExpression, Clone, Copy, Default)]
#[diesel(sql_type = diesel::sql_types::Text)]
pub enum GuestType {
    #[default]
    Adult,
    Child,
}

impl GuestType {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            GuestType::Adult => "adult",
            GuestType::Child => "child",
        }
    }

    pub fn from_db_str(value: &str) -> Option<Self> {
        match value {
            "adult" => Some(Self::Adult),
            "child" => Some(Self::Child),
            _ => None,
        }
    }
}

text_enum_sql_conversion!(GuestType);

impl From<GuestType> for villa_planner_api_types::GuestType {
    fn from(value: GuestType) -> Self {
        match value {
            GuestType::Adult => Self::Adult,
            GuestType::Child => Self::Child,
        }
    }
}

#[derive(Debug, PartialEq, Eq, FromSqlRow, AsExpression, Clone, Copy)]
#[diesel(sql_type = diesel::sql_types::Text)]
pub enum ArrivalMode {
    Car,
    Transfer,
}

impl ArrivalMode {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            ArrivalMode::Car => "car",
            ArrivalMode::Transfer => "transfer",
        }
    }

    pub fn from_db_str(value: &str) -> Option<Self> {
        match value {
            "car" => Some(Self::Car),
            "transfer" => Some(Self::Transfer),
            _ => None,
        }
    }
}

text_enum_sql_conversion!(ArrivalMode);

impl From<ArrivalMode> for villa_planner_api_types::ArrivalMode {
    fn from(value: ArrivalMode) -> Self {
        match value {
            ArrivalMode::Car => Self::Car,
            ArrivalMode::Transfer => Self::Transfer,
        }
    }
}

/// Current occupancy of one apartment for one event, as provided by the `apartment_occupancy`
/// database view
#[derive(Clone, Debug, Queryable, Selectable, PartialEq)]
#[diesel(table_name=super::schema::apartment_occupancy)]
pub struct ApartmentOccupancy {
    pub event_id: EventId,
    pub apartment_id: String,
    pub capacity: i32,
    pub guests_count: i64,
    pub structure: String,
    pub floor: i32,
}

#[derive(Clone, Debug, Queryable, Selectable)]
#[diesel(table_name=super::schema::apartments)]
pub struct Apartment {
    pub id: String,
    pub structure: String,
    pub floor: i32,
    pub capacity: i32,
}

#[derive(Clone, Debug, Queryable, Selectable)]
#[diesel(table_name=super::schema::profiles)]
pub struct Profile {
    pub id: Uuid,
    pub is_admin: bool,
    pub full_name: Option<String>,
}
