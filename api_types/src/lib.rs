use chrono::{naive::NaiveDate, DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    Submitted,
    Final,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OccupancyStatus {
    Free,
    Partial,
    Full,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ApartmentOccupancy {
    pub apartment_id: String,
    pub label: String,
    pub structure: String,
    pub floor: i32,
    pub capacity: i32,
    pub guests_count: i64,
    pub status: OccupancyStatus,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GuestType {
    Adult,
    Child,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ArrivalMode {
    Car,
    Transfer,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Guest {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apartment_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub guest_type: GuestType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_age: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_mode: Option<ArrivalMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkin_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_date: Option<NaiveDate>,
    #[serde(default)]
    pub extra_nights: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Request body of the admin endpoint for creating a client account together with its draft event
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct CreateUserAndEventRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub event_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CreateUserAndEventResponse {
    pub ok: bool,
    pub user_id: Uuid,
    pub event_id: Uuid,
}
