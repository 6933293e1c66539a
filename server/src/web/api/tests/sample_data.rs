use crate::data_store::models::{
    Apartment, ArrivalMode, Event, EventStatus, Guest, GuestType, Profile,
};
use crate::data_store::store_mock::StoreMock;
use crate::data_store::{EventId, UserId};
use uuid::{uuid, Uuid};

pub(crate) const ADMIN_ID: UserId = uuid!("0193a7c4-0000-7b1a-8f3c-000000000001");
pub(crate) const CLIENT_ID: UserId = uuid!("0193a7c4-0000-7b1a-8f3c-000000000002");
pub(crate) const STRANGER_ID: UserId = uuid!("0193a7c4-0000-7b1a-8f3c-000000000003");
pub(crate) const EVENT_ID: EventId = uuid!("0193a7c4-1111-7b1a-8f3c-000000000001");

pub(crate) fn fill_sample_data(store: &StoreMock) {
    let mut data = store.data.lock().unwrap();
    data.profiles.push(Profile {
        id: ADMIN_ID,
        is_admin: true,
        full_name: Some("Villa Office".to_owned()),
    });
    data.profiles.push(Profile {
        id: CLIENT_ID,
        is_admin: false,
        full_name: Some("Anna Rossi".to_owned()),
    });
    data.profiles.push(Profile {
        id: STRANGER_ID,
        is_admin: false,
        full_name: None,
    });
    data.events.push(Event {
        id: EVENT_ID,
        name: "Anna & Marco".to_owned(),
        start_date: chrono::NaiveDate::from_ymd_opt(2026, 6, 12),
        end_date: chrono::NaiveDate::from_ymd_opt(2026, 6, 14),
        status: EventStatus::Draft,
        created_at: chrono::Utc::now(),
        created_by: CLIENT_ID,
        submitted_at: None,
        submitted_by: None,
    });
    data.members.push((EVENT_ID, CLIENT_ID));
    for (id, structure, floor, capacity) in [
        ("apt_1", "Lakehouse", 0, 2),
        ("apt_2", "Lakehouse", 0, 4),
        ("apt_5", "Lakehouse", 1, 3),
        ("apt_wc", "Woodcutter", 0, 6),
    ] {
        data.apartments.push(Apartment {
            id: id.to_owned(),
            structure: structure.to_owned(),
            floor,
            capacity,
        });
    }
    for (first_name, last_name, apartment_id) in [
        ("Anna", "Rossi", Some("apt_1")),
        ("Marco", "Bianchi", Some("apt_1")),
        ("Giulia", "Verdi", Some("apt_2")),
        ("Luca", "Esposito", None),
    ] {
        data.guests.push(Guest {
            id: Uuid::now_v7(),
            event_id: EVENT_ID,
            apartment_id: apartment_id.map(|a| a.to_owned()),
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            guest_type: GuestType::Adult,
            child_age: None,
            arrival_mode: Some(ArrivalMode::Car),
            checkin_date: chrono::NaiveDate::from_ymd_opt(2026, 6, 12),
            checkout_date: chrono::NaiveDate::from_ymd_opt(2026, 6, 14),
            extra_nights: 0,
            allergies: None,
            notes: None,
            created_at: chrono::Utc::now(),
        });
    }
}
