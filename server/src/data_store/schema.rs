// Tables and views of the managed backend's database, as far as they are used by this application.
// The schema itself is owned and migrated by the backend platform.

diesel::table! {
    apartments (id) {
        id -> Text,
        structure -> Text,
        floor -> Int4,
        capacity -> Int4,
    }
}

diesel::table! {
    apartment_occupancy (event_id, apartment_id) {
        event_id -> Uuid,
        apartment_id -> Text,
        capacity -> Int4,
        guests_count -> Int8,
        structure -> Text,
        floor -> Int4,
    }
}

diesel::table! {
    event_members (event_id, user_id) {
        event_id -> Uuid,
        user_id -> Uuid,
        role -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    events (id) {
        id -> Uuid,
        name -> Text,
        start_date -> Nullable<Date>,
        end_date -> Nullable<Date>,
        status -> Text,
        created_at -> Timestamptz,
        created_by -> Uuid,
        submitted_at -> Nullable<Timestamptz>,
        submitted_by -> Nullable<Uuid>,
    }
}

diesel::table! {
    guests (id) {
        id -> Uuid,
        event_id -> Uuid,
        apartment_id -> Nullable<Text>,
        first_name -> Text,
        last_name -> Text,
        guest_type -> Text,
        child_age -> Nullable<Int4>,
        arrival_mode -> Nullable<Text>,
        checkin_date -> Nullable<Date>,
        checkout_date -> Nullable<Date>,
        extra_nights -> Int4,
        allergies -> Nullable<Text>,
        notes -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    profiles (id) {
        id -> Uuid,
        is_admin -> Bool,
        full_name -> Nullable<Text>,
    }
}

diesel::joinable!(event_members -> events (event_id));
diesel::joinable!(guests -> events (event_id));
diesel::joinable!(guests -> apartments (apartment_id));

diesel::allow_tables_to_appear_in_same_query!(
    apartments,
    apartment_occupancy,
    event_members,
    events,
    guests,
    profiles,
);
