pub mod admin_event;
pub mod admin_events;
pub mod apartment;
pub mod auth;
pub mod client_home;
pub mod guests;
pub mod index;
pub mod planner;
