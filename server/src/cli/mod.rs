//! Command line administration functions
//!
//! These functions work directly on the database via the data store, authorized by
//! [CliAuthTokenKey]-based auth tokens.

pub mod export_guests;
pub mod manage_events;
mod util;

/// Key for creating auth tokens with administrator privileges in the command line interface.
///
/// Only command line interface functions shall create instances of this key.
pub struct CliAuthTokenKey {
    _private: (),
}

impl CliAuthTokenKey {
    #[allow(clippy::new_without_default)] // We always want to explicitly create these objects
    pub fn new() -> Self {
        Self { _private: () }
    }
}
