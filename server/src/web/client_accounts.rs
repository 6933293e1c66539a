//! Creation of client accounts: a new backend user together with the client's draft event
//!
//! Shared by the JSON endpoint for administrators and the administration web form.

use crate::auth_session::SessionToken;
use crate::backend_client::BackendError;
use crate::data_store::auth_token::{GlobalAuthToken, Privilege};
use crate::data_store::models::{EventStatus, NewEvent};
use crate::data_store::{EventId, StoreError, UserId};
use crate::web::AppState;
use actix_web::web;
use chrono::NaiveDate;
use villa_planner_api_types::CreateUserAndEventRequest;

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// The validated and normalized data for creating a client account
#[derive(Debug, Clone, PartialEq)]
pub struct NewClientAccount {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub event_name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl TryFrom<CreateUserAndEventRequest> for NewClientAccount {
    type Error = String;

    fn try_from(value: CreateUserAndEventRequest) -> Result<Self, Self::Error> {
        let email = value.email.trim().to_lowercase();
        let full_name = value
            .full_name
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty());
        let event_name = value.event_name.trim().to_owned();
        if email.is_empty() || value.password.is_empty() || event_name.is_empty() {
            return Err("Missing fields: email/password/event_name".to_owned());
        }
        if value.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(format!(
                "Password must have at least {} characters",
                MIN_PASSWORD_LENGTH
            ));
        }
        if let (Some(start), Some(end)) = (value.start_date, value.end_date) {
            if end < start {
                return Err("End date must not be before start date".to_owned());
            }
        }
        Ok(Self {
            email,
            password: value.password,
            full_name,
            event_name,
            start_date: value.start_date,
            end_date: value.end_date,
        })
    }
}

#[derive(Debug)]
pub enum CreateClientError {
    /// The backend refused to create the user (e.g. the email address is already registered)
    UserRejected(String),
    Backend(BackendError),
    Store(StoreError),
}

impl From<StoreError> for CreateClientError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<BackendError> for CreateClientError {
    fn from(value: BackendError) -> Self {
        if value.is_client_error() {
            Self::UserRejected(value.message())
        } else {
            Self::Backend(value)
        }
    }
}

impl From<actix_web::error::BlockingError> for CreateClientError {
    fn from(_e: actix_web::error::BlockingError) -> Self {
        Self::Store(StoreError::ConnectionError(
            "Could not get thread from thread pool for synchronous database operation.".to_owned(),
        ))
    }
}

/// Check that the user of the session is an administrator and return their global auth token.
pub async fn admin_auth_token(
    state: &AppState,
    session_token: SessionToken,
) -> Result<GlobalAuthToken, StoreError> {
    let store = state.store.clone();
    web::block(move || -> Result<_, StoreError> {
        let mut store = store.get_facade()?;
        let auth = store.get_global_auth_token_for_session(&session_token)?;
        auth.check_privilege(Privilege::CreateEvents)?;
        Ok(auth)
    })
    .await
    .map_err(|_| {
        StoreError::ConnectionError(
            "Could not get thread from thread pool for synchronous database operation.".to_owned(),
        )
    })?
}

/// Create the backend user, store their name in the profile and create their draft event.
///
/// The user is created first, as the event references them as creator. If storing the profile
/// or the event fails, the backend user is deleted again and the store's error is returned.
pub async fn create_client_account(
    state: &AppState,
    auth_token: GlobalAuthToken,
    account: NewClientAccount,
) -> Result<(UserId, EventId), CreateClientError> {
    let user = state
        .backend
        .admin_create_user(
            &account.email,
            &account.password,
            account.full_name.as_deref(),
        )
        .await?;
    let user_id = user.id;

    let event_id = match create_client_event(state, auth_token, user_id, account).await {
        Ok(event_id) => event_id,
        Err(e) => {
            rollback_backend_user(state, user_id).await;
            return Err(e);
        }
    };

    log::info!(
        "Created client account {} with event {}",
        user_id,
        event_id
    );
    Ok((user_id, event_id))
}

async fn create_client_event(
    state: &AppState,
    auth_token: GlobalAuthToken,
    user_id: UserId,
    account: NewClientAccount,
) -> Result<EventId, CreateClientError> {
    let store = state.store.clone();
    let event_id = web::block(move || -> Result<_, StoreError> {
        let mut store = store.get_facade()?;
        if let Some(full_name) = &account.full_name {
            // The profile row is created by the backend on user creation; a missing profile is
            // not fatal for creating the event.
            match store.update_profile_name(&auth_token, user_id, full_name) {
                Ok(()) | Err(StoreError::NotExisting) => {}
                Err(e) => return Err(e),
            }
        }
        store.create_client_event(
            &auth_token,
            NewEvent {
                id: uuid::Uuid::now_v7(),
                name: account.event_name,
                start_date: account.start_date,
                end_date: account.end_date,
                status: EventStatus::Draft,
                created_by: user_id,
            },
        )
    })
    .await??;
    Ok(event_id)
}

/// Delete the freshly created backend user, so the email address can be used for another try.
async fn rollback_backend_user(state: &AppState, user_id: UserId) {
    if let Err(e) = state.backend.admin_delete_user(user_id).await {
        log::warn!(
            "Could not delete backend user {} after failed account creation: {}",
            user_id,
            e
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_store::store_mock::StoreMock;
    use crate::web::api::tests::sample_data;
    use std::sync::Arc;

    fn request() -> CreateUserAndEventRequest {
        CreateUserAndEventRequest {
            email: "  Anna.Rossi@Example.com ".to_owned(),
            password: "secret123".to_owned(),
            full_name: Some("  ".to_owned()),
            event_name: " Anna & Marco ".to_owned(),
            start_date: NaiveDate::from_ymd_opt(2026, 6, 12),
            end_date: NaiveDate::from_ymd_opt(2026, 6, 14),
        }
    }

    #[test]
    fn test_normalization() {
        let account = NewClientAccount::try_from(request()).unwrap();
        assert_eq!(account.email, "anna.rossi@example.com");
        assert_eq!(account.event_name, "Anna & Marco");
        assert_eq!(account.full_name, None);
        assert_eq!(account.password, "secret123");
    }

    #[test]
    fn test_missing_fields() {
        let mut r = request();
        r.email = "   ".to_owned();
        assert!(NewClientAccount::try_from(r).is_err());
        let mut r = request();
        r.event_name = String::new();
        assert!(NewClientAccount::try_from(r).is_err());
        let mut r = request();
        r.password = "12345".to_owned();
        assert!(NewClientAccount::try_from(r).is_err());
    }

    #[test]
    fn test_date_order() {
        let mut r = request();
        r.end_date = NaiveDate::from_ymd_opt(2026, 6, 11);
        assert!(NewClientAccount::try_from(r).is_err());
        let mut r = request();
        r.start_date = None;
        assert!(NewClientAccount::try_from(r).is_ok());
    }

    #[actix_web::test]
    async fn test_failed_event_creation_returns_store_error() {
        let store = StoreMock::default();
        sample_data::fill_sample_data(&store);
        let store = Arc::new(store);
        let state = AppState::with_store(store.clone(), "123456");
        let auth = admin_auth_token(&state, SessionToken::new(sample_data::ADMIN_ID))
            .await
            .unwrap();
        let events_before = store.data.lock().unwrap().events.len();
        store.data.lock().unwrap().next_error =
            Some(StoreError::ConnectionError("database unavailable".to_owned()));

        let user_id = uuid::Uuid::now_v7();
        let account = NewClientAccount::try_from(request()).unwrap();
        let result = create_client_event(&state, auth, user_id, account).await;
        assert!(matches!(
            result,
            Err(CreateClientError::Store(StoreError::ConnectionError(_)))
        ));
        assert_eq!(store.data.lock().unwrap().events.len(), events_before);

        // The backend is unreachable in tests: the failed deletion is only logged.
        rollback_backend_user(&state, user_id).await;
    }
}
