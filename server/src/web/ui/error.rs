use crate::auth_session::SessionError;
use crate::backend_client::BackendError;
use crate::data_store::auth_token::Privilege;
use crate::data_store::{EventId, StoreError};
use crate::web::client_accounts::CreateClientError;
use actix_web::error::UrlGenerationError;
use actix_web::http::StatusCode;
use actix_web::ResponseError;
use std::fmt::{Display, Formatter};

/// Semantic error type for ui endpoint functions
///
/// The different enum items are meant to produce different descriptive and helpful error pages for
/// the user, with an appropriate HTTP status code.
///
/// The error pages are generated using the
/// [crate::web::ui::error_page::error_page_middleware] middleware, because actix-web's
/// ResponseError trait is quite restricted in what it can do. [AppError::NotLoggedIn] is turned
/// into a redirect to the login page by the same middleware.
///
/// The recoverable errors ([AppError::EventLocked], [AppError::ApartmentFull],
/// [AppError::InvalidData]) are typically not shown as error page, but as flash message after
/// redirecting the user back to the previous page. See [crate::web::ui::util::flash_recoverable_error].
#[derive(Debug)]
pub enum AppError {
    PageNotFound,
    EntityNotFound,
    /// No valid session: the user needs to log in (again)
    NotLoggedIn {
        session_error: Option<SessionError>,
    },
    PermissionDenied {
        required_privilege: Privilege,
        event_id: Option<EventId>,
    },
    /// The guest list has been submitted and cannot be changed anymore
    EventLocked(String),
    ApartmentFull(String),
    InvalidData(String),
    /// The managed backend's auth or storage service failed
    BackendError(String),
    TransactionConflict,
    DatabaseConnectionError(String),
    InternalError(String),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ConnectionError(error) => Self::DatabaseConnectionError(error),
            StoreError::QueryError(diesel_error) => {
                Self::InternalError(format!("Database query failed: {}", diesel_error))
            }
            StoreError::TransactionConflict => Self::TransactionConflict,
            StoreError::NotExisting => Self::EntityNotFound,
            StoreError::ConflictEntityExists => {
                Self::InternalError("Conflicting entity exists".to_owned())
            }
            e @ StoreError::EventLocked { .. } => Self::EventLocked(e.to_string()),
            e @ StoreError::ApartmentFull { .. } => Self::ApartmentFull(e.to_string()),
            StoreError::PermissionDenied {
                required_privilege,
                event_id,
            } => Self::PermissionDenied {
                required_privilege,
                event_id,
            },
            StoreError::InvalidInputData(e) => Self::InvalidData(e),
            StoreError::InvalidDataInDatabase(e) => Self::InternalError(format!(
                "Data queried from database could not be deserialized: {}",
                e
            )),
        }
    }
}

impl From<BackendError> for AppError {
    fn from(e: BackendError) -> Self {
        Self::BackendError(e.to_string())
    }
}

impl From<CreateClientError> for AppError {
    fn from(e: CreateClientError) -> Self {
        match e {
            CreateClientError::UserRejected(message) => Self::InvalidData(message),
            CreateClientError::Backend(e) => e.into(),
            CreateClientError::Store(e) => e.into(),
        }
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(_e: actix_web::error::BlockingError) -> Self {
        AppError::InternalError(
            "Could not get thread from thread pool for synchronous database operation.".to_owned(),
        )
    }
}

impl From<askama::Error> for AppError {
    fn from(value: askama::Error) -> Self {
        AppError::InternalError(format!("Error while rendering template: {}", value))
    }
}

impl From<UrlGenerationError> for AppError {
    fn from(value: UrlGenerationError) -> Self {
        AppError::InternalError(format!("Could not generate URL: {}", value))
    }
}

impl From<serde_urlencoded::ser::Error> for AppError {
    fn from(value: serde_urlencoded::ser::Error) -> Self {
        AppError::InternalError(format!(
            "Error while serializing URL query parameters: {}",
            value
        ))
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::PageNotFound => write!(f, "Not found"),
            AppError::TransactionConflict => {
                write!(f, "Concurrent database transaction conflict. Please retry.")
            }
            AppError::EntityNotFound => write!(f, "Entity not found"),
            AppError::NotLoggedIn { session_error } => {
                write!(f, "Not logged in")?;
                if let Some(session_error) = session_error {
                    write!(f, ": {}", session_error)?;
                }
                Ok(())
            }
            AppError::PermissionDenied {
                required_privilege,
                event_id: _,
            } => {
                write!(
                    f,
                    "You are not allowed to perform this action. It requires the role {}.",
                    required_privilege
                        .qualifying_roles()
                        .iter()
                        .map(|role| role.name().to_owned())
                        .collect::<Vec<String>>()
                        .join(" or ")
                )
            }
            AppError::EventLocked(e) | AppError::ApartmentFull(e) | AppError::InvalidData(e) => {
                f.write_str(e)
            }
            AppError::BackendError(e) => write!(f, "Backend service failed: {}", e),
            AppError::DatabaseConnectionError(e) => {
                write!(f, "Could not connect to database: {}", e)
            }
            AppError::InternalError(e) => write!(f, "Internal program error: {}", e),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::PageNotFound | AppError::EntityNotFound => StatusCode::NOT_FOUND,
            AppError::NotLoggedIn { .. } => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            AppError::EventLocked(_) | AppError::ApartmentFull(_) => StatusCode::CONFLICT,
            AppError::InvalidData(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BackendError(_) => StatusCode::BAD_GATEWAY,
            AppError::TransactionConflict => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DatabaseConnectionError(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
