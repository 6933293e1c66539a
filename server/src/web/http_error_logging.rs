use crate::web::api::APIError;
use crate::web::ui::error::AppError;
use log::{error, warn};

pub async fn error_logging_middleware<B: actix_web::body::MessageBody>(
    req: actix_web::dev::ServiceRequest,
    next: actix_web::middleware::Next<B>,
) -> Result<actix_web::dev::ServiceResponse<B>, actix_web::Error> {
    let response = next.call(req).await?;

    if let Some(error) = response.response().error() {
        let status = response.response().status();
        let uri = response.request().uri();
        let client = response
            .request()
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_owned();
        if let Some(app_error) = error.as_error::<AppError>() {
            match app_error {
                AppError::PageNotFound => {
                    warn!("HTTP {} page not found at <{}>", status, uri);
                }
                AppError::InvalidData(e) => {
                    warn!("HTTP {} invalid data at <{}>: {}", status, uri, e);
                }
                AppError::NotLoggedIn {
                    session_error: Some(session_error),
                } => {
                    warn!(
                        "HTTP {} invalid session token. Client: <{}> Cause: {:?}",
                        status, client, session_error
                    );
                }
                AppError::PermissionDenied {
                    required_privilege,
                    event_id,
                } => {
                    warn!(
                        "HTTP {} permission denied at <{}>. Client: <{}> Requires privilege: {:?}{}",
                        status,
                        uri,
                        client,
                        required_privilege,
                        event_id
                            .map(|id| format!(" on event {}", id))
                            .unwrap_or_default()
                    );
                }
                AppError::NotLoggedIn {
                    session_error: None,
                }
                | AppError::EntityNotFound
                | AppError::EventLocked(_)
                | AppError::ApartmentFull(_)
                | AppError::TransactionConflict => {}
                AppError::BackendError(e) => {
                    error!("HTTP {} backend service error at <{}>: {}", status, uri, e);
                }
                AppError::DatabaseConnectionError(e) => {
                    error!("HTTP {} database connection error: {}", status, e);
                }
                AppError::InternalError(e) => {
                    error!("HTTP {} internal server error at <{}>: {}", status, uri, e);
                }
            }
        } else if let Some(api_error) = error.as_error::<APIError>() {
            match api_error {
                APIError::PermissionDenied { required_privilege } => {
                    warn!(
                        "HTTP {} permission denied at <{}>. Client: <{}> Requires privilege: {:?}",
                        status, uri, client, required_privilege,
                    );
                }
                APIError::NoSessionToken | APIError::MissingBearerToken => {
                    warn!(
                        "HTTP {} permission denied at <{}>. Client: <{}> Cause: No session token",
                        status, uri, client,
                    );
                }
                APIError::InvalidSessionToken | APIError::InvalidBearerToken => {
                    warn!(
                        "HTTP {} invalid session token. Client: <{}>",
                        status, client,
                    );
                }
                APIError::NotExisting
                | APIError::AlreadyExisting
                | APIError::InvalidJson(_)
                | APIError::InvalidData(_)
                | APIError::EventLocked(_)
                | APIError::ApartmentFull(_)
                | APIError::BackendRejected(_)
                | APIError::TransactionConflict => {}
                APIError::BackendUnavailable(e) => {
                    error!("HTTP {} backend service error at <{}>: {}", status, uri, e);
                }
                APIError::InternalError(e) => {
                    error!("HTTP {} internal server error at <{}>: {}", status, uri, e);
                }
            }
        } else {
            error!(
                "HTTP {} unexpected error at <{}>: {:?}",
                status, uri, error
            );
        }
    }
    Ok(response)
}
