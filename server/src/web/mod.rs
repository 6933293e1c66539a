use crate::backend_client::BackendClient;
use crate::cli_error::CliError;
use crate::data_store::get_store_from_env;
use crate::setup::{
    get_backend_settings_from_env, get_listen_address_from_env, get_listen_port_from_env,
    get_secret_from_env,
};
use actix_web::middleware::from_fn;
use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;

mod api;
mod client_accounts;
mod http_error_logging;
mod ui;

pub fn serve() -> Result<(), CliError> {
    let state = AppState::new()?;
    let listen_address = get_listen_address_from_env()?;
    let listen_port = get_listen_port_from_env()?;
    log::info!("Listening on {}:{}", listen_address, listen_port);
    actix_web::rt::System::new()
        .block_on(
            HttpServer::new(move || {
                App::new()
                    .configure(api::configure_app)
                    .configure(ui::configure_app)
                    .app_data(web::Data::new(state.clone()))
                    .wrap(from_fn(http_error_logging::error_logging_middleware))
                    .wrap(middleware::Compress::default())
            })
            .bind((listen_address, listen_port))
            .map_err(CliError::BindError)?
            .run(),
        )
        .map_err(CliError::ServerError)
}

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn crate::data_store::GuestPlanStore>,
    secret: String,
    backend: Arc<BackendClient>,
}

impl AppState {
    pub fn new() -> Result<Self, CliError> {
        let backend = BackendClient::new(get_backend_settings_from_env()?)
            .map_err(|e| CliError::SetupError(format!("Could not create HTTP client: {}", e)))?;
        Ok(Self {
            store: Arc::new(get_store_from_env()?),
            secret: get_secret_from_env()?,
            backend: Arc::new(backend),
        })
    }

    #[cfg(test)]
    pub fn with_store(store: Arc<dyn crate::data_store::GuestPlanStore>, secret: &str) -> Self {
        let backend = BackendClient::new(crate::setup::BackendSettings {
            base_url: "http://backend.invalid".to_owned(),
            anon_key: "anon".to_owned(),
            service_role_key: "service".to_owned(),
            photo_bucket: crate::setup::DEFAULT_PHOTO_BUCKET.to_owned(),
        })
        .expect("HTTP client should be creatable");
        Self {
            store,
            secret: secret.to_owned(),
            backend: Arc::new(backend),
        }
    }
}
