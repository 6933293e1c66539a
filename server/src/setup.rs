use std::env;
use std::env::VarError;
use std::fmt::{Display, Formatter};

/// Get the database URL from the environment variable.
pub fn get_database_url_from_env() -> Result<String, SetupError> {
    env::var("DATABASE_URL").map_err(|e| SetupError::from_env_error(e, "DATABASE_URL"))
}

/// Get the cryptographic application secret for signing session tokens from the environment
/// variable.
pub fn get_secret_from_env() -> Result<String, SetupError> {
    env::var("SECRET").map_err(|e| SetupError::from_env_error(e, "SECRET"))
}

/// Get the web server TCP listening port from the environment variable
pub fn get_listen_port_from_env() -> Result<u16, SetupError> {
    env::var("LISTEN_PORT")
        .map_err(|e| SetupError::from_env_error(e, "LISTEN_PORT"))
        .and_then(|v| {
            v.parse().map_err(|_| SetupError::EnvVariableInvalid {
                variable_name: "LISTEN_PORT",
                problem: "Not a valid uint16",
            })
        })
}

/// Get the web server TCP listening interface address from the environment variable
pub fn get_listen_address_from_env() -> Result<String, SetupError> {
    env::var("LISTEN_ADDRESS").map_err(|e| SetupError::from_env_error(e, "LISTEN_ADDRESS"))
}

/// Connection settings of the managed backend's REST services (auth and storage).
#[derive(Clone, Debug)]
pub struct BackendSettings {
    /// Base URL, e.g. "https://myproject.example.com", without trailing slash
    pub base_url: String,
    /// Public ("anon") api key, used for user sign-in and token verification
    pub anon_key: String,
    /// Privileged api key, used for creating user accounts
    pub service_role_key: String,
    /// Name of the storage bucket holding the apartment photos
    pub photo_bucket: String,
}

pub const DEFAULT_PHOTO_BUCKET: &str = "apartment-photos";

/// Read the [BackendSettings] from the environment variables BACKEND_URL, BACKEND_ANON_KEY,
/// BACKEND_SERVICE_ROLE_KEY and (optionally) PHOTO_BUCKET.
pub fn get_backend_settings_from_env() -> Result<BackendSettings, SetupError> {
    let base_url = env::var("BACKEND_URL")
        .map_err(|e| SetupError::from_env_error(e, "BACKEND_URL"))
        .and_then(|v| {
            url::Url::parse(&v).map_err(|_| SetupError::EnvVariableInvalid {
                variable_name: "BACKEND_URL",
                problem: "Not a valid URL",
            })?;
            Ok(v.trim_end_matches('/').to_owned())
        })?;
    let photo_bucket = match env::var("PHOTO_BUCKET") {
        Ok(v) => v,
        Err(VarError::NotPresent) => DEFAULT_PHOTO_BUCKET.to_owned(),
        Err(e) => return Err(SetupError::from_env_error(e, "PHOTO_BUCKET")),
    };
    Ok(BackendSettings {
        base_url,
        anon_key: env::var("BACKEND_ANON_KEY")
            .map_err(|e| SetupError::from_env_error(e, "BACKEND_ANON_KEY"))?,
        service_role_key: env::var("BACKEND_SERVICE_ROLE_KEY")
            .map_err(|e| SetupError::from_env_error(e, "BACKEND_SERVICE_ROLE_KEY"))?,
        photo_bucket,
    })
}

#[derive(Debug)]
pub enum SetupError {
    EnvVariableMissing {
        variable_name: &'static str,
    },
    EnvVariableInvalid {
        variable_name: &'static str,
        problem: &'static str,
    },
}

impl SetupError {
    fn from_env_error(error: VarError, variable_name: &'static str) -> Self {
        match error {
            VarError::NotPresent => Self::EnvVariableMissing { variable_name },
            VarError::NotUnicode(_) => Self::EnvVariableInvalid {
                variable_name,
                problem: "no valid unicode",
            },
        }
    }
}

impl Display for SetupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SetupError::EnvVariableMissing { variable_name } => {
                write!(f, "Environment variable {} must be defined", variable_name)
            }
            SetupError::EnvVariableInvalid {
                variable_name,
                problem,
            } => write!(
                f,
                "Value of environment variable {} is invalid: {}",
                variable_name, problem
            ),
        }
    }
}
