//! HTTP client for the managed backend's authentication and storage REST APIs
//!
//! The database of the backend is accessed directly via the [crate::data_store]. This client only
//! covers the functionality which is not available as database tables: password sign-in, resolving
//! backend access tokens, creating users and listing apartment photos in the storage bucket.

use crate::data_store::UserId;
use crate::setup::BackendSettings;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Maximum number of photos listed per apartment
const PHOTO_LIST_LIMIT: u32 = 100;

pub struct BackendClient {
    settings: BackendSettings,
    client: reqwest::Client,
    /// Public photo urls per apartment id
    photo_cache: Mutex<HashMap<String, Vec<String>>>,
}

/// A user of the backend's authentication service
#[derive(Debug, Clone, Deserialize)]
pub struct BackendUser {
    pub id: UserId,
}

#[derive(Deserialize)]
struct SignInResponse {
    user: BackendUser,
}

#[derive(Serialize)]
struct NewUserRequest<'a> {
    email: &'a str,
    password: &'a str,
    email_confirm: bool,
    user_metadata: serde_json::Value,
}

#[derive(Deserialize)]
struct StorageObject {
    name: String,
}

impl BackendClient {
    pub fn new(settings: BackendSettings) -> Result<Self, BackendError> {
        let client = reqwest::ClientBuilder::new()
            .timeout(Duration::from_secs(20))
            .user_agent(concat!("villa_planner/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            settings,
            client,
            photo_cache: Mutex::new(HashMap::new()),
        })
    }

    /// Check the user's credentials with the backend's password sign-in and return the user.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<BackendUser, BackendError> {
        let response = self
            .client
            .post(format!(
                "{}/auth/v1/token?grant_type=password",
                self.settings.base_url
            ))
            .header("apikey", &self.settings.anon_key)
            .json(&json!({"email": email, "password": password}))
            .send()
            .await?;
        let response: SignInResponse = check_response(response).await?.json().await?;
        Ok(response.user)
    }

    /// Resolve a backend access token to the user it has been issued for.
    pub async fn get_user(&self, access_token: &str) -> Result<BackendUser, BackendError> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.settings.base_url))
            .header("apikey", &self.settings.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        Ok(check_response(response).await?.json().await?)
    }

    /// Create a new user with confirmed email address, so they can sign in immediately.
    pub async fn admin_create_user(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<BackendUser, BackendError> {
        let user_metadata = match full_name {
            Some(name) => json!({"full_name": name}),
            None => json!({}),
        };
        let response = self
            .client
            .post(format!("{}/auth/v1/admin/users", self.settings.base_url))
            .header("apikey", &self.settings.service_role_key)
            .bearer_auth(&self.settings.service_role_key)
            .json(&NewUserRequest {
                email,
                password,
                email_confirm: true,
                user_metadata,
            })
            .send()
            .await?;
        let user: BackendUser = check_response(response).await?.json().await?;
        log::info!("Created backend user {} for {}", user.id, email);
        Ok(user)
    }

    /// Delete a user from the backend's authentication service.
    pub async fn admin_delete_user(&self, user_id: UserId) -> Result<(), BackendError> {
        let response = self
            .client
            .delete(format!(
                "{}/auth/v1/admin/users/{}",
                self.settings.base_url, user_id
            ))
            .header("apikey", &self.settings.service_role_key)
            .bearer_auth(&self.settings.service_role_key)
            .send()
            .await?;
        check_response(response).await?;
        log::info!("Deleted backend user {}", user_id);
        Ok(())
    }

    /// Get the public urls of all photos of the apartment, ordered by file name.
    ///
    /// The result is cached per apartment until [Self::invalidate_photos] is called.
    pub async fn list_apartment_photos(
        &self,
        apartment_id: &str,
    ) -> Result<Vec<String>, BackendError> {
        if let Some(urls) = self.cached_photos(apartment_id) {
            return Ok(urls);
        }

        let response = self
            .client
            .post(format!(
                "{}/storage/v1/object/list/{}",
                self.settings.base_url, self.settings.photo_bucket
            ))
            .header("apikey", &self.settings.service_role_key)
            .bearer_auth(&self.settings.service_role_key)
            .json(&json!({
                "prefix": apartment_id,
                "limit": PHOTO_LIST_LIMIT,
                "offset": 0,
                "sortBy": {"column": "name", "order": "asc"},
            }))
            .send()
            .await?;
        let objects: Vec<StorageObject> = check_response(response).await?.json().await?;
        let urls: Vec<String> = photo_paths(apartment_id, objects.into_iter().map(|o| o.name))
            .iter()
            .map(|path| self.public_url(path))
            .collect();
        log::debug!("Listed {} photos of {}", urls.len(), apartment_id);

        self.lock_photo_cache()
            .insert(apartment_id.to_owned(), urls.clone());
        Ok(urls)
    }

    fn cached_photos(&self, apartment_id: &str) -> Option<Vec<String>> {
        self.lock_photo_cache().get(apartment_id).cloned()
    }

    /// Lock the photo cache, ignoring poisoning: the cache only holds plain url lists.
    fn lock_photo_cache(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<String>>> {
        self.photo_cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Drop the cached photo list of the apartment, so the next listing queries the backend again.
    pub fn invalidate_photos(&self, apartment_id: &str) {
        self.lock_photo_cache().remove(apartment_id);
    }

    /// Public url of an object in the photo bucket
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.settings.base_url, self.settings.photo_bucket, path
        )
    }
}

/// Build the object paths of an apartment's photos from the file names of a storage listing,
/// skipping folder placeholders.
fn photo_paths(apartment_id: &str, names: impl Iterator<Item = String>) -> Vec<String> {
    names
        .filter(|name| !name.is_empty() && !name.ends_with('/'))
        .map(|name| format!("{}/{}", apartment_id, name))
        .collect()
}

/// Turn a non-success response into a [BackendError::Status] with the backend's error message.
async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BackendError::Status {
        status: status.as_u16(),
        message: error_message_from_body(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_owned()),
    })
}

/// Extract the human readable error message from a JSON error response of the backend. The auth
/// and storage APIs use different keys for it.
fn error_message_from_body(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["msg", "message", "error_description", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()).map(|s| s.to_owned()))
}

#[derive(Debug)]
pub enum BackendError {
    /// The request could not be sent or the response could not be received
    Transport(reqwest::Error),
    /// The backend responded with a non-success status code
    Status { status: u16, message: String },
    /// The response of the backend could not be interpreted
    InvalidResponse(String),
}

impl BackendError {
    /// True if the backend rejected the request because of the client's data or credentials
    /// (as opposed to a failure of the backend or the connection)
    pub fn is_client_error(&self) -> bool {
        matches!(self, BackendError::Status { status, .. } if (400..500).contains(status))
    }

    /// The message for displaying to the user
    pub fn message(&self) -> String {
        match self {
            BackendError::Status { message, .. } => message.clone(),
            e => e.to_string(),
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::InvalidResponse(error.to_string())
        } else {
            Self::Transport(error)
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "Could not reach backend: {}", e),
            Self::Status { status, message } => {
                write!(f, "Backend responded with HTTP {}: {}", status, message)
            }
            Self::InvalidResponse(e) => write!(f, "Invalid response from backend: {}", e),
        }
    }
}

impl std::error::Error for BackendError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> BackendClient {
        BackendClient::new(BackendSettings {
            base_url: "https://backend.example.com".to_owned(),
            anon_key: "anon".to_owned(),
            service_role_key: "service".to_owned(),
            photo_bucket: "apartment-photos".to_owned(),
        })
        .unwrap()
    }

    #[test]
    fn test_photo_paths_skip_folders() {
        let names = vec![
            "01.jpg".to_owned(),
            "thumbs/".to_owned(),
            "".to_owned(),
            "02.jpg".to_owned(),
        ];
        assert_eq!(
            photo_paths("apt_3", names.into_iter()),
            vec!["apt_3/01.jpg", "apt_3/02.jpg"]
        );
    }

    #[test]
    fn test_public_url() {
        assert_eq!(
            client().public_url("apt_3/01.jpg"),
            "https://backend.example.com/storage/v1/object/public/apartment-photos/apt_3/01.jpg"
        );
    }

    #[test]
    fn test_photo_cache_invalidation() {
        let client = client();
        client
            .photo_cache
            .lock()
            .unwrap()
            .insert("apt_3".to_owned(), vec!["url".to_owned()]);
        assert_eq!(client.cached_photos("apt_3"), Some(vec!["url".to_owned()]));
        client.invalidate_photos("apt_3");
        assert_eq!(client.cached_photos("apt_3"), None);
    }

    #[test]
    fn test_error_message_from_body() {
        assert_eq!(
            error_message_from_body(
                r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#
            ),
            Some("Invalid login credentials".to_owned())
        );
        assert_eq!(
            error_message_from_body(r#"{"code":422,"msg":"User already registered"}"#),
            Some("User already registered".to_owned())
        );
        assert_eq!(error_message_from_body("<html>Bad gateway</html>"), None);
    }

    #[test]
    fn test_client_error_classification() {
        let rejected = BackendError::Status {
            status: 422,
            message: "User already registered".to_owned(),
        };
        assert!(rejected.is_client_error());
        assert_eq!(rejected.message(), "User already registered");
        let unavailable = BackendError::Status {
            status: 503,
            message: "Service Unavailable".to_owned(),
        };
        assert!(!unavailable.is_client_error());
    }
}
