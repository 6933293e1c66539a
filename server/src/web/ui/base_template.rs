use crate::data_store::auth_token::{AccessRole, AuthToken};
use crate::data_store::models::Event;
use crate::web::ui::flash::{FlashMessage, FlashesInterface};
use crate::web::ui::Resources;
use actix_web::error::UrlGenerationError;
use actix_web::HttpRequest;
use std::fmt::Write;

/// Common template data for all ui templates extending the `base.html` template
///
/// This struct must be a part of the template data structure, as the field `base`.
/// The contained data and functions can be used by the individual template's code, as well.
#[derive(Debug)]
pub struct BaseTemplateContext<'a> {
    /// The HTTP request the template is used to respond to. Used for creating ressource urls and
    /// extracting the flash messages
    pub request: &'a HttpRequest,
    /// HTML title
    pub page_title: &'a str,
    /// If the current page belongs to the context of an event, the information about the event.
    /// This is used for rendering the navigation bar.
    pub event: Option<&'a Event>,
    /// Which user is logged in (if any). Used for rendering the navigation bar.
    pub user: UserNavigation,
}

/// The kind of logged-in user, which determines the navigation bar entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserNavigation {
    Anonymous,
    Client,
    Admin,
}

impl UserNavigation {
    pub fn for_admin(is_admin: bool) -> Self {
        if is_admin {
            Self::Admin
        } else {
            Self::Client
        }
    }

    pub fn for_auth_token(auth: &AuthToken) -> Self {
        Self::for_admin(auth.roles().contains(&AccessRole::Admin))
    }
}

impl BaseTemplateContext<'_> {
    pub fn url_for_static(&self, file: &str) -> Result<String, UrlGenerationError> {
        let mut url = self.request.url_for("static_resources", [file])?;
        url.query_pairs_mut().append_pair(
            "hash",
            &Resources::get(file)
                .map(|f| bytes_to_hex(&f.metadata.sha256_hash()))
                .unwrap_or("unknown".to_string()),
        );
        Ok(url.to_string())
    }

    pub fn get_flashes(&self) -> Vec<FlashMessage> {
        self.request.get_and_clear_flashes()
    }

    pub fn is_logged_in(&self) -> bool {
        self.user != UserNavigation::Anonymous
    }

    pub fn is_admin(&self) -> bool {
        self.user == UserNavigation::Admin
    }
}

fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::new(), |mut output, b| {
        let _ = write!(output, "{:02x}", b);
        output
    })
}
