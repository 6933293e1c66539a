//! Flash messages: short notifications for the user, which are stored in a cookie until the next
//! page is rendered. Typically used to report the outcome of a form submission after redirecting.

use actix_web::cookie::Cookie;
use actix_web::http::header::{HeaderValue, SET_COOKIE};
use actix_web::{HttpMessage, HttpRequest};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashType {
    Info,
    Success,
    Warning,
    Error,
}

impl FlashType {
    pub fn css_class(&self) -> &'static str {
        match self {
            FlashType::Info => "info",
            FlashType::Success => "success",
            FlashType::Warning => "warning",
            FlashType::Error => "error",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FlashMessage {
    pub flash_type: FlashType,
    pub message: String,
}

impl FlashMessage {
    pub fn new(flash_type: FlashType, message: impl Into<String>) -> Self {
        Self {
            flash_type,
            message: message.into(),
        }
    }
}

struct Flashes {
    flashes: Vec<FlashMessage>,
    dirty: bool,
}

const COOKIE_NAME: &str = "flash";

impl Flashes {
    fn from_cookie(request: &HttpRequest) -> Result<Self, serde_json::Error> {
        let flashes = match request.cookie(COOKIE_NAME) {
            Some(cookie) => serde_json::from_str(cookie.value())?,
            None => vec![],
        };
        Ok(Flashes {
            flashes,
            dirty: false,
        })
    }

    fn into_cookie(self) -> Result<Cookie<'static>, serde_json::Error> {
        let mut result = Cookie::new(COOKIE_NAME, serde_json::to_string(&self.flashes)?);
        result.set_path("/");
        result.set_http_only(true);
        Ok(result)
    }
}

pub trait FlashesInterface {
    fn add_flash_message(&self, flash: FlashMessage);

    fn get_and_clear_flashes(&self) -> Vec<FlashMessage>;
}

impl FlashesInterface for HttpRequest {
    fn add_flash_message(&self, flash: FlashMessage) {
        if let Some(flashes) = self.extensions_mut().get_mut::<Flashes>() {
            flashes.flashes.push(flash);
            flashes.dirty = true;
            return;
        }
        // Must not be within the `if let` statement to avoid panicking of the `extensions` RefCell
        self.extensions_mut().insert(Flashes {
            flashes: vec![flash],
            dirty: true,
        });
    }

    fn get_and_clear_flashes(&self) -> Vec<FlashMessage> {
        self.extensions_mut()
            .get_mut::<Flashes>()
            .map(|flashes| {
                if !flashes.flashes.is_empty() {
                    flashes.dirty = true;
                }
                std::mem::take(&mut flashes.flashes)
            })
            .unwrap_or_default()
    }
}

/// An actix-web middleware for loading the flash messages from the request's cookie and storing
/// the remaining (or new) flash messages in the response's cookie.
pub async fn flash_middleware(
    req: actix_web::dev::ServiceRequest,
    next: actix_web::middleware::Next<impl actix_web::body::MessageBody>,
) -> Result<actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>, actix_web::Error> {
    // Ignore errors while parsing flashes from Request
    if let Ok(flashes) = Flashes::from_cookie(req.request()) {
        req.extensions_mut().insert(flashes);
    }

    let mut response = next.call(req).await?;

    let flashes = response.request().extensions_mut().remove::<Flashes>();
    if let Some(flashes) = flashes.filter(|f| f.dirty) {
        let cookie = flashes
            .into_cookie()
            .map_err(actix_web::error::ErrorInternalServerError)?;
        let val = HeaderValue::from_str(&cookie.to_string())?;
        response.headers_mut().append(SET_COOKIE, val);
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_add_and_clear_flashes() {
        let req = TestRequest::default().to_http_request();
        assert!(req.get_and_clear_flashes().is_empty());
        req.add_flash_message(FlashMessage::new(FlashType::Success, "Guest added"));
        req.add_flash_message(FlashMessage::new(FlashType::Error, "Apartment is full"));
        let flashes = req.get_and_clear_flashes();
        assert_eq!(flashes.len(), 2);
        assert_eq!(flashes[1].flash_type, FlashType::Error);
        assert!(req.get_and_clear_flashes().is_empty());
    }
}
