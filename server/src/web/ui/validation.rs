use crate::data_store::models::{ArrivalMode, EventStatus, GuestType};
use crate::web::client_accounts::MIN_PASSWORD_LENGTH;
use crate::web::ui::form_values::{
    FormValueRepresentation, ValidateFromFormInput, ValidationDataForFormValue,
};
use std::fmt::Debug;

/// A string that is not empty after trimming whitespace. The value is stored trimmed.
#[derive(Default, Debug, PartialEq)]
pub struct NonEmptyString(pub String);

impl NonEmptyString {
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl FormValueRepresentation for NonEmptyString {
    fn into_form_value_string(self) -> String {
        self.0
    }
}
impl ValidateFromFormInput for NonEmptyString {
    fn from_form_value(value: &str) -> Result<Self, String> {
        let value = value.trim();
        if value.is_empty() {
            Err("Must not be empty".to_owned())
        } else {
            Ok(NonEmptyString(value.to_owned()))
        }
    }
}

/// An email address, trimmed and lower-cased
#[derive(Default, Debug, PartialEq)]
pub struct EmailAddress(pub String);

impl EmailAddress {
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl FormValueRepresentation for EmailAddress {
    fn into_form_value_string(self) -> String {
        self.0
    }
}
impl ValidateFromFormInput for EmailAddress {
    fn from_form_value(value: &str) -> Result<Self, String> {
        let value = value.trim().to_lowercase();
        match value.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(Self(value)),
            _ => Err("Not a valid email address".to_owned()),
        }
    }
}

/// A new password. It is never rendered back into the form.
#[derive(Default, PartialEq)]
pub struct Password(pub String);

impl Password {
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}

impl FormValueRepresentation for Password {
    fn into_form_value_string(self) -> String {
        String::new()
    }
}
impl ValidateFromFormInput for Password {
    fn from_form_value(value: &str) -> Result<Self, String> {
        if value.chars().count() < MIN_PASSWORD_LENGTH {
            Err(format!(
                "Must have at least {} characters",
                MIN_PASSWORD_LENGTH
            ))
        } else {
            Ok(Self(value.to_owned()))
        }
    }
}

#[derive(Default, Debug, PartialEq)]
pub struct IsoDate(pub chrono::NaiveDate);

impl IsoDate {
    pub fn into_inner(self) -> chrono::NaiveDate {
        self.0
    }
}

impl FormValueRepresentation for IsoDate {
    fn into_form_value_string(self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }
}
impl ValidateFromFormInput for IsoDate {
    fn from_form_value(value: &str) -> Result<Self, String> {
        chrono::NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
            .map(IsoDate)
            .map_err(|_| "Not a valid date".to_owned())
    }
}

/// A date, which must be one of a given list of allowed dates
#[derive(Default, Debug, PartialEq)]
pub struct DateFromList(pub chrono::NaiveDate);

impl DateFromList {
    pub fn into_inner(self) -> chrono::NaiveDate {
        self.0
    }
}

impl FormValueRepresentation for DateFromList {
    fn into_form_value_string(self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }
}

impl ValidationDataForFormValue<DateFromList> for &Vec<chrono::NaiveDate> {
    fn validate_form_value(self, value: &'_ str) -> Result<DateFromList, String> {
        let date = IsoDate::from_form_value(value)?.into_inner();
        if self.contains(&date) {
            Ok(DateFromList(date))
        } else {
            Err("Date is not available for selection".to_owned())
        }
    }
}

/// An apartment id, which must be one of the event's apartments
#[derive(Default, Debug, PartialEq)]
pub struct ApartmentFromList(pub String);

impl ApartmentFromList {
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl FormValueRepresentation for ApartmentFromList {
    fn into_form_value_string(self) -> String {
        self.0
    }
}

impl ValidationDataForFormValue<ApartmentFromList> for &Vec<String> {
    fn validate_form_value(self, value: &'_ str) -> Result<ApartmentFromList, String> {
        if self.iter().any(|id| id == value) {
            Ok(ApartmentFromList(value.to_owned()))
        } else {
            Err("Unknown apartment".to_owned())
        }
    }
}

#[derive(Debug, PartialEq, Default)]
pub struct NonNegativeInt32(pub i32);

impl NonNegativeInt32 {
    pub fn into_inner(self) -> i32 {
        self.0
    }
}

impl FormValueRepresentation for NonNegativeInt32 {
    fn into_form_value_string(self) -> String {
        self.0.to_string()
    }
}

impl ValidateFromFormInput for NonNegativeInt32 {
    fn from_form_value(value: &'_ str) -> Result<Self, String> {
        let value = value
            .trim()
            .parse::<i32>()
            .map_err(|_| "Not a number".to_owned())?;
        if value < 0 {
            Err("Must not be negative".to_owned())
        } else {
            Ok(Self(value))
        }
    }
}

/// Age of a child guest in years (0 to 17)
#[derive(Debug, PartialEq, Default)]
pub struct ChildAge(pub i32);

impl ChildAge {
    pub fn into_inner(self) -> i32 {
        self.0
    }
}

impl FormValueRepresentation for ChildAge {
    fn into_form_value_string(self) -> String {
        self.0.to_string()
    }
}

impl ValidateFromFormInput for ChildAge {
    fn from_form_value(value: &'_ str) -> Result<Self, String> {
        let value = value
            .trim()
            .parse::<i32>()
            .map_err(|_| "Not a number".to_owned())?;
        if (0..=17).contains(&value) {
            Ok(Self(value))
        } else {
            Err("Must be between 0 and 17".to_owned())
        }
    }
}

/// An optional value. Empty (or whitespace-only) input is interpreted as `None`.
#[derive(Debug, PartialEq)]
pub struct MaybeEmpty<T>(pub Option<T>);

impl<T> MaybeEmpty<T> {
    pub fn into_inner(self) -> Option<T> {
        self.0
    }
}

impl<T> Default for MaybeEmpty<T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<T: FormValueRepresentation + PartialEq> FormValueRepresentation for MaybeEmpty<T> {
    fn into_form_value_string(self) -> String {
        match self.0 {
            None => "".to_owned(),
            Some(t) => t.into_form_value_string(),
        }
    }
}

impl<T: ValidateFromFormInput + PartialEq> ValidateFromFormInput for MaybeEmpty<T> {
    fn from_form_value(value: &'_ str) -> Result<Self, String> {
        if value.trim().is_empty() {
            Ok(Self(None))
        } else {
            Ok(Self(Some(T::from_form_value(value)?)))
        }
    }
}

impl<T: FormValueRepresentation + PartialEq, D: ValidationDataForFormValue<T>>
    ValidationDataForFormValue<MaybeEmpty<T>> for D
{
    fn validate_form_value(self, value: &'_ str) -> Result<MaybeEmpty<T>, String> {
        if value.trim().is_empty() {
            Ok(MaybeEmpty(None))
        } else {
            Ok(MaybeEmpty(Some(
                <D as ValidationDataForFormValue<T>>::validate_form_value(self, value)?,
            )))
        }
    }
}

impl FormValueRepresentation for GuestType {
    fn into_form_value_string(self) -> String {
        self.as_db_str().to_owned()
    }
}

impl ValidateFromFormInput for GuestType {
    fn from_form_value(value: &'_ str) -> Result<Self, String> {
        GuestType::from_db_str(value).ok_or_else(|| "Unknown guest type".to_owned())
    }
}

impl FormValueRepresentation for ArrivalMode {
    fn into_form_value_string(self) -> String {
        self.as_db_str().to_owned()
    }
}

impl ValidateFromFormInput for ArrivalMode {
    fn from_form_value(value: &'_ str) -> Result<Self, String> {
        ArrivalMode::from_db_str(value).ok_or_else(|| "Unknown arrival mode".to_owned())
    }
}

impl FormValueRepresentation for EventStatus {
    fn into_form_value_string(self) -> String {
        self.as_db_str().to_owned()
    }
}

impl ValidateFromFormInput for EventStatus {
    fn from_form_value(value: &'_ str) -> Result<Self, String> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_non_empty_string_is_trimmed() {
        assert_eq!(
            NonEmptyString::from_form_value("  Anna ").unwrap(),
            NonEmptyString("Anna".to_owned())
        );
        assert!(NonEmptyString::from_form_value("   ").is_err());
    }

    #[test]
    fn test_email_address() {
        assert_eq!(
            EmailAddress::from_form_value(" Anna@Example.COM ")
                .unwrap()
                .into_inner(),
            "anna@example.com"
        );
        assert!(EmailAddress::from_form_value("anna").is_err());
        assert!(EmailAddress::from_form_value("@example.com").is_err());
    }

    #[test]
    fn test_password_is_not_rendered() {
        assert!(Password::from_form_value("12345").is_err());
        let password = Password::from_form_value("123456").unwrap();
        assert_eq!(format!("{:?}", password), "Password(***)");
        assert_eq!(password.into_form_value_string(), "");
    }

    #[test]
    fn test_child_age_bounds() {
        assert_eq!(ChildAge::from_form_value("0").unwrap(), ChildAge(0));
        assert_eq!(ChildAge::from_form_value("17").unwrap(), ChildAge(17));
        assert!(ChildAge::from_form_value("18").is_err());
        assert!(ChildAge::from_form_value("-1").is_err());
        assert!(ChildAge::from_form_value("seven").is_err());
        assert_eq!(
            MaybeEmpty::<ChildAge>::from_form_value(" ").unwrap(),
            MaybeEmpty(None)
        );
    }

    #[test]
    fn test_date_from_list() {
        let choices = vec![
            NaiveDate::from_ymd_opt(2026, 6, 11).unwrap(),
            NaiveDate::from_ymd_opt(2026, 6, 12).unwrap(),
        ];
        // The trait's type parameter must be given explicitly, due to the generic implementation
        // for MaybeEmpty
        let result = <&Vec<NaiveDate> as ValidationDataForFormValue<DateFromList>>::validate_form_value(
            &choices,
            "2026-06-11",
        );
        assert_eq!(result.unwrap().into_inner(), choices[0]);
        assert!(
            <&Vec<NaiveDate> as ValidationDataForFormValue<DateFromList>>::validate_form_value(
                &choices,
                "2026-06-10",
            )
            .is_err()
        );
        let result = <&Vec<NaiveDate> as ValidationDataForFormValue<MaybeEmpty<DateFromList>>>::validate_form_value(
            &choices,
            "",
        );
        assert_eq!(result.unwrap(), MaybeEmpty(None));
    }

    #[test]
    fn test_apartment_from_list() {
        let apartments = vec!["apt_1".to_owned(), "apt_wc".to_owned()];
        assert!(
            <&Vec<String> as ValidationDataForFormValue<ApartmentFromList>>::validate_form_value(
                &apartments,
                "apt_wc",
            )
            .is_ok()
        );
        assert!(
            <&Vec<String> as ValidationDataForFormValue<ApartmentFromList>>::validate_form_value(
                &apartments,
                "apt_99",
            )
            .is_err()
        );
    }

    #[test]
    fn test_enum_values() {
        assert_eq!(GuestType::from_form_value("child"), Ok(GuestType::Child));
        assert!(GuestType::from_form_value("baby").is_err());
        assert_eq!(
            MaybeEmpty::<ArrivalMode>::from_form_value("").unwrap(),
            MaybeEmpty(None)
        );
        assert_eq!(EventStatus::from_form_value("final"), Ok(EventStatus::Final));
    }
}
