use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::ids::UserId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AccountError {
    #[error("name cannot be empty")]
    EmptyName,

    #[error("email cannot be empty")]
    EmptyEmail,

    #[error("email must contain '@'")]
    InvalidEmail,

    #[error("password cannot be empty")]
    EmptyPassword,

    #[error("unknown qualification: {0}")]
    UnknownQualification(String),
}

//
// ─── CURRENT USER ──────────────────────────────────────────────────────────────
//

/// The authenticated user as reported by `GET /users/me`.
///
/// The server treats this as an open record; fields this client does not
/// model are kept in `extra` so nothing is lost when it is re-serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "isAdmin", default)]
    pub is_admin: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CurrentUser {
    #[must_use]
    pub fn new(name: impl Into<String>, is_admin: bool) -> Self {
        Self {
            id: None,
            name: name.into(),
            is_admin,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: UserId) -> Self {
        self.id = Some(id);
        self
    }
}

//
// ─── CREDENTIALS ───────────────────────────────────────────────────────────────
//

/// Login payload for `POST /login`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    /// # Errors
    ///
    /// Returns `AccountError` if the email or password is blank.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Result<Self, AccountError> {
        let email = email.into().trim().to_owned();
        let password = password.into();
        if email.is_empty() {
            return Err(AccountError::EmptyEmail);
        }
        if password.is_empty() {
            return Err(AccountError::EmptyPassword);
        }
        Ok(Self { email, password })
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

//
// ─── REGISTRATION ──────────────────────────────────────────────────────────────
//

/// Highest education level, as accepted by the registration endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Qualification {
    Matriculation,
    #[serde(rename = "Senior Secondary")]
    SeniorSecondary,
    Graduation,
    #[serde(rename = "Post Graduation")]
    PostGraduation,
    #[serde(rename = "PhD")]
    Phd,
}

impl Qualification {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Matriculation => "Matriculation",
            Self::SeniorSecondary => "Senior Secondary",
            Self::Graduation => "Graduation",
            Self::PostGraduation => "Post Graduation",
            Self::Phd => "PhD",
        }
    }
}

impl fmt::Display for Qualification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Qualification {
    type Err = AccountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "matriculation" => Ok(Self::Matriculation),
            "senior secondary" => Ok(Self::SeniorSecondary),
            "graduation" => Ok(Self::Graduation),
            "post graduation" => Ok(Self::PostGraduation),
            "phd" => Ok(Self::Phd),
            _ => Err(AccountError::UnknownQualification(s.to_owned())),
        }
    }
}

/// Sign-up payload for `POST /register`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    name: String,
    email: String,
    password: String,
    qualification: Qualification,
    dob: NaiveDate,
}

impl Registration {
    /// # Errors
    ///
    /// Returns `AccountError` for a blank name or password, or a malformed email.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        qualification: Qualification,
        dob: NaiveDate,
    ) -> Result<Self, AccountError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(AccountError::EmptyName);
        }
        let credentials = Credentials::new(email, password)?;
        if !credentials.email.contains('@') {
            return Err(AccountError::InvalidEmail);
        }
        Ok(Self {
            name,
            email: credentials.email,
            password: credentials.password,
            qualification,
            dob,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn qualification(&self) -> Qualification {
        self.qualification
    }

    #[must_use]
    pub fn dob(&self) -> NaiveDate {
        self.dob
    }

    /// Credentials that log in as the account this payload creates.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials {
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("qualification", &self.qualification)
            .field("dob", &self.dob)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_date;

    #[test]
    fn current_user_keeps_unknown_fields() {
        let user: CurrentUser =
            serde_json::from_str(r#"{"id":3,"name":"a","isAdmin":true,"theme":"dark"}"#).unwrap();
        assert_eq!(user.id, Some(UserId::new(3)));
        assert!(user.is_admin);
        assert_eq!(user.extra.get("theme"), Some(&Value::from("dark")));
    }

    #[test]
    fn current_user_admin_flag_defaults_to_false() {
        let user: CurrentUser = serde_json::from_str(r#"{"name":"a"}"#).unwrap();
        assert!(!user.is_admin);
        assert_eq!(user.id, None);
    }

    #[test]
    fn credentials_reject_blank_fields() {
        assert_eq!(Credentials::new("  ", "pw"), Err(AccountError::EmptyEmail));
        assert_eq!(Credentials::new("a@b.c", ""), Err(AccountError::EmptyPassword));
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials::new("a@b.c", "hunter2").unwrap();
        assert!(!format!("{creds:?}").contains("hunter2"));
    }

    #[test]
    fn registration_serializes_wire_shape() {
        let reg = Registration::new(
            "Ada",
            "ada@example.com",
            "pw",
            Qualification::PostGraduation,
            fixed_date(),
        )
        .unwrap();
        let json = serde_json::to_value(&reg).unwrap();
        assert_eq!(json["qualification"], "Post Graduation");
        assert_eq!(json["dob"], "2023-11-14");
        assert_eq!(json["email"], "ada@example.com");
    }

    #[test]
    fn registration_requires_email_shape() {
        let err = Registration::new("Ada", "ada", "pw", Qualification::Phd, fixed_date());
        assert_eq!(err, Err(AccountError::InvalidEmail));
    }

    #[test]
    fn qualification_parses_loose_spellings() {
        assert_eq!(
            "senior-secondary".parse::<Qualification>(),
            Ok(Qualification::SeniorSecondary)
        );
        assert!("wizard".parse::<Qualification>().is_err());
    }
}
