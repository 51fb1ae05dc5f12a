use crate::model::{Id, auth::PasswordHash, post::PostMarker};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use thiserror::Error;

pub const USERNAME_MIN_LEN: usize = 3;
pub const PASSWORD_MIN_LEN: usize = 3;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct UserMarker;

/// A user as exposed over the API. The password hash is never part of it.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct User {
    pub id: Id<UserMarker>,
    pub username: Username,
    pub name: Option<String>,
    pub posts: Vec<Id<PostMarker>>,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct Username(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The username is invalid: {0:?}")]
pub struct InvalidUsernameError(String);

impl Username {
    pub fn new(username: String) -> Result<Self, InvalidUsernameError> {
        if username.chars().count() >= USERNAME_MIN_LEN {
            Ok(Username(username))
        } else {
            Err(InvalidUsernameError(username))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<'de> Deserialize<'de> for Username {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        Username::new(inner)
            .map_err(|err| Error::invalid_value(Unexpected::Str(&err.0), &"Username"))
    }
}

/// Request body for registering a user.
#[derive(Clone, Eq, PartialEq, Default, Hash, Deserialize)]
pub struct CreateUser {
    pub username: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for CreateUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUser")
            .field("username", &self.username)
            .field("name", &self.name)
            .field("password", &"[redacted]")
            .finish()
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("username and password must be set and at least three characters long")]
pub struct InvalidRegistrationError;

/// A registration whose username and password passed the length checks.
pub struct Registration {
    pub username: Username,
    pub name: Option<String>,
    pub password: String,
}

impl CreateUser {
    pub fn validate(self) -> Result<Registration, InvalidRegistrationError> {
        let password = self
            .password
            .filter(|password| password.chars().count() >= PASSWORD_MIN_LEN)
            .ok_or(InvalidRegistrationError)?;
        let username = self
            .username
            .and_then(|username| Username::new(username).ok())
            .ok_or(InvalidRegistrationError)?;

        Ok(Registration {
            username,
            name: self.name,
            password,
        })
    }
}

/// A user ready to be stored.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct UserDraft {
    pub username: Username,
    pub name: Option<String>,
    pub password_hash: PasswordHash,
}

/// What login needs to know about a stored user.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct UserCredentials {
    pub id: Id<UserMarker>,
    pub username: Username,
    pub name: Option<String>,
    pub password_hash: PasswordHash,
}

#[cfg(test)]
mod tests {
    use crate::model::user::{CreateUser, InvalidRegistrationError, Username};

    fn create_user(username: Option<&str>, password: Option<&str>) -> CreateUser {
        CreateUser {
            username: username.map(str::to_owned),
            name: Some("Arto Hellas".to_owned()),
            password: password.map(str::to_owned),
        }
    }

    #[test]
    fn username_needs_three_characters() {
        assert!(Username::new("ab".to_owned()).is_err());
        assert!(Username::new("abc".to_owned()).is_ok());
        assert!(Username::new("äöü".to_owned()).is_ok());
    }

    #[test]
    fn registration_checks_both_fields() {
        assert!(create_user(Some("hellas"), Some("secret")).validate().is_ok());

        for (username, password) in [
            (None, Some("secret")),
            (Some("hellas"), None),
            (Some("he"), Some("secret")),
            (Some("hellas"), Some("pw")),
        ] {
            assert_eq!(
                create_user(username, password).validate().err(),
                Some(InvalidRegistrationError)
            );
        }
    }

    #[test]
    fn username_deserialization_validates() {
        assert!(serde_json::from_str::<Username>(r#""root""#).is_ok());
        assert!(serde_json::from_str::<Username>(r#""ro""#).is_err());
    }

    #[test]
    fn debug_hides_password() {
        let debug = format!("{:?}", create_user(Some("hellas"), Some("hunter22")));
        assert!(!debug.contains("hunter22"));
    }
}
