use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Pipeline stage of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    #[default]
    Lead,
    Negotiating,
    Customer,
}

impl ClientStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientStatus::Lead => "lead",
            ClientStatus::Negotiating => "negotiating",
            ClientStatus::Customer => "customer",
        }
    }
}

impl fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClientStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lead" => Ok(ClientStatus::Lead),
            "negotiating" => Ok(ClientStatus::Negotiating),
            "customer" => Ok(ClientStatus::Customer),
            other => Err(Error::Validation(format!(
                "invalid status '{other}': must be one of lead, negotiating, customer"
            ))),
        }
    }
}

/// Channel of a recorded interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactType {
    #[default]
    Phone,
    Email,
    Visit,
    Other,
}

impl ContactType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactType::Phone => "phone",
            ContactType::Email => "email",
            ContactType::Visit => "visit",
            ContactType::Other => "other",
        }
    }
}

impl fmt::Display for ContactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContactType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "phone" => Ok(ContactType::Phone),
            "email" => Ok(ContactType::Email),
            "visit" => Ok(ContactType::Visit),
            "other" => Ok(ContactType::Other),
            other => Err(Error::Validation(format!(
                "invalid contact type '{other}': must be one of phone, email, visit, other"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_valid() {
        assert_eq!("lead".parse::<ClientStatus>().unwrap(), ClientStatus::Lead);
        assert_eq!(
            "negotiating".parse::<ClientStatus>().unwrap(),
            ClientStatus::Negotiating
        );
        assert_eq!(
            "customer".parse::<ClientStatus>().unwrap(),
            ClientStatus::Customer
        );
    }

    #[test]
    fn test_status_parse_invalid() {
        let err = "prospect".parse::<ClientStatus>().unwrap_err();
        assert!(err.to_string().contains("invalid status"));
    }

    #[test]
    fn test_status_default_is_lead() {
        assert_eq!(ClientStatus::default(), ClientStatus::Lead);
    }

    #[test]
    fn test_status_roundtrip() {
        for s in ["lead", "negotiating", "customer"] {
            assert_eq!(s.parse::<ClientStatus>().unwrap().as_str(), s);
        }
    }

    #[test]
    fn test_contact_type_parse() {
        assert_eq!("visit".parse::<ContactType>().unwrap(), ContactType::Visit);
        assert!("fax".parse::<ContactType>().is_err());
        assert_eq!(ContactType::default(), ContactType::Phone);
    }
}
