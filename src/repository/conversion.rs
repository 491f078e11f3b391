use std::{collections::BTreeSet, str::FromStr};

use thiserror::Error;
use time::{format_description::FormatItem, macros::format_description, PrimitiveDateTime};

use crate::models::{
    types::{Division, LocalDateTime},
    CompletedMatchId, Phase, ProposalId, ProposalStatus, RequirementPhase,
};

pub trait DBConvertible: Sized {
    type DBType;

    fn to_db(&self) -> Result<Self::DBType, DBToConversionError>;

    fn from_db(value: &Self::DBType) -> Result<Self, DBFromConversionError>;
}

#[derive(Debug, Error)]
pub enum DBFromConversionError {
    #[error("Failed to parse datetime: {0}")]
    DateTime(#[from] time::error::Parse),
    #[error("Failed to parse enum variant: {0}")]
    NoSuchVariant(String),
    #[error("Invalid number: {0}")]
    InvalidNumber(i64),
    #[error("Failed to parse divisions: {0}")]
    Divisions(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum DBToConversionError {
    #[error("Failed to format datetime")]
    DateTime(#[from] time::error::Format),
    #[error("Failed to serialize divisions: {0}")]
    Divisions(#[from] serde_json::Error),
    #[error("Number out of range: {0}")]
    InvalidNumber(u64),
}

const DATETIME_FORMAT: &[FormatItem<'_>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

impl DBConvertible for LocalDateTime {
    type DBType = String;

    fn to_db(&self) -> Result<Self::DBType, DBToConversionError> {
        let string = PrimitiveDateTime::from(*self).format(DATETIME_FORMAT)?;
        Ok(string)
    }

    fn from_db(db_value: &Self::DBType) -> Result<Self, DBFromConversionError> {
        let datetime = PrimitiveDateTime::parse(db_value, DATETIME_FORMAT)?;
        Ok(LocalDateTime::from(datetime))
    }
}

fn id_to_db(id: u64) -> Result<i64, DBToConversionError> {
    i64::try_from(id).map_err(|_| DBToConversionError::InvalidNumber(id))
}

fn id_from_db(value: i64) -> Result<u64, DBFromConversionError> {
    u64::try_from(value).map_err(|_| DBFromConversionError::InvalidNumber(value))
}

impl DBConvertible for ProposalId {
    type DBType = i64;

    fn to_db(&self) -> Result<Self::DBType, DBToConversionError> {
        id_to_db(self.0)
    }

    fn from_db(value: &Self::DBType) -> Result<Self, DBFromConversionError> {
        Ok(ProposalId(id_from_db(*value)?))
    }
}

impl DBConvertible for CompletedMatchId {
    type DBType = i64;

    fn to_db(&self) -> Result<Self::DBType, DBToConversionError> {
        id_to_db(self.0)
    }

    fn from_db(value: &Self::DBType) -> Result<Self, DBFromConversionError> {
        Ok(CompletedMatchId(id_from_db(*value)?))
    }
}

impl DBConvertible for ProposalStatus {
    type DBType = String;

    fn to_db(&self) -> Result<Self::DBType, DBToConversionError> {
        Ok(<&'static str>::from(*self).to_string())
    }

    fn from_db(value: &Self::DBType) -> Result<Self, DBFromConversionError> {
        ProposalStatus::from_str(value)
            .map_err(|_| DBFromConversionError::NoSuchVariant(value.clone()))
    }
}

impl DBConvertible for Phase {
    type DBType = String;

    fn to_db(&self) -> Result<Self::DBType, DBToConversionError> {
        Ok(<&'static str>::from(*self).to_string())
    }

    fn from_db(value: &Self::DBType) -> Result<Self, DBFromConversionError> {
        Phase::from_str(value).map_err(|_| DBFromConversionError::NoSuchVariant(value.clone()))
    }
}

impl DBConvertible for RequirementPhase {
    type DBType = i64;

    fn to_db(&self) -> Result<Self::DBType, DBToConversionError> {
        Ok(self.0 as _)
    }

    fn from_db(value: &Self::DBType) -> Result<Self, DBFromConversionError> {
        u8::try_from(*value)
            .map(RequirementPhase)
            .map_err(|_| DBFromConversionError::InvalidNumber(*value))
    }
}

/// Division sets are stored as a JSON array of display names.
impl DBConvertible for BTreeSet<Division> {
    type DBType = String;

    fn to_db(&self) -> Result<Self::DBType, DBToConversionError> {
        let names: Vec<&str> = self.iter().map(|division| division.as_ref()).collect();
        Ok(serde_json::to_string(&names)?)
    }

    fn from_db(value: &Self::DBType) -> Result<Self, DBFromConversionError> {
        let names: Vec<String> = serde_json::from_str(value)?;
        Ok(names
            .into_iter()
            .map(Division::new)
            .filter(|division| !division.is_blank())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use map_macro::btree_set;
    use time::macros::datetime;

    use super::DBConvertible;
    use crate::models::{
        types::{Division, LocalDateTime},
        Phase, ProposalStatus,
    };

    #[test]
    fn datetime_text() {
        let value: LocalDateTime = datetime!(2024-03-01 18:30:05).into();
        assert_eq!(value.to_db().unwrap(), "2024-03-01T18:30:05");
        assert_eq!(
            LocalDateTime::from_db(&"2024-03-01T18:30:05".to_string()).unwrap(),
            value
        );
    }

    #[test]
    fn enums_use_lowercase_names() {
        assert_eq!(ProposalStatus::Countered.to_db().unwrap(), "countered");
        assert_eq!(Phase::Challenge.to_db().unwrap(), "challenge");
        assert!(ProposalStatus::from_db(&"accepted".to_string()).is_err());
    }

    #[test]
    fn divisions_json() {
        let divisions = btree_set! { Division::new("Monday 8-Ball"), Division::new("Friday 9-Ball") };
        assert_eq!(
            divisions.to_db().unwrap(),
            r#"["Friday 9-Ball","Monday 8-Ball"]"#
        );
    }

    #[test]
    fn malformed_divisions_are_an_error() {
        assert!(BTreeSet::<Division>::from_db(&"Monday 8-Ball".to_string()).is_err());
        assert!(BTreeSet::<Division>::from_db(&r#"{"name":"x"}"#.to_string()).is_err());
    }

    #[test]
    fn blank_division_names_are_dropped() {
        let divisions = BTreeSet::<Division>::from_db(&r#"["  ", "Monday"]"#.to_string()).unwrap();
        assert_eq!(divisions, btree_set! { Division::new("monday") });
    }
}
