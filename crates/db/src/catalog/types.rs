//! Enumerated column types
//!
//! Stored as plain text and validated at the row-decode boundary: a null
//! column falls back to the default variant, an out-of-set string is an
//! [`DbError::InvalidEnumValue`]. Historical rows predate the allowed
//! sets, so validation cannot be pushed into the column definition.

use serde::{Deserialize, Serialize};

use crate::error::{DbError, DbResult};

/// Kind of a holding comment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HoldingCommentType {
    Review,
    Comment,
    TrackWarning,
    #[default]
    Other,
}

impl HoldingCommentType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            HoldingCommentType::Review => "REVIEW",
            HoldingCommentType::Comment => "COMMENT",
            HoldingCommentType::TrackWarning => "TRACK_WARNING",
            HoldingCommentType::Other => "OTHER",
        }
    }

    pub fn parse(value: &str) -> DbResult<Self> {
        match value {
            "REVIEW" => Ok(HoldingCommentType::Review),
            "COMMENT" => Ok(HoldingCommentType::Comment),
            "TRACK_WARNING" => Ok(HoldingCommentType::TrackWarning),
            "OTHER" => Ok(HoldingCommentType::Other),
            other => Err(DbError::InvalidEnumValue {
                column: "holding_comments.type",
                value: other.to_string(),
            }),
        }
    }

    /// Decode a nullable stored value; null means [`Self::Other`].
    pub fn from_nullable(value: Option<&str>) -> DbResult<Self> {
        match value {
            None => Ok(HoldingCommentType::Other),
            Some(v) => Self::parse(v),
        }
    }
}

impl std::fmt::Display for HoldingCommentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a track has been checked for FCC-restricted content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackFccStatus {
    Yes,
    No,
    #[default]
    Unknown,
}

impl TrackFccStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TrackFccStatus::Yes => "YES",
            TrackFccStatus::No => "NO",
            TrackFccStatus::Unknown => "UNKNOWN",
        }
    }

    pub fn parse(value: &str) -> DbResult<Self> {
        match value {
            "YES" => Ok(TrackFccStatus::Yes),
            "NO" => Ok(TrackFccStatus::No),
            "UNKNOWN" => Ok(TrackFccStatus::Unknown),
            other => Err(DbError::InvalidEnumValue {
                column: "tracks.has_fcc",
                value: other.to_string(),
            }),
        }
    }

    /// Decode a nullable stored value; null means [`Self::Unknown`].
    pub fn from_nullable(value: Option<&str>) -> DbResult<Self> {
        match value {
            None => Ok(TrackFccStatus::Unknown),
            Some(v) => Self::parse(v),
        }
    }
}

impl std::fmt::Display for TrackFccStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_comment_type_defaults_to_other() {
        assert_eq!(
            HoldingCommentType::from_nullable(None).unwrap(),
            HoldingCommentType::Other
        );
    }

    #[test]
    fn known_comment_types_round_trip() {
        for value in ["REVIEW", "COMMENT", "TRACK_WARNING", "OTHER"] {
            let parsed = HoldingCommentType::parse(value).unwrap();
            assert_eq!(parsed.as_str(), value);
        }
    }

    #[test]
    fn bogus_comment_type_is_rejected() {
        let err = HoldingCommentType::parse("BOGUS").unwrap_err();
        match err {
            DbError::InvalidEnumValue { column, value } => {
                assert_eq!(column, "holding_comments.type");
                assert_eq!(value, "BOGUS");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn null_fcc_status_defaults_to_unknown() {
        assert_eq!(
            TrackFccStatus::from_nullable(None).unwrap(),
            TrackFccStatus::Unknown
        );
    }

    #[test]
    fn fcc_statuses_round_trip() {
        for value in ["YES", "NO", "UNKNOWN"] {
            assert_eq!(TrackFccStatus::parse(value).unwrap().as_str(), value);
        }
    }

    #[test]
    fn bogus_fcc_status_is_rejected() {
        assert!(matches!(
            TrackFccStatus::from_nullable(Some("MAYBE")),
            Err(DbError::InvalidEnumValue { .. })
        ));
    }
}
