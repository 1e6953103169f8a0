//! School domain types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of establishment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchoolType {
    /// Primary school.
    Primary,
    /// Middle school.
    Middle,
    /// High school.
    High,
    /// Vocational school.
    Vocational,
    /// University or other higher education.
    Higher,
    /// Anything else.
    Other,
}

impl SchoolType {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Middle => "middle",
            Self::High => "high",
            Self::Vocational => "vocational",
            Self::Higher => "higher",
            Self::Other => "other",
        }
    }

    /// Parses from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "primary" => Some(Self::Primary),
            "middle" => Some(Self::Middle),
            "high" => Some(Self::High),
            "vocational" => Some(Self::Vocational),
            "higher" => Some(Self::Higher),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl fmt::Display for SchoolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commercial relationship with the school.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartnerStatus {
    /// Not yet a partner.
    Prospect,
    /// Current partner.
    ActivePartner,
    /// Former partner.
    InactivePartner,
}

impl PartnerStatus {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Prospect => "prospect",
            Self::ActivePartner => "active_partner",
            Self::InactivePartner => "inactive_partner",
        }
    }

    /// Parses from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "prospect" => Some(Self::Prospect),
            "active_partner" => Some(Self::ActivePartner),
            "inactive_partner" => Some(Self::InactivePartner),
            _ => None,
        }
    }
}

impl fmt::Display for PartnerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A person to reach at the school.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Full name.
    pub name: String,
    /// Position, e.g. "head teacher".
    #[serde(default)]
    pub role: Option<String>,
    /// Email address. Notification emails go to every contact that has one.
    #[serde(default)]
    pub email: Option<String>,
    /// Phone number.
    #[serde(default)]
    pub phone: Option<String>,
}

/// Inclusive range of calendar dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day.
    pub start: NaiveDate,
    /// Last day (inclusive).
    pub end: NaiveDate,
    /// Optional label ("winter break").
    #[serde(default)]
    pub label: Option<String>,
}

impl DateRange {
    /// Returns true if `day` falls in the range.
    #[must_use]
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

/// Collects contact emails, skipping blanks.
#[must_use]
pub fn contact_emails(contacts: &[Contact]) -> Vec<String> {
    contacts
        .iter()
        .filter_map(|c| c.email.as_deref())
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("primary", SchoolType::Primary)]
    #[case("VOCATIONAL", SchoolType::Vocational)]
    #[case("higher", SchoolType::Higher)]
    fn test_school_type_parse(#[case] input: &str, #[case] expected: SchoolType) {
        assert_eq!(SchoolType::parse(input), Some(expected));
    }

    #[test]
    fn test_partner_status_roundtrip() {
        for status in [
            PartnerStatus::Prospect,
            PartnerStatus::ActivePartner,
            PartnerStatus::InactivePartner,
        ] {
            assert_eq!(PartnerStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(PartnerStatus::parse("partner"), None);
    }

    #[test]
    fn test_date_range_inclusive() {
        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2026, 2, 14).unwrap(),
            end: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            label: None,
        };
        assert!(range.contains(NaiveDate::from_ymd_opt(2026, 2, 14).unwrap()));
        assert!(range.contains(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()));
    }

    #[test]
    fn test_contact_emails() {
        let contacts = vec![
            Contact {
                name: "A".into(),
                role: None,
                email: Some(" a@school.fr ".into()),
                phone: None,
            },
            Contact {
                name: "B".into(),
                role: None,
                email: Some(String::new()),
                phone: None,
            },
            Contact {
                name: "C".into(),
                role: None,
                email: None,
                phone: Some("0102".into()),
            },
        ];
        assert_eq!(contact_emails(&contacts), vec!["a@school.fr".to_string()]);
    }
}
