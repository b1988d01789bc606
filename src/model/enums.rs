//! Closed enumerations stored as strings

use std::fmt;

use serde::{Deserialize, Serialize};

/// Administrative sex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "O")]
    Other,
    #[serde(rename = "U")]
    Unknown,
}

impl Sex {
    pub const ALL: [Sex; 4] = [Sex::Male, Sex::Female, Sex::Other, Sex::Unknown];

    /// Stored single-letter code
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
            Sex::Other => "O",
            Sex::Unknown => "U",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Triage category, declared from most to least urgent.
///
/// The stored value is the label only; sort by [`Priority::rank`] when
/// ordering by clinical urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Immediate,
    #[serde(rename = "Very Urgent")]
    VeryUrgent,
    Urgent,
    Standard,
    #[serde(rename = "Non-Urgent")]
    NonUrgent,
}

impl Priority {
    pub const ALL: [Priority; 5] = [
        Priority::Immediate,
        Priority::VeryUrgent,
        Priority::Urgent,
        Priority::Standard,
        Priority::NonUrgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Immediate => "Immediate",
            Priority::VeryUrgent => "Very Urgent",
            Priority::Urgent => "Urgent",
            Priority::Standard => "Standard",
            Priority::NonUrgent => "Non-Urgent",
        }
    }

    /// Numeric urgency, 1 (Immediate) to 5 (Non-Urgent)
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Immediate => 1,
            Priority::VeryUrgent => 2,
            Priority::Urgent => 3,
            Priority::Standard => 4,
            Priority::NonUrgent => 5,
        }
    }

    /// Looks up a stored label
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == label)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow status of a triage entry.
///
/// No transition graph is enforced here; any status may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Cancelled,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Open,
        Status::InProgress,
        Status::Completed,
        Status::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Open => "Open",
            Status::InProgress => "In Progress",
            Status::Completed => "Completed",
            Status::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
