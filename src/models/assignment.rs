use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Urgency {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AssignmentStatus {
    Pending,
    Completed,
}

/// A property (society) with units awaiting inspection. Read-only on the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: String,
    pub society_name: String,
    pub flat_numbers: Vec<String>,
    pub address: String,
    pub urgency: Urgency,
    pub status: AssignmentStatus,
}

/// Static assignments shown when the backend cannot be reached.
pub fn mock_assignments() -> Vec<Assignment> {
    let assignment = |id: &str, society: &str, flats: &[&str], address: &str, urgency| Assignment {
        id: id.to_string(),
        society_name: society.to_string(),
        flat_numbers: flats.iter().map(|f| f.to_string()).collect(),
        address: address.to_string(),
        urgency,
        status: AssignmentStatus::Pending,
    };

    vec![
        assignment(
            "1",
            "Green Valley Apartments",
            &["A-101", "A-102", "A-103"],
            "123 Main Street, Mumbai",
            Urgency::High,
        ),
        assignment(
            "2",
            "Sunset Gardens",
            &["B-205", "B-206"],
            "456 Park Avenue, Pune",
            Urgency::Medium,
        ),
        assignment(
            "3",
            "Royal Heights",
            &["C-304"],
            "789 Hill Road, Bangalore",
            Urgency::Low,
        ),
    ]
}
