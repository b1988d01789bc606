//! Patient document

use bson::oid::ObjectId;
use bson::DateTime;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::enums::Sex;
use super::meta::Meta;

/// Patient demographics and history used in triage workflows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<DateTime>,
    pub age: Option<i32>,
    pub sex: Sex,
    pub contact: Contact,
    pub identifiers: Option<Vec<Identifier>>,
    pub medical_history: Option<MedicalHistory>,
    pub emergency_contact: Option<EmergencyContact>,
    pub meta: Meta,
}

impl Patient {
    /// Age in whole years on `on`.
    ///
    /// Derived from `dateOfBirth` when present; the stored `age` is only a
    /// fallback for records without a birth date.
    pub fn age_on(&self, on: NaiveDate) -> Option<u32> {
        match self.date_of_birth {
            Some(dob) => {
                let dob = dob.to_chrono().date_naive();
                let mut years = on.year() - dob.year();
                if (on.month(), on.day()) < (dob.month(), dob.day()) {
                    years -= 1;
                }
                u32::try_from(years).ok()
            }
            None => self.age.and_then(|a| u32::try_from(a).ok()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// External identifier; `system` + `value` identify a patient together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identifier {
    pub system: String,
    pub value: String,
    pub assigner: Option<String>,
}

impl Identifier {
    pub fn new(system: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            value: value.into(),
            assigner: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicalHistory {
    pub allergies: Option<Vec<String>>,
    pub conditions: Option<Vec<String>>,
    pub medications: Option<Vec<String>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub name: Option<String>,
    pub relationship: Option<String>,
    pub phone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn patient(dob: Option<DateTime>, age: Option<i32>) -> Patient {
        Patient {
            id: None,
            first_name: "Jane".into(),
            last_name: "Smith".into(),
            date_of_birth: dob,
            age,
            sex: Sex::Female,
            contact: Contact {
                phone: "+1-555-555-5555".into(),
                email: None,
                address: None,
            },
            identifiers: None,
            medical_history: None,
            emergency_contact: None,
            meta: Meta::new("test", "triage-db", DateTime::now()),
        }
    }

    #[test]
    fn test_age_derived_from_date_of_birth() {
        let dob = DateTime::from_chrono(Utc.with_ymd_and_hms(1990, 6, 15, 0, 0, 0).unwrap());
        let p = patient(Some(dob), Some(99));

        let before_birthday = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        let on_birthday = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();

        assert_eq!(p.age_on(before_birthday), Some(33));
        assert_eq!(p.age_on(on_birthday), Some(34));
    }

    #[test]
    fn test_age_falls_back_to_stored_age() {
        let p = patient(None, Some(41));
        assert_eq!(p.age_on(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()), Some(41));
        assert_eq!(patient(None, None).age_on(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()), None);
    }

    #[test]
    fn test_serialized_layout() {
        let doc = bson::to_document(&patient(None, Some(33))).unwrap();

        assert!(!doc.contains_key("_id"));
        assert_eq!(doc.get_str("firstName").unwrap(), "Jane");
        assert_eq!(doc.get_str("sex").unwrap(), "F");
        assert_eq!(doc.get_document("contact").unwrap().get_str("phone").unwrap(), "+1-555-555-5555");
        assert!(doc.contains_key("medicalHistory"));
        assert!(doc.contains_key("emergencyContact"));
    }
}
