//! Triage entry document

use bson::oid::ObjectId;
use bson::DateTime;
use serde::{Deserialize, Serialize};

use super::enums::{Priority, Status};
use super::meta::Meta;

/// One triage interaction.
///
/// `patient_id` refers to `patients._id`; the patient is never embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageEntry {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub patient_id: ObjectId,
    pub triage_time: DateTime,
    pub priority: Priority,
    pub status: Status,
    pub nurse: Option<String>,
    pub doctor: Option<String>,
    pub vitals: Option<Vitals>,
    pub notes: Option<String>,
    pub attachments: Option<Vec<Attachment>>,
    pub meta: Meta,
}

/// Vital signs; blood pressure is kept as the recorded "systolic/diastolic" text.
///
/// Rates are stored as any numeric BSON type and read back as `f64`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vitals {
    pub heart_rate: Option<f64>,
    pub blood_pressure: Option<String>,
    pub respiratory_rate: Option<f64>,
    pub temperature_c: Option<f64>,
    pub oxygen_saturation: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{triage_entry_schema, SchemaValidator};
    use bson::doc;

    fn stored_entry(vitals: bson::Document) -> bson::Document {
        let now = DateTime::now();
        doc! {
            "patientId": ObjectId::new(),
            "triageTime": now,
            "priority": "Urgent",
            "status": "Open",
            "vitals": vitals,
            "meta": { "createdAt": now, "updatedAt": now },
        }
    }

    #[test]
    fn test_decodes_any_numeric_vitals() {
        let schema = triage_entry_schema();
        let validator = SchemaValidator::new(&schema);
        let doc = stored_entry(doc! {
            "heartRate": 72.5,
            "respiratoryRate": 16_i32,
            "temperatureC": 37_i64,
            "oxygenSaturation": 98_i64,
            "bloodPressure": null,
        });
        assert!(validator.is_valid(&doc));

        let entry: TriageEntry = bson::from_document(doc).unwrap();
        let vitals = entry.vitals.unwrap();
        assert_eq!(vitals.heart_rate, Some(72.5));
        assert_eq!(vitals.respiratory_rate, Some(16.0));
        assert_eq!(vitals.temperature_c, Some(37.0));
        assert_eq!(vitals.oxygen_saturation, Some(98.0));
        assert_eq!(vitals.blood_pressure, None);
    }

    #[test]
    fn test_decodes_minimal_entry() {
        let mut doc = stored_entry(doc! {});
        doc.remove("vitals");
        assert!(SchemaValidator::new(&triage_entry_schema()).is_valid(&doc));

        let entry: TriageEntry = bson::from_document(doc).unwrap();
        assert_eq!(entry.priority, Priority::Urgent);
        assert!(entry.vitals.is_none());
        assert!(entry.attachments.is_none());
    }

    #[test]
    fn test_serialized_layout() {
        let entry = TriageEntry {
            id: None,
            patient_id: ObjectId::new(),
            triage_time: DateTime::now(),
            priority: Priority::VeryUrgent,
            status: Status::InProgress,
            nurse: Some("nurse.alex".into()),
            doctor: None,
            vitals: Some(Vitals {
                temperature_c: Some(37.2),
                ..Default::default()
            }),
            notes: None,
            attachments: Some(vec![Attachment {
                kind: Some("image".into()),
                ..Default::default()
            }]),
            meta: Meta::new("test", "triage-db", DateTime::now()),
        };

        let doc = bson::to_document(&entry).unwrap();
        assert!(doc.get_object_id("patientId").is_ok());
        assert!(doc.get_datetime("triageTime").is_ok());
        assert_eq!(doc.get_str("priority").unwrap(), "Very Urgent");
        assert_eq!(doc.get_str("status").unwrap(), "In Progress");
        assert_eq!(
            doc.get_document("vitals").unwrap().get_f64("temperatureC").unwrap(),
            37.2
        );
        let attachment = doc.get_array("attachments").unwrap()[0].as_document().unwrap();
        assert_eq!(attachment.get_str("type").unwrap(), "image");
    }
}
