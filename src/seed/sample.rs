//! Sample documents for local development and demos

use bson::oid::ObjectId;
use bson::DateTime;
use chrono::{Duration, Months, Utc};
use rand::Rng;

use crate::model::{
    Contact, Identifier, MedicalHistory, Patient, Priority, Sex, Status, TriageEntry, Vitals,
};
use crate::schema::build_default_meta;

/// Identity recorded in `meta.createdBy` / `meta.updatedBy` for seeded data
pub const SEED_USER: &str = "seed";

const NURSES: [&str; 3] = ["nurse.alex", "nurse.beth", "nurse.cole"];
const DOCTORS: [Option<&str>; 4] = [Some("dr.lee"), Some("dr.patel"), Some("dr.nguyen"), None];
const TRIAGE_NOTES: &str = "Patient assessed and stabilized.";

struct PatientTemplate {
    first_name: &'static str,
    last_name: &'static str,
    age: i32,
    sex: Sex,
    email: &'static str,
    mrn: &'static str,
    allergies: &'static [&'static str],
    conditions: &'static [&'static str],
    medications: &'static [&'static str],
    notes: Option<&'static str>,
}

const PATIENTS: [PatientTemplate; 3] = [
    PatientTemplate {
        first_name: "John",
        last_name: "Doe",
        age: 45,
        sex: Sex::Male,
        email: "john.doe@example.com",
        mrn: "MRN-10001",
        allergies: &["Penicillin"],
        conditions: &["Hypertension"],
        medications: &["Lisinopril"],
        notes: Some("Smoker, advised cessation."),
    },
    PatientTemplate {
        first_name: "Jane",
        last_name: "Smith",
        age: 33,
        sex: Sex::Female,
        email: "jane.smith@example.com",
        mrn: "MRN-10002",
        allergies: &[],
        conditions: &["Asthma"],
        medications: &["Albuterol"],
        notes: None,
    },
    PatientTemplate {
        first_name: "Alex",
        last_name: "Kim",
        age: 27,
        sex: Sex::Other,
        email: "alex.kim@example.com",
        mrn: "MRN-10003",
        allergies: &["Peanuts"],
        conditions: &[],
        medications: &[],
        notes: Some("Carries EpiPen."),
    },
];

fn strings(values: &[&str]) -> Option<Vec<String>> {
    Some(values.iter().map(|v| v.to_string()).collect())
}

/// North American style number, `+1-XXX-XXX-XXXX`
pub fn random_phone<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "+1-{}-{}-{}",
        rng.gen_range(100..1000),
        rng.gen_range(100..1000),
        rng.gen_range(1000..10000)
    )
}

/// Birth date `age_years` before `now`, to the day
pub fn approximate_dob(age_years: i32, now: chrono::DateTime<Utc>) -> DateTime {
    let months = u32::try_from(age_years).unwrap_or(0).saturating_mul(12);
    let dob = now.checked_sub_months(Months::new(months)).unwrap_or(now);
    DateTime::from_chrono(dob)
}

/// The three demo patients, without identities
pub fn sample_patients<R: Rng + ?Sized>(rng: &mut R, now: chrono::DateTime<Utc>) -> Vec<Patient> {
    PATIENTS
        .iter()
        .map(|t| Patient {
            id: None,
            first_name: t.first_name.to_string(),
            last_name: t.last_name.to_string(),
            date_of_birth: Some(approximate_dob(t.age, now)),
            age: Some(t.age),
            sex: t.sex,
            contact: Contact {
                phone: random_phone(rng),
                email: Some(t.email.to_string()),
                address: None,
            },
            identifiers: Some(vec![Identifier::new("MRN", t.mrn)]),
            medical_history: Some(MedicalHistory {
                allergies: strings(t.allergies),
                conditions: strings(t.conditions),
                medications: strings(t.medications),
                notes: t.notes.map(str::to_string),
            }),
            emergency_contact: None,
            meta: build_default_meta(SEED_USER),
        })
        .collect()
}

fn pick<T: Copy, R: Rng + ?Sized>(rng: &mut R, values: &[T]) -> T {
    values[rng.gen_range(0..values.len())]
}

fn random_vitals<R: Rng + ?Sized>(rng: &mut R) -> Vitals {
    Vitals {
        heart_rate: Some(f64::from(rng.gen_range(60_i32..100))),
        blood_pressure: Some(format!(
            "{}/{}",
            rng.gen_range(100..140),
            rng.gen_range(60..90)
        )),
        respiratory_rate: Some(f64::from(rng.gen_range(12_i32..20))),
        temperature_c: Some(rng.gen_range(36.0..38.0)),
        oxygen_saturation: Some(f64::from(rng.gen_range(94_i32..100))),
    }
}

/// Two to four recent triage entries for each patient
pub fn sample_triages<R: Rng + ?Sized>(
    rng: &mut R,
    patient_ids: &[ObjectId],
    now: chrono::DateTime<Utc>,
) -> Vec<TriageEntry> {
    let mut entries = Vec::new();
    for patient_id in patient_ids {
        let count = rng.gen_range(2..=4);
        for _ in 0..count {
            let when = now - Duration::days(rng.gen_range(0..30));
            entries.push(TriageEntry {
                id: None,
                patient_id: *patient_id,
                triage_time: DateTime::from_chrono(when),
                priority: pick(rng, &Priority::ALL),
                status: pick(rng, &Status::ALL),
                nurse: Some(pick(rng, &NURSES).to_string()),
                doctor: pick(rng, &DOCTORS).map(str::to_string),
                vitals: Some(random_vitals(rng)),
                notes: Some(TRIAGE_NOTES.to_string()),
                attachments: None,
                meta: build_default_meta(SEED_USER),
            });
        }
    }
    entries
}
