//! Dog records and registration input.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::{DogId, Parent, Sex};

/// Read-only projection of a registry record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DogRecord {
    pub id: DogId,
    pub name: String,
    pub breed: String,
    pub sex: Sex,
    pub age: u64,
    pub mother_id: Option<DogId>,
    pub father_id: Option<DogId>,
}

impl DogRecord {
    /// Parent edges of this node in the pedigree graph.
    pub fn parents(&self) -> impl Iterator<Item = (Parent, DogId)> {
        [
            (Parent::Mother, self.mother_id),
            (Parent::Father, self.father_id),
        ]
        .into_iter()
        .filter_map(|(parent, id)| id.map(|id| (parent, id)))
    }
}

/// Raw register-form input, exactly as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DogForm {
    pub name: Option<String>,
    pub breed: Option<String>,
    pub sex: Option<String>,
    pub age: Option<String>,
    /// `0` means unknown mother.
    pub mother: Option<String>,
    /// `0` means unknown father.
    pub father: Option<String>,
}

/// A validated `registerDog` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DogRegistration {
    pub name: String,
    pub breed: String,
    pub sex: Sex,
    pub age: u64,
    pub mother_id: Option<DogId>,
    pub father_id: Option<DogId>,
}

impl DogRegistration {
    /// Parse the form; every one of the six fields is required.
    pub fn from_form(form: &DogForm) -> Result<Self, ValidationError> {
        let name = required("name", &form.name)?.to_string();
        let breed = required("breed", &form.breed)?.to_string();
        let sex = required("sex", &form.sex)?
            .parse::<Sex>()
            .map_err(|reason| ValidationError::InvalidField { field: "sex", reason })?;
        let age = number("age", required("age", &form.age)?)?;
        let mother_id = DogId::from_wire(number("mother", required("mother", &form.mother)?)?);
        let father_id = DogId::from_wire(number("father", required("father", &form.father)?)?);

        Ok(Self {
            name,
            breed,
            sex,
            age,
            mother_id,
            father_id,
        })
    }

    pub fn parents(&self) -> impl Iterator<Item = (Parent, DogId)> {
        [
            (Parent::Mother, self.mother_id),
            (Parent::Father, self.father_id),
        ]
        .into_iter()
        .filter_map(|(parent, id)| id.map(|id| (parent, id)))
    }

    /// The record this registration produces once the registry assigns `id`.
    pub fn into_record(self, id: DogId) -> DogRecord {
        DogRecord {
            id,
            name: self.name,
            breed: self.breed,
            sex: self.sex,
            age: self.age,
            mother_id: self.mother_id,
            father_id: self.father_id,
        }
    }
}

fn required<'a>(field: &'static str, value: &'a Option<String>) -> Result<&'a str, ValidationError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ValidationError::MissingField(field))
}

fn number(field: &'static str, value: &str) -> Result<u64, ValidationError> {
    value.parse::<u64>().map_err(|e| ValidationError::InvalidField {
        field,
        reason: e.to_string(),
    })
}
