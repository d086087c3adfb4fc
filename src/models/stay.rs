use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::NursingSheet;

/// Patient (paciente). Referenced by stays for display context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub curp: String,
    pub nombre: String,
    pub apellido_paterno: String,
    pub apellido_materno: String,
    pub sexo: String,
    pub fecha_nacimiento: NaiveDate,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewPatient {
    #[validate(length(equal = 18, message = "CURP must have 18 characters"))]
    pub curp: String,
    #[validate(length(min = 1, max = 100))]
    pub nombre: String,
    #[validate(length(min = 1, max = 100))]
    pub apellido_paterno: String,
    #[validate(length(max = 100))]
    #[serde(default)]
    pub apellido_materno: String,
    #[validate(length(min = 1, max = 20))]
    pub sexo: String,
    pub fecha_nacimiento: NaiveDate,
}

/// Hospital admission (estancia).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stay {
    pub id: i64,
    pub paciente_id: i64,
    pub folio: String,
    pub tipo_estancia: String,
    pub fecha_ingreso: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewStay {
    pub paciente_id: i64,
    #[validate(length(min = 1, max = 50))]
    pub folio: String,
    #[validate(length(min = 1, max = 50))]
    pub tipo_estancia: String,
    pub fecha_ingreso: Option<DateTime<Utc>>,
}

/// Body of `GET /estancias/{id}`: the stay with its patient and sheets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StayView {
    pub estancia: Stay,
    pub paciente: Patient,
    pub hojas_enfermeria: Vec<NursingSheet>,
}
