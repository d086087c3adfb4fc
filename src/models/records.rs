//! Records appended to a nursing sheet by its documentation sections.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{Error, Result};

/// One vital-signs reading (`signos`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalSignReading {
    pub id: i64,
    pub hoja_enfermeria_id: i64,
    pub fecha_hora_registro: DateTime<Utc>,
    #[serde(flatten)]
    pub mediciones: VitalSigns,
}

/// Measurements of a reading. Every field is optional, but a reading must
/// carry at least one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VitalSigns {
    pub tension_arterial_sistolica: Option<i32>,
    pub tension_arterial_diastolica: Option<i32>,
    pub frecuencia_cardiaca: Option<i32>,
    pub frecuencia_respiratoria: Option<i32>,
    pub temperatura: Option<f64>,
    pub saturacion_oxigeno: Option<i32>,
    pub glucemia_capilar: Option<i32>,
    pub talla: Option<f64>,
    pub peso: Option<f64>,
}

impl VitalSigns {
    pub fn validate_ranges(&self) -> Result<()> {
        fn check<T: PartialOrd + Copy>(
            field: &str,
            value: Option<T>,
            min: T,
            max: T,
        ) -> Result<()> {
            match value {
                Some(v) if v < min || v > max => {
                    Err(Error::validation(field, "value out of range"))
                }
                _ => Ok(()),
            }
        }

        check("tension_arterial_sistolica", self.tension_arterial_sistolica, 30, 300)?;
        check("tension_arterial_diastolica", self.tension_arterial_diastolica, 10, 200)?;
        check("frecuencia_cardiaca", self.frecuencia_cardiaca, 10, 300)?;
        check("frecuencia_respiratoria", self.frecuencia_respiratoria, 1, 100)?;
        check("temperatura", self.temperatura, 25.0, 45.0)?;
        check("saturacion_oxigeno", self.saturacion_oxigeno, 0, 100)?;
        check("glucemia_capilar", self.glucemia_capilar, 10, 1000)?;
        check("talla", self.talla, 20.0, 250.0)?;
        check("peso", self.peso, 0.3, 400.0)?;

        if let (Some(sys), Some(dia)) = (
            self.tension_arterial_sistolica,
            self.tension_arterial_diastolica,
        ) {
            if dia >= sys {
                return Err(Error::validation(
                    "tension_arterial_diastolica",
                    "diastolic pressure must be below systolic",
                ));
            }
        }

        if self.is_empty() {
            return Err(Error::validation("signos", "at least one measurement is required"));
        }
        Ok(())
    }

    fn is_empty(&self) -> bool {
        *self == VitalSigns::default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewVitalSignReading {
    pub fecha_hora_registro: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub mediciones: VitalSigns,
    pub version: Option<i32>,
}

/// One medication administration (`medicamentos`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationAdministration {
    pub id: i64,
    pub hoja_enfermeria_id: i64,
    pub producto_servicio_id: i64,
    pub nombre_medicamento: String,
    pub dosis: String,
    pub via_administracion: String,
    pub fecha_hora_aplicacion: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewMedicationAdministration {
    pub producto_servicio_id: i64,
    #[validate(length(min = 1, max = 100))]
    pub dosis: String,
    #[validate(length(min = 1, max = 100))]
    pub via_administracion: String,
    pub fecha_hora_aplicacion: Option<DateTime<Utc>>,
    pub version: Option<i32>,
}

/// One IV therapy order (`terapia_iv`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IvTherapy {
    pub id: i64,
    pub hoja_enfermeria_id: i64,
    pub producto_servicio_id: i64,
    pub nombre_solucion: String,
    pub cantidad_ml: i32,
    pub duracion_horas: i32,
    pub flujo_ml_hora: Decimal,
    pub fecha_hora_inicio: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewIvTherapy {
    pub producto_servicio_id: i64,
    #[validate(range(min = 1, max = 10000))]
    pub cantidad_ml: i32,
    #[validate(range(min = 1, max = 72))]
    pub duracion_horas: i32,
    pub fecha_hora_inicio: Option<DateTime<Utc>>,
    pub version: Option<i32>,
}

impl NewIvTherapy {
    /// Infusion rate in ml/h, rounded to two decimals.
    pub fn flow_rate(&self) -> Decimal {
        let mut rate =
            (Decimal::from(self.cantidad_ml) / Decimal::from(self.duracion_horas)).round_dp(2);
        rate.rescale(2);
        rate
    }
}

/// One catheter or feeding tube installation (`sondas`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatheterRecord {
    pub id: i64,
    pub hoja_enfermeria_id: i64,
    pub tipo_dispositivo: String,
    pub calibre: Option<String>,
    pub fecha_instalacion: DateTime<Utc>,
    pub fecha_caducidad: Option<DateTime<Utc>>,
    pub observaciones: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewCatheterRecord {
    #[validate(length(min = 1, max = 100))]
    pub tipo_dispositivo: String,
    #[validate(length(max = 50))]
    pub calibre: Option<String>,
    pub fecha_instalacion: DateTime<Utc>,
    pub fecha_caducidad: Option<DateTime<Utc>>,
    pub observaciones: Option<String>,
    pub version: Option<i32>,
}

impl NewCatheterRecord {
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        if let Some(expiry) = self.fecha_caducidad {
            if expiry < self.fecha_instalacion {
                return Err(Error::validation(
                    "fecha_caducidad",
                    "expiry date precedes installation",
                ));
            }
        }
        Ok(())
    }
}
