use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Lifecycle state of a nursing sheet. `Cerrado` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SheetStatus {
    Abierto,
    Cerrado,
}

impl SheetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SheetStatus::Abierto => "Abierto",
            SheetStatus::Cerrado => "Cerrado",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Abierto" => Some(SheetStatus::Abierto),
            "Cerrado" => Some(SheetStatus::Cerrado),
            _ => None,
        }
    }
}

/// Nursing sheet (hoja de enfermería) for one shift within a stay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NursingSheet {
    pub id: i64,
    pub estancia_id: i64,
    pub estado: SheetStatus,
    pub observaciones: String,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NursingSheet {
    pub fn new(id: i64, estancia_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            id,
            estancia_id,
            estado: SheetStatus::Abierto,
            observaciones: String::new(),
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.estado == SheetStatus::Cerrado
    }

    /// Rejects any write against a closed sheet or a stale version.
    ///
    /// Must be called while the caller holds whatever lock serializes
    /// writes to this sheet.
    pub fn ensure_editable(&self, expected_version: Option<i32>) -> Result<()> {
        if self.is_closed() {
            return Err(Error::AlreadyClosed { id: self.id });
        }
        if let Some(expected) = expected_version {
            if expected != self.version {
                return Err(Error::VersionConflict {
                    id: self.id,
                    expected,
                    actual: self.version,
                });
            }
        }
        Ok(())
    }

    /// Open -> Closed. Only `estado`, `version` and `updated_at` change.
    pub fn close(&mut self, expected_version: Option<i32>, now: DateTime<Utc>) -> Result<()> {
        self.ensure_editable(expected_version)?;
        self.estado = SheetStatus::Cerrado;
        self.touch(now);
        Ok(())
    }

    pub fn set_observations(
        &mut self,
        observaciones: String,
        expected_version: Option<i32>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_editable(expected_version)?;
        self.observaciones = observaciones;
        self.touch(now);
        Ok(())
    }

    /// Records that a section entry was appended to this sheet.
    pub fn record_section_write(
        &mut self,
        expected_version: Option<i32>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_editable(expected_version)?;
        self.touch(now);
        Ok(())
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.version += 1;
        self.updated_at = now;
    }
}

/// The single mutation intent carried by `PUT /hojasenfermerias/{id}`.
#[derive(Debug, Clone, PartialEq)]
pub enum SheetUpdate {
    Close,
    Observations(String),
}

/// Raw body of `PUT /hojasenfermerias/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SheetUpdateRequest {
    pub estado: Option<String>,
    pub observaciones: Option<String>,
    pub version: Option<i32>,
}

impl SheetUpdateRequest {
    /// Resolves the body to exactly one intent so a close request can never
    /// overwrite observations and vice versa.
    pub fn intent(self) -> Result<(SheetUpdate, Option<i32>)> {
        let update = match (self.estado, self.observaciones) {
            (Some(_), Some(_)) => {
                return Err(Error::validation(
                    "estado",
                    "send either estado or observaciones, not both",
                ))
            }
            (Some(estado), None) => match SheetStatus::parse(&estado) {
                Some(SheetStatus::Cerrado) => SheetUpdate::Close,
                _ => {
                    return Err(Error::validation(
                        "estado",
                        "the only allowed transition is to \"Cerrado\"",
                    ))
                }
            },
            (None, Some(text)) => SheetUpdate::Observations(text),
            (None, None) => {
                return Err(Error::validation(
                    "body",
                    "expected estado or observaciones",
                ))
            }
        };
        Ok((update, self.version))
    }
}
