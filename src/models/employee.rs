use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use validator::Validate;

use crate::error::{Error, Result};

/// Hospital employee (user). `colaborador_responsable_id` points to the
/// responsible colleague; a self-reference marks the top of the hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    pub curp: String,
    pub nombre: String,
    pub apellido_paterno: String,
    pub apellido_materno: String,
    pub sexo: String,
    pub fecha_nacimiento: NaiveDate,
    pub email: String,
    pub cargo_id: i32,
    pub colaborador_responsable_id: Option<i64>,
    #[serde(skip)]
    pub password_hash: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewEmployee {
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
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, message = "password must have at least 8 characters"))]
    pub password: String,
    pub cargo_id: i32,
    pub colaborador_responsable_id: Option<i64>,
}

/// Professional credential (credencial de empleado). Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub id: i64,
    pub user_id: i64,
    pub titulo: String,
    pub cedula_profesional: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewCredential {
    #[validate(length(min = 1, max = 255))]
    pub titulo: String,
    #[validate(length(min = 1, max = 20))]
    pub cedula_profesional: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignResponsible {
    pub colaborador_responsable_id: Option<i64>,
}

/// Checks that pointing `employee_id` at `new_responsible` keeps the
/// hierarchy a tree. `responsible_of` maps every employee to its current
/// responsible colleague.
///
/// Pointing an employee at itself is allowed and makes it a root.
pub fn check_no_cycle(
    employee_id: i64,
    new_responsible: Option<i64>,
    responsible_of: &HashMap<i64, Option<i64>>,
) -> Result<()> {
    let Some(mut current) = new_responsible else {
        return Ok(());
    };
    if current == employee_id {
        return Ok(());
    }

    let mut visited = HashSet::new();
    loop {
        if current == employee_id {
            return Err(Error::validation(
                "colaborador_responsable_id",
                format!("employee {} would become its own superior", employee_id),
            ));
        }
        if !visited.insert(current) {
            // Pre-existing loop above the new responsible; it does not pass
            // through this employee.
            return Ok(());
        }
        match responsible_of.get(&current).copied().flatten() {
            Some(next) if next != current => current = next,
            _ => return Ok(()),
        }
    }
}
