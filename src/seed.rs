//! Demo employees and credentials for a fresh database.

use chrono::NaiveDate;

use crate::db::{EmployeeRecord, Store};
use crate::error::{Error, Result};
use crate::models::{Employee, NewCredential};
use crate::password::hash_password;

struct DemoEmployee {
    curp: &'static str,
    nombre: &'static str,
    apellido_paterno: &'static str,
    apellido_materno: &'static str,
    sexo: &'static str,
    fecha_nacimiento: (i32, u32, u32),
    email: &'static str,
    password: &'static str,
    cargo_id: i32,
}

impl DemoEmployee {
    fn record(&self, responsible: Option<i64>) -> Result<EmployeeRecord> {
        let (y, m, d) = self.fecha_nacimiento;
        let fecha_nacimiento = NaiveDate::from_ymd_opt(y, m, d)
            .ok_or_else(|| Error::validation("fecha_nacimiento", "invalid date"))?;
        Ok(EmployeeRecord {
            curp: self.curp.to_string(),
            nombre: self.nombre.to_string(),
            apellido_paterno: self.apellido_paterno.to_string(),
            apellido_materno: self.apellido_materno.to_string(),
            sexo: self.sexo.to_string(),
            fecha_nacimiento,
            email: self.email.to_string(),
            cargo_id: self.cargo_id,
            colaborador_responsable_id: responsible,
            password_hash: hash_password(self.password)?,
        })
    }
}

const JUAN: DemoEmployee = DemoEmployee {
    curp: "JUAP850101HDFLRS01",
    nombre: "Juan",
    apellido_paterno: "Pérez",
    apellido_materno: "Ramírez",
    sexo: "Masculino",
    fecha_nacimiento: (1985, 1, 1),
    email: "juan.perez@hospital.com",
    password: "password123",
    cargo_id: 6,
};

const MARIA: DemoEmployee = DemoEmployee {
    curp: "MALO900214MDFLPS02",
    nombre: "María",
    apellido_paterno: "López",
    apellido_materno: "Santos",
    sexo: "Femenino",
    fecha_nacimiento: (1990, 2, 14),
    email: "maria.lopez@hospital.com",
    password: "password123",
    cargo_id: 5,
};

const CARLOS: DemoEmployee = DemoEmployee {
    curp: "CARA820710HDFRMR03",
    nombre: "Carlos",
    apellido_paterno: "Ramírez",
    apellido_materno: "Moreno",
    sexo: "Masculino",
    fecha_nacimiento: (1982, 7, 10),
    email: "carlos.ramirez@hospital.com",
    password: "password123",
    cargo_id: 4,
};

const LAURA: DemoEmployee = DemoEmployee {
    curp: "LAHE880320MDFHND04",
    nombre: "Laura",
    apellido_paterno: "Hernández",
    apellido_materno: "Díaz",
    sexo: "Femenino",
    fecha_nacimiento: (1988, 3, 20),
    email: "laura.hernandez@hospital.com",
    password: "password123",
    cargo_id: 3,
};

const ANDRES: DemoEmployee = DemoEmployee {
    curp: "ANGG910923HDFGLZ05",
    nombre: "Andrés",
    apellido_paterno: "González",
    apellido_materno: "Luna",
    sexo: "Masculino",
    fecha_nacimiento: (1991, 9, 23),
    email: "andres.gonzalez@hospital.com",
    password: "password123",
    cargo_id: 1,
};

const SOFIA: DemoEmployee = DemoEmployee {
    curp: "SOMA950105MDFMRT06",
    nombre: "Sofía",
    apellido_paterno: "Martínez",
    apellido_materno: "Rojas",
    sexo: "Femenino",
    fecha_nacimiento: (1995, 1, 5),
    email: "sofia.martinez@hospital.com",
    password: "password123",
    cargo_id: 2,
};

const KEVIN: DemoEmployee = DemoEmployee {
    curp: "TIMK040210HMSRDVA6",
    nombre: "Kevin Yahir",
    apellido_paterno: "Trinidad",
    apellido_materno: "Medina",
    sexo: "Masculino",
    fecha_nacimiento: (2004, 2, 10),
    email: "kevinyahirt@gmail.com",
    password: "12345678",
    cargo_id: 2,
};

fn credential(titulo: &str, cedula: &str) -> NewCredential {
    NewCredential {
        titulo: titulo.to_string(),
        cedula_profesional: cedula.to_string(),
    }
}

/// Returns the employee registered under the demo email, creating it (and
/// its credentials) only when missing. The flag tells whether it was created.
async fn ensure(
    store: &dyn Store,
    demo: &DemoEmployee,
    responsible: Option<i64>,
    credentials: &[NewCredential],
) -> Result<(Employee, bool)> {
    if let Some(existing) = store.find_employee_by_email(demo.email).await? {
        return Ok((existing, false));
    }
    let employee = store.create_employee(demo.record(responsible)?).await?;
    for credential in credentials {
        store.add_credential(employee.id, credential.clone()).await?;
    }
    Ok((employee, true))
}

/// Insert the demo staff. Returns the employees in seeding order.
///
/// Juan heads the hierarchy and is his own responsible colleague; Kevin has
/// no responsible colleague. Employees whose email is already registered are
/// left untouched, so running the seed again (or after a partial run) only
/// fills in what is missing.
pub async fn seed_demo_employees(store: &dyn Store) -> Result<Vec<Employee>> {
    let (juan, created_juan) = ensure(store, &JUAN, None, &[]).await?;
    let juan = if created_juan {
        store.set_responsible(juan.id, Some(juan.id)).await?
    } else {
        juan
    };

    let maria = ensure(
        store,
        &MARIA,
        Some(juan.id),
        &[credential("Licenciatura en Enfermería", "7654321")],
    )
    .await?;
    let carlos = ensure(store, &CARLOS, Some(juan.id), &[]).await?;
    let laura = ensure(store, &LAURA, Some(carlos.0.id), &[]).await?;
    let andres = ensure(store, &ANDRES, Some(maria.0.id), &[]).await?;
    let sofia = ensure(
        store,
        &SOFIA,
        Some(andres.0.id),
        &[
            credential("Médico Especialista en Cirugía General", "9123456"),
            credential("Médico Especialista en Pediatría", "8765432"),
        ],
    )
    .await?;
    let kevin = ensure(
        store,
        &KEVIN,
        None,
        &[credential("Médico Especialista en Pediatría", "8765432")],
    )
    .await?;

    let rest = [maria, carlos, laura, andres, sofia, kevin];
    let created = rest.iter().filter(|(_, created)| *created).count() + usize::from(created_juan);
    let mut staff = vec![juan];
    staff.extend(rest.into_iter().map(|(employee, _)| employee));

    if created == 0 {
        tracing::warn!("⚠ Demo employees already present, nothing seeded");
    } else {
        tracing::info!("✓ Seeded {} demo employees", created);
    }
    Ok(staff)
}
