use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Postgres, Row, Transaction};
use std::collections::HashMap;

use super::{EmployeeRecord, Store};
use crate::error::{Error, Result};
use crate::models::{
    check_no_cycle, CatalogFilter, CatheterRecord, Credential, Employee, IvTherapy,
    MedicationAdministration, NewCatheterRecord, NewCredential, NewIvTherapy,
    NewMedicationAdministration, NewPatient, NewProductoServicio, NewStay, NewVitalSignReading,
    NursingSheet, Patient, ProductoServicio, SheetStatus, Stay, VitalSignReading, VitalSigns,
};

const SHEET_COLUMNS: &str =
    "id, estancia_id, estado, observaciones, version, created_at, updated_at";
const EMPLOYEE_COLUMNS: &str = "id, curp, nombre, apellido_paterno, apellido_materno, sexo, \
     fecha_nacimiento, email, cargo_id, colaborador_responsable_id, password";
const PRODUCT_COLUMNS: &str =
    "id, tipo, subtipo, codigo_prestacion, nombre_prestacion, importe, cantidad";

/// PostgreSQL-backed store.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load a sheet with a row lock held until `tx` ends.
    async fn lock_sheet(
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
    ) -> Result<NursingSheet> {
        let sql = format!(
            "SELECT {} FROM hojas_enfermerias WHERE id = $1 FOR UPDATE",
            SHEET_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(Error::not_found("HojaEnfermeria", id))?;
        sheet_from_row(&row)
    }

    async fn store_sheet(
        tx: &mut Transaction<'_, Postgres>,
        sheet: &NursingSheet,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE hojas_enfermerias
             SET estado = $1, observaciones = $2, version = $3, updated_at = $4
             WHERE id = $5",
        )
        .bind(sheet.estado.as_str())
        .bind(&sheet.observaciones)
        .bind(sheet.version)
        .bind(sheet.updated_at)
        .bind(sheet.id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Lock the sheet, apply the section-write rule and persist the bump.
    /// The caller inserts the section row on the same transaction.
    async fn begin_section_write(
        &self,
        sheet_id: i64,
        expected_version: Option<i32>,
    ) -> Result<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;
        let mut sheet = Self::lock_sheet(&mut tx, sheet_id).await?;
        sheet.record_section_write(expected_version, Utc::now())?;
        Self::store_sheet(&mut tx, &sheet).await?;
        Ok(tx)
    }
}

fn sheet_from_row(row: &PgRow) -> Result<NursingSheet> {
    let estado: String = row.try_get("estado")?;
    let estado = SheetStatus::parse(&estado).ok_or_else(|| {
        Error::Storage(sqlx::Error::Decode(
            format!("unknown sheet status '{}'", estado).into(),
        ))
    })?;

    Ok(NursingSheet {
        id: row.try_get("id")?,
        estancia_id: row.try_get("estancia_id")?,
        estado,
        observaciones: row.try_get("observaciones")?,
        version: row.try_get("version")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn patient_from_row(row: &PgRow) -> Result<Patient> {
    Ok(Patient {
        id: row.try_get("id")?,
        curp: row.try_get("curp")?,
        nombre: row.try_get("nombre")?,
        apellido_paterno: row.try_get("apellido_paterno")?,
        apellido_materno: row.try_get("apellido_materno")?,
        sexo: row.try_get("sexo")?,
        fecha_nacimiento: row.try_get("fecha_nacimiento")?,
    })
}

fn stay_from_row(row: &PgRow) -> Result<Stay> {
    Ok(Stay {
        id: row.try_get("id")?,
        paciente_id: row.try_get("paciente_id")?,
        folio: row.try_get("folio")?,
        tipo_estancia: row.try_get("tipo_estancia")?,
        fecha_ingreso: row.try_get("fecha_ingreso")?,
    })
}

fn product_from_row(row: &PgRow) -> Result<ProductoServicio> {
    Ok(ProductoServicio {
        id: row.try_get("id")?,
        tipo: row.try_get("tipo")?,
        subtipo: row.try_get("subtipo")?,
        codigo_prestacion: row.try_get("codigo_prestacion")?,
        nombre_prestacion: row.try_get("nombre_prestacion")?,
        importe: row.try_get("importe")?,
        cantidad: row.try_get("cantidad")?,
    })
}

fn employee_from_row(row: &PgRow) -> Result<Employee> {
    Ok(Employee {
        id: row.try_get("id")?,
        curp: row.try_get("curp")?,
        nombre: row.try_get("nombre")?,
        apellido_paterno: row.try_get("apellido_paterno")?,
        apellido_materno: row.try_get("apellido_materno")?,
        sexo: row.try_get("sexo")?,
        fecha_nacimiento: row.try_get("fecha_nacimiento")?,
        email: row.try_get("email")?,
        cargo_id: row.try_get("cargo_id")?,
        colaborador_responsable_id: row.try_get("colaborador_responsable_id")?,
        password_hash: row.try_get("password")?,
    })
}

fn credential_from_row(row: &PgRow) -> Result<Credential> {
    Ok(Credential {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        titulo: row.try_get("titulo")?,
        cedula_profesional: row.try_get("cedula_profesional")?,
    })
}

fn vital_signs_from_row(row: &PgRow) -> Result<VitalSignReading> {
    Ok(VitalSignReading {
        id: row.try_get("id")?,
        hoja_enfermeria_id: row.try_get("hoja_enfermeria_id")?,
        fecha_hora_registro: row.try_get("fecha_hora_registro")?,
        mediciones: VitalSigns {
            tension_arterial_sistolica: row.try_get("tension_arterial_sistolica")?,
            tension_arterial_diastolica: row.try_get("tension_arterial_diastolica")?,
            frecuencia_cardiaca: row.try_get("frecuencia_cardiaca")?,
            frecuencia_respiratoria: row.try_get("frecuencia_respiratoria")?,
            temperatura: row.try_get("temperatura")?,
            saturacion_oxigeno: row.try_get("saturacion_oxigeno")?,
            glucemia_capilar: row.try_get("glucemia_capilar")?,
            talla: row.try_get("talla")?,
            peso: row.try_get("peso")?,
        },
    })
}

fn medication_from_row(row: &PgRow) -> Result<MedicationAdministration> {
    Ok(MedicationAdministration {
        id: row.try_get("id")?,
        hoja_enfermeria_id: row.try_get("hoja_enfermeria_id")?,
        producto_servicio_id: row.try_get("producto_servicio_id")?,
        nombre_medicamento: row.try_get("nombre_prestacion")?,
        dosis: row.try_get("dosis")?,
        via_administracion: row.try_get("via_administracion")?,
        fecha_hora_aplicacion: row.try_get("fecha_hora_aplicacion")?,
    })
}

fn iv_therapy_from_row(row: &PgRow) -> Result<IvTherapy> {
    Ok(IvTherapy {
        id: row.try_get("id")?,
        hoja_enfermeria_id: row.try_get("hoja_enfermeria_id")?,
        producto_servicio_id: row.try_get("producto_servicio_id")?,
        nombre_solucion: row.try_get("nombre_prestacion")?,
        cantidad_ml: row.try_get("cantidad_ml")?,
        duracion_horas: row.try_get("duracion_horas")?,
        flujo_ml_hora: row.try_get("flujo_ml_hora")?,
        fecha_hora_inicio: row.try_get("fecha_hora_inicio")?,
    })
}

fn catheter_from_row(row: &PgRow) -> Result<CatheterRecord> {
    Ok(CatheterRecord {
        id: row.try_get("id")?,
        hoja_enfermeria_id: row.try_get("hoja_enfermeria_id")?,
        tipo_dispositivo: row.try_get("tipo_dispositivo")?,
        calibre: row.try_get("calibre")?,
        fecha_instalacion: row.try_get("fecha_instalacion")?,
        fecha_caducidad: row.try_get("fecha_caducidad")?,
        observaciones: row.try_get("observaciones")?,
    })
}

/// Turns a foreign-key violation into a `NotFound` for the referenced row.
fn missing_reference(err: sqlx::Error, entity: &'static str, id: i64) -> Error {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => Error::not_found(entity, id),
        _ => Error::Storage(err),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_patient(&self, patient: NewPatient) -> Result<Patient> {
        let row = sqlx::query(
            "INSERT INTO pacientes (curp, nombre, apellido_paterno, apellido_materno, sexo, fecha_nacimiento)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, curp, nombre, apellido_paterno, apellido_materno, sexo, fecha_nacimiento",
        )
        .bind(&patient.curp)
        .bind(&patient.nombre)
        .bind(&patient.apellido_paterno)
        .bind(&patient.apellido_materno)
        .bind(&patient.sexo)
        .bind(patient.fecha_nacimiento)
        .fetch_one(&self.pool)
        .await?;
        patient_from_row(&row)
    }

    async fn get_patient(&self, id: i64) -> Result<Option<Patient>> {
        sqlx::query(
            "SELECT id, curp, nombre, apellido_paterno, apellido_materno, sexo, fecha_nacimiento
             FROM pacientes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(|row| patient_from_row(&row))
        .transpose()
    }

    async fn create_stay(&self, stay: NewStay) -> Result<Stay> {
        let row = sqlx::query(
            "INSERT INTO estancias (paciente_id, folio, tipo_estancia, fecha_ingreso)
             VALUES ($1, $2, $3, COALESCE($4, NOW()))
             RETURNING id, paciente_id, folio, tipo_estancia, fecha_ingreso",
        )
        .bind(stay.paciente_id)
        .bind(&stay.folio)
        .bind(&stay.tipo_estancia)
        .bind(stay.fecha_ingreso)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| missing_reference(e, "Paciente", stay.paciente_id))?;
        stay_from_row(&row)
    }

    async fn get_stay(&self, id: i64) -> Result<Option<Stay>> {
        sqlx::query(
            "SELECT id, paciente_id, folio, tipo_estancia, fecha_ingreso FROM estancias WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(|row| stay_from_row(&row))
        .transpose()
    }

    async fn create_sheet(&self, estancia_id: i64) -> Result<NursingSheet> {
        let sql = format!(
            "INSERT INTO hojas_enfermerias (estancia_id, estado, observaciones, version)
             VALUES ($1, 'Abierto', '', 1)
             RETURNING {}",
            SHEET_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(estancia_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| missing_reference(e, "Estancia", estancia_id))?;
        tracing::info!("✓ Nursing sheet {} opened for stay {}", row.try_get::<i64, _>("id")?, estancia_id);
        sheet_from_row(&row)
    }

    async fn get_sheet(&self, id: i64) -> Result<Option<NursingSheet>> {
        let sql = format!("SELECT {} FROM hojas_enfermerias WHERE id = $1", SHEET_COLUMNS);
        sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| sheet_from_row(&row))
            .transpose()
    }

    async fn list_sheets(&self, estancia_id: i64) -> Result<Vec<NursingSheet>> {
        let sql = format!(
            "SELECT {} FROM hojas_enfermerias WHERE estancia_id = $1 ORDER BY id",
            SHEET_COLUMNS
        );
        sqlx::query(&sql)
            .bind(estancia_id)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(sheet_from_row)
            .collect()
    }

    async fn close_sheet(&self, id: i64, expected_version: Option<i32>) -> Result<NursingSheet> {
        let mut tx = self.pool.begin().await?;
        let mut sheet = Self::lock_sheet(&mut tx, id).await?;
        sheet.close(expected_version, Utc::now())?;
        Self::store_sheet(&mut tx, &sheet).await?;
        tx.commit().await?;
        Ok(sheet)
    }

    async fn update_observations(
        &self,
        id: i64,
        observaciones: String,
        expected_version: Option<i32>,
    ) -> Result<NursingSheet> {
        let mut tx = self.pool.begin().await?;
        let mut sheet = Self::lock_sheet(&mut tx, id).await?;
        sheet.set_observations(observaciones, expected_version, Utc::now())?;
        Self::store_sheet(&mut tx, &sheet).await?;
        tx.commit().await?;
        Ok(sheet)
    }

    async fn add_vital_signs(
        &self,
        sheet_id: i64,
        reading: NewVitalSignReading,
    ) -> Result<VitalSignReading> {
        let mut tx = self.begin_section_write(sheet_id, reading.version).await?;
        let m = &reading.mediciones;
        let row = sqlx::query(
            "INSERT INTO hoja_signos (hoja_enfermeria_id, fecha_hora_registro,
                 tension_arterial_sistolica, tension_arterial_diastolica, frecuencia_cardiaca,
                 frecuencia_respiratoria, temperatura, saturacion_oxigeno, glucemia_capilar,
                 talla, peso)
             VALUES ($1, COALESCE($2, NOW()), $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING *",
        )
        .bind(sheet_id)
        .bind(reading.fecha_hora_registro)
        .bind(m.tension_arterial_sistolica)
        .bind(m.tension_arterial_diastolica)
        .bind(m.frecuencia_cardiaca)
        .bind(m.frecuencia_respiratoria)
        .bind(m.temperatura)
        .bind(m.saturacion_oxigeno)
        .bind(m.glucemia_capilar)
        .bind(m.talla)
        .bind(m.peso)
        .fetch_one(&mut *tx)
        .await?;
        let record = vital_signs_from_row(&row)?;
        tx.commit().await?;
        Ok(record)
    }

    async fn list_vital_signs(&self, sheet_id: i64) -> Result<Vec<VitalSignReading>> {
        sqlx::query(
            "SELECT * FROM hoja_signos WHERE hoja_enfermeria_id = $1
             ORDER BY fecha_hora_registro, id",
        )
        .bind(sheet_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(vital_signs_from_row)
        .collect()
    }

    async fn add_medication(
        &self,
        sheet_id: i64,
        medication: NewMedicationAdministration,
        product: &ProductoServicio,
    ) -> Result<MedicationAdministration> {
        let mut tx = self
            .begin_section_write(sheet_id, medication.version)
            .await?;
        let row = sqlx::query(
            "INSERT INTO hoja_medicamentos (hoja_enfermeria_id, producto_servicio_id, dosis,
                 via_administracion, fecha_hora_aplicacion)
             VALUES ($1, $2, $3, $4, COALESCE($5, NOW()))
             RETURNING *, $6::VARCHAR AS nombre_prestacion",
        )
        .bind(sheet_id)
        .bind(product.id)
        .bind(&medication.dosis)
        .bind(&medication.via_administracion)
        .bind(medication.fecha_hora_aplicacion)
        .bind(&product.nombre_prestacion)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| missing_reference(e, "ProductoServicio", product.id))?;
        let record = medication_from_row(&row)?;
        tx.commit().await?;
        Ok(record)
    }

    async fn list_medications(&self, sheet_id: i64) -> Result<Vec<MedicationAdministration>> {
        sqlx::query(
            "SELECT m.*, p.nombre_prestacion
             FROM hoja_medicamentos m
             JOIN producto_servicios p ON p.id = m.producto_servicio_id
             WHERE m.hoja_enfermeria_id = $1
             ORDER BY m.fecha_hora_aplicacion, m.id",
        )
        .bind(sheet_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(medication_from_row)
        .collect()
    }

    async fn add_iv_therapy(
        &self,
        sheet_id: i64,
        therapy: NewIvTherapy,
        solution: &ProductoServicio,
    ) -> Result<IvTherapy> {
        let mut tx = self.begin_section_write(sheet_id, therapy.version).await?;
        let row = sqlx::query(
            "INSERT INTO hoja_terapia_iv (hoja_enfermeria_id, producto_servicio_id, cantidad_ml,
                 duracion_horas, flujo_ml_hora, fecha_hora_inicio)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, NOW()))
             RETURNING *, $7::VARCHAR AS nombre_prestacion",
        )
        .bind(sheet_id)
        .bind(solution.id)
        .bind(therapy.cantidad_ml)
        .bind(therapy.duracion_horas)
        .bind(therapy.flow_rate())
        .bind(therapy.fecha_hora_inicio)
        .bind(&solution.nombre_prestacion)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| missing_reference(e, "ProductoServicio", solution.id))?;
        let record = iv_therapy_from_row(&row)?;
        tx.commit().await?;
        Ok(record)
    }

    async fn list_iv_therapies(&self, sheet_id: i64) -> Result<Vec<IvTherapy>> {
        sqlx::query(
            "SELECT t.*, p.nombre_prestacion
             FROM hoja_terapia_iv t
             JOIN producto_servicios p ON p.id = t.producto_servicio_id
             WHERE t.hoja_enfermeria_id = $1
             ORDER BY t.fecha_hora_inicio, t.id",
        )
        .bind(sheet_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(iv_therapy_from_row)
        .collect()
    }

    async fn add_catheter(
        &self,
        sheet_id: i64,
        catheter: NewCatheterRecord,
    ) -> Result<CatheterRecord> {
        let mut tx = self.begin_section_write(sheet_id, catheter.version).await?;
        let row = sqlx::query(
            "INSERT INTO hoja_sondas_cateteres (hoja_enfermeria_id, tipo_dispositivo, calibre,
                 fecha_instalacion, fecha_caducidad, observaciones)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(sheet_id)
        .bind(&catheter.tipo_dispositivo)
        .bind(&catheter.calibre)
        .bind(catheter.fecha_instalacion)
        .bind(catheter.fecha_caducidad)
        .bind(&catheter.observaciones)
        .fetch_one(&mut *tx)
        .await?;
        let record = catheter_from_row(&row)?;
        tx.commit().await?;
        Ok(record)
    }

    async fn list_catheters(&self, sheet_id: i64) -> Result<Vec<CatheterRecord>> {
        sqlx::query(
            "SELECT * FROM hoja_sondas_cateteres WHERE hoja_enfermeria_id = $1
             ORDER BY fecha_instalacion, id",
        )
        .bind(sheet_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(catheter_from_row)
        .collect()
    }

    async fn create_product(&self, product: NewProductoServicio) -> Result<ProductoServicio> {
        let sql = format!(
            "INSERT INTO producto_servicios (tipo, subtipo, codigo_prestacion, nombre_prestacion, importe, cantidad)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            PRODUCT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(&product.tipo)
            .bind(&product.subtipo)
            .bind(&product.codigo_prestacion)
            .bind(&product.nombre_prestacion)
            .bind(product.importe)
            .bind(product.cantidad)
            .fetch_one(&self.pool)
            .await?;
        product_from_row(&row)
    }

    async fn get_product(&self, id: i64) -> Result<Option<ProductoServicio>> {
        let sql = format!("SELECT {} FROM producto_servicios WHERE id = $1", PRODUCT_COLUMNS);
        sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| product_from_row(&row))
            .transpose()
    }

    async fn list_products(&self, filter: CatalogFilter<'_>) -> Result<Vec<ProductoServicio>> {
        let sql = format!(
            "SELECT {} FROM producto_servicios
             WHERE ($1::VARCHAR IS NULL OR tipo = $1)
               AND ($2::VARCHAR IS NULL OR subtipo = $2)
             ORDER BY nombre_prestacion, id",
            PRODUCT_COLUMNS
        );
        sqlx::query(&sql)
            .bind(filter.tipo.as_deref())
            .bind(filter.subtipo.as_deref())
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(product_from_row)
            .collect()
    }

    async fn create_employee(&self, employee: EmployeeRecord) -> Result<Employee> {
        let sql = format!(
            "INSERT INTO users (curp, nombre, apellido_paterno, apellido_materno, sexo,
                 fecha_nacimiento, email, password, cargo_id, colaborador_responsable_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {}",
            EMPLOYEE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(&employee.curp)
            .bind(&employee.nombre)
            .bind(&employee.apellido_paterno)
            .bind(&employee.apellido_materno)
            .bind(&employee.sexo)
            .bind(employee.fecha_nacimiento)
            .bind(&employee.email)
            .bind(&employee.password_hash)
            .bind(employee.cargo_id)
            .bind(employee.colaborador_responsable_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    Error::validation("email", "email already registered")
                }
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => Error::validation(
                    "colaborador_responsable_id",
                    "responsible employee does not exist",
                ),
                _ => Error::Storage(e),
            })?;
        employee_from_row(&row)
    }

    async fn get_employee(&self, id: i64) -> Result<Option<Employee>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", EMPLOYEE_COLUMNS);
        sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| employee_from_row(&row))
            .transpose()
    }

    async fn find_employee_by_email(&self, email: &str) -> Result<Option<Employee>> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", EMPLOYEE_COLUMNS);
        sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| employee_from_row(&row))
            .transpose()
    }

    async fn list_subordinates(&self, id: i64) -> Result<Vec<Employee>> {
        let sql = format!(
            "SELECT {} FROM users
             WHERE colaborador_responsable_id = $1 AND id <> $1
             ORDER BY id",
            EMPLOYEE_COLUMNS
        );
        sqlx::query(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(employee_from_row)
            .collect()
    }

    async fn set_responsible(&self, id: i64, responsible: Option<i64>) -> Result<Employee> {
        let mut tx = self.pool.begin().await?;

        // Lock the whole adjacency list: the cycle check reads every link.
        let rows = sqlx::query("SELECT id, colaborador_responsable_id FROM users FOR UPDATE")
            .fetch_all(&mut *tx)
            .await?;
        let mut hierarchy: HashMap<i64, Option<i64>> = HashMap::with_capacity(rows.len());
        for row in &rows {
            hierarchy.insert(
                row.try_get("id")?,
                row.try_get("colaborador_responsable_id")?,
            );
        }

        if !hierarchy.contains_key(&id) {
            return Err(Error::not_found("Empleado", id));
        }
        if let Some(responsible) = responsible {
            if !hierarchy.contains_key(&responsible) {
                return Err(Error::validation(
                    "colaborador_responsable_id",
                    format!("employee {} does not exist", responsible),
                ));
            }
        }
        check_no_cycle(id, responsible, &hierarchy)?;

        let sql = format!(
            "UPDATE users SET colaborador_responsable_id = $1 WHERE id = $2 RETURNING {}",
            EMPLOYEE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(responsible)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        let employee = employee_from_row(&row)?;
        tx.commit().await?;
        Ok(employee)
    }

    async fn add_credential(&self, user_id: i64, credential: NewCredential) -> Result<Credential> {
        let row = sqlx::query(
            "INSERT INTO credencial_empleados (user_id, titulo, cedula_profesional)
             VALUES ($1, $2, $3)
             RETURNING id, user_id, titulo, cedula_profesional",
        )
        .bind(user_id)
        .bind(&credential.titulo)
        .bind(&credential.cedula_profesional)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| missing_reference(e, "Empleado", user_id))?;
        credential_from_row(&row)
    }

    async fn list_credentials(&self, user_id: i64) -> Result<Vec<Credential>> {
        sqlx::query(
            "SELECT id, user_id, titulo, cedula_profesional
             FROM credencial_empleados WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(credential_from_row)
        .collect()
    }
}
