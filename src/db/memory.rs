use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use super::{EmployeeRecord, Store};
use crate::error::{Error, Result};
use crate::models::{
    check_no_cycle, CatalogFilter, CatheterRecord, Credential, Employee, IvTherapy,
    MedicationAdministration, NewCatheterRecord, NewCredential, NewIvTherapy,
    NewMedicationAdministration, NewPatient, NewProductoServicio, NewStay, NewVitalSignReading,
    NursingSheet, Patient, ProductoServicio, Stay, VitalSignReading,
};

/// Process-local store. Used when no `DATABASE_URL` is configured and by the
/// test suites. All writes go through one `RwLock`, which also serializes
/// sheet mutations.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    sequence: i64,
    patients: BTreeMap<i64, Patient>,
    stays: BTreeMap<i64, Stay>,
    sheets: BTreeMap<i64, NursingSheet>,
    vital_signs: Vec<VitalSignReading>,
    medications: Vec<MedicationAdministration>,
    iv_therapies: Vec<IvTherapy>,
    catheters: Vec<CatheterRecord>,
    products: BTreeMap<i64, ProductoServicio>,
    employees: BTreeMap<i64, Employee>,
    credentials: Vec<Credential>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.sequence += 1;
        self.sequence
    }

    fn sheet_mut(&mut self, id: i64) -> Result<&mut NursingSheet> {
        self.sheets
            .get_mut(&id)
            .ok_or(Error::not_found("HojaEnfermeria", id))
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_patient(&self, patient: NewPatient) -> Result<Patient> {
        let mut tables = self.inner.write().await;
        let id = tables.next_id();
        let patient = Patient {
            id,
            curp: patient.curp,
            nombre: patient.nombre,
            apellido_paterno: patient.apellido_paterno,
            apellido_materno: patient.apellido_materno,
            sexo: patient.sexo,
            fecha_nacimiento: patient.fecha_nacimiento,
        };
        tables.patients.insert(id, patient.clone());
        Ok(patient)
    }

    async fn get_patient(&self, id: i64) -> Result<Option<Patient>> {
        Ok(self.inner.read().await.patients.get(&id).cloned())
    }

    async fn create_stay(&self, stay: NewStay) -> Result<Stay> {
        let mut tables = self.inner.write().await;
        if !tables.patients.contains_key(&stay.paciente_id) {
            return Err(Error::not_found("Paciente", stay.paciente_id));
        }
        let id = tables.next_id();
        let stay = Stay {
            id,
            paciente_id: stay.paciente_id,
            folio: stay.folio,
            tipo_estancia: stay.tipo_estancia,
            fecha_ingreso: stay.fecha_ingreso.unwrap_or_else(Utc::now),
        };
        tables.stays.insert(id, stay.clone());
        Ok(stay)
    }

    async fn get_stay(&self, id: i64) -> Result<Option<Stay>> {
        Ok(self.inner.read().await.stays.get(&id).cloned())
    }

    async fn create_sheet(&self, estancia_id: i64) -> Result<NursingSheet> {
        let mut tables = self.inner.write().await;
        if !tables.stays.contains_key(&estancia_id) {
            return Err(Error::not_found("Estancia", estancia_id));
        }
        let id = tables.next_id();
        let sheet = NursingSheet::new(id, estancia_id, Utc::now());
        tables.sheets.insert(id, sheet.clone());
        Ok(sheet)
    }

    async fn get_sheet(&self, id: i64) -> Result<Option<NursingSheet>> {
        Ok(self.inner.read().await.sheets.get(&id).cloned())
    }

    async fn list_sheets(&self, estancia_id: i64) -> Result<Vec<NursingSheet>> {
        Ok(self
            .inner
            .read()
            .await
            .sheets
            .values()
            .filter(|s| s.estancia_id == estancia_id)
            .cloned()
            .collect())
    }

    async fn close_sheet(&self, id: i64, expected_version: Option<i32>) -> Result<NursingSheet> {
        let mut tables = self.inner.write().await;
        let sheet = tables.sheet_mut(id)?;
        sheet.close(expected_version, Utc::now())?;
        Ok(sheet.clone())
    }

    async fn update_observations(
        &self,
        id: i64,
        observaciones: String,
        expected_version: Option<i32>,
    ) -> Result<NursingSheet> {
        let mut tables = self.inner.write().await;
        let sheet = tables.sheet_mut(id)?;
        sheet.set_observations(observaciones, expected_version, Utc::now())?;
        Ok(sheet.clone())
    }

    async fn add_vital_signs(
        &self,
        sheet_id: i64,
        reading: NewVitalSignReading,
    ) -> Result<VitalSignReading> {
        let mut tables = self.inner.write().await;
        let now = Utc::now();
        tables
            .sheet_mut(sheet_id)?
            .record_section_write(reading.version, now)?;
        let record = VitalSignReading {
            id: tables.next_id(),
            hoja_enfermeria_id: sheet_id,
            fecha_hora_registro: reading.fecha_hora_registro.unwrap_or(now),
            mediciones: reading.mediciones,
        };
        tables.vital_signs.push(record.clone());
        Ok(record)
    }

    async fn list_vital_signs(&self, sheet_id: i64) -> Result<Vec<VitalSignReading>> {
        let tables = self.inner.read().await;
        let mut records: Vec<VitalSignReading> = tables
            .vital_signs
            .iter()
            .filter(|r| r.hoja_enfermeria_id == sheet_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| (r.fecha_hora_registro, r.id));
        Ok(records)
    }

    async fn add_medication(
        &self,
        sheet_id: i64,
        medication: NewMedicationAdministration,
        product: &ProductoServicio,
    ) -> Result<MedicationAdministration> {
        let mut tables = self.inner.write().await;
        let now = Utc::now();
        tables
            .sheet_mut(sheet_id)?
            .record_section_write(medication.version, now)?;
        let record = MedicationAdministration {
            id: tables.next_id(),
            hoja_enfermeria_id: sheet_id,
            producto_servicio_id: product.id,
            nombre_medicamento: product.nombre_prestacion.clone(),
            dosis: medication.dosis,
            via_administracion: medication.via_administracion,
            fecha_hora_aplicacion: medication.fecha_hora_aplicacion.unwrap_or(now),
        };
        tables.medications.push(record.clone());
        Ok(record)
    }

    async fn list_medications(&self, sheet_id: i64) -> Result<Vec<MedicationAdministration>> {
        let tables = self.inner.read().await;
        let mut records: Vec<MedicationAdministration> = tables
            .medications
            .iter()
            .filter(|r| r.hoja_enfermeria_id == sheet_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| (r.fecha_hora_aplicacion, r.id));
        Ok(records)
    }

    async fn add_iv_therapy(
        &self,
        sheet_id: i64,
        therapy: NewIvTherapy,
        solution: &ProductoServicio,
    ) -> Result<IvTherapy> {
        let mut tables = self.inner.write().await;
        let now = Utc::now();
        tables
            .sheet_mut(sheet_id)?
            .record_section_write(therapy.version, now)?;
        let record = IvTherapy {
            id: tables.next_id(),
            hoja_enfermeria_id: sheet_id,
            producto_servicio_id: solution.id,
            nombre_solucion: solution.nombre_prestacion.clone(),
            cantidad_ml: therapy.cantidad_ml,
            duracion_horas: therapy.duracion_horas,
            flujo_ml_hora: therapy.flow_rate(),
            fecha_hora_inicio: therapy.fecha_hora_inicio.unwrap_or(now),
        };
        tables.iv_therapies.push(record.clone());
        Ok(record)
    }

    async fn list_iv_therapies(&self, sheet_id: i64) -> Result<Vec<IvTherapy>> {
        let tables = self.inner.read().await;
        let mut records: Vec<IvTherapy> = tables
            .iv_therapies
            .iter()
            .filter(|r| r.hoja_enfermeria_id == sheet_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| (r.fecha_hora_inicio, r.id));
        Ok(records)
    }

    async fn add_catheter(
        &self,
        sheet_id: i64,
        catheter: NewCatheterRecord,
    ) -> Result<CatheterRecord> {
        let mut tables = self.inner.write().await;
        tables
            .sheet_mut(sheet_id)?
            .record_section_write(catheter.version, Utc::now())?;
        let record = CatheterRecord {
            id: tables.next_id(),
            hoja_enfermeria_id: sheet_id,
            tipo_dispositivo: catheter.tipo_dispositivo,
            calibre: catheter.calibre,
            fecha_instalacion: catheter.fecha_instalacion,
            fecha_caducidad: catheter.fecha_caducidad,
            observaciones: catheter.observaciones,
        };
        tables.catheters.push(record.clone());
        Ok(record)
    }

    async fn list_catheters(&self, sheet_id: i64) -> Result<Vec<CatheterRecord>> {
        let tables = self.inner.read().await;
        let mut records: Vec<CatheterRecord> = tables
            .catheters
            .iter()
            .filter(|r| r.hoja_enfermeria_id == sheet_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| (r.fecha_instalacion, r.id));
        Ok(records)
    }

    async fn create_product(&self, product: NewProductoServicio) -> Result<ProductoServicio> {
        let mut tables = self.inner.write().await;
        let id = tables.next_id();
        let product = ProductoServicio {
            id,
            tipo: product.tipo,
            subtipo: product.subtipo,
            codigo_prestacion: product.codigo_prestacion,
            nombre_prestacion: product.nombre_prestacion,
            importe: product.importe,
            cantidad: product.cantidad,
        };
        tables.products.insert(id, product.clone());
        Ok(product)
    }

    async fn get_product(&self, id: i64) -> Result<Option<ProductoServicio>> {
        Ok(self.inner.read().await.products.get(&id).cloned())
    }

    async fn list_products(&self, filter: CatalogFilter<'_>) -> Result<Vec<ProductoServicio>> {
        let tables = self.inner.read().await;
        let mut products: Vec<ProductoServicio> = tables
            .products
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        // Same order as the SQL store: by name, then id.
        products.sort_by(|a, b| {
            a.nombre_prestacion
                .cmp(&b.nombre_prestacion)
                .then(a.id.cmp(&b.id))
        });
        Ok(products)
    }

    async fn create_employee(&self, employee: EmployeeRecord) -> Result<Employee> {
        let mut tables = self.inner.write().await;
        if let Some(responsible) = employee.colaborador_responsable_id {
            if !tables.employees.contains_key(&responsible) {
                return Err(Error::validation(
                    "colaborador_responsable_id",
                    format!("employee {} does not exist", responsible),
                ));
            }
        }
        if tables.employees.values().any(|e| e.email == employee.email) {
            return Err(Error::validation("email", "email already registered"));
        }
        let id = tables.next_id();
        let employee = Employee {
            id,
            curp: employee.curp,
            nombre: employee.nombre,
            apellido_paterno: employee.apellido_paterno,
            apellido_materno: employee.apellido_materno,
            sexo: employee.sexo,
            fecha_nacimiento: employee.fecha_nacimiento,
            email: employee.email,
            cargo_id: employee.cargo_id,
            colaborador_responsable_id: employee.colaborador_responsable_id,
            password_hash: employee.password_hash,
        };
        tables.employees.insert(id, employee.clone());
        Ok(employee)
    }

    async fn get_employee(&self, id: i64) -> Result<Option<Employee>> {
        Ok(self.inner.read().await.employees.get(&id).cloned())
    }

    async fn find_employee_by_email(&self, email: &str) -> Result<Option<Employee>> {
        Ok(self
            .inner
            .read()
            .await
            .employees
            .values()
            .find(|e| e.email == email)
            .cloned())
    }

    async fn list_subordinates(&self, id: i64) -> Result<Vec<Employee>> {
        Ok(self
            .inner
            .read()
            .await
            .employees
            .values()
            .filter(|e| e.id != id && e.colaborador_responsable_id == Some(id))
            .cloned()
            .collect())
    }

    async fn set_responsible(&self, id: i64, responsible: Option<i64>) -> Result<Employee> {
        let mut tables = self.inner.write().await;
        if !tables.employees.contains_key(&id) {
            return Err(Error::not_found("Empleado", id));
        }
        if let Some(responsible) = responsible {
            if !tables.employees.contains_key(&responsible) {
                return Err(Error::validation(
                    "colaborador_responsable_id",
                    format!("employee {} does not exist", responsible),
                ));
            }
        }

        let hierarchy: HashMap<i64, Option<i64>> = tables
            .employees
            .values()
            .map(|e| (e.id, e.colaborador_responsable_id))
            .collect();
        check_no_cycle(id, responsible, &hierarchy)?;

        let employee = tables
            .employees
            .get_mut(&id)
            .ok_or(Error::not_found("Empleado", id))?;
        employee.colaborador_responsable_id = responsible;
        Ok(employee.clone())
    }

    async fn add_credential(&self, user_id: i64, credential: NewCredential) -> Result<Credential> {
        let mut tables = self.inner.write().await;
        if !tables.employees.contains_key(&user_id) {
            return Err(Error::not_found("Empleado", user_id));
        }
        let credential = Credential {
            id: tables.next_id(),
            user_id,
            titulo: credential.titulo,
            cedula_profesional: credential.cedula_profesional,
        };
        tables.credentials.push(credential.clone());
        Ok(credential)
    }

    async fn list_credentials(&self, user_id: i64) -> Result<Vec<Credential>> {
        Ok(self
            .inner
            .read()
            .await
            .credentials
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }
}
