pub mod memory;
pub mod migrations;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    CatalogFilter, CatheterRecord, Credential, Employee, IvTherapy, MedicationAdministration,
    NewCatheterRecord, NewCredential, NewIvTherapy, NewMedicationAdministration, NewPatient,
    NewProductoServicio, NewStay, NewVitalSignReading, NursingSheet, Patient, ProductoServicio,
    Stay, VitalSignReading,
};

/// Employee fields as persisted, after the password has been hashed.
#[derive(Debug, Clone)]
pub struct EmployeeRecord {
    pub curp: String,
    pub nombre: String,
    pub apellido_paterno: String,
    pub apellido_materno: String,
    pub sexo: String,
    pub fecha_nacimiento: chrono::NaiveDate,
    pub email: String,
    pub cargo_id: i32,
    pub colaborador_responsable_id: Option<i64>,
    pub password_hash: String,
}

/// Persistence for every entity of the service.
///
/// Sheet mutations (`close_sheet`, `update_observations`, `add_*`) must load
/// the sheet, apply the rule on `NursingSheet` and write the result under one
/// lock, so a closed sheet can never be written to by a concurrent request.
/// Payloads arrive already validated; stores only check references.
#[async_trait]
pub trait Store: Send + Sync {
    // Patients and stays
    async fn create_patient(&self, patient: NewPatient) -> Result<Patient>;
    async fn get_patient(&self, id: i64) -> Result<Option<Patient>>;
    async fn create_stay(&self, stay: NewStay) -> Result<Stay>;
    async fn get_stay(&self, id: i64) -> Result<Option<Stay>>;

    // Nursing sheets
    async fn create_sheet(&self, estancia_id: i64) -> Result<NursingSheet>;
    async fn get_sheet(&self, id: i64) -> Result<Option<NursingSheet>>;
    async fn list_sheets(&self, estancia_id: i64) -> Result<Vec<NursingSheet>>;
    async fn close_sheet(&self, id: i64, expected_version: Option<i32>) -> Result<NursingSheet>;
    async fn update_observations(
        &self,
        id: i64,
        observaciones: String,
        expected_version: Option<i32>,
    ) -> Result<NursingSheet>;

    // Section records
    async fn add_vital_signs(
        &self,
        sheet_id: i64,
        reading: NewVitalSignReading,
    ) -> Result<VitalSignReading>;
    async fn list_vital_signs(&self, sheet_id: i64) -> Result<Vec<VitalSignReading>>;
    async fn add_medication(
        &self,
        sheet_id: i64,
        medication: NewMedicationAdministration,
        product: &ProductoServicio,
    ) -> Result<MedicationAdministration>;
    async fn list_medications(&self, sheet_id: i64) -> Result<Vec<MedicationAdministration>>;
    async fn add_iv_therapy(
        &self,
        sheet_id: i64,
        therapy: NewIvTherapy,
        solution: &ProductoServicio,
    ) -> Result<IvTherapy>;
    async fn list_iv_therapies(&self, sheet_id: i64) -> Result<Vec<IvTherapy>>;
    async fn add_catheter(
        &self,
        sheet_id: i64,
        catheter: NewCatheterRecord,
    ) -> Result<CatheterRecord>;
    async fn list_catheters(&self, sheet_id: i64) -> Result<Vec<CatheterRecord>>;

    // Price list
    async fn create_product(&self, product: NewProductoServicio) -> Result<ProductoServicio>;
    async fn get_product(&self, id: i64) -> Result<Option<ProductoServicio>>;
    async fn list_products(&self, filter: CatalogFilter<'_>) -> Result<Vec<ProductoServicio>>;

    // Employees
    async fn create_employee(&self, employee: EmployeeRecord) -> Result<Employee>;
    async fn get_employee(&self, id: i64) -> Result<Option<Employee>>;
    async fn find_employee_by_email(&self, email: &str) -> Result<Option<Employee>>;
    async fn list_subordinates(&self, id: i64) -> Result<Vec<Employee>>;
    async fn set_responsible(&self, id: i64, responsible: Option<i64>) -> Result<Employee>;
    async fn add_credential(&self, user_id: i64, credential: NewCredential) -> Result<Credential>;
    async fn list_credentials(&self, user_id: i64) -> Result<Vec<Credential>>;
}
