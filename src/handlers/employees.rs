use axum::{extract::State, http::StatusCode};
use validator::Validate;

use crate::{
    db::{EmployeeRecord, Store},
    error::{Error, Result},
    models::{AssignResponsible, Credential, Employee, NewCredential, NewEmployee},
    password::hash_password,
    AppState,
};

use super::extract::{Json, Path};

async fn load_employee(store: &dyn Store, id: i64) -> Result<Employee> {
    store
        .get_employee(id)
        .await?
        .ok_or(Error::not_found("Empleado", id))
}

/// POST /users
/// Register an employee. The password is hashed before it reaches the store
/// and never appears in a response.
pub async fn create_employee(
    State(state): State<AppState>,
    Json(employee): Json<NewEmployee>,
) -> Result<(StatusCode, Json<Employee>)> {
    employee.validate()?;

    let password = employee.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| Error::PasswordHash(e.to_string()))??;

    let record = EmployeeRecord {
        curp: employee.curp,
        nombre: employee.nombre,
        apellido_paterno: employee.apellido_paterno,
        apellido_materno: employee.apellido_materno,
        sexo: employee.sexo,
        fecha_nacimiento: employee.fecha_nacimiento,
        email: employee.email,
        cargo_id: employee.cargo_id,
        colaborador_responsable_id: employee.colaborador_responsable_id,
        password_hash,
    };
    let created = state.store.create_employee(record).await?;
    tracing::info!("Registered employee {} ({})", created.id, created.email);
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /users/{id}
pub async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Employee>> {
    load_employee(state.store.as_ref(), id).await.map(Json)
}

/// GET /users/{id}/subordinados
/// Direct reports only. A root pointing at itself is not its own subordinate.
pub async fn list_subordinates(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Employee>>> {
    let store = state.store.as_ref();
    load_employee(store, id).await?;
    Ok(Json(store.list_subordinates(id).await?))
}

/// PUT /users/{id}/responsable
pub async fn assign_responsible(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<AssignResponsible>,
) -> Result<Json<Employee>> {
    let updated = state
        .store
        .set_responsible(id, body.colaborador_responsable_id)
        .await?;
    tracing::info!(
        "Employee {} now reports to {:?}",
        updated.id,
        updated.colaborador_responsable_id
    );
    Ok(Json(updated))
}

/// POST /users/{id}/credenciales
pub async fn add_credential(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(credential): Json<NewCredential>,
) -> Result<(StatusCode, Json<Credential>)> {
    credential.validate()?;
    let created = state.store.add_credential(id, credential).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /users/{id}/credenciales
pub async fn list_credentials(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Credential>>> {
    let store = state.store.as_ref();
    load_employee(store, id).await?;
    Ok(Json(store.list_credentials(id).await?))
}
