use axum::{extract::State, http::StatusCode};
use validator::Validate;

use crate::{
    error::{Error, Result},
    models::{NewPatient, NewStay, Patient, Stay, StayView},
    AppState,
};

use super::extract::{Json, Path};

/// POST /pacientes
pub async fn create_patient(
    State(state): State<AppState>,
    Json(patient): Json<NewPatient>,
) -> Result<(StatusCode, Json<Patient>)> {
    patient.validate()?;
    let created = state.store.create_patient(patient).await?;
    tracing::info!("Registered patient {}", created.id);
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /pacientes/{id}
pub async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Patient>> {
    state
        .store
        .get_patient(id)
        .await?
        .ok_or(Error::not_found("Paciente", id))
        .map(Json)
}

/// POST /estancias
pub async fn create_stay(
    State(state): State<AppState>,
    Json(stay): Json<NewStay>,
) -> Result<(StatusCode, Json<Stay>)> {
    stay.validate()?;
    let created = state.store.create_stay(stay).await?;
    tracing::info!(
        "Admitted patient {} under stay {} ({})",
        created.paciente_id,
        created.id,
        created.folio
    );
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /estancias/{id}
/// Stay with its patient and every nursing sheet. Target of the redirect
/// issued after a sheet is closed.
pub async fn get_stay(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<StayView>> {
    let store = state.store.as_ref();
    let estancia = store
        .get_stay(id)
        .await?
        .ok_or(Error::not_found("Estancia", id))?;
    let paciente = store
        .get_patient(estancia.paciente_id)
        .await?
        .ok_or(Error::not_found("Paciente", estancia.paciente_id))?;
    let hojas_enfermeria = store.list_sheets(id).await?;

    Ok(Json(StayView {
        estancia,
        paciente,
        hojas_enfermeria,
    }))
}
