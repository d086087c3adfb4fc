use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    db::Store,
    error::{Error, Result},
    models::{
        CatheterRecord, IvTherapy, MedicationAdministration, NewCatheterRecord, NewIvTherapy,
        NewMedicationAdministration, NewVitalSignReading, NursingSheet, ProductoServicio,
        SheetUpdate, SheetUpdateRequest, VitalSignReading, TIPO_MEDICAMENTO, TIPO_SOLUCION,
    },
    section::{self, Section, SheetEditorView},
    AppState,
};

use super::extract::{Json, Path, Query};

#[derive(Debug, Default, Deserialize)]
pub struct EditorQuery {
    pub seccion: Option<String>,
}

async fn load_sheet(store: &dyn Store, id: i64) -> Result<NursingSheet> {
    store
        .get_sheet(id)
        .await?
        .ok_or(Error::not_found("HojaEnfermeria", id))
}

/// Looks up a catalog entry referenced by a section record and checks it is
/// of the expected `tipo`.
async fn load_catalog_item(store: &dyn Store, id: i64, tipo: &str) -> Result<ProductoServicio> {
    let item = store.get_product(id).await?.ok_or_else(|| {
        Error::validation(
            "producto_servicio_id",
            format!("catalog item {} does not exist", id),
        )
    })?;
    if item.tipo != tipo {
        return Err(Error::validation(
            "producto_servicio_id",
            format!("catalog item {} is not of type {}", id, tipo),
        ));
    }
    Ok(item)
}

/// POST /estancias/{id}/hojasenfermerias
/// Open a new nursing sheet for a stay
pub async fn create_sheet(
    State(state): State<AppState>,
    Path(estancia_id): Path<i64>,
) -> Result<Response> {
    let hoja = state.store.create_sheet(estancia_id).await?;
    tracing::info!("Opened nursing sheet {} for stay {}", hoja.id, estancia_id);

    let location = format!("/hojasenfermerias/{}", hoja.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(hoja),
    )
        .into_response())
}

/// GET /hojasenfermerias/{id}?seccion=
/// Editor view with one active section. Never modifies the sheet.
pub async fn get_sheet_editor(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<EditorQuery>,
) -> Result<Json<SheetEditorView>> {
    let seccion = match query.seccion.as_deref() {
        Some(raw) if !raw.is_empty() => raw.parse::<Section>()?,
        _ => Section::default(),
    };

    let store = state.store.as_ref();
    let hoja = load_sheet(store, id).await?;
    let estancia = store
        .get_stay(hoja.estancia_id)
        .await?
        .ok_or(Error::not_found("Estancia", hoja.estancia_id))?;
    let paciente = store
        .get_patient(estancia.paciente_id)
        .await?
        .ok_or(Error::not_found("Paciente", estancia.paciente_id))?;
    let activa = section::render(store, &hoja, seccion).await?;

    Ok(Json(SheetEditorView {
        paciente,
        estancia,
        hoja,
        secciones: section::tabs(),
        activa,
    }))
}

/// PUT /hojasenfermerias/{id}
/// Either closes the sheet (303 to its stay) or saves the observations.
pub async fn update_sheet(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<SheetUpdateRequest>,
) -> Result<Response> {
    let (update, expected_version) = request.intent()?;

    match update {
        SheetUpdate::Close => {
            let hoja = state.store.close_sheet(id, expected_version).await?;
            tracing::info!("✓ Nursing sheet {} closed (version {})", hoja.id, hoja.version);
            Ok(Redirect::to(&format!("/estancias/{}", hoja.estancia_id)).into_response())
        }
        SheetUpdate::Observations(texto) => {
            let hoja = state
                .store
                .update_observations(id, texto, expected_version)
                .await?;
            tracing::debug!("Observations saved on sheet {}", hoja.id);
            Ok(Json(hoja).into_response())
        }
    }
}

/// POST /hojasenfermerias/{id}/signos
pub async fn add_vital_signs(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(reading): Json<NewVitalSignReading>,
) -> Result<(StatusCode, Json<VitalSignReading>)> {
    reading.mediciones.validate_ranges()?;
    let created = state.store.add_vital_signs(id, reading).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /hojasenfermerias/{id}/medicamentos
pub async fn add_medication(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(medication): Json<NewMedicationAdministration>,
) -> Result<(StatusCode, Json<MedicationAdministration>)> {
    medication.validate()?;
    let store = state.store.as_ref();
    let product =
        load_catalog_item(store, medication.producto_servicio_id, TIPO_MEDICAMENTO).await?;
    let created = store.add_medication(id, medication, &product).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /hojasenfermerias/{id}/terapia-iv
pub async fn add_iv_therapy(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(therapy): Json<NewIvTherapy>,
) -> Result<(StatusCode, Json<IvTherapy>)> {
    therapy.validate()?;
    let store = state.store.as_ref();
    let solution = load_catalog_item(store, therapy.producto_servicio_id, TIPO_SOLUCION).await?;
    let created = store.add_iv_therapy(id, therapy, &solution).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /hojasenfermerias/{id}/sondas
pub async fn add_catheter(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(catheter): Json<NewCatheterRecord>,
) -> Result<(StatusCode, Json<CatheterRecord>)> {
    catheter.check()?;
    let created = state.store.add_catheter(id, catheter).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
