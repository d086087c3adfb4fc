use hoja_enfermeria::{router, AppState, MemoryStore};
use reqwest::{redirect::Policy, Client, StatusCode};
use serde_json::{json, Value};
use tokio_test::assert_ok;

/// Starts the service on an ephemeral port backed by a fresh memory store.
async fn spawn_app() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");
    let app = router(AppState::new(MemoryStore::new()));

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server error");
    });

    format!("http://{}", addr)
}

fn client() -> Client {
    Client::builder()
        .redirect(Policy::none())
        .build()
        .expect("Failed to build client")
}

async fn post(client: &Client, url: String, body: Value) -> (StatusCode, Value) {
    let response = client
        .post(url)
        .json(&body)
        .send()
        .await
        .expect("Failed to send request");
    let status = response.status();
    let body = response.json().await.unwrap_or(Value::Null);
    (status, body)
}

async fn get(client: &Client, url: String) -> (StatusCode, Value) {
    let response = client.get(url).send().await.expect("Failed to send request");
    let status = response.status();
    let body = response.json().await.unwrap_or(Value::Null);
    (status, body)
}

async fn put(client: &Client, url: String, body: Value) -> reqwest::Response {
    client
        .put(url)
        .json(&body)
        .send()
        .await
        .expect("Failed to send request")
}

/// Creates a patient, a stay and one open sheet. Returns (stay id, sheet id).
async fn open_sheet(client: &Client, base: &str) -> (i64, i64) {
    let (status, patient) = post(
        client,
        format!("{}/pacientes", base),
        json!({
            "curp": "GOMA800101HDFRRN09",
            "nombre": "Ana",
            "apellido_paterno": "Gómez",
            "apellido_materno": "Mora",
            "sexo": "Femenino",
            "fecha_nacimiento": "1980-01-01"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, stay) = post(
        client,
        format!("{}/estancias", base),
        json!({
            "paciente_id": patient["id"],
            "folio": "EST-0001",
            "tipo_estancia": "Hospitalizacion"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let stay_id = stay["id"].as_i64().unwrap();

    let response = client
        .post(format!("{}/estancias/{}/hojasenfermerias", base, stay_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response.headers()["location"].to_str().unwrap().to_string();
    let sheet: Value = response.json().await.unwrap();
    assert_eq!(sheet["estado"], "Abierto");
    assert_eq!(sheet["version"], 1);
    let sheet_id = sheet["id"].as_i64().unwrap();
    assert_eq!(location, format!("/hojasenfermerias/{}", sheet_id));

    (stay_id, sheet_id)
}

async fn create_product(client: &Client, base: &str, tipo: &str, codigo: &str) -> Value {
    let (status, product) = post(
        client,
        format!("{}/productoservicios", base),
        json!({
            "tipo": tipo,
            "subtipo": "General",
            "codigo_prestacion": codigo,
            "nombre_prestacion": format!("Producto {}", codigo),
            "importe": "100"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    product
}

#[tokio::test]
async fn test_health_check() {
    let base = spawn_app().await;
    let response = assert_ok!(client().get(format!("{}/health", base)).send().await);
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_close_redirects_to_stay_and_is_one_way() {
    let base = spawn_app().await;
    let client = client();
    let (stay_id, sheet_id) = open_sheet(&client, &base).await;
    let sheet_url = format!("{}/hojasenfermerias/{}", base, sheet_id);

    let response = put(&client, sheet_url.clone(), json!({ "estado": "Cerrado" })).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()["location"].to_str().unwrap(),
        format!("/estancias/{}", stay_id)
    );

    let (_, editor) = get(&client, sheet_url.clone()).await;
    assert_eq!(editor["hoja"]["estado"], "Cerrado");
    assert_eq!(editor["hoja"]["version"], 2);
    assert_eq!(editor["activa"]["editable"], false);

    let response = put(&client, sheet_url.clone(), json!({ "estado": "Cerrado" })).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "already-closed");
    assert_eq!(body["retryable"], false);

    let (_, stay) = get(&client, format!("{}/estancias/{}", base, stay_id)).await;
    assert_eq!(stay["hojas_enfermeria"][0]["estado"], "Cerrado");
    assert_eq!(stay["paciente"]["nombre"], "Ana");
}

#[tokio::test]
async fn test_closed_sheet_rejects_every_write() {
    let base = spawn_app().await;
    let client = client();
    let (_, sheet_id) = open_sheet(&client, &base).await;
    let sheet_url = format!("{}/hojasenfermerias/{}", base, sheet_id);

    let response = put(&client, sheet_url.clone(), json!({ "estado": "Cerrado" })).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = put(
        &client,
        sheet_url.clone(),
        json!({ "observaciones": "stale edit from another tab" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let (status, body) = post(
        &client,
        format!("{}/signos", sheet_url),
        json!({ "frecuencia_cardiaca": 80 }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already-closed");

    let (status, _) = post(
        &client,
        format!("{}/sondas", sheet_url),
        json!({
            "tipo_dispositivo": "Sonda Foley",
            "fecha_instalacion": "2024-05-01T08:00:00Z"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, editor) = get(&client, format!("{}?seccion=observaciones", sheet_url)).await;
    assert_eq!(editor["activa"]["contenido"]["datos"]["texto"], "");
}

#[tokio::test]
async fn test_section_switch_is_read_only() {
    let base = spawn_app().await;
    let client = client();
    let (_, sheet_id) = open_sheet(&client, &base).await;
    let sheet_url = format!("{}/hojasenfermerias/{}", base, sheet_id);

    let (status, editor) = get(&client, sheet_url.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(editor["activa"]["seccion"], "signos");
    assert_eq!(editor["secciones"].as_array().unwrap().len(), 9);

    for seccion in ["medicamentos", "terapia_iv", "dieta", "graficas", "signos"] {
        let (status, editor) = get(&client, format!("{}?seccion={}", sheet_url, seccion)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(editor["activa"]["seccion"], seccion);
        assert_eq!(editor["hoja"]["version"], 1);
    }

    let (_, editor) = get(&client, format!("{}?seccion=dieta", sheet_url)).await;
    assert_eq!(editor["activa"]["contenido"]["tipo"], "no_disponible");
    assert_eq!(editor["activa"]["editable"], false);

    let (status, body) = get(&client, format!("{}?seccion=laboratorio", sheet_url)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "seccion");
}

#[tokio::test]
async fn test_observations_round_trip_including_empty() {
    let base = spawn_app().await;
    let client = client();
    let (_, sheet_id) = open_sheet(&client, &base).await;
    let sheet_url = format!("{}/hojasenfermerias/{}", base, sheet_id);

    let text = "Paciente estable.\nSin dolor.";
    let response = put(&client, sheet_url.clone(), json!({ "observaciones": text })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let sheet: Value = response.json().await.unwrap();
    assert_eq!(sheet["observaciones"], text);
    assert_eq!(sheet["estado"], "Abierto");

    let response = put(&client, sheet_url.clone(), json!({ "observaciones": "" })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let (_, editor) = get(&client, format!("{}?seccion=observaciones", sheet_url)).await;
    assert_eq!(editor["activa"]["contenido"]["tipo"], "observaciones");
    assert_eq!(editor["activa"]["contenido"]["datos"]["texto"], "");
    assert_eq!(editor["hoja"]["version"], 3);
}

#[tokio::test]
async fn test_put_rejects_mixed_or_invalid_intent() {
    let base = spawn_app().await;
    let client = client();
    let (_, sheet_id) = open_sheet(&client, &base).await;
    let sheet_url = format!("{}/hojasenfermerias/{}", base, sheet_id);

    let response = put(
        &client,
        sheet_url.clone(),
        json!({ "estado": "Cerrado", "observaciones": "both" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = put(&client, sheet_url.clone(), json!({ "estado": "Abierto" })).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let (_, editor) = get(&client, sheet_url).await;
    assert_eq!(editor["hoja"]["estado"], "Abierto");
    assert_eq!(editor["hoja"]["version"], 1);
}

#[tokio::test]
async fn test_malformed_requests_get_error_body() {
    let base = spawn_app().await;
    let client = client();
    let (_, sheet_id) = open_sheet(&client, &base).await;
    let sheet_url = format!("{}/hojasenfermerias/{}", base, sheet_id);

    let response = put(&client, sheet_url.clone(), json!({ "estado": 5 })).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "invalid");
    assert_eq!(body["field"], "estado");
    assert_eq!(body["retryable"], false);

    let response = put(
        &client,
        format!("{}/hojasenfermerias/abc", base),
        json!({ "estado": "Cerrado" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "invalid");
    assert_eq!(body["field"], "id");

    let response = client
        .post(format!("{}/signos", sheet_url))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["field"], "body");

    let (_, editor) = get(&client, sheet_url).await;
    assert_eq!(editor["hoja"]["version"], 1);
}

#[tokio::test]
async fn test_stale_version_is_a_conflict() {
    let base = spawn_app().await;
    let client = client();
    let (_, sheet_id) = open_sheet(&client, &base).await;
    let sheet_url = format!("{}/hojasenfermerias/{}", base, sheet_id);

    let response = put(
        &client,
        sheet_url.clone(),
        json!({ "observaciones": "first", "version": 1 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = put(
        &client,
        sheet_url.clone(),
        json!({ "estado": "Cerrado", "version": 1 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "conflict");
    assert_eq!(body["retryable"], true);

    let response = put(
        &client,
        sheet_url.clone(),
        json!({ "estado": "Cerrado", "version": 2 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_missing_sheet_is_not_found() {
    let base = spawn_app().await;
    let client = client();

    let (status, body) = get(&client, format!("{}/hojasenfermerias/9999", base)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not-found");

    let response = put(
        &client,
        format!("{}/hojasenfermerias/9999", base),
        json!({ "estado": "Cerrado" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_section_writers() {
    let base = spawn_app().await;
    let client = client();
    let (_, sheet_id) = open_sheet(&client, &base).await;
    let sheet_url = format!("{}/hojasenfermerias/{}", base, sheet_id);

    let (status, reading) = post(
        &client,
        format!("{}/signos", sheet_url),
        json!({
            "tension_arterial_sistolica": 120,
            "tension_arterial_diastolica": 80,
            "frecuencia_cardiaca": 72,
            "temperatura": 36.6
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reading["frecuencia_cardiaca"], 72);

    let (status, body) = post(
        &client,
        format!("{}/signos", sheet_url),
        json!({ "tension_arterial_sistolica": 80, "tension_arterial_diastolica": 120 }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "tension_arterial_diastolica");

    let medicamento = create_product(&client, &base, "Medicamento", "MED-01").await;
    let solucion = create_product(&client, &base, "Solucion", "SOL-01").await;

    let (status, medication) = post(
        &client,
        format!("{}/medicamentos", sheet_url),
        json!({
            "producto_servicio_id": medicamento["id"],
            "dosis": "500 mg",
            "via_administracion": "Oral"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(medication["nombre_medicamento"], "Producto MED-01");

    let (status, body) = post(
        &client,
        format!("{}/medicamentos", sheet_url),
        json!({
            "producto_servicio_id": solucion["id"],
            "dosis": "1 l",
            "via_administracion": "IV"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "producto_servicio_id");

    let (status, therapy) = post(
        &client,
        format!("{}/terapia-iv", sheet_url),
        json!({
            "producto_servicio_id": solucion["id"],
            "cantidad_ml": 1000,
            "duracion_horas": 8
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(therapy["flujo_ml_hora"], "125.00");

    let (status, _) = post(
        &client,
        format!("{}/sondas", sheet_url),
        json!({
            "tipo_dispositivo": "Catéter venoso periférico",
            "calibre": "18G",
            "fecha_instalacion": "2024-05-02T08:00:00Z",
            "fecha_caducidad": "2024-05-01T08:00:00Z"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, editor) = get(&client, format!("{}?seccion=medicamentos", sheet_url)).await;
    let datos = &editor["activa"]["contenido"]["datos"];
    assert_eq!(datos["registros"].as_array().unwrap().len(), 1);
    assert_eq!(datos["catalogo"].as_array().unwrap().len(), 1);
    assert_eq!(editor["hoja"]["version"], 4);

    let (_, editor) = get(&client, format!("{}?seccion=graficas", sheet_url)).await;
    let series = editor["activa"]["contenido"]["datos"]["series"]
        .as_array()
        .unwrap()
        .clone();
    assert!(series.iter().any(|s| s["signo"] == "frecuencia_cardiaca"));
}

#[tokio::test]
async fn test_price_list_keeps_two_decimals() {
    let base = spawn_app().await;
    let client = client();

    let (status, product) = post(
        &client,
        format!("{}/productoservicios", base),
        json!({
            "tipo": "Medicamento",
            "subtipo": "Oral",
            "codigo_prestacion": "M001",
            "nombre_prestacion": "Paracetamol 500mg",
            "importe": "12.5",
            "cantidad": null
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(product["importe"], "12.50");
    assert_eq!(product["cantidad"], Value::Null);

    let (_, fetched) = get(
        &client,
        format!("{}/productoservicios/{}", base, product["id"]),
    )
    .await;
    assert_eq!(fetched, product);

    let (status, body) = post(
        &client,
        format!("{}/productoservicios", base),
        json!({
            "tipo": "Medicamento",
            "subtipo": "Oral",
            "codigo_prestacion": "M002",
            "nombre_prestacion": "Ibuprofeno 400mg",
            "importe": "3.999"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "importe");

    create_product(&client, &base, "Solucion", "S001").await;
    let (_, medicamentos) = get(
        &client,
        format!("{}/productoservicios?tipo=Medicamento", base),
    )
    .await;
    assert_eq!(medicamentos.as_array().unwrap().len(), 1);
    let (_, all) = get(&client, format!("{}/productoservicios", base)).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
}

fn employee(curp: &str, email: &str, responsible: Option<i64>) -> Value {
    json!({
        "curp": curp,
        "nombre": "Empleado",
        "apellido_paterno": "Prueba",
        "sexo": "Femenino",
        "fecha_nacimiento": "1990-02-14",
        "email": email,
        "password": "password123",
        "cargo_id": 5,
        "colaborador_responsable_id": responsible
    })
}

#[tokio::test]
async fn test_employee_hierarchy_and_credentials() {
    let base = spawn_app().await;
    let client = client();

    let (status, jefe) = post(
        &client,
        format!("{}/users", base),
        employee("JEFE850101HDFLRS01", "jefe@hospital.com", None),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(jefe.get("password").is_none());
    let jefe_id = jefe["id"].as_i64().unwrap();

    let response = put(
        &client,
        format!("{}/users/{}/responsable", base, jefe_id),
        json!({ "colaborador_responsable_id": jefe_id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let (_, enfermera) = post(
        &client,
        format!("{}/users", base),
        employee("ENFE900214MDFLPS02", "enfermera@hospital.com", Some(jefe_id)),
    )
    .await;
    let enfermera_id = enfermera["id"].as_i64().unwrap();

    let (status, subordinados) =
        get(&client, format!("{}/users/{}/subordinados", base, jefe_id)).await;
    assert_eq!(status, StatusCode::OK);
    let subordinados = subordinados.as_array().unwrap();
    assert_eq!(subordinados.len(), 1);
    assert_eq!(subordinados[0]["id"], enfermera_id);

    let response = put(
        &client,
        format!("{}/users/{}/responsable", base, jefe_id),
        json!({ "colaborador_responsable_id": enfermera_id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = post(
        &client,
        format!("{}/users/{}/credenciales", base, enfermera_id),
        json!({ "titulo": "Licenciatura en Enfermería", "cedula_profesional": "7654321" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, credenciales) =
        get(&client, format!("{}/users/{}/credenciales", base, enfermera_id)).await;
    assert_eq!(credenciales[0]["cedula_profesional"], "7654321");

    let (status, _) = get(&client, format!("{}/users/9999/subordinados", base)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = post(
        &client,
        format!("{}/users", base),
        employee("SHRT", "corto@hospital.com", None),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "curp");
}
