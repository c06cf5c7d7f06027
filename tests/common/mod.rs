//! Backend de prueba sobre actix-web
//!
//! Responde con respuestas fijas por método y ruta y registra cada solicitud
//! recibida, para verificar qué envió el cliente.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::dev::ServerHandle;
use actix_web::http::StatusCode;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use serde_json::{json, Value};

use reservas_cliente::views::Confirmer;
use reservas_cliente::ApiClient;

/// Solicitud tal como la recibió el backend
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: String,
    pub authorization: Option<String>,
    pub body: Value,
}

/// Respuestas de una ruta; la última se repite indefinidamente
#[derive(Debug, Clone)]
pub struct Route {
    method: String,
    path: String,
    responses: VecDeque<(u16, Value)>,
}

impl Route {
    pub fn new(method: &str, path: &str, status: u16, body: Value) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
            responses: VecDeque::from([(status, body)]),
        }
    }

    pub fn get(path: &str, body: Value) -> Self {
        Self::new("GET", path, 200, body)
    }

    pub fn post(path: &str, body: Value) -> Self {
        Self::new("POST", path, 200, body)
    }

    pub fn patch(path: &str, body: Value) -> Self {
        Self::new("PATCH", path, 200, body)
    }

    /// Agrega una respuesta para la siguiente llamada
    pub fn then(mut self, status: u16, body: Value) -> Self {
        self.responses.push_back((status, body));
        self
    }

    fn next_response(&mut self) -> (u16, Value) {
        if self.responses.len() > 1 {
            self.responses.pop_front().unwrap_or((500, Value::Null))
        } else {
            self.responses.front().cloned().unwrap_or((500, Value::Null))
        }
    }
}

#[derive(Default)]
struct MockState {
    routes: Mutex<Vec<Route>>,
    log: Mutex<Vec<Recorded>>,
}

pub struct MockBackend {
    pub base_url: String,
    state: Arc<MockState>,
    handle: ServerHandle,
}

impl MockBackend {
    pub async fn start(routes: Vec<Route>) -> Self {
        let state = Arc::new(MockState {
            routes: Mutex::new(routes),
            log: Mutex::new(Vec::new()),
        });

        let data = web::Data::from(state.clone());
        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .default_service(web::to(handle_request))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .expect("bind mock backend");

        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        Self {
            base_url: format!("http://{}/api", addr),
            state,
            handle,
        }
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.base_url, Duration::from_secs(5)).expect("api client")
    }

    pub fn authed_client(&self) -> ApiClient {
        self.client().with_token("token-de-prueba")
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.log.lock().unwrap().clone()
    }

    /// Solicitudes que coinciden con método y ruta
    pub fn requests_to(&self, method: &str, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    pub async fn stop(self) {
        self.handle.stop(false).await;
    }
}

async fn handle_request(req: HttpRequest, body: web::Bytes, state: web::Data<MockState>) -> HttpResponse {
    let recorded = Recorded {
        method: req.method().to_string(),
        path: req.path().to_string(),
        query: req.query_string().to_string(),
        authorization: req
            .headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    };
    state.log.lock().unwrap().push(recorded.clone());

    let response = state
        .routes
        .lock()
        .unwrap()
        .iter_mut()
        .find(|r| r.method == recorded.method && r.path == recorded.path)
        .map(Route::next_response);

    match response {
        Some((status, body)) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            if body.is_null() {
                HttpResponse::build(status).finish()
            } else {
                HttpResponse::build(status).json(body)
            }
        }
        None => HttpResponse::NotFound().json(json!({ "detail": "No encontrado" })),
    }
}

// ── Confirmadores con respuesta fija ────────────────────────────────

pub struct AlwaysDecline;

impl Confirmer for AlwaysDecline {
    fn confirm(&mut self, _prompt: &str) -> bool {
        false
    }
}

/// Responde siempre lo mismo y guarda las preguntas recibidas
pub struct RecordingConfirmer {
    pub answer: bool,
    pub prompts: Vec<String>,
}

impl RecordingConfirmer {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            prompts: Vec::new(),
        }
    }
}

impl Confirmer for RecordingConfirmer {
    fn confirm(&mut self, prompt: &str) -> bool {
        self.prompts.push(prompt.to_string());
        self.answer
    }
}

// ── Fixtures en formato del backend ─────────────────────────────────

pub fn reserva(id: i64, fecha: &str, hora: &str, estado: &str) -> Value {
    json!({
        "id": id,
        "cliente_nombre": format!("Cliente {}", id),
        "mesa": 1,
        "mesa_numero": 4,
        "fecha": fecha,
        "hora": hora,
        "num_personas": 2,
        "estado": estado,
        "notas": "",
        "cliente_telefono": "+56 9 1234 5678",
        "cliente_email": format!("cliente{}@correo.cl", id),
        "cliente_rut": "11.111.111-1"
    })
}

pub fn mesa(id: i64, numero: u32, capacidad: u32, estado: &str) -> Value {
    json!({ "id": id, "numero": numero, "capacidad": capacidad, "estado": estado })
}

pub fn bloqueo(id: i64, mesa: i64, activo: bool) -> Value {
    json!({
        "id": id,
        "mesa": mesa,
        "mesa_numero": mesa,
        "fecha_inicio": "2026-10-24",
        "fecha_fin": "2026-10-24",
        "hora_inicio": null,
        "hora_fin": null,
        "motivo": "Mantención",
        "categoria": "mantenimiento",
        "notas": "",
        "activo": activo
    })
}

pub fn auth_response(id: i64, username: &str, rol: &str) -> Value {
    json!({
        "token": format!("token-{}", username),
        "usuario": {
            "id": id,
            "username": username,
            "email": format!("{}@correo.cl", username),
            "rol": rol,
            "nombre_completo": "Ana Rojas"
        }
    })
}
