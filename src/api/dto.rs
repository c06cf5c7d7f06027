//! # Formato de wire del backend
//!
//! Estructuras con los nombres de campo que usa la API REST y su traducción a
//! los modelos de la interfaz. Ningún tipo de este módulo sale de `api`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{AppError, AppResult};
use crate::models::{
    Block, BlockCategory, GuestInvitation, Profile, Reservation, ReservationStatus, Role, Session,
    Table, TableStatus, TimeSlot, User,
};

/// Acepta `HH:MM` y `HH:MM:SS`
pub(crate) fn parse_time(value: &str) -> AppResult<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| AppError::InvalidResponse(format!("Hora inválida: '{}'", value)))
}

pub(crate) fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Acepta RFC 3339 o fecha-hora sin zona
pub(crate) fn parse_datetime(value: &str) -> AppResult<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S"))
        .map_err(|_| AppError::InvalidResponse(format!("Fecha inválida: '{}'", value)))
}

/// Extrae el mensaje de un cuerpo de error JSON
///
/// Busca `error`, `detail`, `message` o `mensaje`; si el cuerpo trae errores
/// por campo (`{"email": ["ya existe"]}`) usa el primero.
pub(crate) fn extract_error_message(body: &Value) -> Option<String> {
    let object = body.as_object()?;

    for key in ["error", "detail", "message", "mensaje"] {
        if let Some(text) = object.get(key).and_then(first_text) {
            return Some(text);
        }
    }

    object.values().find_map(first_text)
}

fn first_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Array(items) => items.iter().find_map(first_text),
        _ => None,
    }
}

/// Las listas llegan como arreglo o como página `{count, next, results}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListResponse<T> {
    Paginated {
        #[serde(default)]
        count: Option<u64>,
        #[serde(default)]
        next: Option<String>,
        results: Vec<T>,
    },
    Plain(Vec<T>),
}

impl<T> ListResponse<T> {
    pub fn has_next(&self) -> bool {
        matches!(self, ListResponse::Paginated { next: Some(_), .. })
    }

    pub fn total(&self) -> Option<u64> {
        match self {
            ListResponse::Paginated { count, .. } => *count,
            ListResponse::Plain(items) => Some(items.len() as u64),
        }
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            ListResponse::Paginated { results, .. } => results,
            ListResponse::Plain(items) => items,
        }
    }
}

// ── Auth ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegistroRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub telefono: &'a str,
    pub rut: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ActivarCuentaRequest<'a> {
    pub token: &'a str,
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UsuarioDto {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub rol: Role,
    #[serde(default)]
    pub rol_display: Option<String>,
    #[serde(default)]
    pub nombre_completo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    pub token: String,
    pub usuario: UsuarioDto,
}

impl From<AuthResponse> for Session {
    fn from(response: AuthResponse) -> Self {
        let user = response.usuario;
        Session {
            token: response.token,
            user_id: user.id,
            role_display_name: user
                .rol_display
                .unwrap_or_else(|| user.rol.display_name().to_string()),
            full_name: user
                .nombre_completo
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| user.username.clone()),
            username: user.username,
            email: user.email,
            role: user.rol,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenInvitadoDto {
    pub valido: bool,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub mensaje: Option<String>,
}

impl TryFrom<TokenInvitadoDto> for GuestInvitation {
    type Error = AppError;

    fn try_from(dto: TokenInvitadoDto) -> AppResult<Self> {
        if !dto.valido {
            return Err(AppError::Validation(
                dto.mensaje
                    .unwrap_or_else(|| "El enlace de activación no es válido o expiró".to_string()),
            ));
        }
        Ok(GuestInvitation {
            email: dto.email.unwrap_or_default(),
            full_name: dto.nombre.unwrap_or_default(),
        })
    }
}

// ── Reservas ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct ReservaDto {
    pub id: i64,
    pub cliente_nombre: String,
    #[serde(default)]
    pub mesa: Option<i64>,
    #[serde(default)]
    pub mesa_numero: Option<u32>,
    pub fecha: NaiveDate,
    pub hora: String,
    pub num_personas: u32,
    pub estado: ReservationStatus,
    #[serde(default)]
    pub notas: Option<String>,
    #[serde(default)]
    pub cliente_telefono: Option<String>,
    #[serde(default)]
    pub cliente_email: Option<String>,
    #[serde(default)]
    pub cliente_rut: Option<String>,
}

impl TryFrom<ReservaDto> for Reservation {
    type Error = AppError;

    fn try_from(dto: ReservaDto) -> AppResult<Self> {
        Ok(Reservation {
            id: dto.id,
            client_name: dto.cliente_nombre,
            table_label: dto
                .mesa_numero
                .map(|n| format!("Mesa {}", n))
                .unwrap_or_else(|| "Sin mesa".to_string()),
            table_id: dto.mesa,
            date: dto.fecha,
            time: parse_time(&dto.hora)?,
            party_size: dto.num_personas,
            status: dto.estado,
            notes: dto.notas.filter(|n| !n.trim().is_empty()),
            client_phone: dto.cliente_telefono.filter(|p| !p.is_empty()),
            client_email: dto.cliente_email.filter(|e| !e.is_empty()),
            client_tax_id: dto.cliente_rut.filter(|r| !r.is_empty()),
        })
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CrearReservaRequest<'a> {
    pub fecha: String,
    pub hora: String,
    pub num_personas: u32,
    pub mesa: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notas: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReservaPublicaRequest<'a> {
    pub nombre: &'a str,
    pub rut: &'a str,
    pub telefono: &'a str,
    pub email: &'a str,
    pub fecha: String,
    pub hora: String,
    pub num_personas: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notas: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct EstadoRequest {
    pub estado: &'static str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HorarioDto {
    pub hora: String,
    #[serde(default = "default_true")]
    pub disponible: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub(crate) struct HorariosResponse {
    pub horarios: Vec<HorarioDto>,
}

impl TryFrom<HorarioDto> for TimeSlot {
    type Error = AppError;

    fn try_from(dto: HorarioDto) -> AppResult<Self> {
        Ok(TimeSlot {
            time: parse_time(&dto.hora)?,
            available: dto.disponible,
        })
    }
}

// ── Mesas ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct MesaDto {
    pub id: i64,
    pub numero: u32,
    pub capacidad: u32,
    pub estado: TableStatus,
}

impl From<MesaDto> for Table {
    fn from(dto: MesaDto) -> Self {
        Table {
            id: dto.id,
            number: dto.numero,
            capacity: dto.capacidad,
            status: dto.estado,
        }
    }
}

// ── Bloqueos ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct BloqueoDto {
    pub id: i64,
    pub mesa: i64,
    pub mesa_numero: u32,
    pub fecha_inicio: NaiveDate,
    pub fecha_fin: NaiveDate,
    #[serde(default)]
    pub hora_inicio: Option<String>,
    #[serde(default)]
    pub hora_fin: Option<String>,
    pub motivo: String,
    pub categoria: BlockCategory,
    #[serde(default)]
    pub notas: Option<String>,
    pub activo: bool,
}

impl TryFrom<BloqueoDto> for Block {
    type Error = AppError;

    fn try_from(dto: BloqueoDto) -> AppResult<Self> {
        Ok(Block {
            id: dto.id,
            table_id: dto.mesa,
            table_number: dto.mesa_numero,
            date_start: dto.fecha_inicio,
            date_end: dto.fecha_fin,
            time_start: dto.hora_inicio.as_deref().map(parse_time).transpose()?,
            time_end: dto.hora_fin.as_deref().map(parse_time).transpose()?,
            reason: dto.motivo,
            category: dto.categoria,
            notes: dto.notas.unwrap_or_default(),
            active: dto.activo,
        })
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CrearBloqueoRequest<'a> {
    pub mesa: i64,
    pub fecha_inicio: String,
    pub fecha_fin: String,
    pub hora_inicio: Option<String>,
    pub hora_fin: Option<String>,
    pub motivo: &'a str,
    pub categoria: BlockCategory,
    pub notas: &'a str,
}

// ── Usuarios y perfil ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct UsuarioAdminDto {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub nombre_completo: String,
    pub rol: Role,
    pub fecha_registro: String,
    #[serde(default)]
    pub ultimo_acceso: Option<String>,
}

impl TryFrom<UsuarioAdminDto> for User {
    type Error = AppError;

    fn try_from(dto: UsuarioAdminDto) -> AppResult<Self> {
        Ok(User {
            id: dto.id,
            full_name: if dto.nombre_completo.trim().is_empty() {
                dto.username.clone()
            } else {
                dto.nombre_completo
            },
            username: dto.username,
            email: dto.email,
            role: dto.rol,
            registered_at: parse_datetime(&dto.fecha_registro)?,
            last_login_at: dto.ultimo_acceso.as_deref().map(parse_datetime).transpose()?,
        })
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RolRequest {
    pub rol: Role,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PerfilDto {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub rut: Option<String>,
}

impl From<PerfilDto> for Profile {
    fn from(dto: PerfilDto) -> Self {
        Profile {
            user_id: dto.id,
            username: dto.username,
            email: dto.email,
            first_name: dto.first_name,
            last_name: dto.last_name,
            phone: dto.telefono.unwrap_or_default(),
            tax_id: dto.rut.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct PerfilUpdateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefono: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rut: Option<&'a str>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reservation_fields_are_translated() {
        let dto: ReservaDto = serde_json::from_value(json!({
            "id": 10,
            "cliente_nombre": "Ana Rojas",
            "mesa": 3,
            "mesa_numero": 7,
            "fecha": "2026-10-20",
            "hora": "20:30:00",
            "num_personas": 4,
            "estado": "activa",
            "notas": "",
            "cliente_telefono": "+56 9 1234 5678"
        }))
        .unwrap();

        let reservation = Reservation::try_from(dto).unwrap();
        assert_eq!(reservation.table_label, "Mesa 7");
        assert_eq!(reservation.table_id, Some(3));
        assert_eq!(reservation.time, NaiveTime::from_hms_opt(20, 30, 0).unwrap());
        assert_eq!(reservation.status, ReservationStatus::Active);
        assert_eq!(reservation.notes, None);
        assert_eq!(reservation.client_email, None);
    }

    #[test]
    fn list_response_accepts_both_shapes() {
        let plain: ListResponse<MesaDto> = serde_json::from_value(json!([
            {"id": 1, "numero": 1, "capacidad": 4, "estado": "disponible"}
        ]))
        .unwrap();
        assert!(!plain.has_next());
        assert_eq!(plain.into_items().len(), 1);

        let paged: ListResponse<MesaDto> = serde_json::from_value(json!({
            "count": 2,
            "next": "http://x/mesas/?page=2",
            "results": [{"id": 1, "numero": 1, "capacidad": 4, "estado": "ocupada"}]
        }))
        .unwrap();
        assert!(paged.has_next());
    }

    #[test]
    fn error_message_extraction() {
        assert_eq!(
            extract_error_message(&json!({"error": "Mesa no disponible"})).as_deref(),
            Some("Mesa no disponible")
        );
        assert_eq!(
            extract_error_message(&json!({"detail": "Token inválido"})).as_deref(),
            Some("Token inválido")
        );
        assert_eq!(
            extract_error_message(&json!({"email": ["Este email ya está registrado"]})).as_deref(),
            Some("Este email ya está registrado")
        );
        assert_eq!(extract_error_message(&json!({})), None);
        assert_eq!(extract_error_message(&json!("texto")), None);
    }

    #[test]
    fn session_falls_back_to_username_and_role_label() {
        let response: AuthResponse = serde_json::from_value(json!({
            "token": "abc",
            "usuario": {"id": 5, "username": "cajero1", "email": "c@r.cl", "rol": "cajero"}
        }))
        .unwrap();
        let session = Session::from(response);
        assert_eq!(session.full_name, "cajero1");
        assert_eq!(session.role_display_name, "Cajero");
    }

    #[test]
    fn block_without_hours_is_full_day() {
        let dto: BloqueoDto = serde_json::from_value(json!({
            "id": 1, "mesa": 2, "mesa_numero": 5,
            "fecha_inicio": "2026-12-24", "fecha_fin": "2026-12-25",
            "motivo": "Navidad", "categoria": "evento_privado", "activo": true
        }))
        .unwrap();
        let block = Block::try_from(dto).unwrap();
        assert!(block.is_full_day());
        assert_eq!(block.notes, "");
    }

    #[test]
    fn datetimes_accept_rfc3339_and_naive() {
        assert!(parse_datetime("2026-10-01T12:00:00Z").is_ok());
        assert!(parse_datetime("2026-10-01T12:00:00.123").is_ok());
        assert!(parse_datetime("2026-10-01 12:00:00").is_ok());
        assert!(parse_datetime("ayer").is_err());
    }
}
