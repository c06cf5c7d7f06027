//! # Manejo de errores del cliente
//!
//! Jerarquía de errores construida con thiserror. Cubre las cuatro familias que
//! la interfaz distingue:
//!
//! - **Validación**: errores de formulario detectados localmente, nunca llegan al servidor
//! - **Solicitud**: respuestas HTTP no exitosas, con el mensaje que envía el backend
//! - **Red**: fallos de transporte (servidor caído, timeout, DNS)
//! - **Carrera**: un recurso que estaba disponible desapareció antes de confirmar

use std::error::Error as StdError;
use thiserror::Error;

/// Mensaje genérico cuando el backend no explica el error
pub const GENERIC_REQUEST_MESSAGE: &str = "Error en la solicitud";

/// Mensaje genérico para fallos de red
pub const GENERIC_NETWORK_MESSAGE: &str =
    "No se pudo conectar con el servidor. Verifique su conexión e intente nuevamente";

/// Tipos de error de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    /// Error de validación con campo específico
    #[error("Error de validación en campo '{field}': {message}")]
    ValidationWithField { field: String, message: String },

    /// Error de validación general
    #[error("Error de validación: {0}")]
    Validation(String),

    /// Respuesta no exitosa del backend
    #[error("Error en la solicitud (HTTP {status}): {message}")]
    Request { status: u16, message: String },

    /// Sesión inválida o expirada (HTTP 401)
    #[error("No autorizado: {0}")]
    Unauthorized(String),

    /// El rol actual no puede acceder a la vista solicitada
    #[error("Acceso denegado: {0}")]
    Forbidden(String),

    /// Fallo de transporte
    #[error("Error de red: {0}")]
    Network(#[from] reqwest::Error),

    /// Un recurso seleccionado dejó de estar disponible
    #[error("{resource} no disponible: {message}")]
    Unavailable { resource: String, message: String },

    /// La respuesta no tiene el formato esperado
    #[error("Respuesta inválida del servidor: {0}")]
    InvalidResponse(String),

    /// Error leyendo o escribiendo el estado persistido
    #[error("Error de almacenamiento en operación '{operation}': {source}")]
    Storage {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Error de serialización
    #[error("Error de serialización: {0}")]
    Json(#[from] serde_json::Error),

    /// Error interno con código de rastreo
    #[error("Error interno (trace: {trace_id}): {message}")]
    InternalWithTrace { trace_id: String, message: String },

    /// Error interno simple
    #[error("Error interno: {0}")]
    Internal(String),
}

impl AppError {
    /// Crea un error de validación con campo específico
    pub fn validation_field(field: &str, message: &str) -> Self {
        Self::ValidationWithField {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    /// Crea un error de recurso no disponible
    pub fn unavailable(resource: &str, message: &str) -> Self {
        Self::Unavailable {
            resource: resource.to_string(),
            message: message.to_string(),
        }
    }

    /// Crea un error de almacenamiento con contexto de operación
    pub fn storage(operation: &str, source: std::io::Error) -> Self {
        Self::Storage {
            operation: operation.to_string(),
            source,
        }
    }

    /// Crea un error interno con trace ID
    pub fn internal_trace(message: &str, trace_id: Option<String>) -> Self {
        Self::InternalWithTrace {
            trace_id: trace_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            message: message.to_string(),
        }
    }

    /// Texto que se muestra al usuario (banner o aviso)
    ///
    /// Los errores de red se muestran siempre con el mensaje genérico; los de
    /// solicitud con el mensaje del servidor.
    pub fn user_message(&self) -> String {
        match self {
            Self::ValidationWithField { message, .. } => message.clone(),
            Self::Validation(message) => message.clone(),
            Self::Request { message, .. } => message.clone(),
            Self::Unauthorized(message) => message.clone(),
            Self::Forbidden(message) => message.clone(),
            Self::Network(_) => GENERIC_NETWORK_MESSAGE.to_string(),
            Self::Unavailable { message, .. } => message.clone(),
            Self::InvalidResponse(_) => GENERIC_REQUEST_MESSAGE.to_string(),
            Self::InternalWithTrace { trace_id, .. } => {
                format!("Error interno (trace: {})", trace_id)
            }
            error => error.to_string(),
        }
    }

    /// Indica si la interfaz puede ofrecer reintentar la operación
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Unavailable { .. } => true,
            Self::Request { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Errores que viven sólo del lado del cliente
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationWithField { .. } | Self::Validation(_))
    }

    /// Campo afectado, si el error está asociado a uno
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::ValidationWithField { field, .. } => Some(field),
            _ => None,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

pub trait ResultExt<T> {
    fn map_err_validation(self, message: &str) -> AppResult<T>;
    fn map_err_internal(self, message: &str) -> AppResult<T>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: StdError + Send + 'static,
{
    fn map_err_validation(self, message: &str) -> AppResult<T> {
        self.map_err(|e| AppError::Validation(format!("{}: {}", message, e)))
    }

    fn map_err_internal(self, message: &str) -> AppResult<T> {
        self.map_err(|e| AppError::internal_trace(&format!("{}: {}", message, e), None))
    }
}
