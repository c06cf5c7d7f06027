//! # Cliente de reservas de mesas
//!
//! Capa de presentación del sistema de reservas de un restaurante. Toda la
//! lógica de negocio (disponibilidad, conflictos, autorización) vive en el
//! backend REST; aquí se orquestan formularios, listados y el calendario
//! sobre esa API.
//!
//! ## Módulos
//!
//! - [`api`] - Cliente HTTP, DTOs del backend y errores
//! - [`session`] - Contexto de sesión inyectado en las vistas
//! - [`storage`] - Almacenes clave/valor para sesión y filtros
//! - [`validation`] - Validadores de RUT, teléfono, email y contraseña
//! - [`views`] - Estado de cada pantalla (formularios, listados, calendario)
//! - [`config`] - Configuración desde el entorno

pub mod api;
pub mod config;
pub mod models;
pub mod session;
pub mod storage;
pub mod validation;
pub mod views;

pub use api::{ApiClient, AppError, AppResult};
pub use config::Config;
pub use session::SessionContext;
