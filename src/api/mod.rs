//! # Módulo API
//!
//! Cliente de la API REST del sistema de reservas.
//!
//! ## Módulos principales
//!
//! - [`client`] - Cliente HTTP con autenticación Bearer
//! - [`auth`] - Login, logout, registro y activación de cuentas
//! - [`reservation`] - Reservas (listar, crear, cambiar estado, horarios)
//! - [`table`] - Mesas (listar, disponibilidad, cambiar estado)
//! - [`block`] - Bloqueos de mesas
//! - [`user`] - Usuarios y perfil
//! - [`errors`] - Manejo de errores de la aplicación
//!
//! Los nombres de campo del backend se traducen a los modelos de la interfaz
//! en `dto`; el resto de la aplicación nunca ve el formato de wire.

pub mod auth;
pub mod block;
pub mod client;
mod dto;
pub mod errors;
pub mod logging;
pub mod reservation;
pub mod table;
pub mod user;

// Re-exportar tipos comunes para facilitar su uso
pub use block::BlockQuery;
pub use client::ApiClient;
pub use errors::{AppError, AppResult, ResultExt};
pub use logging::ErrorLogExt;
pub use reservation::ReservationQuery;
pub use table::TableQuery;
