//! # Vistas
//!
//! Estado de cada pantalla. Las vistas reciben un [`crate::ApiClient`] con el
//! token de la sesión y son dueñas de los datos que traen; ninguna comparte
//! datos con otra.
//!
//! - [`router`] - Pantalla según sesión y rol
//! - [`forms`] - Formularios
//! - [`reservations_panel`], [`my_reservations`], [`tables`], [`users`],
//!   [`blocks`] - Listados de gestión
//! - [`calendar`] - Calendario mensual
//! - [`list`], [`refresh`], [`confirm`], [`filters`] - Piezas comunes

pub mod blocks;
pub mod calendar;
pub mod confirm;
pub mod filters;
pub mod forms;
pub mod list;
pub mod my_reservations;
pub mod refresh;
pub mod reservations_panel;
pub mod router;
pub mod tables;
pub mod users;

pub use blocks::BlockList;
pub use calendar::CalendarView;
pub use confirm::{ActionOutcome, Confirmer};
pub use filters::FilterPrefs;
pub use list::{ListState, Paginator, Refreshable};
pub use my_reservations::MyReservations;
pub use refresh::AutoRefresh;
pub use reservations_panel::ReservationsPanel;
pub use router::{Router, Screen, Tab};
pub use tables::TableManagement;
pub use users::UserManagement;
