//! # Modelos de la interfaz
//!
//! Entidades tal como las consume la interfaz. Los nombres de campo del
//! backend se traducen en [`crate::api::dto`]; aquí sólo viven los nombres
//! que usan las vistas.
//!
//! Los enums de estado se serializan con el valor que espera el backend
//! (`"pendiente"`, `"disponible"`, ...), así pueden viajar sin conversión.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::api::AppError;

/// Define un enum con su valor de wire, su etiqueta visible y `FromStr`
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $variant:ident => $wire:literal, $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $( #[serde(rename = $wire)] $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            /// Valor que envía y recibe el backend
            pub fn as_wire(&self) -> &'static str {
                match self { $( $name::$variant => $wire ),+ }
            }

            /// Etiqueta para mostrar
            pub fn label(&self) -> &'static str {
                match self { $( $name::$variant => $label ),+ }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = AppError;

            /// Acepta el valor de wire o la etiqueta, sin distinguir mayúsculas
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim().to_lowercase();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_wire() == needle || v.label().to_lowercase() == needle)
                    .ok_or_else(|| AppError::Validation(format!(
                        "Valor '{}' no reconocido para {}",
                        s,
                        stringify!($name)
                    )))
            }
        }
    };
}

wire_enum! {
    /// Rol del usuario autenticado
    pub enum Role {
        Client => "cliente", "Cliente",
        Waiter => "mesero", "Mesero",
        Cashier => "cajero", "Cajero",
        Admin => "admin", "Administrador",
    }
}

impl Role {
    pub fn display_name(&self) -> &'static str {
        self.label()
    }

    pub fn is_staff(&self) -> bool {
        !matches!(self, Role::Client)
    }
}

wire_enum! {
    /// Estado de una reserva
    pub enum ReservationStatus {
        Pending => "pendiente", "Pendiente",
        Active => "activa", "Activa",
        Completed => "completada", "Completada",
        Cancelled => "cancelada", "Cancelada",
    }
}

impl ReservationStatus {
    /// Transiciones permitidas desde la interfaz
    ///
    /// - pendiente → activa | cancelada
    /// - activa → completada | cancelada
    /// - completada y cancelada son finales
    pub fn can_transition_to(&self, next: ReservationStatus) -> bool {
        use ReservationStatus::*;
        matches!(
            (self, next),
            (Pending, Active) | (Pending, Cancelled) | (Active, Completed) | (Active, Cancelled)
        )
    }

    /// Cancelar y completar piden confirmación explícita antes de enviarse
    pub fn requires_confirmation(&self) -> bool {
        matches!(self, ReservationStatus::Cancelled | ReservationStatus::Completed)
    }

    pub fn is_final(&self) -> bool {
        matches!(self, ReservationStatus::Cancelled | ReservationStatus::Completed)
    }
}

wire_enum! {
    /// Estado operativo de una mesa
    pub enum TableStatus {
        Available => "disponible", "Disponible",
        Reserved => "reservada", "Reservada",
        Occupied => "ocupada", "Ocupada",
        Cleaning => "limpieza", "En limpieza",
    }
}

wire_enum! {
    /// Motivo general de un bloqueo de mesa
    pub enum BlockCategory {
        Maintenance => "mantenimiento", "Mantenimiento",
        PrivateEvent => "evento_privado", "Evento privado",
        Repair => "reparacion", "Reparación",
        DeepCleaning => "limpieza_profunda", "Limpieza profunda",
        Other => "otro", "Otro",
    }
}

/// Sesión del usuario autenticado
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub role_display_name: String,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: i64,
    pub client_name: String,
    pub table_label: String,
    pub table_id: Option<i64>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub party_size: u32,
    pub status: ReservationStatus,
    pub notes: Option<String>,
    pub client_phone: Option<String>,
    pub client_email: Option<String>,
    pub client_tax_id: Option<String>,
}

impl Reservation {
    /// Texto sobre el que trabaja la búsqueda libre de los paneles
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        [
            Some(self.client_name.as_str()),
            Some(self.table_label.as_str()),
            self.client_phone.as_deref(),
            self.client_email.as_deref(),
            self.client_tax_id.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }

    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub id: i64,
    pub number: u32,
    pub capacity: u32,
    pub status: TableStatus,
}

impl Table {
    pub fn label(&self) -> String {
        format!("Mesa {}", self.number)
    }
}

/// Ventana en la que una mesa no se puede reservar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: i64,
    pub table_id: i64,
    pub table_number: u32,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub time_start: Option<NaiveTime>,
    pub time_end: Option<NaiveTime>,
    pub reason: String,
    pub category: BlockCategory,
    pub notes: String,
    pub active: bool,
}

impl Block {
    /// Los bloqueos de día completo no tienen horas
    pub fn is_full_day(&self) -> bool {
        self.time_start.is_none() && self.time_end.is_none()
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.date_start <= date && date <= self.date_end
    }
}

/// Usuario visto desde la administración
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub registered_at: NaiveDateTime,
    pub last_login_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub tax_id: String,
}

impl Profile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// Horario ofrecido por el backend para una fecha y cantidad de personas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub time: NaiveTime,
    pub available: bool,
}

/// Datos de una reserva hecha por un usuario autenticado
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub party_size: u32,
    pub table_id: i64,
    pub notes: Option<String>,
}

/// Datos de una reserva pública (sin cuenta)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestReservation {
    pub client_name: String,
    pub tax_id: String,
    pub phone: String,
    pub email: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub party_size: u32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBlock {
    pub table_id: i64,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub time_start: Option<NaiveTime>,
    pub time_end: Option<NaiveTime>,
    pub reason: String,
    pub category: BlockCategory,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub tax_id: String,
}

/// Cambios del perfil; los campos `None` no se envían
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub tax_id: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone.is_none()
            && self.tax_id.is_none()
    }
}

/// Respuesta de la verificación de un token de invitado
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestInvitation {
    pub email: String,
    pub full_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_transitions() {
        use ReservationStatus::*;
        assert!(Pending.can_transition_to(Active));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Active.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Cancelled.can_transition_to(Active));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(Cancelled.requires_confirmation());
        assert!(Completed.requires_confirmation());
        assert!(!Active.requires_confirmation());
    }

    #[test]
    fn enums_parse_wire_values_and_labels() {
        assert_eq!("pendiente".parse::<ReservationStatus>().unwrap(), ReservationStatus::Pending);
        assert_eq!("En limpieza".parse::<TableStatus>().unwrap(), TableStatus::Cleaning);
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert!("desconocido".parse::<Role>().is_err());
    }

    #[test]
    fn enums_serialize_as_wire_values() {
        let json = serde_json::to_string(&BlockCategory::PrivateEvent).unwrap();
        assert_eq!(json, "\"evento_privado\"");
        let role: Role = serde_json::from_str("\"mesero\"").unwrap();
        assert_eq!(role, Role::Waiter);
        assert_eq!(role.display_name(), "Mesero");
    }

    #[test]
    fn reservation_search_covers_contact_fields() {
        let reservation = Reservation {
            id: 1,
            client_name: "Ana Rojas".to_string(),
            table_label: "Mesa 4".to_string(),
            table_id: Some(4),
            date: NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
            time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            party_size: 2,
            status: ReservationStatus::Pending,
            notes: None,
            client_phone: Some("+56 9 1234 5678".to_string()),
            client_email: Some("ana@correo.cl".to_string()),
            client_tax_id: None,
        };
        assert!(reservation.matches_search("rojas"));
        assert!(reservation.matches_search("mesa 4"));
        assert!(reservation.matches_search("1234"));
        assert!(reservation.matches_search("  "));
        assert!(!reservation.matches_search("pedro"));
    }
}
