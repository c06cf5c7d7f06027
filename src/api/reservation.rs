//! # API de Reservas
//!
//! Operaciones sobre reservas que consume la interfaz:
//! - Listar reservas con filtros de fecha, rango y estado
//! - Listar las reservas propias del cliente autenticado
//! - Crear reservas (con cuenta o públicas)
//! - Cambiar el estado de una reserva
//! - Consultar horarios disponibles
//!
//! Salvo la reserva pública, todas las operaciones requieren token Bearer.

use chrono::NaiveDate;
use reqwest::Method;

use super::dto::{
    format_date, format_time, CrearReservaRequest, EstadoRequest, HorariosResponse, ListResponse,
    ReservaDto, ReservaPublicaRequest,
};
use super::{ApiClient, AppError, AppResult};
use crate::models::{GuestReservation, NewReservation, Reservation, ReservationStatus, TimeSlot};

/// Tamaño de página al recorrer todas las páginas
const FETCH_ALL_PAGE_SIZE: u32 = 100;

/// Tope de páginas en modo "traer todo"
const FETCH_ALL_MAX_PAGES: u32 = 50;

/// Parámetros de consulta para listar reservas
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationQuery {
    /// Fecha exacta
    pub date: Option<NaiveDate>,
    /// Inicio del rango (inclusive)
    pub date_from: Option<NaiveDate>,
    /// Fin del rango (inclusive)
    pub date_to: Option<NaiveDate>,
    pub status: Option<ReservationStatus>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl ReservationQuery {
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            ..Self::default()
        }
    }

    pub fn for_range(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            date_from: Some(from),
            date_to: Some(to),
            ..Self::default()
        }
    }

    fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(date) = self.date {
            params.push(("fecha", format_date(date)));
        }
        if let Some(from) = self.date_from {
            params.push(("fecha_inicio", format_date(from)));
        }
        if let Some(to) = self.date_to {
            params.push(("fecha_fin", format_date(to)));
        }
        if let Some(status) = self.status {
            params.push(("estado", status.as_wire().to_string()));
        }
        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        if let Some(size) = self.page_size {
            params.push(("page_size", size.to_string()));
        }
        params
    }
}

fn into_reservations(items: Vec<ReservaDto>) -> AppResult<Vec<Reservation>> {
    items.into_iter().map(Reservation::try_from).collect()
}

impl ApiClient {
    /// Lista reservas con los filtros indicados
    ///
    /// Devuelve lo que el backend entregue en una respuesta; si la respuesta
    /// está paginada sólo trae esa página.
    pub async fn list_reservations(&self, query: &ReservationQuery) -> AppResult<Vec<Reservation>> {
        let response: ListResponse<ReservaDto> = self.get("reservas/", &query.to_params()).await?;
        into_reservations(response.into_items())
    }

    /// Recorre todas las páginas de una consulta
    ///
    /// Se usa para agregaciones como el calendario mensual.
    pub async fn list_reservations_all(
        &self,
        query: &ReservationQuery,
    ) -> AppResult<Vec<Reservation>> {
        let mut all = Vec::new();
        let mut page = 1;

        loop {
            let page_query = ReservationQuery {
                page: Some(page),
                page_size: Some(FETCH_ALL_PAGE_SIZE),
                ..query.clone()
            };
            let response: ListResponse<ReservaDto> =
                self.get("reservas/", &page_query.to_params()).await?;

            let has_next = response.has_next();
            let total = response.total();
            all.extend(into_reservations(response.into_items())?);

            if !has_next {
                break;
            }

            if page >= FETCH_ALL_MAX_PAGES {
                tracing::warn!(
                    pages = page,
                    fetched = all.len(),
                    total = ?total,
                    "Page cap reached while fetching reservations"
                );
                break;
            }
            page += 1;
        }

        tracing::debug!(count = all.len(), pages = page, "Fetched all reservation pages");
        Ok(all)
    }

    /// Reservas del cliente autenticado
    pub async fn my_reservations(&self) -> AppResult<Vec<Reservation>> {
        let response: ListResponse<ReservaDto> = self.get("reservas/mis-reservas/", &[]).await?;
        into_reservations(response.into_items())
    }

    /// Crea una reserva para el usuario autenticado
    ///
    /// # Errores
    /// - `Request` (409): La mesa fue tomada por otra reserva
    pub async fn create_reservation(&self, data: &NewReservation) -> AppResult<Reservation> {
        let body = CrearReservaRequest {
            fecha: format_date(data.date),
            hora: format_time(data.time),
            num_personas: data.party_size,
            mesa: data.table_id,
            notas: data.notes.as_deref(),
        };
        let dto: ReservaDto = self.send_json(Method::POST, "reservas/", &body).await?;
        let reservation = Reservation::try_from(dto)?;
        tracing::info!(reservation_id = reservation.id, "Reservation created");
        Ok(reservation)
    }

    /// Crea una reserva sin cuenta (no envía token)
    pub async fn create_guest_reservation(&self, data: &GuestReservation) -> AppResult<Reservation> {
        let body = ReservaPublicaRequest {
            nombre: &data.client_name,
            rut: &data.tax_id,
            telefono: &data.phone,
            email: &data.email,
            fecha: format_date(data.date),
            hora: format_time(data.time),
            num_personas: data.party_size,
            notas: data.notes.as_deref(),
        };
        let mut guest = self.clone();
        guest.set_token(None);
        let dto: ReservaDto = guest.send_json(Method::POST, "reservas/publica/", &body).await?;
        Reservation::try_from(dto)
    }

    /// Cambia el estado de una reserva y devuelve la reserva actualizada
    pub async fn update_reservation_status(
        &self,
        id: i64,
        status: ReservationStatus,
    ) -> AppResult<Reservation> {
        let dto: ReservaDto = self
            .send_json(
                Method::PATCH,
                &format!("reservas/{}/estado/", id),
                &EstadoRequest {
                    estado: status.as_wire(),
                },
            )
            .await?;
        let reservation = Reservation::try_from(dto)?;

        if reservation.status != status {
            return Err(AppError::InvalidResponse(format!(
                "Se pidió el estado '{}' pero el servidor devolvió '{}'",
                status.as_wire(),
                reservation.status.as_wire()
            )));
        }

        tracing::info!(reservation_id = id, status = %status.as_wire(), "Reservation status updated");
        Ok(reservation)
    }

    /// Horarios ofrecidos para una fecha y cantidad de personas
    pub async fn available_time_slots(
        &self,
        date: NaiveDate,
        party_size: u32,
    ) -> AppResult<Vec<TimeSlot>> {
        let response: HorariosResponse = self
            .get(
                "reservas/horarios-disponibles/",
                &[("fecha", format_date(date)), ("personas", party_size.to_string())],
            )
            .await?;
        response.horarios.into_iter().map(TimeSlot::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_params_use_backend_names() {
        let query = ReservationQuery {
            date: None,
            date_from: NaiveDate::from_ymd_opt(2026, 10, 1),
            date_to: NaiveDate::from_ymd_opt(2026, 10, 31),
            status: Some(ReservationStatus::Pending),
            page: Some(2),
            page_size: None,
        };
        let params = query.to_params();
        assert_eq!(
            params,
            vec![
                ("fecha_inicio", "2026-10-01".to_string()),
                ("fecha_fin", "2026-10-31".to_string()),
                ("estado", "pendiente".to_string()),
                ("page", "2".to_string()),
            ]
        );
    }

    #[test]
    fn empty_query_sends_nothing() {
        assert!(ReservationQuery::default().to_params().is_empty());
    }
}
