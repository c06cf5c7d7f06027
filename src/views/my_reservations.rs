//! # Mis reservas (cliente)
//!
//! Reservas del cliente autenticado separadas en próximas y pasadas. Sólo
//! las reservas pendientes se pueden cancelar, siempre con confirmación.

use chrono::NaiveDateTime;

use super::confirm::{ActionOutcome, Confirmer};
use super::list::{self, ListState, PendingFetch, Refreshable, Ticket};
use crate::api::{ApiClient, AppError, AppResult, ErrorLogExt};
use crate::models::{Reservation, ReservationStatus};

pub struct MyReservations {
    api: ApiClient,
    list: ListState<Reservation, ()>,
}

impl MyReservations {
    pub fn new(api: ApiClient, page_size: usize) -> Self {
        Self {
            api,
            list: ListState::new(page_size),
        }
    }

    pub fn list(&self) -> &ListState<Reservation, ()> {
        &self.list
    }

    pub async fn refresh(&mut self) -> AppResult<bool> {
        list::refresh(self).await
    }

    /// Reservas vigentes desde `now`, la más cercana primero
    pub fn upcoming(&self, now: NaiveDateTime) -> Vec<&Reservation> {
        let mut upcoming: Vec<&Reservation> = self
            .list
            .items()
            .iter()
            .filter(|r| !r.status.is_final() && r.starts_at() >= now)
            .collect();
        upcoming.sort_by_key(|r| r.starts_at());
        upcoming
    }

    /// Historial: reservas ya ocurridas o cerradas, la más reciente primero
    pub fn past(&self, now: NaiveDateTime) -> Vec<&Reservation> {
        let mut past: Vec<&Reservation> = self
            .list
            .items()
            .iter()
            .filter(|r| r.status.is_final() || r.starts_at() < now)
            .collect();
        past.sort_by_key(|r| std::cmp::Reverse(r.starts_at()));
        past
    }

    /// Cancela una reserva pendiente
    ///
    /// # Errores
    /// - `Validation`: La reserva no existe en el listado o ya no está pendiente
    pub async fn cancel(
        &mut self,
        id: i64,
        confirmer: &mut dyn Confirmer,
    ) -> AppResult<ActionOutcome<Reservation>> {
        self.list.ensure_open()?;

        let reservation = self
            .list
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::Validation(format!("La reserva {} no está en el listado", id)))?;

        if reservation.status != ReservationStatus::Pending {
            return Err(AppError::validation_field(
                "estado",
                "Sólo se pueden cancelar reservas pendientes",
            ));
        }

        let prompt = format!(
            "¿Cancelar su reserva del {} a las {}?",
            reservation.date.format("%d-%m-%Y"),
            reservation.time.format("%H:%M")
        );
        if !confirmer.confirm(&prompt) {
            return Ok(ActionOutcome::Declined);
        }

        let updated = self
            .api
            .update_reservation_status(id, ReservationStatus::Cancelled)
            .await
            .log_error_context("cancelling own reservation")?;

        self.list.patch(updated.clone(), |a, b| a.id == b.id);
        self.refresh().await.best_effort("reloading own reservations");

        Ok(ActionOutcome::Applied(updated))
    }

    pub fn teardown(&mut self) {
        self.list.teardown();
    }
}

impl Refreshable for MyReservations {
    type Item = Reservation;

    fn begin_refresh(&mut self) -> PendingFetch<Reservation> {
        let ticket = self.list.begin_fetch();
        let api = self.api.clone();
        PendingFetch::new(ticket, async move { api.my_reservations().await })
    }

    fn apply_fetch(&mut self, ticket: Ticket, result: AppResult<Vec<Reservation>>) -> AppResult<bool> {
        self.list.finish_fetch(ticket, result)
    }

    fn teardown(&mut self) {
        self.list.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::confirm::{AlwaysConfirm, AlwaysDecline};
    use chrono::{NaiveDate, NaiveTime};
    use std::time::Duration;

    fn reservation(id: i64, day: u32, status: ReservationStatus) -> Reservation {
        Reservation {
            id,
            client_name: "Ana".to_string(),
            table_label: "Mesa 1".to_string(),
            table_id: Some(1),
            date: NaiveDate::from_ymd_opt(2026, 10, day).unwrap(),
            time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            party_size: 2,
            status,
            notes: None,
            client_phone: None,
            client_email: None,
            client_tax_id: None,
        }
    }

    fn view_with(items: Vec<Reservation>) -> MyReservations {
        let api = ApiClient::new("http://127.0.0.1:9", Duration::from_millis(100)).unwrap();
        let mut view = MyReservations::new(api, 10);
        let ticket = view.list.begin_fetch();
        view.apply_fetch(ticket, Ok(items)).unwrap();
        view
    }

    #[test]
    fn splits_upcoming_and_past() {
        let view = view_with(vec![
            reservation(1, 25, ReservationStatus::Pending),
            reservation(2, 10, ReservationStatus::Completed),
            reservation(3, 22, ReservationStatus::Active),
            reservation(4, 28, ReservationStatus::Cancelled),
            reservation(5, 15, ReservationStatus::Pending),
        ]);
        let now = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();

        let upcoming: Vec<i64> = view.upcoming(now).iter().map(|r| r.id).collect();
        assert_eq!(upcoming, vec![3, 1]);

        let past: Vec<i64> = view.past(now).iter().map(|r| r.id).collect();
        assert_eq!(past, vec![4, 5, 2]);
    }

    #[tokio::test]
    async fn only_pending_reservations_can_be_cancelled() {
        let mut view = view_with(vec![reservation(1, 25, ReservationStatus::Active)]);
        let error = view.cancel(1, &mut AlwaysConfirm).await.unwrap_err();
        assert_eq!(error.field(), Some("estado"));
    }

    #[tokio::test]
    async fn declining_keeps_the_reservation() {
        let mut view = view_with(vec![reservation(1, 25, ReservationStatus::Pending)]);
        let outcome = view.cancel(1, &mut AlwaysDecline).await.unwrap();
        assert_eq!(outcome, ActionOutcome::Declined);
        assert_eq!(view.list().items()[0].status, ReservationStatus::Pending);
    }

    #[tokio::test]
    async fn actions_after_teardown_are_refused() {
        let mut view = view_with(vec![reservation(1, 25, ReservationStatus::Pending)]);
        view.teardown();
        assert!(view.cancel(1, &mut AlwaysConfirm).await.is_err());
    }
}
