//! # Panel de reservas (personal)
//!
//! Listado de reservas para meseros, cajeros y administración:
//!
//! - Filtro por fecha (se consulta al servidor)
//! - Filtro por estado y búsqueda libre (en memoria)
//! - Orden por fecha, hora, cliente, personas o estado
//! - Cambios de estado; cancelar y completar piden confirmación
//!
//! Los filtros se guardan con [`FilterPrefs`] bajo [`FILTERS_KEY`].

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::confirm::{ActionOutcome, Confirmer};
use super::filters::FilterPrefs;
use super::list::{self, ListState, Page, PendingFetch, Refreshable, Ticket};
use crate::api::{ApiClient, AppError, AppResult, ErrorLogExt, ReservationQuery};
use crate::models::{Reservation, ReservationStatus};
use crate::storage::KeyValueStore;

pub const FILTERS_KEY: &str = "panel_reservas";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationFilters {
    pub date: Option<NaiveDate>,
    pub status: Option<ReservationStatus>,
    #[serde(default)]
    pub search: String,
}

impl ReservationFilters {
    fn matches(&self, reservation: &Reservation) -> bool {
        self.status.map_or(true, |status| reservation.status == status)
            && reservation.matches_search(&self.search)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationSort {
    Date,
    Time,
    Client,
    PartySize,
    Status,
}

pub(crate) fn compare_reservations(a: &Reservation, b: &Reservation, key: ReservationSort) -> Ordering {
    match key {
        ReservationSort::Date => a.starts_at().cmp(&b.starts_at()),
        ReservationSort::Time => a.time.cmp(&b.time),
        ReservationSort::Client => a
            .client_name
            .to_lowercase()
            .cmp(&b.client_name.to_lowercase()),
        ReservationSort::PartySize => a.party_size.cmp(&b.party_size),
        ReservationSort::Status => a.status.cmp(&b.status),
    }
}

pub struct ReservationsPanel {
    api: ApiClient,
    filters: ReservationFilters,
    list: ListState<Reservation, ReservationSort>,
}

impl ReservationsPanel {
    pub fn new(api: ApiClient, page_size: usize) -> Self {
        Self::with_filters(api, page_size, ReservationFilters::default())
    }

    pub fn with_filters(api: ApiClient, page_size: usize, filters: ReservationFilters) -> Self {
        let mut list = ListState::new(page_size);
        list.set_sort(ReservationSort::Date);
        Self { api, filters, list }
    }

    /// Crea el panel con los filtros guardados
    pub fn restore<S: KeyValueStore>(api: ApiClient, page_size: usize, prefs: &FilterPrefs<S>) -> Self {
        Self::with_filters(api, page_size, prefs.load(FILTERS_KEY))
    }

    pub fn save_filters<S: KeyValueStore>(&self, prefs: &mut FilterPrefs<S>) -> AppResult<()> {
        prefs.save(FILTERS_KEY, &self.filters)
    }

    pub fn filters(&self) -> &ReservationFilters {
        &self.filters
    }

    pub fn list(&self) -> &ListState<Reservation, ReservationSort> {
        &self.list
    }

    pub async fn refresh(&mut self) -> AppResult<bool> {
        list::refresh(self).await
    }

    /// Cambia la fecha consultada y recarga
    pub async fn set_date(&mut self, date: Option<NaiveDate>) -> AppResult<bool> {
        self.filters.date = date;
        self.list.paginator_mut().reset();
        self.refresh().await
    }

    pub fn set_status_filter(&mut self, status: Option<ReservationStatus>) {
        self.filters.status = status;
        self.list.paginator_mut().reset();
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.filters.search = search.into();
        self.list.paginator_mut().reset();
    }

    pub fn sort_by(&mut self, key: ReservationSort) {
        self.list.set_sort(key);
    }

    pub fn set_page(&mut self, page: usize) {
        let total = self.visible().len();
        self.list.paginator_mut().set_page(page, total);
    }

    /// Todas las reservas que pasan los filtros, ordenadas
    pub fn visible(&self) -> Vec<&Reservation> {
        self.list
            .filtered(|r| self.filters.matches(r), compare_reservations)
    }

    pub fn page(&self) -> Page<'_, Reservation> {
        self.list.page(|r| self.filters.matches(r), compare_reservations)
    }

    /// Cambia el estado de una reserva
    ///
    /// Cancelar y completar se envían sólo si `confirmer` acepta. Tras la
    /// confirmación del servidor la reserva se actualiza localmente y el
    /// listado se recarga; si la recarga falla, el cambio ya hecho se mantiene.
    ///
    /// # Errores
    /// - `Validation`: La reserva no está en el listado o la transición no se permite
    /// - `Request` / `Network`: El servidor rechazó el cambio
    pub async fn change_status(
        &mut self,
        id: i64,
        status: ReservationStatus,
        confirmer: &mut dyn Confirmer,
    ) -> AppResult<ActionOutcome<Reservation>> {
        self.list.ensure_open()?;

        let current = self
            .list
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::Validation(format!("La reserva {} no está en el listado", id)))?;

        if !current.status.can_transition_to(status) {
            return Err(AppError::Validation(format!(
                "No se puede pasar una reserva de {} a {}",
                current.status, status
            )));
        }

        if status.requires_confirmation() {
            let prompt = format!(
                "¿Marcar como {} la reserva de {} ({} {})?",
                status.label().to_lowercase(),
                current.client_name,
                current.date.format("%d-%m-%Y"),
                current.time.format("%H:%M")
            );
            if !confirmer.confirm(&prompt) {
                tracing::debug!(reservation_id = id, status = %status.as_wire(), "Status change declined");
                return Ok(ActionOutcome::Declined);
            }
        }

        let updated = self
            .api
            .update_reservation_status(id, status)
            .await
            .log_error_context("changing reservation status")?;

        self.list.patch(updated.clone(), |a, b| a.id == b.id);
        self.refresh().await.best_effort("reloading reservations");

        Ok(ActionOutcome::Applied(updated))
    }

    pub fn teardown(&mut self) {
        self.list.teardown();
    }
}

impl Refreshable for ReservationsPanel {
    type Item = Reservation;

    fn begin_refresh(&mut self) -> PendingFetch<Reservation> {
        let ticket = self.list.begin_fetch();
        let api = self.api.clone();
        let query = ReservationQuery {
            date: self.filters.date,
            ..ReservationQuery::default()
        };
        PendingFetch::new(ticket, async move { api.list_reservations(&query).await })
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
    use crate::storage::MemoryStore;
    use crate::views::confirm::RecordingConfirmer;
    use chrono::NaiveTime;
    use std::time::Duration;

    fn reservation(id: i64, name: &str, hour: u32, party: u32, status: ReservationStatus) -> Reservation {
        Reservation {
            id,
            client_name: name.to_string(),
            table_label: format!("Mesa {}", id),
            table_id: Some(id),
            date: NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
            time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            party_size: party,
            status,
            notes: None,
            client_phone: None,
            client_email: None,
            client_tax_id: None,
        }
    }

    fn panel_with(items: Vec<Reservation>) -> ReservationsPanel {
        let api = ApiClient::new("http://127.0.0.1:9", Duration::from_millis(100)).unwrap();
        let mut panel = ReservationsPanel::new(api, 2);
        let ticket = panel.list.begin_fetch();
        panel.apply_fetch(ticket, Ok(items)).unwrap();
        panel
    }

    #[test]
    fn filters_and_sorting_are_client_side() {
        let mut panel = panel_with(vec![
            reservation(1, "Carla", 21, 4, ReservationStatus::Pending),
            reservation(2, "ana", 19, 2, ReservationStatus::Active),
            reservation(3, "Bruno", 20, 6, ReservationStatus::Pending),
        ]);

        let ids: Vec<i64> = panel.visible().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);

        panel.sort_by(ReservationSort::Client);
        let ids: Vec<i64> = panel.visible().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);

        panel.sort_by(ReservationSort::PartySize);
        panel.sort_by(ReservationSort::PartySize);
        let ids: Vec<i64> = panel.visible().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);

        panel.set_status_filter(Some(ReservationStatus::Pending));
        assert_eq!(panel.visible().len(), 2);

        panel.set_search("bru");
        let page = panel.page();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].client_name, "Bruno");
    }

    #[test]
    fn pages_slice_the_filtered_list() {
        let mut panel = panel_with(
            (1..=5)
                .map(|i| reservation(i, "X", 12 + i as u32, 2, ReservationStatus::Pending))
                .collect(),
        );
        assert_eq!(panel.page().page_count, 3);
        panel.set_page(3);
        let page = panel.page();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, 5);
    }

    #[tokio::test]
    async fn declined_cancellation_sends_nothing() {
        let mut panel = panel_with(vec![reservation(1, "Ana", 20, 2, ReservationStatus::Pending)]);
        let mut confirmer = RecordingConfirmer::answering(false);

        // El servidor no existe: si se enviara algo fallaría con error de red
        let outcome = panel
            .change_status(1, ReservationStatus::Cancelled, &mut confirmer)
            .await
            .unwrap();

        assert_eq!(outcome, ActionOutcome::Declined);
        assert_eq!(confirmer.prompts.len(), 1);
        assert_eq!(panel.list().items()[0].status, ReservationStatus::Pending);
    }

    #[tokio::test]
    async fn invalid_transitions_are_rejected_locally() {
        let mut panel = panel_with(vec![reservation(1, "Ana", 20, 2, ReservationStatus::Completed)]);
        let mut confirmer = RecordingConfirmer::answering(true);

        let error = panel
            .change_status(1, ReservationStatus::Active, &mut confirmer)
            .await
            .unwrap_err();
        assert!(error.is_validation());
        assert!(confirmer.prompts.is_empty());
    }

    #[test]
    fn filters_round_trip_through_prefs() {
        let mut panel = panel_with(Vec::new());
        panel.set_search("rojas");
        panel.set_status_filter(Some(ReservationStatus::Active));

        let mut prefs = FilterPrefs::new(MemoryStore::new());
        panel.save_filters(&mut prefs).unwrap();

        let api = ApiClient::new("http://127.0.0.1:9", Duration::from_millis(100)).unwrap();
        let restored = ReservationsPanel::restore(api, 10, &prefs);
        assert_eq!(restored.filters(), panel.filters());
    }

    #[test]
    fn late_responses_do_not_overwrite_newer_ones() {
        let mut panel = panel_with(Vec::new());
        let old = panel.begin_refresh().ticket();
        let new = panel.begin_refresh().ticket();

        panel
            .apply_fetch(new, Ok(vec![reservation(2, "Nueva", 20, 2, ReservationStatus::Pending)]))
            .unwrap();
        let applied = panel
            .apply_fetch(old, Ok(vec![reservation(1, "Vieja", 20, 2, ReservationStatus::Pending)]))
            .unwrap();

        assert!(!applied);
        assert_eq!(panel.list().items()[0].client_name, "Nueva");
    }
}
