//! # Calendario mensual
//!
//! Grilla del mes que comienza en lunes, completada con días de los meses
//! vecinos hasta cerrar semanas de 7. Cada día del mes se anota con la
//! cantidad de reservas y un nivel de ocupación, que es sólo una pista
//! visual: no limita nada.
//!
//! Las reservas canceladas no cuentan para la ocupación.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, Months, NaiveDate};

use super::list::{self, PendingFetch, Refreshable, RequestGuard, Ticket};
use crate::api::{ApiClient, AppError, AppResult, ReservationQuery};
use crate::models::{Reservation, ReservationStatus};

const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

pub const WEEKDAY_HEADERS: [&str; 7] = ["Lu", "Ma", "Mi", "Ju", "Vi", "Sá", "Do"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OccupancyTier {
    None,
    Low,
    Medium,
    High,
}

impl OccupancyTier {
    /// 0 → ninguna, 1–5 → baja, 6–15 → media, 16 o más → alta
    pub fn from_count(count: usize) -> Self {
        match count {
            0 => OccupancyTier::None,
            1..=5 => OccupancyTier::Low,
            6..=15 => OccupancyTier::Medium,
            _ => OccupancyTier::High,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarCell {
    pub date: NaiveDate,
    /// `false` para los días de relleno de los meses vecinos
    pub in_month: bool,
    pub count: usize,
    pub tier: OccupancyTier,
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn last_of_month(date: NaiveDate) -> NaiveDate {
    let first = first_of_month(date);
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(first)
}

/// Grilla del mes de `reference`, sin anotar
pub fn month_grid(reference: NaiveDate) -> Vec<CalendarCell> {
    let first = first_of_month(reference);
    let last = last_of_month(reference);
    let leading = i64::from(first.weekday().number_from_monday()) - 1;
    let days = i64::from(last.day());
    let trailing = (7 - (leading + days) % 7) % 7;

    let start = first - Duration::days(leading);
    (0..leading + days + trailing)
        .map(|offset| {
            let date = start + Duration::days(offset);
            CalendarCell {
                date,
                in_month: date.month() == first.month() && date.year() == first.year(),
                count: 0,
                tier: OccupancyTier::None,
            }
        })
        .collect()
}

pub struct CalendarView {
    api: ApiClient,
    month: NaiveDate,
    cells: Vec<CalendarCell>,
    by_day: BTreeMap<NaiveDate, Vec<Reservation>>,
    guard: RequestGuard,
    loading: bool,
    error: Option<String>,
}

impl CalendarView {
    pub fn new(api: ApiClient, reference: NaiveDate) -> Self {
        let month = first_of_month(reference);
        Self {
            api,
            month,
            cells: month_grid(month),
            by_day: BTreeMap::new(),
            guard: RequestGuard::new(),
            loading: false,
            error: None,
        }
    }

    /// Primer día del mes visible
    pub fn month(&self) -> NaiveDate {
        self.month
    }

    pub fn title(&self) -> String {
        format!("{} {}", MONTH_NAMES[self.month.month0() as usize], self.month.year())
    }

    pub fn cells(&self) -> &[CalendarCell] {
        &self.cells
    }

    pub fn weeks(&self) -> impl Iterator<Item = &[CalendarCell]> {
        self.cells.chunks(7)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub async fn load(&mut self) -> AppResult<bool> {
        list::refresh(self).await
    }

    pub async fn next_month(&mut self) -> AppResult<bool> {
        self.go_to(self.month + Months::new(1)).await
    }

    pub async fn prev_month(&mut self) -> AppResult<bool> {
        self.go_to(self.month - Months::new(1)).await
    }

    /// Muestra el mes de `reference` y lo carga
    pub async fn go_to(&mut self, reference: NaiveDate) -> AppResult<bool> {
        self.set_month(reference);
        self.load().await
    }

    /// Cambia el mes visible sin cargar; las cargas en curso quedan obsoletas
    pub fn set_month(&mut self, reference: NaiveDate) {
        self.month = first_of_month(reference);
        self.cells = month_grid(self.month);
        self.by_day.clear();
        self.guard.invalidate();
    }

    /// Reservas de un día, ordenadas por hora
    ///
    /// # Errores
    /// - `Validation`: El día no pertenece al mes visible
    pub fn day_detail(&self, date: NaiveDate) -> AppResult<&[Reservation]> {
        if first_of_month(date) != self.month {
            return Err(AppError::validation_field(
                "fecha",
                &format!("El día {} no pertenece a {}", date.format("%d-%m-%Y"), self.title()),
            ));
        }
        Ok(self.by_day.get(&date).map(Vec::as_slice).unwrap_or(&[]))
    }

    pub fn teardown(&mut self) {
        self.guard.teardown();
        self.loading = false;
    }

    fn annotate(&mut self, reservations: Vec<Reservation>) {
        let last = last_of_month(self.month);
        let mut by_day: BTreeMap<NaiveDate, Vec<Reservation>> = BTreeMap::new();

        for reservation in reservations {
            if reservation.status == ReservationStatus::Cancelled {
                continue;
            }
            if reservation.date < self.month || reservation.date > last {
                continue;
            }
            by_day.entry(reservation.date).or_default().push(reservation);
        }
        for day in by_day.values_mut() {
            day.sort_by_key(|r| r.time);
        }

        for cell in self.cells.iter_mut() {
            cell.count = if cell.in_month {
                by_day.get(&cell.date).map_or(0, Vec::len)
            } else {
                0
            };
            cell.tier = OccupancyTier::from_count(cell.count);
        }
        self.by_day = by_day;
    }
}

impl Refreshable for CalendarView {
    type Item = Reservation;

    fn begin_refresh(&mut self) -> PendingFetch<Reservation> {
        self.loading = true;
        let ticket = self.guard.begin();
        let api = self.api.clone();
        let query = ReservationQuery::for_range(self.month, last_of_month(self.month));
        PendingFetch::new(ticket, async move { api.list_reservations_all(&query).await })
    }

    fn apply_fetch(&mut self, ticket: Ticket, result: AppResult<Vec<Reservation>>) -> AppResult<bool> {
        if !self.guard.is_current(ticket) {
            tracing::debug!(month = %self.month, "Discarding stale calendar response");
            return Ok(false);
        }

        self.loading = false;
        match result {
            Ok(reservations) => {
                tracing::debug!(month = %self.month, count = reservations.len(), "Calendar loaded");
                self.error = None;
                self.annotate(reservations);
                Ok(true)
            }
            Err(error) => {
                self.error = Some(error.user_message());
                Err(error)
            }
        }
    }

    fn teardown(&mut self) {
        CalendarView::teardown(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn grid_properties_hold_for_every_month() {
        for year in 2020..=2030 {
            for month in 1..=12 {
                let reference = date(year, month, 15);
                let grid = month_grid(reference);
                let first = first_of_month(reference);

                assert_eq!(grid.len() % 7, 0, "{}-{}", year, month);
                assert_eq!(
                    grid.iter().filter(|c| c.in_month).count() as u32,
                    last_of_month(reference).day()
                );

                let leading = grid.iter().take_while(|c| !c.in_month).count() as u32;
                assert_eq!(leading, first.weekday().number_from_monday() - 1);
                assert_eq!(grid[leading as usize].date, first);

                assert_eq!(grid[0].date.weekday(), chrono::Weekday::Mon);
                assert!(grid.len() / 7 >= 4 && grid.len() / 7 <= 6);
            }
        }
    }

    #[test]
    fn october_2026_starts_on_thursday() {
        let grid = month_grid(date(2026, 10, 19));
        assert_eq!(grid[0].date, date(2026, 9, 28));
        assert!(!grid[2].in_month);
        assert_eq!(grid[3].date, date(2026, 10, 1));
        assert_eq!(grid.len(), 35);
        assert_eq!(grid[34].date, date(2026, 11, 1));
    }

    #[test]
    fn occupancy_tiers() {
        assert_eq!(OccupancyTier::from_count(0), OccupancyTier::None);
        assert_eq!(OccupancyTier::from_count(1), OccupancyTier::Low);
        assert_eq!(OccupancyTier::from_count(5), OccupancyTier::Low);
        assert_eq!(OccupancyTier::from_count(6), OccupancyTier::Medium);
        assert_eq!(OccupancyTier::from_count(15), OccupancyTier::Medium);
        assert_eq!(OccupancyTier::from_count(16), OccupancyTier::High);
    }

    fn reservation(id: i64, day: NaiveDate, hour: u32, status: ReservationStatus) -> Reservation {
        Reservation {
            id,
            client_name: format!("Cliente {}", id),
            table_label: "Mesa 1".to_string(),
            table_id: Some(1),
            date: day,
            time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            party_size: 2,
            status,
            notes: None,
            client_phone: None,
            client_email: None,
            client_tax_id: None,
        }
    }

    fn view() -> CalendarView {
        let api = ApiClient::new("http://127.0.0.1:9", std::time::Duration::from_millis(100)).unwrap();
        CalendarView::new(api, date(2026, 10, 19))
    }

    #[test]
    fn annotates_counts_without_cancelled() {
        let mut view = view();
        let ticket = view.begin_refresh().ticket();
        let day = date(2026, 10, 20);
        let mut reservations: Vec<Reservation> = (0..7)
            .map(|i| reservation(i, day, 12 + i as u32, ReservationStatus::Pending))
            .collect();
        reservations.push(reservation(50, day, 22, ReservationStatus::Cancelled));
        reservations.push(reservation(51, date(2026, 10, 2), 21, ReservationStatus::Active));
        reservations.push(reservation(52, date(2026, 10, 2), 13, ReservationStatus::Completed));

        assert!(view.apply_fetch(ticket, Ok(reservations)).unwrap());

        let cell = view.cells().iter().find(|c| c.date == day).unwrap();
        assert_eq!(cell.count, 7);
        assert_eq!(cell.tier, OccupancyTier::Medium);

        let detail = view.day_detail(date(2026, 10, 2)).unwrap();
        assert_eq!(detail.iter().map(|r| r.id).collect::<Vec<_>>(), vec![52, 51]);
        assert!(view.day_detail(date(2026, 10, 3)).unwrap().is_empty());
        assert!(view.day_detail(date(2026, 11, 3)).is_err());
    }

    #[test]
    fn month_change_discards_in_flight_load() {
        let mut view = view();
        let ticket = view.begin_refresh().ticket();
        view.set_month(date(2026, 11, 1));

        let applied = view
            .apply_fetch(ticket, Ok(vec![reservation(1, date(2026, 10, 20), 20, ReservationStatus::Pending)]))
            .unwrap();
        assert!(!applied);
        assert_eq!(view.title(), "Noviembre 2026");
        assert!(view.cells().iter().all(|c| c.count == 0));
    }
}
