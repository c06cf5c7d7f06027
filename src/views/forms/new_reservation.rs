//! # Nueva reserva (cliente autenticado)
//!
//! Campos con opciones derivadas:
//!
//! - horarios: dependen de fecha y personas
//! - mesas: dependen de fecha, hora y personas
//!
//! Cada vez que cambia una dependencia se recargan las opciones. Si la
//! selección actual desaparece se limpia y queda un aviso; nunca se envía
//! una selección obsoleta.
//!
//! El envío sigue este orden:
//!
//! 1. Validación completa (mesa elegida, capacidad, fecha no pasada)
//! 2. Confirmación de disponibilidad de la mesa con el servidor
//! 3. Creación de la reserva
//! 4. Limpieza del formulario y aviso al contenedor

use chrono::{Local, NaiveDate, NaiveTime};

use super::public_reservation::SLOT_GONE_MESSAGE;
use super::{FormStatus, SuccessCallback};
use crate::api::{ApiClient, AppError, AppResult, ErrorLogExt, TableQuery};
use crate::models::{NewReservation, Reservation, Table, TimeSlot};
use crate::validation::{validate_party_size, validate_reservation_date, validate_table_selection};

const TABLE_GONE_MESSAGE: &str =
    "La mesa seleccionada ya no está disponible. Por favor, seleccione otra";

pub struct NewReservationForm {
    api: ApiClient,
    today: NaiveDate,
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
    party_size: u32,
    table_id: Option<i64>,
    pub notes: String,
    slots: Vec<TimeSlot>,
    tables: Vec<Table>,
    on_success: Option<SuccessCallback<Reservation>>,
    pub status: FormStatus,
}

impl NewReservationForm {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            today: Local::now().date_naive(),
            date: None,
            time: None,
            party_size: 2,
            table_id: None,
            notes: String::new(),
            slots: Vec::new(),
            tables: Vec::new(),
            on_success: None,
            status: FormStatus::default(),
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn on_success(&mut self, callback: SuccessCallback<Reservation>) {
        self.on_success = Some(callback);
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn time(&self) -> Option<NaiveTime> {
        self.time
    }

    pub fn party_size(&self) -> u32 {
        self.party_size
    }

    pub fn table_id(&self) -> Option<i64> {
        self.table_id
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    /// Mesas candidatas de la última consulta
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub async fn set_date(&mut self, date: NaiveDate) -> AppResult<()> {
        self.date = Some(date);
        self.refresh_options().await
    }

    pub async fn set_party_size(&mut self, party_size: u32) -> AppResult<()> {
        self.party_size = party_size;
        self.refresh_options().await
    }

    /// Elige un horario y recarga las mesas para ese horario
    ///
    /// Sin horarios cargados se acepta cualquier hora; el servidor decide al
    /// listar las mesas.
    pub async fn set_time(&mut self, time: NaiveTime) -> AppResult<()> {
        if !self.slots.is_empty() && !self.slots.iter().any(|s| s.time == time && s.available) {
            let error = AppError::validation_field("hora", "Seleccione uno de los horarios disponibles");
            return Err(self.status.fail(error));
        }
        self.time = Some(time);
        self.status.errors.remove("hora");
        self.refresh_tables().await
    }

    /// Elige una mesa; se valida contra las candidatas al enviar
    pub fn select_table(&mut self, table_id: i64) {
        self.table_id = Some(table_id);
        self.status.errors.remove("mesa");
    }

    /// Recarga horarios y luego mesas
    pub async fn refresh_options(&mut self) -> AppResult<()> {
        self.refresh_slots().await?;
        self.refresh_tables().await
    }

    pub async fn refresh_slots(&mut self) -> AppResult<()> {
        let Some(date) = self.date else {
            self.slots.clear();
            return Ok(());
        };
        if self.party_size == 0 {
            self.slots.clear();
            return Ok(());
        }

        let slots = self
            .api
            .available_time_slots(date, self.party_size)
            .await
            .log_error_context("loading time slots")?;
        self.replace_slots(slots);
        Ok(())
    }

    pub async fn refresh_tables(&mut self) -> AppResult<()> {
        let (Some(date), Some(time)) = (self.date, self.time) else {
            self.replace_tables(Vec::new());
            return Ok(());
        };
        if self.party_size == 0 {
            self.replace_tables(Vec::new());
            return Ok(());
        }

        let tables = self
            .api
            .list_tables(&TableQuery::availability(date, time, self.party_size))
            .await
            .log_error_context("loading available tables")?;
        self.replace_tables(tables);
        Ok(())
    }

    fn replace_slots(&mut self, slots: Vec<TimeSlot>) {
        self.slots = slots;
        if let Some(time) = self.time {
            if !self.slots.iter().any(|s| s.time == time && s.available) {
                self.time = None;
                self.status.warn(format!(
                    "El horario de las {} ya no está disponible",
                    time.format("%H:%M")
                ));
            }
        }
    }

    fn replace_tables(&mut self, tables: Vec<Table>) {
        self.tables = tables;
        if let Some(id) = self.table_id {
            if !self.tables.iter().any(|t| t.id == id) {
                self.table_id = None;
                self.status
                    .warn("La mesa seleccionada ya no está disponible para el horario elegido");
            }
        }
    }

    pub fn validate(&mut self) -> bool {
        let errors = &mut self.status.errors;
        let mut ok = true;

        match self.date {
            Some(date) => ok &= errors.check("fecha", validate_reservation_date(date, self.today)),
            None => {
                errors.set("fecha", "Debe seleccionar una fecha");
                ok = false;
            }
        }
        if self.time.is_none() {
            errors.set("hora", "Debe seleccionar un horario");
            ok = false;
        } else {
            errors.remove("hora");
        }
        if self.party_size == 0 {
            errors.set("personas", "Debe indicar al menos 1 persona");
            ok = false;
        } else {
            errors.remove("personas");
        }

        if errors.check("mesa", validate_table_selection(self.table_id, &self.tables)) {
            let table = self.tables.iter().find(|t| Some(t.id) == self.table_id);
            if let Some(table) = table {
                ok &= errors.check("personas", validate_party_size(self.party_size, table));
            }
        } else {
            ok = false;
        }

        ok
    }

    /// Valida, confirma disponibilidad y crea la reserva
    ///
    /// # Errores
    /// - `ValidationWithField`: Algún campo no es válido (la capacidad nombra la mesa)
    /// - `Unavailable`: La mesa u horario dejaron de estar disponibles, ya sea
    ///   en la confirmación previa o por un conflicto (409) al crear; las
    ///   opciones se reemplazan por las recién consultadas, la mesa elegida se
    ///   descarta y el resto de los campos se conserva
    /// - `Request` / `Network`: El servidor rechazó la reserva
    pub async fn submit(&mut self) -> AppResult<Reservation> {
        if !self.validate() {
            return Err(self.status.invalid());
        }
        let (Some(date), Some(time), Some(table_id)) = (self.date, self.time, self.table_id) else {
            return Err(self.status.invalid());
        };
        self.status.begin_submit()?;

        // Confirmación final: la mesa debe seguir en la lista del servidor
        let query = TableQuery::availability(date, time, self.party_size);
        let fresh = match self.api.list_tables(&query).await {
            Ok(tables) => tables,
            Err(error) => return Err(self.status.fail(error)),
        };

        let Some(table) = fresh.iter().find(|t| t.id == table_id).cloned() else {
            tracing::info!(table_id, "Selected table vanished before submit");
            self.tables = fresh;
            self.table_id = None;
            self.status.errors.set("mesa", TABLE_GONE_MESSAGE);
            return Err(self.status.fail(AppError::unavailable("Mesa", TABLE_GONE_MESSAGE)));
        };
        self.tables = fresh;

        let capacity = validate_party_size(self.party_size, &table);
        if !capacity.valid {
            return Err(self
                .status
                .fail(AppError::validation_field("personas", &capacity.message)));
        }

        let data = NewReservation {
            date,
            time,
            party_size: self.party_size,
            table_id,
            notes: Some(self.notes.trim().to_string()).filter(|n| !n.is_empty()),
        };

        match self.api.create_reservation(&data).await {
            Ok(reservation) => {
                self.reset();
                if let Some(callback) = self.on_success.as_mut() {
                    callback(&reservation);
                }
                Ok(reservation)
            }
            Err(AppError::Request { status: 409, message }) => {
                tracing::info!(table_id, server_message = %message, "Reservation conflict on create");
                // La mesa ya no sirve para ese horario; nunca se reenvía
                self.table_id = None;
                self.refresh_options()
                    .await
                    .best_effort("refreshing options after conflict");
                self.status.errors.set("hora", SLOT_GONE_MESSAGE);
                Err(self.status.fail(AppError::unavailable("Horario", SLOT_GONE_MESSAGE)))
            }
            Err(error) => Err(self.status.fail(error)),
        }
    }

    pub fn reset(&mut self) {
        self.date = None;
        self.time = None;
        self.party_size = 2;
        self.table_id = None;
        self.notes.clear();
        self.slots.clear();
        self.tables.clear();
        self.status.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TableStatus;
    use std::time::Duration;

    fn form() -> NewReservationForm {
        let api = ApiClient::new("http://127.0.0.1:9", Duration::from_millis(100)).unwrap();
        NewReservationForm::new(api).with_today(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap())
    }

    fn table(id: i64, number: u32, capacity: u32) -> Table {
        Table {
            id,
            number,
            capacity,
            status: TableStatus::Available,
        }
    }

    fn filled() -> NewReservationForm {
        let mut form = form();
        form.date = NaiveDate::from_ymd_opt(2026, 10, 24);
        form.time = NaiveTime::from_hms_opt(20, 0, 0);
        form.tables = vec![table(1, 4, 4), table(2, 7, 6)];
        form
    }

    #[tokio::test]
    async fn party_larger_than_table_is_blocked_with_capacity_message() {
        let mut form = filled();
        form.party_size = 5;
        form.select_table(1);

        let error = form.submit().await.unwrap_err();
        assert_eq!(error.field(), Some("personas"));
        assert_eq!(
            error.user_message(),
            "La mesa 4 tiene capacidad para 4 personas"
        );
        assert_eq!(form.table_id(), Some(1));
        assert_eq!(form.party_size(), 5);
    }

    #[tokio::test]
    async fn missing_table_blocks_submit() {
        let mut form = filled();
        let error = form.submit().await.unwrap_err();
        assert_eq!(error.field(), Some("mesa"));
        assert_eq!(form.status.errors.get("mesa"), Some("Debe seleccionar una mesa"));
    }

    #[test]
    fn past_dates_fail_validation() {
        let mut form = filled();
        form.date = NaiveDate::from_ymd_opt(2026, 10, 1);
        form.select_table(2);
        assert!(!form.validate());
        assert!(form.status.errors.get("fecha").is_some());
    }

    #[test]
    fn validation_clears_errors_once_fields_are_valid() {
        let mut form = filled();
        form.status.errors.set("hora", SLOT_GONE_MESSAGE);
        form.party_size = 0;
        form.select_table(2);
        assert!(!form.validate());
        assert!(form.status.errors.get("hora").is_none());
        assert!(form.status.errors.get("personas").is_some());

        form.party_size = 4;
        assert!(form.validate());
        assert!(form.status.errors.is_empty());
    }

    #[test]
    fn refreshed_tables_drop_stale_selection() {
        let mut form = filled();
        form.select_table(1);

        form.replace_tables(vec![table(2, 7, 6)]);
        assert_eq!(form.table_id(), None);
        assert_eq!(form.status.warnings().len(), 1);

        form.select_table(2);
        form.replace_tables(vec![table(2, 7, 6)]);
        assert_eq!(form.table_id(), Some(2));
        assert_eq!(form.status.warnings().len(), 1);
    }
}
