//! # Reserva pública
//!
//! Formulario para reservar sin cuenta. Los horarios ofrecidos dependen de
//! la fecha y de la cantidad de personas, y se vuelven a pedir cada vez que
//! cambia alguna de las dos. Antes de crear la reserva se confirma con el
//! servidor que el horario elegido sigue libre.

use chrono::{Local, NaiveDate, NaiveTime};

use super::{FormStatus, SuccessCallback};
use crate::api::{ApiClient, AppError, AppResult, ErrorLogExt};
use crate::models::{GuestReservation, Reservation, TimeSlot};
use crate::validation::{
    format_phone, format_rut, validate_email, validate_full_name, validate_phone,
    validate_reservation_date, validate_rut,
};

pub(crate) const SLOT_GONE_MESSAGE: &str =
    "El horario seleccionado ya no está disponible. Por favor, seleccione otro";

pub struct PublicReservationForm {
    api: ApiClient,
    today: NaiveDate,
    pub client_name: String,
    tax_id: String,
    phone: String,
    pub email: String,
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
    party_size: u32,
    pub notes: String,
    slots: Vec<TimeSlot>,
    on_success: Option<SuccessCallback<Reservation>>,
    pub status: FormStatus,
}

impl PublicReservationForm {
    /// El cliente se usa sin token aunque lo traiga
    pub fn new(api: ApiClient) -> Self {
        let mut api = api;
        api.set_token(None);
        Self {
            api,
            today: Local::now().date_naive(),
            client_name: String::new(),
            tax_id: String::new(),
            phone: String::new(),
            email: String::new(),
            date: None,
            time: None,
            party_size: 2,
            notes: String::new(),
            slots: Vec::new(),
            on_success: None,
            status: FormStatus::default(),
        }
    }

    /// Fija el "hoy" contra el que se validan las fechas
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn on_success(&mut self, callback: SuccessCallback<Reservation>) {
        self.on_success = Some(callback);
    }

    pub fn set_tax_id(&mut self, input: &str) {
        self.tax_id = format_rut(input);
    }

    pub fn tax_id(&self) -> &str {
        &self.tax_id
    }

    pub fn set_phone(&mut self, input: &str) {
        self.phone = format_phone(input);
    }

    pub fn phone(&self) -> &str {
        &self.phone
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

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub async fn set_date(&mut self, date: NaiveDate) -> AppResult<()> {
        self.date = Some(date);
        self.refresh_slots().await
    }

    pub async fn set_party_size(&mut self, party_size: u32) -> AppResult<()> {
        self.party_size = party_size;
        self.refresh_slots().await
    }

    /// Elige un horario de los ofrecidos
    pub fn select_time(&mut self, time: NaiveTime) -> AppResult<()> {
        if !self.slots.iter().any(|s| s.time == time && s.available) {
            let error = AppError::validation_field("hora", "Seleccione uno de los horarios disponibles");
            return Err(self.status.fail(error));
        }
        self.time = Some(time);
        self.status.errors.remove("hora");
        Ok(())
    }

    /// Vuelve a pedir los horarios para la fecha y cantidad actuales
    ///
    /// Si el horario elegido ya no aparece, se limpia y se deja un aviso.
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
            .log_error_context("loading public time slots")?;
        self.replace_slots(slots);
        Ok(())
    }

    fn replace_slots(&mut self, slots: Vec<TimeSlot>) {
        self.slots = slots;
        if let Some(time) = self.time {
            if !self.slots.iter().any(|s| s.time == time && s.available) {
                self.time = None;
                self.status.warn(format!(
                    "El horario de las {} ya no está disponible para la fecha y cantidad elegidas",
                    time.format("%H:%M")
                ));
            }
        }
    }

    pub fn validate(&mut self) -> bool {
        let errors = &mut self.status.errors;
        let mut ok = errors.check("nombre", validate_full_name(&self.client_name));
        ok &= errors.check("rut", validate_rut(&self.tax_id));
        ok &= errors.check("telefono", validate_phone(&self.phone));
        ok &= errors.check("email", validate_email(&self.email));

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
        ok
    }

    /// Valida, confirma el horario con el servidor y crea la reserva
    ///
    /// # Errores
    /// - `ValidationWithField`: Algún campo no es válido
    /// - `Unavailable`: El horario dejó de estar disponible, antes de enviar o
    ///   por un conflicto (409) al crear; se recargan las opciones
    /// - `Request` / `Network`: El servidor rechazó la reserva
    pub async fn submit(&mut self) -> AppResult<Reservation> {
        if !self.validate() {
            return Err(self.status.invalid());
        }
        let (Some(date), Some(time)) = (self.date, self.time) else {
            return Err(self.status.invalid());
        };
        self.status.begin_submit()?;

        // Confirmación final de disponibilidad
        let fresh = match self.api.available_time_slots(date, self.party_size).await {
            Ok(slots) => slots,
            Err(error) => return Err(self.status.fail(error)),
        };
        if !fresh.iter().any(|s| s.time == time && s.available) {
            self.slots = fresh;
            self.time = None;
            self.status.errors.set("hora", SLOT_GONE_MESSAGE);
            return Err(self.status.fail(AppError::unavailable("Horario", SLOT_GONE_MESSAGE)));
        }

        let data = GuestReservation {
            client_name: self.client_name.trim().to_string(),
            tax_id: self.tax_id.clone(),
            phone: self.phone.clone(),
            email: self.email.trim().to_string(),
            date,
            time,
            party_size: self.party_size,
            notes: Some(self.notes.trim().to_string()).filter(|n| !n.is_empty()),
        };

        match self.api.create_guest_reservation(&data).await {
            Ok(reservation) => {
                tracing::info!(reservation_id = reservation.id, "Guest reservation created");
                self.reset();
                if let Some(callback) = self.on_success.as_mut() {
                    callback(&reservation);
                }
                Ok(reservation)
            }
            Err(AppError::Request { status: 409, message }) => {
                tracing::info!(server_message = %message, "Guest reservation conflict on create");
                self.time = None;
                self.refresh_slots()
                    .await
                    .best_effort("refreshing time slots after conflict");
                self.status.errors.set("hora", SLOT_GONE_MESSAGE);
                Err(self.status.fail(AppError::unavailable("Horario", SLOT_GONE_MESSAGE)))
            }
            Err(error) => Err(self.status.fail(error)),
        }
    }

    /// Limpia los campos tras un envío exitoso
    pub fn reset(&mut self) {
        self.client_name.clear();
        self.tax_id.clear();
        self.phone.clear();
        self.email.clear();
        self.date = None;
        self.time = None;
        self.party_size = 2;
        self.notes.clear();
        self.slots.clear();
        self.status.reset();
    }
}
