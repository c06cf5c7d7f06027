//! # Formularios
//!
//! Cada formulario guarda sus campos, los errores por campo, un indicador de
//! envío y avisos no fatales (por ejemplo, una selección que dejó de ser
//! válida tras recargar opciones). Un fallo en cualquier paso conserva lo
//! ingresado.
//!
//! - [`login`] - Inicio de sesión y registro
//! - [`public_reservation`] - Reserva sin cuenta
//! - [`new_reservation`] - Reserva de un cliente autenticado
//! - [`profile`] - Edición del perfil
//! - [`activation`] - Activación de cuenta desde un token de invitado

pub mod activation;
pub mod login;
pub mod new_reservation;
pub mod profile;
pub mod public_reservation;

use std::collections::BTreeMap;

use crate::api::{AppError, AppResult};
use crate::validation::ValidationResult;

pub use activation::ActivationForm;
pub use login::{LoginForm, RegisterForm};
pub use new_reservation::NewReservationForm;
pub use profile::ProfileForm;
pub use public_reservation::PublicReservationForm;

/// Errores de validación por campo, en orden de campo
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// Registra el resultado de un validador; devuelve si fue válido
    pub fn check(&mut self, field: &str, result: ValidationResult) -> bool {
        if result.valid {
            self.0.remove(field);
            true
        } else {
            self.0.insert(field.to_string(), result.message);
            false
        }
    }

    pub fn set(&mut self, field: &str, message: impl Into<String>) {
        self.0.insert(field.to_string(), message.into());
    }

    pub fn remove(&mut self, field: &str) {
        self.0.remove(field);
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok` si no hay errores; si no, el primero como error de campo
    pub fn into_result(&self) -> AppResult<()> {
        match self.0.iter().next() {
            None => Ok(()),
            Some((field, message)) => Err(AppError::validation_field(field, message)),
        }
    }
}

/// Estado común de envío de un formulario
#[derive(Debug, Default)]
pub struct FormStatus {
    pub errors: FieldErrors,
    warnings: Vec<String>,
    message: Option<String>,
    submitting: bool,
}

impl FormStatus {
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Mensaje del último fallo, para mostrar en un aviso
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn warn(&mut self, warning: impl Into<String>) {
        let warning = warning.into();
        tracing::debug!(warning = %warning, "Form warning");
        self.warnings.push(warning);
    }

    /// Devuelve y limpia los avisos acumulados
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    pub(crate) fn begin_submit(&mut self) -> AppResult<()> {
        if self.submitting {
            return Err(AppError::Validation("El formulario ya se está enviando".to_string()));
        }
        self.submitting = true;
        self.message = None;
        Ok(())
    }

    /// Registra un fallo y lo devuelve para propagarlo
    pub(crate) fn fail(&mut self, error: AppError) -> AppError {
        self.submitting = false;
        if let AppError::ValidationWithField { field, message } = &error {
            self.errors.set(field, message.clone());
        }
        self.message = Some(error.user_message());
        error
    }

    /// Fallo por validación local, con el primer campo inválido
    pub(crate) fn invalid(&mut self) -> AppError {
        let error = self
            .errors
            .into_result()
            .err()
            .unwrap_or_else(|| AppError::Validation("Revise los datos ingresados".to_string()));
        self.fail(error)
    }

    pub(crate) fn succeed(&mut self) {
        self.submitting = false;
        self.message = None;
        self.errors.clear();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Aviso opcional al contenedor del formulario tras un envío exitoso
pub type SuccessCallback<T> = Box<dyn FnMut(&T) + Send>;
