//! Edición del perfil del usuario autenticado
//!
//! Sólo se envían los campos que cambiaron respecto de lo cargado.

use super::FormStatus;
use crate::api::{AppResult, ErrorLogExt};
use crate::models::{Profile, ProfileUpdate};
use crate::session::SessionContext;
use crate::storage::KeyValueStore;
use crate::validation::{
    format_phone, format_rut, validate_email, validate_phone, validate_required, validate_rut,
};

#[derive(Debug)]
pub struct ProfileForm {
    original: Profile,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    phone: String,
    tax_id: String,
    pub status: FormStatus,
}

impl ProfileForm {
    pub fn from_profile(profile: Profile) -> Self {
        Self {
            email: profile.email.clone(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            phone: profile.phone.clone(),
            tax_id: profile.tax_id.clone(),
            original: profile,
            status: FormStatus::default(),
        }
    }

    /// Carga el perfil de la sesión actual
    pub async fn load<S: KeyValueStore>(session: &SessionContext<S>) -> AppResult<Self> {
        let profile = session
            .api()
            .get_profile()
            .await
            .log_error_context("loading profile")?;
        Ok(Self::from_profile(profile))
    }

    pub fn profile(&self) -> &Profile {
        &self.original
    }

    pub fn set_phone(&mut self, input: &str) {
        self.phone = format_phone(input);
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn set_tax_id(&mut self, input: &str) {
        self.tax_id = format_rut(input);
    }

    pub fn tax_id(&self) -> &str {
        &self.tax_id
    }

    /// Campos modificados respecto del perfil cargado
    pub fn changes(&self) -> ProfileUpdate {
        fn changed(current: &str, original: &str) -> Option<String> {
            let current = current.trim();
            (current != original.trim()).then(|| current.to_string())
        }

        ProfileUpdate {
            email: changed(&self.email, &self.original.email),
            first_name: changed(&self.first_name, &self.original.first_name),
            last_name: changed(&self.last_name, &self.original.last_name),
            phone: changed(&self.phone, &self.original.phone),
            tax_id: changed(&self.tax_id, &self.original.tax_id),
        }
    }

    /// Teléfono y RUT son opcionales, pero si vienen deben ser válidos
    pub fn validate(&mut self) -> bool {
        let errors = &mut self.status.errors;
        let mut ok = errors.check("email", validate_email(&self.email));
        ok &= errors.check("first_name", validate_required(&self.first_name, "El nombre"));
        ok &= errors.check("last_name", validate_required(&self.last_name, "El apellido"));

        if self.phone.trim().is_empty() {
            errors.remove("telefono");
        } else {
            ok &= errors.check("telefono", validate_phone(&self.phone));
        }
        if self.tax_id.trim().is_empty() {
            errors.remove("rut");
        } else {
            ok &= errors.check("rut", validate_rut(&self.tax_id));
        }
        ok
    }

    /// Guarda los cambios y actualiza el resumen de la sesión
    ///
    /// # Errores
    /// - `Validation`: Datos inválidos o nada que guardar
    pub async fn submit<S: KeyValueStore>(&mut self, session: &mut SessionContext<S>) -> AppResult<Profile> {
        if !self.validate() {
            return Err(self.status.invalid());
        }
        self.status.begin_submit()?;

        let changes = self.changes();
        let updated = match session.api().update_profile(&changes).await {
            Ok(profile) => profile,
            Err(error) => {
                session.handle_error(&error);
                return Err(self.status.fail(error));
            }
        };

        session
            .update_summary(&updated)
            .best_effort("updating session summary");

        tracing::info!(user_id = updated.user_id, "Profile updated");
        *self = Self::from_profile(updated.clone());
        Ok(updated)
    }
}
