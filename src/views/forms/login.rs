//! Formularios de inicio de sesión y de registro de clientes

use super::FormStatus;
use crate::api::AppResult;
use crate::models::{Registration, Session};
use crate::session::SessionContext;
use crate::storage::KeyValueStore;
use crate::validation::{
    format_phone, format_rut, validate_email, validate_full_name, validate_password,
    validate_password_match, validate_phone, validate_required, validate_rut, validate_username,
};

#[derive(Debug, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub status: FormStatus,
}

impl LoginForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&mut self) -> bool {
        let errors = &mut self.status.errors;
        let user_ok = errors.check("username", validate_required(&self.username, "El usuario"));
        let password_ok = errors.check("password", validate_required(&self.password, "La contraseña"));
        user_ok && password_ok
    }

    /// Valida e inicia sesión
    ///
    /// Si las credenciales son rechazadas los campos se conservan.
    pub async fn submit<S: KeyValueStore>(&mut self, session: &mut SessionContext<S>) -> AppResult<Session> {
        if !self.validate() {
            return Err(self.status.invalid());
        }
        self.status.begin_submit()?;

        match session.login(&self.username, &self.password).await {
            Ok(established) => {
                let established = established.clone();
                self.status.succeed();
                self.password.clear();
                Ok(established)
            }
            Err(error) => Err(self.status.fail(error)),
        }
    }
}

#[derive(Debug, Default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    pub first_name: String,
    pub last_name: String,
    phone: String,
    tax_id: String,
    pub status: FormStatus,
}

impl RegisterForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Guarda el teléfono con el formato de pantalla
    pub fn set_phone(&mut self, input: &str) {
        self.phone = format_phone(input);
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    /// Guarda el RUT con el formato de pantalla
    pub fn set_tax_id(&mut self, input: &str) {
        self.tax_id = format_rut(input);
    }

    pub fn tax_id(&self) -> &str {
        &self.tax_id
    }

    pub fn validate(&mut self) -> bool {
        let full_name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let errors = &mut self.status.errors;

        let checks = [
            errors.check("username", validate_username(&self.username)),
            errors.check("email", validate_email(&self.email)),
            errors.check("password", validate_password(&self.password)),
            errors.check(
                "password_confirmation",
                validate_password_match(&self.password, &self.password_confirmation),
            ),
            errors.check("first_name", validate_required(&self.first_name, "El nombre")),
            errors.check("last_name", validate_required(&self.last_name, "El apellido")),
            errors.check("nombre_completo", validate_full_name(&full_name)),
            errors.check("telefono", validate_phone(&self.phone)),
            errors.check("rut", validate_rut(&self.tax_id)),
        ];
        checks.iter().all(|ok| *ok)
    }

    pub async fn submit<S: KeyValueStore>(&mut self, session: &mut SessionContext<S>) -> AppResult<Session> {
        if !self.validate() {
            return Err(self.status.invalid());
        }
        self.status.begin_submit()?;

        let registration = Registration {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            phone: self.phone.clone(),
            tax_id: self.tax_id.clone(),
        };

        match session.register(&registration).await {
            Ok(established) => {
                let established = established.clone();
                self.status.succeed();
                Ok(established)
            }
            Err(error) => Err(self.status.fail(error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_requires_both_fields() {
        let mut form = LoginForm::new();
        form.username = "ana".to_string();
        assert!(!form.validate());
        assert!(form.status.errors.get("password").is_some());
        assert!(form.status.errors.get("username").is_none());
    }

    fn filled() -> RegisterForm {
        let mut form = RegisterForm::new();
        form.username = "ana.rojas".to_string();
        form.email = "ana@correo.cl".to_string();
        form.password = "secreta123".to_string();
        form.password_confirmation = "secreta123".to_string();
        form.first_name = "Ana".to_string();
        form.last_name = "Rojas".to_string();
        form.set_phone("912345678");
        form.set_tax_id("123456785");
        form
    }

    #[test]
    fn register_formats_contact_fields() {
        let form = filled();
        assert_eq!(form.phone(), "+56 9 1234 5678");
        assert_eq!(form.tax_id(), "12.345.678-5");
    }

    #[test]
    fn register_validation_reports_each_field() {
        let mut form = filled();
        assert!(form.validate());

        form.password_confirmation = "otra".to_string();
        form.set_tax_id("123456789");
        assert!(!form.validate());
        assert!(form.status.errors.get("password_confirmation").is_some());
        assert_eq!(
            form.status.errors.get("rut"),
            Some("RUT inválido. El dígito verificador debería ser 5")
        );
        assert_eq!(form.status.errors.len(), 2);
    }
}
