//! Activación de cuenta para quien reservó sin cuenta
//!
//! El correo de confirmación trae un token. Primero se verifica el token y
//! luego se elige usuario y contraseña; el backend crea la cuenta y entrega
//! la sesión.

use super::FormStatus;
use crate::api::{ApiClient, AppError, AppResult};
use crate::models::{GuestInvitation, Session};
use crate::session::SessionContext;
use crate::storage::KeyValueStore;
use crate::validation::{validate_password, validate_password_match, validate_username};

#[derive(Debug)]
pub struct ActivationForm {
    token: String,
    invitation: Option<GuestInvitation>,
    pub username: String,
    pub password: String,
    pub password_confirmation: String,
    pub status: FormStatus,
}

impl ActivationForm {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into().trim().to_string(),
            invitation: None,
            username: String::new(),
            password: String::new(),
            password_confirmation: String::new(),
            status: FormStatus::default(),
        }
    }

    pub fn invitation(&self) -> Option<&GuestInvitation> {
        self.invitation.as_ref()
    }

    /// Verifica el token y sugiere un usuario a partir del email
    pub async fn verify(&mut self, api: &ApiClient) -> AppResult<&GuestInvitation> {
        if self.token.is_empty() {
            return Err(self
                .status
                .fail(AppError::validation_field("token", "El enlace de activación no es válido")));
        }

        let invitation = match api.verify_guest_token(&self.token).await {
            Ok(invitation) => invitation,
            Err(error) => return Err(self.status.fail(error)),
        };

        if self.username.is_empty() {
            self.username = suggested_username(&invitation.email);
        }
        Ok(self.invitation.insert(invitation))
    }

    pub fn validate(&mut self) -> bool {
        let errors = &mut self.status.errors;
        let mut ok = errors.check("username", validate_username(&self.username));
        ok &= errors.check("password", validate_password(&self.password));
        ok &= errors.check(
            "password_confirmation",
            validate_password_match(&self.password, &self.password_confirmation),
        );
        ok
    }

    pub async fn submit<S: KeyValueStore>(&mut self, session: &mut SessionContext<S>) -> AppResult<Session> {
        if self.invitation.is_none() {
            return Err(self.status.fail(AppError::Validation(
                "Primero debe verificarse el enlace de activación".to_string(),
            )));
        }
        if !self.validate() {
            return Err(self.status.invalid());
        }
        self.status.begin_submit()?;

        match session
            .activate_account(&self.token, self.username.trim(), &self.password)
            .await
        {
            Ok(established) => {
                let established = established.clone();
                self.status.succeed();
                self.password.clear();
                self.password_confirmation.clear();
                Ok(established)
            }
            Err(error) => Err(self.status.fail(error)),
        }
    }
}

/// Parte local del email, sólo con caracteres válidos para un usuario
fn suggested_username(email: &str) -> String {
    email
        .split('@')
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | '+'))
        .collect()
}
