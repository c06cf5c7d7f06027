//! # API de autenticación
//!
//! Creación y cierre de sesión, registro de clientes y activación de cuentas
//! a partir de un token de invitado. La emisión de tokens es del backend; aquí
//! sólo se traduce la respuesta a [`Session`].

use reqwest::Method;

use super::dto::{ActivarCuentaRequest, AuthResponse, LoginRequest, RegistroRequest, TokenInvitadoDto};
use super::{ApiClient, AppResult};
use crate::models::{GuestInvitation, Registration, Session};

impl ApiClient {
    /// Inicia sesión con usuario y contraseña
    ///
    /// # Errores
    /// - `Unauthorized`: Credenciales incorrectas
    /// - `Network`: El servidor no responde
    pub async fn login(&self, username: &str, password: &str) -> AppResult<Session> {
        let response: AuthResponse = self
            .send_json(Method::POST, "auth/login/", &LoginRequest { username, password })
            .await?;
        Ok(Session::from(response))
    }

    /// Cierra la sesión en el servidor
    pub async fn logout(&self) -> AppResult<()> {
        self.send_empty(Method::POST, "auth/logout/").await
    }

    /// Registra una cuenta de cliente y devuelve la sesión ya iniciada
    pub async fn register(&self, data: &Registration) -> AppResult<Session> {
        let body = RegistroRequest {
            username: &data.username,
            email: &data.email,
            password: &data.password,
            first_name: &data.first_name,
            last_name: &data.last_name,
            telefono: &data.phone,
            rut: &data.tax_id,
        };
        let response: AuthResponse = self.send_json(Method::POST, "auth/register/", &body).await?;
        Ok(Session::from(response))
    }

    /// Verifica el token enviado por correo a quien reservó sin cuenta
    ///
    /// # Errores
    /// - `Validation`: El backend informa que el token no es válido
    pub async fn verify_guest_token(&self, token: &str) -> AppResult<GuestInvitation> {
        let dto: TokenInvitadoDto = self
            .get(&format!("auth/verificar-token/{}/", token), &[])
            .await?;
        GuestInvitation::try_from(dto)
    }

    /// Activa la cuenta de un invitado y devuelve la sesión iniciada
    pub async fn activate_account(
        &self,
        token: &str,
        username: &str,
        password: &str,
    ) -> AppResult<Session> {
        let body = ActivarCuentaRequest {
            token,
            username,
            password,
        };
        let response: AuthResponse = self
            .send_json(Method::POST, "auth/activar-cuenta/", &body)
            .await?;
        Ok(Session::from(response))
    }
}
