//! # Cliente HTTP
//!
//! Envoltorio delgado sobre `reqwest`. Cada llamada es una solicitud nueva:
//! sin reintentos, sin deduplicación y sin caché.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::dto::extract_error_message;
use super::errors::GENERIC_REQUEST_MESSAGE;
use super::{AppError, AppResult};
use crate::config::Config;

/// Cliente de la API REST del sistema de reservas
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Crea un cliente sin token
    ///
    /// # Errores
    /// - `Internal`: Si no se puede construir el cliente HTTP (TLS)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Error creando cliente HTTP: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        Self::new(config.api_url.clone(), config.timeout)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Arma la solicitud con el header `Authorization: Bearer` si hay token
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        tracing::debug!(method = %method, url = %url, "Sending request");

        let mut request = self
            .client
            .request(method, url)
            .header("X-Request-Id", uuid::Uuid::new_v4().to_string());

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        request
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        let response = self.request(Method::GET, path).query(query).send().await?;
        Self::handle_response(response).await
    }

    pub(crate) async fn send_json<T, B>(&self, method: Method, path: &str, body: &B) -> AppResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.request(method, path).json(body).send().await?;
        Self::handle_response(response).await
    }

    /// Solicitud cuya respuesta no interesa más allá del código de estado
    pub(crate) async fn send_empty(&self, method: Method, path: &str) -> AppResult<()> {
        let response = self.request(method, path).send().await?;
        Self::check_status(response).await.map(|_| ())
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> AppResult<T> {
        let response = Self::check_status(response).await?;
        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(error = %e, "Unexpected response body");
            AppError::InvalidResponse(e.to_string())
        })
    }

    /// Convierte las respuestas no exitosas en errores con el mensaje del servidor
    async fn check_status(response: Response) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|value| extract_error_message(&value))
            .unwrap_or_else(|| format!("{} (HTTP {})", GENERIC_REQUEST_MESSAGE, status.as_u16()));

        tracing::warn!(status = status.as_u16(), message = %message, "Request failed");

        match status {
            StatusCode::UNAUTHORIZED => Err(AppError::Unauthorized(message)),
            _ => Err(AppError::Request {
                status: status.as_u16(),
                message,
            }),
        }
    }
}
