//! # Contexto de sesión
//!
//! Única pieza de estado compartida por las vistas. Tiene un ciclo de vida
//! explícito:
//!
//! 1. [`SessionContext::hydrate`] lee la sesión persistida (si existe)
//! 2. `login` / `register` / `activate_account` la establecen y persisten
//! 3. `logout` / `invalidate` limpian el almacenamiento y la memoria
//!
//! Las vistas reciben un [`ApiClient`] con el token actual a través de
//! [`SessionContext::api`]; nunca leen la sesión de forma global.

use crate::api::{ApiClient, AppError, AppResult, ErrorLogExt};
use crate::models::{Profile, Registration, Role, Session};
use crate::storage::KeyValueStore;

const SESSION_KEY: &str = "auth_session";

pub struct SessionContext<S: KeyValueStore> {
    store: S,
    api: ApiClient,
    session: Option<Session>,
}

impl<S: KeyValueStore> SessionContext<S> {
    /// Restaura la sesión guardada
    ///
    /// Si el valor persistido está corrupto se descarta y se parte sin sesión.
    pub fn hydrate(mut store: S, mut api: ApiClient) -> Self {
        let session = match store.get_json::<Session>(SESSION_KEY) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding corrupt persisted session");
                store.remove(SESSION_KEY).best_effort("removing corrupt session");
                None
            }
        };

        api.set_token(session.as_ref().map(|s| s.token.clone()));

        if let Some(session) = &session {
            tracing::debug!(username = %session.username, role = %session.role.as_wire(), "Session restored");
        }

        Self { store, api, session }
    }

    pub fn current(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.session.as_ref().map(|s| s.role)
    }

    /// Sesión actual o error si no hay usuario autenticado
    pub fn require(&self) -> AppResult<&Session> {
        self.session
            .as_ref()
            .ok_or_else(|| AppError::Unauthorized("Debe iniciar sesión".to_string()))
    }

    /// Cliente con el token de la sesión actual, para inyectar en las vistas
    pub fn api(&self) -> ApiClient {
        self.api.clone()
    }

    pub async fn login(&mut self, username: &str, password: &str) -> AppResult<&Session> {
        let session = self.api.login(username.trim(), password).await?;
        tracing::info!(username = %session.username, role = %session.role.as_wire(), "Logged in");
        self.establish(session)
    }

    pub async fn register(&mut self, data: &Registration) -> AppResult<&Session> {
        let session = self.api.register(data).await?;
        tracing::info!(username = %session.username, "Account registered");
        self.establish(session)
    }

    pub async fn activate_account(
        &mut self,
        token: &str,
        username: &str,
        password: &str,
    ) -> AppResult<&Session> {
        let session = self.api.activate_account(token, username, password).await?;
        tracing::info!(username = %session.username, "Guest account activated");
        self.establish(session)
    }

    /// Cierra la sesión
    ///
    /// El aviso al servidor es secundario: aunque falle, la sesión local se
    /// elimina igual.
    pub async fn logout(&mut self) -> AppResult<()> {
        if self.session.is_some() {
            self.api.logout().await.best_effort("server logout");
        }
        self.invalidate()
    }

    /// Limpia la sesión sin avisar al servidor (por ejemplo tras un 401)
    pub fn invalidate(&mut self) -> AppResult<()> {
        if let Some(session) = self.session.take() {
            tracing::info!(username = %session.username, "Session cleared");
        }
        self.api.set_token(None);
        self.store.remove(SESSION_KEY)
    }

    /// Invalida la sesión si el error indica que el token ya no sirve
    pub fn handle_error(&mut self, error: &AppError) {
        if matches!(error, AppError::Unauthorized(_)) && self.session.is_some() {
            tracing::warn!("Token rejected by server, clearing session");
            self.invalidate().best_effort("clearing rejected session");
        }
    }

    /// Refleja en el resumen guardado los cambios del perfil
    pub fn update_summary(&mut self, profile: &Profile) -> AppResult<()> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        session.email = profile.email.clone();
        let full_name = profile.full_name();
        if !full_name.is_empty() {
            session.full_name = full_name;
        }
        let snapshot = session.clone();
        self.store.set_json(SESSION_KEY, &snapshot)
    }

    fn establish(&mut self, session: Session) -> AppResult<&Session> {
        self.store.set_json(SESSION_KEY, &session)?;
        self.api.set_token(Some(session.token.clone()));
        Ok(self.session.insert(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::time::Duration;

    fn api() -> ApiClient {
        ApiClient::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap()
    }

    fn sample_session() -> Session {
        Session {
            token: "tok-123".to_string(),
            user_id: 1,
            username: "mesero1".to_string(),
            email: "mesero@resto.cl".to_string(),
            role: Role::Waiter,
            role_display_name: "Mesero".to_string(),
            full_name: "Juan Soto".to_string(),
        }
    }

    #[test]
    fn hydrate_restores_persisted_session_and_token() {
        let mut store = MemoryStore::new();
        store.set_json(SESSION_KEY, &sample_session()).unwrap();

        let context = SessionContext::hydrate(store, api());
        assert!(context.is_authenticated());
        assert_eq!(context.role(), Some(Role::Waiter));
        assert_eq!(context.api().token(), Some("tok-123"));
    }

    #[test]
    fn hydrate_discards_corrupt_session() {
        let mut store = MemoryStore::new();
        store.set(SESSION_KEY, "{roto".to_string()).unwrap();

        let context = SessionContext::hydrate(store, api());
        assert!(!context.is_authenticated());
        assert!(context.api().token().is_none());
        assert!(context.require().is_err());
    }

    #[test]
    fn invalidate_clears_memory_and_storage() {
        let mut store = MemoryStore::new();
        store.set_json(SESSION_KEY, &sample_session()).unwrap();
        let mut context = SessionContext::hydrate(store, api());

        context.invalidate().unwrap();
        assert!(!context.is_authenticated());
        assert!(context.api().token().is_none());
        assert!(context.store.get(SESSION_KEY).is_none());
    }

    #[test]
    fn unauthorized_errors_invalidate_the_session() {
        let mut store = MemoryStore::new();
        store.set_json(SESSION_KEY, &sample_session()).unwrap();
        let mut context = SessionContext::hydrate(store, api());

        context.handle_error(&AppError::Request {
            status: 500,
            message: "x".to_string(),
        });
        assert!(context.is_authenticated());

        context.handle_error(&AppError::Unauthorized("Token expirado".to_string()));
        assert!(!context.is_authenticated());
    }

    #[tokio::test]
    async fn logout_clears_even_when_server_is_unreachable() {
        let mut store = MemoryStore::new();
        store.set_json(SESSION_KEY, &sample_session()).unwrap();
        let mut context = SessionContext::hydrate(store, api());

        context.logout().await.unwrap();
        assert!(!context.is_authenticated());
    }

    #[test]
    fn profile_changes_update_the_summary() {
        let mut store = MemoryStore::new();
        store.set_json(SESSION_KEY, &sample_session()).unwrap();
        let mut context = SessionContext::hydrate(store, api());

        let profile = Profile {
            user_id: 1,
            username: "mesero1".to_string(),
            email: "nuevo@resto.cl".to_string(),
            first_name: "Juan".to_string(),
            last_name: "Soto Díaz".to_string(),
            phone: String::new(),
            tax_id: String::new(),
        };
        context.update_summary(&profile).unwrap();

        let stored: Session = context.store.get_json(SESSION_KEY).unwrap().unwrap();
        assert_eq!(stored.email, "nuevo@resto.cl");
        assert_eq!(stored.full_name, "Juan Soto Díaz");
    }
}
