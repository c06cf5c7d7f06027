//! # Gestión de usuarios (administración)
//!
//! Búsqueda por nombre, usuario o email, filtro por rol, orden y cambio de
//! rol. Quitar el rol de administrador pide confirmación, y nadie puede
//! cambiar su propio rol desde aquí.

use std::cmp::Ordering;

use super::confirm::{ActionOutcome, Confirmer};
use super::list::{self, ListState, Page, PendingFetch, Refreshable, Ticket};
use crate::api::{ApiClient, AppError, AppResult, ErrorLogExt};
use crate::models::{Role, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSort {
    Username,
    FullName,
    Role,
    RegisteredAt,
    LastLogin,
}

fn compare_users(a: &User, b: &User, key: UserSort) -> Ordering {
    match key {
        UserSort::Username => a.username.to_lowercase().cmp(&b.username.to_lowercase()),
        UserSort::FullName => a.full_name.to_lowercase().cmp(&b.full_name.to_lowercase()),
        UserSort::Role => a.role.cmp(&b.role),
        UserSort::RegisteredAt => a.registered_at.cmp(&b.registered_at),
        // Option ordena None primero: quien nunca entró queda al inicio
        UserSort::LastLogin => a.last_login_at.cmp(&b.last_login_at),
    }
}

pub struct UserManagement {
    api: ApiClient,
    current_user_id: i64,
    search: String,
    role_filter: Option<Role>,
    list: ListState<User, UserSort>,
}

impl UserManagement {
    pub fn new(api: ApiClient, page_size: usize, current_user_id: i64) -> Self {
        let mut list = ListState::new(page_size);
        list.set_sort(UserSort::Username);
        Self {
            api,
            current_user_id,
            search: String::new(),
            role_filter: None,
            list,
        }
    }

    pub fn list(&self) -> &ListState<User, UserSort> {
        &self.list
    }

    pub async fn refresh(&mut self) -> AppResult<bool> {
        list::refresh(self).await
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.list.paginator_mut().reset();
    }

    pub fn set_role_filter(&mut self, role: Option<Role>) {
        self.role_filter = role;
        self.list.paginator_mut().reset();
    }

    pub fn sort_by(&mut self, key: UserSort) {
        self.list.set_sort(key);
    }

    pub fn set_page(&mut self, page: usize) {
        let total = self.visible().len();
        self.list.paginator_mut().set_page(page, total);
    }

    pub fn visible(&self) -> Vec<&User> {
        self.list.filtered(|u| self.matches(u), compare_users)
    }

    pub fn page(&self) -> Page<'_, User> {
        self.list.page(|u| self.matches(u), compare_users)
    }

    fn matches(&self, user: &User) -> bool {
        if let Some(role) = self.role_filter {
            if user.role != role {
                return false;
            }
        }
        let needle = self.search.trim().to_lowercase();
        needle.is_empty()
            || user.username.to_lowercase().contains(&needle)
            || user.full_name.to_lowercase().contains(&needle)
            || user.email.to_lowercase().contains(&needle)
    }

    /// Cambia el rol de un usuario
    ///
    /// # Errores
    /// - `Validation`: Usuario desconocido, mismo rol o cambio del propio rol
    pub async fn change_role(
        &mut self,
        id: i64,
        role: Role,
        confirmer: &mut dyn Confirmer,
    ) -> AppResult<ActionOutcome<User>> {
        self.list.ensure_open()?;

        if id == self.current_user_id {
            return Err(AppError::Validation(
                "No puede cambiar su propio rol".to_string(),
            ));
        }

        let user = self
            .list
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::Validation(format!("El usuario {} no está en el listado", id)))?;

        if user.role == role {
            return Err(AppError::Validation(format!(
                "{} ya tiene el rol {}",
                user.username,
                role.display_name()
            )));
        }

        if user.role == Role::Admin {
            let prompt = format!(
                "¿Quitar el rol de administrador a {} y asignarle {}?",
                user.username,
                role.display_name()
            );
            if !confirmer.confirm(&prompt) {
                return Ok(ActionOutcome::Declined);
            }
        }

        let updated = self
            .api
            .update_user_role(id, role)
            .await
            .log_error_context("changing user role")?;

        tracing::info!(user_id = id, role = %role.as_wire(), "User role changed");
        self.list.patch(updated.clone(), |a, b| a.id == b.id);
        self.refresh().await.best_effort("reloading users");

        Ok(ActionOutcome::Applied(updated))
    }

    pub fn teardown(&mut self) {
        self.list.teardown();
    }
}

impl Refreshable for UserManagement {
    type Item = User;

    fn begin_refresh(&mut self) -> PendingFetch<User> {
        let ticket = self.list.begin_fetch();
        let api = self.api.clone();
        PendingFetch::new(ticket, async move { api.list_users().await })
    }

    fn apply_fetch(&mut self, ticket: Ticket, result: AppResult<Vec<User>>) -> AppResult<bool> {
        self.list.finish_fetch(ticket, result)
    }

    fn teardown(&mut self) {
        self.list.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::confirm::RecordingConfirmer;
    use chrono::NaiveDate;
    use std::time::Duration;

    fn user(id: i64, username: &str, full_name: &str, role: Role) -> User {
        User {
            id,
            username: username.to_string(),
            email: format!("{}@resto.cl", username),
            full_name: full_name.to_string(),
            role,
            registered_at: NaiveDate::from_ymd_opt(2026, 1, id as u32)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            last_login_at: None,
        }
    }

    fn view_with(items: Vec<User>) -> UserManagement {
        let api = ApiClient::new("http://127.0.0.1:9", Duration::from_millis(100)).unwrap();
        let mut view = UserManagement::new(api, 10, 1);
        let ticket = view.list.begin_fetch();
        view.apply_fetch(ticket, Ok(items)).unwrap();
        view
    }

    #[test]
    fn search_and_role_filter() {
        let mut view = view_with(vec![
            user(1, "admin", "Ana Admin", Role::Admin),
            user(2, "pedro", "Pedro Pérez", Role::Waiter),
            user(3, "carla", "Carla Díaz", Role::Client),
        ]);
        view.set_search("PÉREZ");
        assert_eq!(view.visible().len(), 1);

        view.set_search("");
        view.set_role_filter(Some(Role::Client));
        assert_eq!(view.visible()[0].username, "carla");
    }

    #[tokio::test]
    async fn cannot_change_own_role() {
        let mut view = view_with(vec![user(1, "admin", "Ana Admin", Role::Admin)]);
        let mut confirmer = RecordingConfirmer::answering(true);
        let error = view.change_role(1, Role::Waiter, &mut confirmer).await.unwrap_err();
        assert!(error.is_validation());
    }

    #[tokio::test]
    async fn demoting_an_admin_asks_first() {
        let mut view = view_with(vec![
            user(1, "yo", "Yo", Role::Admin),
            user(2, "otra", "Otra Admin", Role::Admin),
        ]);
        let mut confirmer = RecordingConfirmer::answering(false);
        let outcome = view.change_role(2, Role::Cashier, &mut confirmer).await.unwrap();
        assert_eq!(outcome, ActionOutcome::Declined);
        assert_eq!(confirmer.prompts.len(), 1);
        assert_eq!(view.list().items()[1].role, Role::Admin);
    }
}
