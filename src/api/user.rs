//! # API de Usuarios y Perfil

use reqwest::Method;

use super::dto::{ListResponse, PerfilDto, PerfilUpdateRequest, RolRequest, UsuarioAdminDto};
use super::{ApiClient, AppError, AppResult};
use crate::models::{Profile, ProfileUpdate, Role, User};

impl ApiClient {
    /// Lista todos los usuarios (administración)
    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        let response: ListResponse<UsuarioAdminDto> = self.get("usuarios/", &[]).await?;
        response.into_items().into_iter().map(User::try_from).collect()
    }

    /// Cambia el rol de un usuario
    pub async fn update_user_role(&self, id: i64, role: Role) -> AppResult<User> {
        let dto: UsuarioAdminDto = self
            .send_json(Method::PATCH, &format!("usuarios/{}/rol/", id), &RolRequest { rol: role })
            .await?;
        tracing::info!(user_id = id, role = %role.as_wire(), "User role updated");
        User::try_from(dto)
    }

    pub async fn get_profile(&self) -> AppResult<Profile> {
        let dto: PerfilDto = self.get("perfil/", &[]).await?;
        Ok(Profile::from(dto))
    }

    /// Envía sólo los campos modificados
    pub async fn update_profile(&self, changes: &ProfileUpdate) -> AppResult<Profile> {
        if changes.is_empty() {
            return Err(AppError::Validation("No hay cambios que guardar".to_string()));
        }

        let body = PerfilUpdateRequest {
            email: changes.email.as_deref(),
            first_name: changes.first_name.as_deref(),
            last_name: changes.last_name.as_deref(),
            telefono: changes.phone.as_deref(),
            rut: changes.tax_id.as_deref(),
        };
        let dto: PerfilDto = self.send_json(Method::PATCH, "perfil/", &body).await?;
        Ok(Profile::from(dto))
    }
}
