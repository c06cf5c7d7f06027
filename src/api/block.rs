//! # API de Bloqueos
//!
//! Ventanas en que una mesa no se puede reservar. Sólo administración.

use reqwest::Method;

use super::dto::{format_date, format_time, BloqueoDto, CrearBloqueoRequest, ListResponse};
use super::{ApiClient, AppResult};
use crate::models::{Block, NewBlock};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockQuery {
    pub active: Option<bool>,
    pub table_id: Option<i64>,
}

impl BlockQuery {
    fn to_params(self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(active) = self.active {
            params.push(("activo", active.to_string()));
        }
        if let Some(table) = self.table_id {
            params.push(("mesa", table.to_string()));
        }
        params
    }
}

impl ApiClient {
    pub async fn list_blocks(&self, query: &BlockQuery) -> AppResult<Vec<Block>> {
        let response: ListResponse<BloqueoDto> = self.get("bloqueos/", &query.to_params()).await?;
        response.into_items().into_iter().map(Block::try_from).collect()
    }

    pub async fn create_block(&self, data: &NewBlock) -> AppResult<Block> {
        let body = CrearBloqueoRequest {
            mesa: data.table_id,
            fecha_inicio: format_date(data.date_start),
            fecha_fin: format_date(data.date_end),
            hora_inicio: data.time_start.map(format_time),
            hora_fin: data.time_end.map(format_time),
            motivo: &data.reason,
            categoria: data.category,
            notas: &data.notes,
        };
        let dto: BloqueoDto = self.send_json(Method::POST, "bloqueos/", &body).await?;
        let block = Block::try_from(dto)?;
        tracing::info!(block_id = block.id, table_id = block.table_id, "Block created");
        Ok(block)
    }

    pub async fn activate_block(&self, id: i64) -> AppResult<()> {
        self.send_empty(Method::POST, &format!("bloqueos/{}/activar/", id))
            .await
    }

    pub async fn deactivate_block(&self, id: i64) -> AppResult<()> {
        self.send_empty(Method::POST, &format!("bloqueos/{}/desactivar/", id))
            .await
    }

    pub async fn delete_block(&self, id: i64) -> AppResult<()> {
        self.send_empty(Method::DELETE, &format!("bloqueos/{}/", id))
            .await?;
        tracing::info!(block_id = id, "Block deleted");
        Ok(())
    }
}
