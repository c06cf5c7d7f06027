//! # Bloqueos de mesas (administración)
//!
//! Listado con filtros por vigencia, categoría y mesa; creación validada,
//! activación, desactivación y eliminación con confirmación.

use std::cmp::Ordering;

use super::confirm::{ActionOutcome, Confirmer};
use super::list::{self, ListState, Page, PendingFetch, Refreshable, Ticket};
use crate::api::{ApiClient, AppError, AppResult, BlockQuery, ErrorLogExt};
use crate::models::{Block, BlockCategory, NewBlock};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockFilters {
    pub active: Option<bool>,
    pub category: Option<BlockCategory>,
    pub table_id: Option<i64>,
}

impl BlockFilters {
    fn matches(&self, block: &Block) -> bool {
        self.active.map_or(true, |active| block.active == active)
            && self.category.map_or(true, |category| block.category == category)
            && self.table_id.map_or(true, |table| block.table_id == table)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSort {
    Start,
    Table,
    Category,
}

fn compare_blocks(a: &Block, b: &Block, key: BlockSort) -> Ordering {
    match key {
        BlockSort::Start => (a.date_start, a.time_start).cmp(&(b.date_start, b.time_start)),
        BlockSort::Table => a.table_number.cmp(&b.table_number).then(a.date_start.cmp(&b.date_start)),
        BlockSort::Category => a.category.cmp(&b.category).then(a.date_start.cmp(&b.date_start)),
    }
}

/// Valida un bloqueo antes de enviarlo
///
/// # Errores
/// - `ValidationWithField`: Con el campo que falla (`fecha_fin`, `hora_inicio`,
///   `hora_fin`, `motivo`)
pub fn validate_new_block(block: &NewBlock) -> AppResult<()> {
    if block.date_end < block.date_start {
        return Err(AppError::validation_field(
            "fecha_fin",
            "La fecha de término no puede ser anterior a la de inicio",
        ));
    }

    match (block.time_start, block.time_end) {
        (Some(start), Some(end)) => {
            if block.date_start == block.date_end && start >= end {
                return Err(AppError::validation_field(
                    "hora_fin",
                    "La hora de término debe ser posterior a la de inicio",
                ));
            }
        }
        (None, None) => {}
        (None, Some(_)) => {
            return Err(AppError::validation_field(
                "hora_inicio",
                "Indique ambas horas o ninguna para un bloqueo de día completo",
            ));
        }
        (Some(_), None) => {
            return Err(AppError::validation_field(
                "hora_fin",
                "Indique ambas horas o ninguna para un bloqueo de día completo",
            ));
        }
    }

    if block.reason.trim().is_empty() {
        return Err(AppError::validation_field("motivo", "El motivo es obligatorio"));
    }

    Ok(())
}

pub struct BlockList {
    api: ApiClient,
    filters: BlockFilters,
    list: ListState<Block, BlockSort>,
}

impl BlockList {
    pub fn new(api: ApiClient, page_size: usize) -> Self {
        let mut list = ListState::new(page_size);
        list.set_sort(BlockSort::Start);
        Self {
            api,
            filters: BlockFilters::default(),
            list,
        }
    }

    pub fn list(&self) -> &ListState<Block, BlockSort> {
        &self.list
    }

    pub fn filters(&self) -> &BlockFilters {
        &self.filters
    }

    pub async fn refresh(&mut self) -> AppResult<bool> {
        list::refresh(self).await
    }

    /// Cambia los filtros; si cambia la mesa se vuelve a consultar
    ///
    /// Devuelve `false` cuando la recarga llegó tarde y se descartó.
    pub async fn set_filters(&mut self, filters: BlockFilters) -> AppResult<bool> {
        let table_changed = filters.table_id != self.filters.table_id;
        self.filters = filters;
        self.list.paginator_mut().reset();
        if table_changed {
            self.refresh().await
        } else {
            Ok(true)
        }
    }

    pub fn sort_by(&mut self, key: BlockSort) {
        self.list.set_sort(key);
    }

    pub fn set_page(&mut self, page: usize) {
        let total = self.visible().len();
        self.list.paginator_mut().set_page(page, total);
    }

    pub fn visible(&self) -> Vec<&Block> {
        self.list.filtered(|b| self.filters.matches(b), compare_blocks)
    }

    pub fn page(&self) -> Page<'_, Block> {
        self.list.page(|b| self.filters.matches(b), compare_blocks)
    }

    pub async fn create(&mut self, data: &NewBlock) -> AppResult<Block> {
        self.list.ensure_open()?;
        validate_new_block(data)?;

        let block = self
            .api
            .create_block(data)
            .await
            .log_error_context("creating block")?;

        tracing::info!(block_id = block.id, table_id = block.table_id, "Block created");
        self.refresh().await.best_effort("reloading blocks");
        Ok(block)
    }

    pub async fn activate(&mut self, id: i64) -> AppResult<()> {
        self.set_active(id, true).await
    }

    pub async fn deactivate(&mut self, id: i64) -> AppResult<()> {
        self.set_active(id, false).await
    }

    async fn set_active(&mut self, id: i64, active: bool) -> AppResult<()> {
        self.list.ensure_open()?;

        let result = if active {
            self.api.activate_block(id).await
        } else {
            self.api.deactivate_block(id).await
        };
        result.log_error_context("toggling block")?;

        // Las rutas de activación no devuelven el bloqueo: se ajusta localmente
        if let Some(mut block) = self.list.find(|b| b.id == id).cloned() {
            block.active = active;
            self.list.patch(block, |a, b| a.id == b.id);
        }
        tracing::info!(block_id = id, active, "Block state changed");
        self.refresh().await.best_effort("reloading blocks");
        Ok(())
    }

    /// Elimina un bloqueo tras confirmación
    pub async fn delete(&mut self, id: i64, confirmer: &mut dyn Confirmer) -> AppResult<ActionOutcome<()>> {
        self.list.ensure_open()?;

        let prompt = match self.list.find(|b| b.id == id) {
            Some(block) => format!(
                "¿Eliminar el bloqueo de la mesa {} ({})?",
                block.table_number, block.reason
            ),
            None => format!("¿Eliminar el bloqueo {}?", id),
        };
        if !confirmer.confirm(&prompt) {
            return Ok(ActionOutcome::Declined);
        }

        self.api
            .delete_block(id)
            .await
            .log_error_context("deleting block")?;

        tracing::info!(block_id = id, "Block deleted");
        self.list.remove_where(|b| b.id == id);
        self.refresh().await.best_effort("reloading blocks");
        Ok(ActionOutcome::Applied(()))
    }

    pub fn teardown(&mut self) {
        self.list.teardown();
    }
}

impl Refreshable for BlockList {
    type Item = Block;

    fn begin_refresh(&mut self) -> PendingFetch<Block> {
        let ticket = self.list.begin_fetch();
        let api = self.api.clone();
        // La vigencia y la categoría se filtran en memoria
        let query = BlockQuery {
            active: None,
            table_id: self.filters.table_id,
        };
        PendingFetch::new(ticket, async move { api.list_blocks(&query).await })
    }

    fn apply_fetch(&mut self, ticket: Ticket, result: AppResult<Vec<Block>>) -> AppResult<bool> {
        self.list.finish_fetch(ticket, result)
    }

    fn teardown(&mut self) {
        self.list.teardown();
    }
}
