//! # Gestión de mesas
//!
//! Listado de mesas con filtros de disponibilidad opcionales (fecha, hora,
//! personas), filtro de estado y cambio de estado operativo.

use std::cmp::Ordering;

use super::list::{self, ListState, Page, PendingFetch, Refreshable, Ticket};
use crate::api::{ApiClient, AppError, AppResult, ErrorLogExt, TableQuery};
use crate::models::{Table, TableStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSort {
    Number,
    Capacity,
    Status,
}

fn compare_tables(a: &Table, b: &Table, key: TableSort) -> Ordering {
    match key {
        TableSort::Number => a.number.cmp(&b.number),
        TableSort::Capacity => a.capacity.cmp(&b.capacity).then(a.number.cmp(&b.number)),
        TableSort::Status => a.status.cmp(&b.status).then(a.number.cmp(&b.number)),
    }
}

pub struct TableManagement {
    api: ApiClient,
    availability: TableQuery,
    status_filter: Option<TableStatus>,
    list: ListState<Table, TableSort>,
}

impl TableManagement {
    pub fn new(api: ApiClient, page_size: usize) -> Self {
        let mut list = ListState::new(page_size);
        list.set_sort(TableSort::Number);
        Self {
            api,
            availability: TableQuery::default(),
            status_filter: None,
            list,
        }
    }

    pub fn list(&self) -> &ListState<Table, TableSort> {
        &self.list
    }

    pub fn availability(&self) -> &TableQuery {
        &self.availability
    }

    pub async fn refresh(&mut self) -> AppResult<bool> {
        list::refresh(self).await
    }

    /// Cambia los filtros de disponibilidad y recarga
    pub async fn set_availability(&mut self, query: TableQuery) -> AppResult<bool> {
        self.availability = query;
        self.list.paginator_mut().reset();
        self.refresh().await
    }

    pub fn set_status_filter(&mut self, status: Option<TableStatus>) {
        self.status_filter = status;
        self.list.paginator_mut().reset();
    }

    pub fn sort_by(&mut self, key: TableSort) {
        self.list.set_sort(key);
    }

    pub fn set_page(&mut self, page: usize) {
        let total = self.visible().len();
        self.list.paginator_mut().set_page(page, total);
    }

    pub fn visible(&self) -> Vec<&Table> {
        self.list.filtered(|t| self.matches(t), compare_tables)
    }

    pub fn page(&self) -> Page<'_, Table> {
        self.list.page(|t| self.matches(t), compare_tables)
    }

    fn matches(&self, table: &Table) -> bool {
        self.status_filter.map_or(true, |status| table.status == status)
    }

    /// Cambia el estado operativo de una mesa
    pub async fn change_status(&mut self, id: i64, status: TableStatus) -> AppResult<Table> {
        self.list.ensure_open()?;

        let current = self
            .list
            .find(|t| t.id == id)
            .ok_or_else(|| AppError::Validation(format!("La mesa {} no está en el listado", id)))?;
        if current.status == status {
            return Err(AppError::Validation(format!(
                "La mesa {} ya está {}",
                current.number,
                status.label().to_lowercase()
            )));
        }

        let updated = self
            .api
            .update_table_status(id, status)
            .await
            .log_error_context("changing table status")?;

        self.list.patch(updated.clone(), |a, b| a.id == b.id);
        self.refresh().await.best_effort("reloading tables");
        Ok(updated)
    }

    pub fn teardown(&mut self) {
        self.list.teardown();
    }
}

impl Refreshable for TableManagement {
    type Item = Table;

    fn begin_refresh(&mut self) -> PendingFetch<Table> {
        let ticket = self.list.begin_fetch();
        let api = self.api.clone();
        let query = self.availability;
        PendingFetch::new(ticket, async move { api.list_tables(&query).await })
    }

    fn apply_fetch(&mut self, ticket: Ticket, result: AppResult<Vec<Table>>) -> AppResult<bool> {
        self.list.finish_fetch(ticket, result)
    }

    fn teardown(&mut self) {
        self.list.teardown();
    }
}
