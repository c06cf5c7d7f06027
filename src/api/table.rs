//! # API de Mesas
//!
//! Listado de mesas (con filtros de disponibilidad opcionales) y cambio de
//! estado operativo. La capacidad no se modifica desde la interfaz.

use chrono::{NaiveDate, NaiveTime};
use reqwest::Method;

use super::dto::{format_date, format_time, EstadoRequest, ListResponse, MesaDto};
use super::{ApiClient, AppResult};
use crate::models::{Table, TableStatus};

/// Filtros de disponibilidad
///
/// Sin filtros el backend devuelve todas las mesas; con fecha, hora y
/// personas devuelve sólo las que se pueden reservar en ese horario.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableQuery {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub party_size: Option<u32>,
}

impl TableQuery {
    pub fn availability(date: NaiveDate, time: NaiveTime, party_size: u32) -> Self {
        Self {
            date: Some(date),
            time: Some(time),
            party_size: Some(party_size),
        }
    }

    pub fn is_availability(&self) -> bool {
        self.date.is_some() && self.time.is_some()
    }

    fn to_params(self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(date) = self.date {
            params.push(("fecha", format_date(date)));
        }
        if let Some(time) = self.time {
            params.push(("hora", format_time(time)));
        }
        if let Some(party) = self.party_size {
            params.push(("personas", party.to_string()));
        }
        params
    }
}

impl ApiClient {
    pub async fn list_tables(&self, query: &TableQuery) -> AppResult<Vec<Table>> {
        let response: ListResponse<MesaDto> = self.get("mesas/", &query.to_params()).await?;
        Ok(response.into_items().into_iter().map(Table::from).collect())
    }

    /// Cambia el estado operativo de una mesa
    pub async fn update_table_status(&self, id: i64, status: TableStatus) -> AppResult<Table> {
        let dto: MesaDto = self
            .send_json(
                Method::PATCH,
                &format!("mesas/{}/estado/", id),
                &EstadoRequest {
                    estado: status.as_wire(),
                },
            )
            .await?;
        tracing::info!(table_id = id, status = %status.as_wire(), "Table status updated");
        Ok(Table::from(dto))
    }
}
