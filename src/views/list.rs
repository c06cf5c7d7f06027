//! # Estado común de los listados
//!
//! Todas las vistas de gestión siguen el mismo ciclo:
//!
//! 1. `begin_fetch` entrega un [`Ticket`] y marca la vista como cargando
//! 2. la solicitud se resuelve fuera de la vista
//! 3. `finish_fetch` aplica el resultado sólo si el ticket sigue vigente
//!
//! El filtrado, el orden y la paginación se hacen en memoria sobre lo último
//! que se trajo.

use std::cmp::Ordering;
use std::future::Future;
use std::pin::Pin;

use crate::api::{AppError, AppResult};

type FetchFuture<T> = Pin<Box<dyn Future<Output = AppResult<Vec<T>>> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggle(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Paginación en memoria, con páginas numeradas desde 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
    page: usize,
}

impl Paginator {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            page: 1,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// `ceil(total / page_size)`; cero cuando no hay elementos
    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.page_size)
    }

    /// Cambia de página, acotando al rango válido
    pub fn set_page(&mut self, page: usize, total: usize) {
        let last = self.page_count(total).max(1);
        self.page = page.clamp(1, last);
    }

    pub fn next(&mut self, total: usize) {
        self.set_page(self.page + 1, total);
    }

    pub fn prev(&mut self, total: usize) {
        self.set_page(self.page.saturating_sub(1), total);
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }

    /// Elementos de la página actual
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        self.slice_page(items, self.page)
    }

    /// Elementos de una página cualquiera; vacío si está fuera de rango
    pub fn slice_page<'a, T>(&self, items: &'a [T], page: usize) -> &'a [T] {
        if page == 0 {
            return &[];
        }
        let start = (page - 1).saturating_mul(self.page_size);
        if start >= items.len() {
            return &[];
        }
        let end = (start + self.page_size).min(items.len());
        &items[start..end]
    }
}

/// Comprobante de una solicitud en curso
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Contador de generaciones para descartar respuestas tardías
///
/// Cada solicitud nueva invalida las anteriores; después de `teardown`
/// ninguna respuesta se aplica.
#[derive(Debug, Default)]
pub struct RequestGuard {
    generation: u64,
    torn_down: bool,
}

impl RequestGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> Ticket {
        self.generation += 1;
        Ticket(self.generation)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        !self.torn_down && ticket.0 == self.generation
    }

    /// Deja obsoletas las solicitudes en curso sin iniciar una nueva
    pub fn invalidate(&mut self) {
        self.generation += 1;
    }

    pub fn teardown(&mut self) {
        self.torn_down = true;
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

/// Solicitud de carga ya preparada, con su ticket
///
/// La vista la crea sin esperar la respuesta; quien la posee decide cuándo
/// resolverla y devuelve el resultado a la vista con su ticket.
pub struct PendingFetch<T> {
    ticket: Ticket,
    future: FetchFuture<T>,
}

impl<T> PendingFetch<T> {
    pub fn new<F>(ticket: Ticket, future: F) -> Self
    where
        F: Future<Output = AppResult<Vec<T>>> + Send + 'static,
    {
        Self {
            ticket,
            future: Box::pin(future),
        }
    }

    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    pub async fn resolve(self) -> (Ticket, AppResult<Vec<T>>) {
        let result = self.future.await;
        (self.ticket, result)
    }
}

/// Vista que recarga su colección desde la API
pub trait Refreshable {
    type Item;

    fn begin_refresh(&mut self) -> PendingFetch<Self::Item>;

    /// Aplica una respuesta; `Ok(false)` si se descartó por tardía
    fn apply_fetch(&mut self, ticket: Ticket, result: AppResult<Vec<Self::Item>>) -> AppResult<bool>;

    /// Cierra la vista: las respuestas pendientes ya no se aplican
    fn teardown(&mut self);
}

/// Carga y aplica en un solo paso
pub async fn refresh<V: Refreshable>(view: &mut V) -> AppResult<bool> {
    let (ticket, result) = view.begin_refresh().resolve().await;
    view.apply_fetch(ticket, result)
}

/// Una página ya filtrada y ordenada, lista para mostrar
#[derive(Debug)]
pub struct Page<'a, T> {
    pub items: Vec<&'a T>,
    pub page: usize,
    pub page_count: usize,
    /// Total de elementos que pasan el filtro
    pub total: usize,
}

/// Datos traídos por una vista junto con su orden y paginación
#[derive(Debug)]
pub struct ListState<T, K> {
    items: Vec<T>,
    loading: bool,
    error: Option<String>,
    sort: Option<(K, SortDirection)>,
    paginator: Paginator,
    guard: RequestGuard,
}

impl<T, K: Copy + PartialEq> ListState<T, K> {
    pub fn new(page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
            sort: None,
            paginator: Paginator::new(page_size),
            guard: RequestGuard::new(),
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Último error de carga, como texto para el usuario
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn sort(&self) -> Option<(K, SortDirection)> {
        self.sort
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    pub fn paginator_mut(&mut self) -> &mut Paginator {
        &mut self.paginator
    }

    /// Ordena por `key`; repetir la misma clave invierte la dirección
    pub fn set_sort(&mut self, key: K) {
        self.sort = match self.sort {
            Some((current, direction)) if current == key => Some((key, direction.toggle())),
            _ => Some((key, SortDirection::Asc)),
        };
    }

    pub fn begin_fetch(&mut self) -> Ticket {
        self.loading = true;
        self.guard.begin()
    }

    /// Aplica el resultado de una carga
    ///
    /// Devuelve `Ok(false)` si la respuesta llegó tarde y se descartó. Un
    /// error se guarda para mostrarlo y se devuelve; los datos anteriores se
    /// conservan.
    pub fn finish_fetch(&mut self, ticket: Ticket, result: AppResult<Vec<T>>) -> AppResult<bool> {
        if !self.guard.is_current(ticket) {
            tracing::debug!(torn_down = self.guard.is_torn_down(), "Discarding stale list response");
            return Ok(false);
        }

        self.loading = false;
        match result {
            Ok(items) => {
                self.items = items;
                self.error = None;
                let total = self.items.len();
                let page = self.paginator.page();
                self.paginator.set_page(page, total);
                Ok(true)
            }
            Err(error) => {
                self.error = Some(error.user_message());
                Err(error)
            }
        }
    }

    /// Reemplaza localmente el registro que el servidor confirmó
    pub fn patch(&mut self, updated: T, same: impl Fn(&T, &T) -> bool) -> bool {
        match self.items.iter_mut().find(|item| same(item, &updated)) {
            Some(slot) => {
                *slot = updated;
                true
            }
            None => false,
        }
    }

    pub fn remove_where(&mut self, predicate: impl Fn(&T) -> bool) {
        self.items.retain(|item| !predicate(item));
    }

    pub fn teardown(&mut self) {
        self.guard.teardown();
        self.loading = false;
    }

    pub fn is_torn_down(&self) -> bool {
        self.guard.is_torn_down()
    }

    /// Las acciones sobre una vista cerrada no se envían
    pub fn ensure_open(&self) -> AppResult<()> {
        if self.guard.is_torn_down() {
            return Err(AppError::Internal("La vista ya fue cerrada".to_string()));
        }
        Ok(())
    }

    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<&T> {
        self.items.iter().find(|item| predicate(item))
    }

    /// Elementos que pasan el filtro, ordenados según la clave actual
    pub fn filtered<F, C>(&self, filter: F, compare: C) -> Vec<&T>
    where
        F: Fn(&T) -> bool,
        C: Fn(&T, &T, K) -> Ordering,
    {
        let mut visible: Vec<&T> = self.items.iter().filter(|item| filter(item)).collect();
        if let Some((key, direction)) = self.sort {
            // sort_by es estable: los empates conservan el orden del servidor
            visible.sort_by(|a, b| direction.apply(compare(a, b, key)));
        }
        visible
    }

    /// Página actual de los elementos filtrados y ordenados
    pub fn page<F, C>(&self, filter: F, compare: C) -> Page<'_, T>
    where
        F: Fn(&T) -> bool,
        C: Fn(&T, &T, K) -> Ordering,
    {
        let visible = self.filtered(filter, compare);
        let total = visible.len();
        let page_count = self.paginator.page_count(total);
        let page = self.paginator.page().min(page_count.max(1));
        let items = self.paginator.slice_page(&visible, page).to_vec();
        Page {
            items,
            page,
            page_count,
            total,
        }
    }
}
