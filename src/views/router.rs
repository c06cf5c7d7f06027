//! # Selección de vista
//!
//! Decide qué pantalla se muestra según el estado de autenticación y el rol.
//! Sin sesión sólo se ofrecen las pantallas públicas; con sesión, cada rol
//! tiene su conjunto de pestañas.

use std::fmt;

use crate::api::{AppError, AppResult};
use crate::models::{Role, Session};

/// Pestañas disponibles con sesión iniciada
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    NewReservation,
    MyReservations,
    ReservationsPanel,
    Calendar,
    Tables,
    Users,
    Blocks,
    Profile,
}

const CLIENT_TABS: &[Tab] = &[Tab::NewReservation, Tab::MyReservations, Tab::Profile];

const STAFF_TABS: &[Tab] = &[
    Tab::ReservationsPanel,
    Tab::Calendar,
    Tab::Tables,
    Tab::Profile,
];

const ADMIN_TABS: &[Tab] = &[
    Tab::ReservationsPanel,
    Tab::Calendar,
    Tab::Tables,
    Tab::Users,
    Tab::Blocks,
    Tab::Profile,
];

impl Tab {
    pub fn label(&self) -> &'static str {
        match self {
            Tab::NewReservation => "Nueva reserva",
            Tab::MyReservations => "Mis reservas",
            Tab::ReservationsPanel => "Reservas",
            Tab::Calendar => "Calendario",
            Tab::Tables => "Mesas",
            Tab::Users => "Usuarios",
            Tab::Blocks => "Bloqueos",
            Tab::Profile => "Perfil",
        }
    }

    /// Pestañas del rol, en el orden en que se muestran
    pub fn for_role(role: Role) -> &'static [Tab] {
        match role {
            Role::Client => CLIENT_TABS,
            Role::Waiter | Role::Cashier => STAFF_TABS,
            Role::Admin => ADMIN_TABS,
        }
    }

    pub fn allowed_for(&self, role: Role) -> bool {
        Tab::for_role(role).contains(self)
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pantalla seleccionada
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Register,
    PublicReservation,
    Activation,
    Tab(Tab),
}

impl Screen {
    pub fn is_public(&self) -> bool {
        !matches!(self, Screen::Tab(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Router {
    current: Screen,
}

impl Default for Router {
    fn default() -> Self {
        Self {
            current: Screen::Login,
        }
    }
}

impl Router {
    pub fn new(session: Option<&Session>) -> Self {
        let mut router = Self::default();
        router.on_session_change(session);
        router
    }

    pub fn current(&self) -> Screen {
        self.current
    }

    /// Pestañas visibles para la sesión actual
    pub fn tabs(session: Option<&Session>) -> &'static [Tab] {
        session.map(|s| Tab::for_role(s.role)).unwrap_or(&[])
    }

    /// Pantalla que corresponde a una pestaña pedida
    ///
    /// # Errores
    /// - `Forbidden`: La pestaña no pertenece al rol de la sesión
    pub fn resolve(session: Option<&Session>, tab: Tab) -> AppResult<Screen> {
        let Some(session) = session else {
            return Ok(Screen::Login);
        };

        if tab.allowed_for(session.role) {
            Ok(Screen::Tab(tab))
        } else {
            tracing::warn!(role = %session.role.as_wire(), tab = ?tab, "Tab not allowed for role");
            Err(AppError::Forbidden(format!(
                "El rol {} no tiene acceso a {}",
                session.role.display_name(),
                tab.label()
            )))
        }
    }

    pub fn navigate(&mut self, session: Option<&Session>, tab: Tab) -> AppResult<Screen> {
        let screen = Self::resolve(session, tab)?;
        self.current = screen;
        Ok(screen)
    }

    /// Abre una pantalla pública
    ///
    /// Con sesión iniciada las pantallas públicas no aplican y se vuelve a la
    /// pestaña inicial del rol.
    pub fn open_public(&mut self, session: Option<&Session>, screen: Screen) -> Screen {
        self.current = match session {
            Some(session) => Screen::Tab(Tab::for_role(session.role)[0]),
            None if screen.is_public() => screen,
            None => Screen::Login,
        };
        self.current
    }

    /// Ajusta la pantalla tras iniciar o cerrar sesión
    pub fn on_session_change(&mut self, session: Option<&Session>) {
        self.current = match session {
            None => Screen::Login,
            Some(session) => match self.current {
                Screen::Tab(tab) if tab.allowed_for(session.role) => Screen::Tab(tab),
                _ => Screen::Tab(Tab::for_role(session.role)[0]),
            },
        };
    }
}
