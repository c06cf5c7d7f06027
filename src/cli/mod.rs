//! # Línea de comandos
//!
//! Cada subcomando corresponde a una pantalla. Las opciones globales tienen
//! prioridad sobre las variables de entorno.

mod commands;
mod render;

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};

use reservas_cliente::models::{BlockCategory, ReservationStatus, Role, TableStatus};

pub use commands::run;

#[derive(Parser, Debug)]
#[command(name = "reservas", about = "Cliente del sistema de reservas de mesas", version)]
pub struct Cli {
    /// URL base de la API (por ejemplo http://localhost:8000/api)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Directorio de la sesión y los filtros guardados
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Timeout de cada solicitud, en segundos
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Confirmar sin preguntar las acciones destructivas
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Iniciar sesión
    Login {
        username: String,
        /// Si se omite se pide por la entrada estándar
        #[arg(long)]
        password: Option<String>,
    },
    /// Crear una cuenta de cliente
    Register(RegisterArgs),
    /// Cerrar la sesión
    Logout,
    /// Mostrar la sesión actual y sus pestañas
    Whoami,
    /// Reservar sin cuenta
    Book(BookArgs),
    /// Activar la cuenta de una reserva sin cuenta
    Activate {
        token: String,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Panel de reservas del personal
    #[command(subcommand)]
    Reservations(ReservationsCommand),
    /// Reservas propias
    #[command(subcommand)]
    Mine(MineCommand),
    /// Nueva reserva con la sesión actual
    New(NewArgs),
    /// Gestión de mesas
    #[command(subcommand)]
    Tables(TablesCommand),
    /// Calendario mensual de ocupación
    Calendar {
        /// Mes a mostrar (AAAA-MM); por defecto el actual
        #[arg(long)]
        month: Option<String>,
        /// Detalle de un día
        #[arg(long)]
        day: Option<NaiveDate>,
    },
    /// Bloqueos de mesas
    #[command(subcommand)]
    Blocks(BlocksCommand),
    /// Gestión de usuarios
    #[command(subcommand)]
    Users(UsersCommand),
    /// Perfil del usuario
    #[command(subcommand)]
    Profile(ProfileCommand),
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    pub username: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub first_name: String,
    #[arg(long)]
    pub last_name: String,
    #[arg(long)]
    pub phone: String,
    #[arg(long)]
    pub rut: String,
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Args, Debug)]
pub struct BookArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub rut: String,
    #[arg(long)]
    pub phone: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub date: NaiveDate,
    /// Hora HH:MM; si se omite se listan los horarios disponibles
    #[arg(long, value_parser = parse_time)]
    pub time: Option<NaiveTime>,
    #[arg(long, default_value_t = 2)]
    pub party: u32,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args, Debug)]
pub struct NewArgs {
    #[arg(long)]
    pub date: NaiveDate,
    #[arg(long, value_parser = parse_time)]
    pub time: Option<NaiveTime>,
    #[arg(long, default_value_t = 2)]
    pub party: u32,
    /// Id de la mesa; si se omite se listan las disponibles
    #[arg(long)]
    pub table: Option<i64>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct WatchArgs {
    /// Recargar periódicamente hasta Ctrl-C
    #[arg(long)]
    pub watch: bool,
    #[arg(long, default_value_t = 1)]
    pub page: usize,
}

#[derive(Subcommand, Debug)]
pub enum ReservationsCommand {
    List {
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        status: Option<ReservationStatus>,
        #[arg(long)]
        search: Option<String>,
        /// date, time, client, party o status
        #[arg(long)]
        sort: Option<String>,
        /// Descarta los filtros guardados
        #[arg(long)]
        reset: bool,
        #[command(flatten)]
        watch: WatchArgs,
    },
    Status {
        id: i64,
        status: ReservationStatus,
    },
}

#[derive(Subcommand, Debug)]
pub enum MineCommand {
    List,
    Cancel { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum TablesCommand {
    List {
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, value_parser = parse_time)]
        time: Option<NaiveTime>,
        #[arg(long)]
        party: Option<u32>,
        #[arg(long)]
        status: Option<TableStatus>,
        /// number, capacity o status
        #[arg(long)]
        sort: Option<String>,
        #[command(flatten)]
        watch: WatchArgs,
    },
    Status {
        id: i64,
        status: TableStatus,
    },
}

#[derive(Subcommand, Debug)]
pub enum BlocksCommand {
    List {
        #[arg(long)]
        active: Option<bool>,
        #[arg(long)]
        category: Option<BlockCategory>,
        #[arg(long)]
        table: Option<i64>,
    },
    Create {
        #[arg(long)]
        table: i64,
        #[arg(long)]
        from: NaiveDate,
        /// Por defecto el mismo día de inicio
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long, value_parser = parse_time)]
        start: Option<NaiveTime>,
        #[arg(long, value_parser = parse_time)]
        end: Option<NaiveTime>,
        #[arg(long)]
        reason: String,
        #[arg(long, default_value = "otro")]
        category: BlockCategory,
        #[arg(long, default_value = "")]
        notes: String,
    },
    Activate { id: i64 },
    Deactivate { id: i64 },
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        role: Option<Role>,
    },
    Role { id: i64, role: Role },
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    Show,
    Update {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        rut: Option<String>,
    },
}

fn parse_time(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| format!("hora inválida '{}', use HH:MM", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_subcommands() {
        let cli = Cli::try_parse_from([
            "reservas",
            "--yes",
            "reservations",
            "status",
            "12",
            "cancelada",
        ])
        .unwrap();
        assert!(cli.yes);
        match cli.command {
            Command::Reservations(ReservationsCommand::Status { id, status }) => {
                assert_eq!(id, 12);
                assert_eq!(status, ReservationStatus::Cancelled);
            }
            other => panic!("comando inesperado: {:?}", other),
        }
    }

    #[test]
    fn time_accepts_hours_and_minutes() {
        assert_eq!(parse_time("20:30"), Ok(NaiveTime::from_hms_opt(20, 30, 0).unwrap()));
        assert!(parse_time("8pm").is_err());
    }

    #[test]
    fn watch_flag_is_flattened() {
        let cli = Cli::try_parse_from(["reservas", "tables", "list", "--watch", "--party", "4"]).unwrap();
        match cli.command {
            Command::Tables(TablesCommand::List { watch, party, .. }) => {
                assert!(watch.watch);
                assert_eq!(party, Some(4));
            }
            other => panic!("comando inesperado: {:?}", other),
        }
    }
}
