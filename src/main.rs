//! # Reservas
//!
//! Cliente de terminal del sistema de reservas de mesas de un restaurante.
//!
//! ## Configuración
//!
//! Variables de entorno (archivo `.env`), con prioridad de las opciones de
//! línea de comandos:
//!
//! ```env
//! RESERVAS_API_URL=http://localhost:8000/api
//! RESERVAS_TIMEOUT_SECS=30
//! RESERVAS_DATA_DIR=/home/usuario/.reservas
//! RESERVAS_PAGE_SIZE=10
//! RESERVAS_AUTO_REFRESH_SECS=30
//!
//! # Logging
//! RUST_LOG=reservas_cliente=debug
//! ```
//!
//! ## Ejecución
//!
//! ```bash
//! # Reserva sin cuenta: primero los horarios, luego la reserva
//! reservas book --name "Ana Rojas" --rut 11.111.111-1 --phone "+56 9 1234 5678" \
//!     --email ana@correo.cl --date 2026-10-24 --party 4
//! reservas book ... --time 20:00
//!
//! # Personal
//! reservas login mesero1
//! reservas reservations list --date 2026-10-24 --watch
//! reservas reservations status 42 activa
//! reservas calendar --month 2026-10 --day 2026-10-24
//! ```

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use reservas_cliente::api::{AppResult, ResultExt};
use reservas_cliente::Config;

mod cli;

use cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    if let Err(e) = init_tracing() {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    let cli = Cli::parse();
    let config = Config::from_env().with_overrides(cli.api_url.clone(), cli.data_dir.clone(), cli.timeout);
    tracing::debug!(api_url = %config.api_url, data_dir = %config.data_dir.display(), "Configuration loaded");

    match cli::run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::debug!(error = ?error, "Command failed");
            eprintln!("{}", error.user_message());
            ExitCode::FAILURE
        }
    }
}

/// Logs a stderr para no mezclarlos con la salida de los comandos
fn init_tracing() -> AppResult<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("reservas_cliente=info".parse::<Directive>().map_err_internal("Invalid log directive")?)
        .add_directive("reqwest=warn".parse::<Directive>().map_err_internal("Invalid log directive")?);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
