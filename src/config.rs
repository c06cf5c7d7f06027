//! # Configuración
//!
//! El cliente se configura mediante variables de entorno (archivo `.env`):
//!
//! ```env
//! # Backend
//! RESERVAS_API_URL=http://localhost:8000/api
//! RESERVAS_TIMEOUT_SECS=30
//!
//! # Estado local (sesión y filtros)
//! RESERVAS_DATA_DIR=/home/usuario/.reservas
//!
//! # Listados
//! RESERVAS_PAGE_SIZE=10
//! RESERVAS_AUTO_REFRESH_SECS=30
//!
//! # Logging
//! RUST_LOG=reservas_cliente=debug
//! ```
//!
//! Las opciones de línea de comandos tienen prioridad sobre el entorno.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:8000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone)]
pub struct Config {
    /// URL base de la API REST, con su prefijo
    pub api_url: String,
    /// Directorio de la sesión persistida y de los filtros
    pub data_dir: PathBuf,
    /// Timeout de cada solicitud HTTP
    pub timeout: Duration,
    /// Filas por página en los listados
    pub page_size: usize,
    /// Intervalo de auto-refresco; `None` lo desactiva
    pub auto_refresh: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            data_dir: default_data_dir(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            page_size: DEFAULT_PAGE_SIZE,
            auto_refresh: None,
        }
    }
}

impl Config {
    /// Lee la configuración desde las variables de entorno
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Igual que [`Config::from_env`] pero con una fuente de variables arbitraria
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let api_url = lookup("RESERVAS_API_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(defaults.api_url);

        let data_dir = lookup("RESERVAS_DATA_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let timeout_secs = parse_or_default(&lookup, "RESERVAS_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS);
        let page_size = parse_or_default(&lookup, "RESERVAS_PAGE_SIZE", DEFAULT_PAGE_SIZE).max(1);
        let refresh_secs: u64 = parse_or_default(&lookup, "RESERVAS_AUTO_REFRESH_SECS", 0);

        Self {
            api_url,
            data_dir,
            timeout: Duration::from_secs(timeout_secs),
            page_size,
            auto_refresh: (refresh_secs > 0).then(|| Duration::from_secs(refresh_secs)),
        }
    }

    /// Aplica las opciones recibidas por línea de comandos
    pub fn with_overrides(
        mut self,
        api_url: Option<String>,
        data_dir: Option<PathBuf>,
        timeout_secs: Option<u64>,
    ) -> Self {
        if let Some(url) = api_url {
            self.api_url = url;
        }
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        if let Some(secs) = timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        self
    }

    /// Archivo con el token y el resumen del usuario
    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }

    /// Archivo con los filtros elegidos en cada vista
    pub fn filters_path(&self) -> PathBuf {
        self.data_dir.join("filtros.json")
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".reservas"))
        .unwrap_or_else(|| PathBuf::from(".reservas"))
}

fn parse_or_default<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(name) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(variable = %name, value = %raw, default = %default, "Invalid value, using default");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = Config::from_lookup(lookup_from(&[]));
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.page_size, 10);
        assert!(config.auto_refresh.is_none());
    }

    #[test]
    fn reads_values_and_ignores_garbage() {
        let config = Config::from_lookup(lookup_from(&[
            ("RESERVAS_API_URL", "https://reservas.example.cl/api"),
            ("RESERVAS_DATA_DIR", "/tmp/reservas"),
            ("RESERVAS_TIMEOUT_SECS", "abc"),
            ("RESERVAS_PAGE_SIZE", "25"),
            ("RESERVAS_AUTO_REFRESH_SECS", "15"),
        ]));
        assert_eq!(config.api_url, "https://reservas.example.cl/api");
        assert_eq!(config.session_path(), PathBuf::from("/tmp/reservas/session.json"));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.page_size, 25);
        assert_eq!(config.auto_refresh, Some(Duration::from_secs(15)));
    }

    #[test]
    fn command_line_overrides_environment() {
        let config = Config::from_lookup(lookup_from(&[("RESERVAS_API_URL", "http://a/api")]))
            .with_overrides(Some("http://b/api".to_string()), None, Some(5));
        assert_eq!(config.api_url, "http://b/api");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
