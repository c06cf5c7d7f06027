//! # Almacenamiento local
//!
//! Pares clave/valor persistidos del lado del cliente. Se usan dos almacenes:
//!
//! - sesión: token y resumen del usuario (sobrevive entre ejecuciones)
//! - filtros: selección de filtros de cada vista
//!
//! [`FileStore`] guarda un mapa JSON en disco; [`MemoryStore`] sirve para
//! pruebas y para ejecuciones sin estado.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::api::{AppError, AppResult};

pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: String) -> AppResult<()>;

    fn remove(&mut self, key: &str) -> AppResult<()>;

    /// Lee y deserializa un valor JSON
    ///
    /// Un valor corrupto se informa como error para que quien llama decida
    /// si descartarlo.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>>
    where
        Self: Sized,
    {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        }
    }

    fn set_json<T: Serialize>(&mut self, key: &str, value: &T) -> AppResult<()>
    where
        Self: Sized,
    {
        let raw = serde_json::to_string(value)?;
        self.set(key, raw)
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    data: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.data.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> AppResult<()> {
        self.data.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> AppResult<()> {
        self.data.remove(key);
        Ok(())
    }
}

/// Mapa JSON en un archivo; cada escritura reescribe el archivo completo
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    data: BTreeMap<String, String>,
}

impl FileStore {
    /// Abre el archivo, o parte vacío si no existe o está corrupto
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();

        let data = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| AppError::storage("read_store", e))?;
            match serde_json::from_str(&content) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Corrupt store file, starting empty");
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::storage("create_store_dir", e))?;
        }
        let content = serde_json::to_string_pretty(&self.data)?;
        std::fs::write(&self.path, content).map_err(|e| AppError::storage("write_store", e))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.data.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> AppResult<()> {
        self.data.insert(key.to_string(), value);
        self.save()
    }

    fn remove(&mut self, key: &str) -> AppResult<()> {
        if self.data.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_store_persists_between_opens() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let mut store = FileStore::open(&path).unwrap();
        store.set("clave", "valor".to_string()).unwrap();
        store.set_json("numeros", &vec![1, 2, 3]).unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("clave").as_deref(), Some("valor"));
        let numbers: Option<Vec<i32>> = reopened.get_json("numeros").unwrap();
        assert_eq!(numbers, Some(vec![1, 2, 3]));
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{no es json").unwrap();

        let store = FileStore::open(&path).unwrap();
        assert!(store.get("clave").is_none());
    }

    #[test]
    fn remove_deletes_key() {
        let mut store = MemoryStore::new();
        store.set("a", "1".to_string()).unwrap();
        store.remove("a").unwrap();
        assert!(store.get("a").is_none());
        store.remove("a").unwrap();
    }

    #[test]
    fn corrupt_json_value_is_an_error() {
        let mut store = MemoryStore::new();
        store.set("a", "no-json".to_string()).unwrap();
        let value: AppResult<Option<Vec<i32>>> = store.get_json("a");
        assert!(value.is_err());
    }
}
