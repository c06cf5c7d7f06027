//! # Filtros persistidos
//!
//! Cada vista guarda su selección de filtros bajo su propia clave, para
//! recuperarla en la siguiente ejecución. Un valor corrupto se ignora y la
//! vista parte con sus filtros por defecto.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::AppResult;
use crate::storage::KeyValueStore;

const KEY_PREFIX: &str = "filtros.";

pub struct FilterPrefs<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> FilterPrefs<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn load<T: DeserializeOwned + Default>(&self, view: &str) -> T {
        match self.store.get_json::<T>(&key(view)) {
            Ok(Some(filters)) => filters,
            Ok(None) => T::default(),
            Err(e) => {
                tracing::warn!(view = %view, error = %e, "Ignoring corrupt saved filters");
                T::default()
            }
        }
    }

    pub fn save<T: Serialize>(&mut self, view: &str, filters: &T) -> AppResult<()> {
        self.store.set_json(&key(view), filters)
    }

    pub fn clear(&mut self, view: &str) -> AppResult<()> {
        self.store.remove(&key(view))
    }
}

fn key(view: &str) -> String {
    format!("{}{}", KEY_PREFIX, view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Filters {
        search: String,
        page: usize,
    }

    #[test]
    fn saved_filters_are_loaded_back() {
        let mut prefs = FilterPrefs::new(MemoryStore::new());
        let filters = Filters {
            search: "rojas".to_string(),
            page: 2,
        };
        prefs.save("panel", &filters).unwrap();

        let loaded: Filters = prefs.load("panel");
        assert_eq!(loaded, filters);

        let other: Filters = prefs.load("otra");
        assert_eq!(other, Filters::default());
    }

    #[test]
    fn corrupt_filters_fall_back_to_default() {
        let mut store = MemoryStore::new();
        store.set("filtros.panel", "[1,2".to_string()).unwrap();
        let mut prefs = FilterPrefs::new(store);

        let loaded: Filters = prefs.load("panel");
        assert_eq!(loaded, Filters::default());

        prefs.clear("panel").unwrap();
    }
}
