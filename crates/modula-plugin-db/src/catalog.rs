use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::description::{DescriptionKey, PluginDescription};

const CATALOG_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct CatalogDocument {
    version: u32,
    plugins: Vec<PluginDescription>,
}

/// Ordered, de-duplicated collection of known plugin descriptions.
///
/// The catalog is shared between the session facade, the scanner and any UI
/// observer, so its state sits behind a mutex and every method takes `&self`.
/// Mutation is still expected to happen on a single coordinating thread; the
/// lock only makes concurrent snapshots safe.
#[derive(Debug, Default)]
pub struct PluginCatalog {
    inner: Mutex<Vec<PluginDescription>>,
}

impl PluginCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a description, replacing any existing entry with the same
    /// `(format, id)` key in place. Last write wins; catalog position of a
    /// replaced entry is preserved. Returns `true` when the entry was new.
    pub fn add(&self, description: PluginDescription) -> bool {
        let mut plugins = self.inner.lock();
        if let Some(existing) = plugins
            .iter_mut()
            .find(|entry| entry.key() == description.key())
        {
            *existing = description;
            false
        } else {
            plugins.push(description);
            true
        }
    }

    pub fn contains(&self, key: &DescriptionKey) -> bool {
        self.inner.lock().iter().any(|entry| &entry.key() == key)
    }

    /// Full ordered snapshot of the catalog.
    pub fn descriptions(&self) -> Vec<PluginDescription> {
        self.inner.lock().clone()
    }

    pub fn descriptions_for_format(&self, format: &str) -> Vec<PluginDescription> {
        self.inner
            .lock()
            .iter()
            .filter(|entry| entry.format == format)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Serializes the whole catalog into a versioned JSON document.
    pub fn serialize(&self) -> Value {
        let document = CatalogDocument {
            version: CATALOG_VERSION,
            plugins: self.inner.lock().clone(),
        };
        serde_json::to_value(&document).unwrap_or_else(|_| Value::Null)
    }

    /// Replaces the catalog contents with the entries parsed from `document`.
    ///
    /// The parse is tolerant: a malformed entry is skipped and logged, never
    /// an error that aborts the restore. Entries sharing a key are collapsed,
    /// last write wins. Returns the number of entries restored.
    pub fn restore(&self, document: &Value) -> usize {
        let mut restored: Vec<PluginDescription> = Vec::new();
        let entries = document
            .get("plugins")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        for entry in entries {
            match serde_json::from_value::<PluginDescription>(entry.clone()) {
                Ok(description) => {
                    if let Some(existing) = restored
                        .iter_mut()
                        .find(|known| known.key() == description.key())
                    {
                        *existing = description;
                    } else {
                        restored.push(description);
                    }
                }
                Err(err) => {
                    log::warn!("skipping malformed catalog entry: {err}");
                }
            }
        }
        let count = restored.len();
        *self.inner.lock() = restored;
        count
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn description(id: &str, name: &str) -> PluginDescription {
        PluginDescription::new(id, name, "Modula", format!("builtin:{id}"))
    }

    #[test]
    fn add_is_idempotent_per_key() {
        let catalog = PluginCatalog::new();
        assert!(catalog.add(description("a", "A")));
        assert!(!catalog.add(description("a", "A")));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn same_key_last_write_wins_preserving_position() {
        let catalog = PluginCatalog::new();
        catalog.add(description("a", "A"));
        catalog.add(description("b", "B"));
        let mut replacement = description("a", "A2");
        replacement.path = "/somewhere/else".into();
        catalog.add(replacement);
        let entries = catalog.descriptions();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "A2");
        assert_eq!(entries[0].path, "/somewhere/else");
        assert_eq!(entries[1].name, "B");
    }

    #[test]
    fn serialize_restore_roundtrip() {
        let catalog = PluginCatalog::new();
        catalog.add(description("a", "A").with_vendor("Acme").as_instrument());
        catalog.add(description("b", "B").with_channels(2, 2));
        let document = catalog.serialize();

        let restored = PluginCatalog::new();
        restored.add(description("stale", "Stale"));
        assert_eq!(restored.restore(&document), 2);
        assert_eq!(restored.descriptions(), catalog.descriptions());
    }

    #[test]
    fn restore_skips_malformed_entries() {
        let catalog = PluginCatalog::new();
        let document = json!({
            "version": 1,
            "plugins": [
                {
                    "id": "ok",
                    "name": "Ok",
                    "format": "Modula",
                    "path": "builtin:ok",
                    "vendor": null,
                    "version": null,
                    "is_instrument": false,
                    "num_inputs": 0,
                    "num_outputs": 2
                },
                { "name": "missing fields" },
                "not even an object"
            ]
        });
        assert_eq!(catalog.restore(&document), 1);
        assert_eq!(catalog.descriptions()[0].id, "ok");
    }

    #[test]
    fn restore_of_garbage_document_yields_empty_catalog() {
        let catalog = PluginCatalog::new();
        catalog.add(description("a", "A"));
        assert_eq!(catalog.restore(&json!({"unexpected": true})), 0);
        assert!(catalog.is_empty());
    }
}
