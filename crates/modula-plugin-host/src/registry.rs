use crate::format::PluginFormat;
use crate::internal::InternalPluginFormat;

/// Ordered collection of format backends, addressed by name.
///
/// Insertion order is preserved and lookups are a linear scan, so a duplicate
/// name shadows later registrations only in the sense that the first match
/// wins. `add_default_formats` appends unconditionally; calling it more than
/// once is the caller's bug.
#[derive(Default)]
pub struct FormatRegistry {
    formats: Vec<Box<dyn PluginFormat>>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the baseline backends for this build: the native Modula
    /// format, plus LV2 when compiled in.
    pub fn add_default_formats(&mut self) {
        self.add_format(Box::new(InternalPluginFormat::new()));
        #[cfg(feature = "lv2")]
        self.add_format(Box::new(crate::lv2::Lv2PluginFormat::new()));
    }

    pub fn add_format(&mut self, format: Box<dyn PluginFormat>) {
        self.formats.push(format);
    }

    /// First backend whose name equals `name` exactly, in registration order.
    pub fn find_by_name(&self, name: &str) -> Option<&dyn PluginFormat> {
        self.formats
            .iter()
            .find(|format| format.name() == name)
            .map(Box::as_ref)
    }

    pub fn get(&self, index: usize) -> Option<&dyn PluginFormat> {
        self.formats.get(index).map(Box::as_ref)
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn PluginFormat> {
        self.formats.iter().map(Box::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use modula_plugin_db::PluginDescription;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::{InstantiateError, ProbeError};
    use crate::format::PluginProcessor;
    use crate::internal::INTERNAL_FORMAT_NAME;
    use crate::PlayConfig;

    struct NamedFormat {
        name: &'static str,
        marker: &'static str,
    }

    impl PluginFormat for NamedFormat {
        fn name(&self) -> &str {
            self.name
        }

        fn default_search_locations(&self) -> Vec<PathBuf> {
            vec![PathBuf::from(self.marker)]
        }

        fn scan_candidate(&self, _path: &Path) -> Result<Vec<PluginDescription>, ProbeError> {
            Ok(Vec::new())
        }

        fn instantiate(
            &self,
            _description: &PluginDescription,
            _config: PlayConfig,
        ) -> Result<Box<dyn PluginProcessor>, InstantiateError> {
            Err(InstantiateError::failed("stub"))
        }
    }

    #[test]
    fn default_formats_include_the_native_backend() {
        let mut registry = FormatRegistry::new();
        registry.add_default_formats();
        assert!(registry.find_by_name(INTERNAL_FORMAT_NAME).is_some());
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let mut registry = FormatRegistry::new();
        registry.add_default_formats();
        assert!(registry.find_by_name("modula").is_none());
    }

    #[test]
    fn duplicate_names_resolve_to_first_registration() {
        let mut registry = FormatRegistry::new();
        registry.add_format(Box::new(NamedFormat {
            name: "Twin",
            marker: "first",
        }));
        registry.add_format(Box::new(NamedFormat {
            name: "Twin",
            marker: "second",
        }));
        let found = registry.find_by_name("Twin").unwrap();
        assert_eq!(found.default_search_locations(), vec![PathBuf::from("first")]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn positional_access_follows_registration_order() {
        let mut registry = FormatRegistry::new();
        registry.add_format(Box::new(NamedFormat {
            name: "A",
            marker: "a",
        }));
        registry.add_format(Box::new(NamedFormat {
            name: "B",
            marker: "b",
        }));
        assert_eq!(registry.get(0).unwrap().name(), "A");
        assert_eq!(registry.get(1).unwrap().name(), "B");
        assert!(registry.get(2).is_none());
    }
}
