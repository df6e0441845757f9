use serde::{Deserialize, Serialize};

/// De-duplication identity of a description: unique id scoped to one format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DescriptionKey {
    pub format: String,
    pub id: String,
}

impl DescriptionKey {
    pub fn new(format: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            id: id.into(),
        }
    }
}

/// Metadata identifying one discoverable plugin without loading it.
///
/// Descriptions are produced by format backends during scanning and are
/// immutable afterwards. The `format` field holds the registered name of the
/// owning backend; `path` is a file location or a backend-specific URI such
/// as `builtin:modula.sine`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDescription {
    pub id: String,
    pub name: String,
    pub format: String,
    pub path: String,
    pub vendor: Option<String>,
    pub version: Option<String>,
    pub is_instrument: bool,
    pub num_inputs: u32,
    pub num_outputs: u32,
}

impl PluginDescription {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        format: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            format: format.into(),
            path: path.into(),
            vendor: None,
            version: None,
            is_instrument: false,
            num_inputs: 0,
            num_outputs: 2,
        }
    }

    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_channels(mut self, num_inputs: u32, num_outputs: u32) -> Self {
        self.num_inputs = num_inputs;
        self.num_outputs = num_outputs;
        self
    }

    pub fn as_instrument(mut self) -> Self {
        self.is_instrument = true;
        self
    }

    pub fn key(&self) -> DescriptionKey {
        DescriptionKey::new(self.format.clone(), self.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn description_roundtrip() {
        let description = PluginDescription::new("modula.sine", "Sine", "Modula", "builtin:modula.sine")
            .with_vendor("Modula Labs")
            .as_instrument();
        let json = serde_json::to_string(&description).unwrap();
        let roundtrip: PluginDescription = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip, description);
    }

    #[test]
    fn key_is_scoped_to_format() {
        let a = PluginDescription::new("x", "X", "Modula", "/tmp/a");
        let b = PluginDescription::new("x", "X", "LV2", "/tmp/b");
        assert_ne!(a.key(), b.key());
    }
}
