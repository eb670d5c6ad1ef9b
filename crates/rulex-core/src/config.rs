use serde::{Deserialize, Serialize};

use rulex_model::LABEL_NETWORK_ID;

/// Rule editor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Label injected by the surrounding system and hidden from the threshold editor.
    pub reserved_label: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            reserved_label: LABEL_NETWORK_ID.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reserves_network_id() {
        assert_eq!(EditorConfig::default().reserved_label, "networkID");
    }

    #[test]
    fn serde_uses_defaults_for_missing_fields() {
        let cfg: EditorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, EditorConfig::default());

        let cfg: EditorConfig = serde_json::from_str(r#"{"reservedLabel":"tenant"}"#).unwrap();
        assert_eq!(cfg.reserved_label, "tenant");
    }
}
