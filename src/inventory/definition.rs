use serde::Deserialize;

use crate::error::DataError;

// ============================================================================
// Raw Item Definition (direct from TOML)
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RawItemDefinition {
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub max_stack: Option<i32>,
    pub weight: Option<f32>,
    #[serde(default)]
    pub usable: bool,
}

// ============================================================================
// Resolved Item Definition
// ============================================================================

const DEFAULT_MAX_STACK: i32 = 1;
const DEFAULT_WEIGHT: f32 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct ItemDefinition {
    pub id: String,
    pub display_name: String,
    pub description: String,
    /// Units one inventory slot can hold (1 = not stackable)
    pub max_stack_size: i32,
    /// Weight of a single unit
    pub weight: f32,
    pub usable: bool,
}

impl ItemDefinition {
    pub fn new(id: &str, max_stack_size: i32) -> Self {
        Self {
            id: id.to_string(),
            display_name: id.to_string(),
            description: String::new(),
            max_stack_size: max_stack_size.max(1),
            weight: DEFAULT_WEIGHT,
            usable: false,
        }
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight.max(0.0);
        self
    }

    pub fn with_usable(mut self, usable: bool) -> Self {
        self.usable = usable;
        self
    }

    pub fn from_raw(id: &str, raw: &RawItemDefinition) -> Result<Self, DataError> {
        let max_stack_size = raw.max_stack.unwrap_or(DEFAULT_MAX_STACK);
        if max_stack_size < 1 {
            return Err(DataError::invalid(id, format!("max_stack must be >= 1, got {}", max_stack_size)));
        }

        let weight = raw.weight.unwrap_or(DEFAULT_WEIGHT);
        if weight.is_nan() || weight < 0.0 {
            return Err(DataError::invalid(id, format!("weight must be >= 0, got {}", weight)));
        }

        Ok(Self {
            id: id.to_string(),
            display_name: raw.display_name.clone()
                .unwrap_or_else(|| id.to_string()),
            description: raw.description.clone()
                .unwrap_or_default(),
            max_stack_size,
            weight,
            usable: raw.usable,
        })
    }

    /// Check if this item stacks beyond a single unit
    pub fn is_stackable(&self) -> bool {
        self.max_stack_size > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_applies_defaults() {
        let raw: RawItemDefinition = toml::from_str("display_name = \"Rope\"").unwrap();
        let item = ItemDefinition::from_raw("rope", &raw).unwrap();

        assert_eq!(item.display_name, "Rope");
        assert_eq!(item.max_stack_size, 1);
        assert!(!item.is_stackable());
        assert!(!item.usable);
    }

    #[test]
    fn test_from_raw_rejects_bad_values() {
        let raw: RawItemDefinition = toml::from_str("max_stack = 0").unwrap();
        assert!(ItemDefinition::from_raw("dust", &raw).is_err());

        let raw: RawItemDefinition = toml::from_str("weight = -1.0").unwrap();
        assert!(ItemDefinition::from_raw("feather", &raw).is_err());
    }
}
