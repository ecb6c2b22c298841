//! Feature catalog: the ordered list of columns the engine may reason over.

use serde::{Deserialize, Serialize};

/// Declared semantic type of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Binary,
    Ordinal,
    Continuous,
    Categorical,
}

impl SemanticType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Ordinal => "ordinal",
            Self::Continuous => "continuous",
            Self::Categorical => "categorical",
        }
    }
}

/// One catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub name: String,
    pub semantic_type: SemanticType,
    pub description: Option<String>,
}

impl FeatureSpec {
    pub fn new(name: impl Into<String>, semantic_type: SemanticType) -> Self {
        Self {
            name: name.into(),
            semantic_type,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Ordered, immutable feature catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureCatalog {
    features: Vec<FeatureSpec>,
}

impl FeatureCatalog {
    pub fn new(features: Vec<FeatureSpec>) -> Self {
        Self { features }
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureSpec> {
        self.features.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.features.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.features.iter().any(|f| f.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&FeatureSpec> {
        self.features.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
