//! Catalog of known data fields, used to suggest and check leaf field paths.
//!
//! The catalog is advisory. Evaluation resolves fields by walking the data
//! context and never looks at the catalog.

use serde::{Deserialize, Serialize};
use strsim::levenshtein;

use crate::lookup::walk;
use crate::model::{FieldType, FilterTree, ItemRef};

/// Maximum Levenshtein distance to consider a path as a suggestion.
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Description of one field in the data context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterField {
    pub name: String,
    /// Dot-delimited path, e.g. `user.profile.email`.
    pub path: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Allowed values, for enumerated fields.
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,
}

/// A leaf whose field path is not in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnknownField {
    pub leaf_id: String,
    pub field: String,
    /// Closest known path, if one is near enough.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// An ordered set of known fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldCatalog {
    fields: Vec<FilterField>,
}

impl FieldCatalog {
    pub fn new(fields: Vec<FilterField>) -> Self {
        Self { fields }
    }

    /// Parses a catalog from a JSON array of fields.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn fields(&self) -> &[FilterField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Finds a field by exact path.
    pub fn field_by_path(&self, path: &str) -> Option<&FilterField> {
        self.fields.iter().find(|f| f.path == path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.path.as_str())
    }

    /// Returns the closest known path to `path`.
    ///
    /// Candidates are ranked by case-insensitive distance, so a path that
    /// differs only in case is the best suggestion. An exact match, or a path
    /// further than the suggestion threshold, yields `None`.
    pub fn suggest(&self, path: &str) -> Option<&str> {
        if self.field_by_path(path).is_some() {
            return None;
        }
        let query = path.to_lowercase();
        let (best, distance) = self
            .paths()
            .filter(|candidate| !candidate.is_empty())
            .map(|candidate| (candidate, levenshtein(&query, &candidate.to_lowercase())))
            .min_by_key(|(_, distance)| *distance)?;

        (distance <= MAX_SUGGESTION_DISTANCE).then_some(best)
    }

    /// Lists the leaves of `tree` whose non-empty field is not in the catalog.
    pub fn unknown_fields(&self, tree: &FilterTree) -> Vec<UnknownField> {
        let mut unknown = Vec::new();
        walk(ItemRef::Node(&tree.root), &mut |item| {
            let Some(leaf) = item.as_leaf() else {
                return;
            };
            if leaf.field.is_empty() || self.field_by_path(&leaf.field).is_some() {
                return;
            }
            unknown.push(UnknownField {
                leaf_id: leaf.id.clone(),
                field: leaf.field.clone(),
                suggestion: self.suggest(&leaf.field).map(str::to_string),
            });
        });
        unknown
    }
}

impl FromIterator<FilterField> for FieldCatalog {
    fn from_iter<I: IntoIterator<Item = FilterField>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
