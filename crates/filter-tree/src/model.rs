//! Filter tree data model.
//!
//! A [`FilterTree`] owns a root [`FilterNode`]. Nodes group child items under
//! AND/OR logic; each child is a [`FilterItem`], which is either another node
//! or a [`FilterLeaf`] comparing one field of the data context against a value.
//!
//! The JSON representation is part of the exchange contract:
//!
//! ```text
//! FilterTree = { id, name, description?, root, createdAt, updatedAt, createdBy, version }
//! FilterNode = { id, type: "node", operator: "AND"|"OR", children, enabled }
//! FilterLeaf = { id, type: "leaf", field, operator, value, fieldType, enabled }
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ParseError;

/// Largest version a valid tree may carry: 2^53 - 1, the largest integer a
/// JSON number holds exactly in JavaScript.
pub const MAX_VERSION: u64 = (1 << 53) - 1;

/// Generates a fresh, process-unique item or tree id.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Returns the current time truncated to millisecond precision.
///
/// Millisecond precision keeps the RFC 3339 text form lossless, so a tree
/// serialized and read back compares equal to the original.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

// ==================== Operators ====================

/// Logical operator combining the children of a [`FilterNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    /// Every child must pass. Vacuously true for zero children.
    #[default]
    And,
    /// At least one child must pass. Vacuously false for zero children.
    Or,
}

impl LogicalOperator {
    /// All logical operators, in declaration order.
    pub const ALL: [LogicalOperator; 2] = [LogicalOperator::And, LogicalOperator::Or];

    /// Returns the wire name (`"AND"` or `"OR"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }

    /// Returns the other operator (AND becomes OR and vice versa).
    pub fn toggled(self) -> Self {
        match self {
            LogicalOperator::And => LogicalOperator::Or,
            LogicalOperator::Or => LogicalOperator::And,
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogicalOperator {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseError::unknown_logical_operator(s))
    }
}

/// Comparison operator applied by a [`FilterLeaf`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    /// Strict equality.
    #[default]
    Equals,
    /// Strict inequality.
    NotEquals,
    /// Substring test on the string forms of both sides.
    Contains,
    /// Negated substring test.
    NotContains,
    /// Numeric `>`.
    GreaterThan,
    /// Numeric `<`.
    LessThan,
    /// Numeric `>=`.
    GreaterThanOrEqual,
    /// Numeric `<=`.
    LessThanOrEqual,
    /// Membership in the leaf's array value.
    In,
    /// Non-membership in the leaf's array value.
    NotIn,
    /// Field is null or absent.
    IsNull,
    /// Field is present and not null.
    IsNotNull,
}

impl ComparisonOperator {
    /// All comparison operators, in declaration order.
    pub const ALL: [ComparisonOperator; 12] = [
        ComparisonOperator::Equals,
        ComparisonOperator::NotEquals,
        ComparisonOperator::Contains,
        ComparisonOperator::NotContains,
        ComparisonOperator::GreaterThan,
        ComparisonOperator::LessThan,
        ComparisonOperator::GreaterThanOrEqual,
        ComparisonOperator::LessThanOrEqual,
        ComparisonOperator::In,
        ComparisonOperator::NotIn,
        ComparisonOperator::IsNull,
        ComparisonOperator::IsNotNull,
    ];

    /// Returns the wire name, e.g. `"greater_than_or_equal"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::Equals => "equals",
            ComparisonOperator::NotEquals => "not_equals",
            ComparisonOperator::Contains => "contains",
            ComparisonOperator::NotContains => "not_contains",
            ComparisonOperator::GreaterThan => "greater_than",
            ComparisonOperator::LessThan => "less_than",
            ComparisonOperator::GreaterThanOrEqual => "greater_than_or_equal",
            ComparisonOperator::LessThanOrEqual => "less_than_or_equal",
            ComparisonOperator::In => "in",
            ComparisonOperator::NotIn => "not_in",
            ComparisonOperator::IsNull => "is_null",
            ComparisonOperator::IsNotNull => "is_not_null",
        }
    }

    /// Returns false for `is_null` / `is_not_null`, which ignore the leaf value.
    pub fn reads_value(&self) -> bool {
        !matches!(
            self,
            ComparisonOperator::IsNull | ComparisonOperator::IsNotNull
        )
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComparisonOperator {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == wanted)
            .ok_or_else(|| ParseError::unknown_comparison_operator(s))
    }
}

/// Declared type of a leaf's field. Advisory only; evaluation never checks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Number,
    Boolean,
    Date,
    Array,
    Object,
}

impl FieldType {
    /// All field types, in declaration order.
    pub const ALL: [FieldType; 6] = [
        FieldType::String,
        FieldType::Number,
        FieldType::Boolean,
        FieldType::Date,
        FieldType::Array,
        FieldType::Object,
    ];

    /// Returns the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Array => "array",
            FieldType::Object => "object",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseError::unknown_field_type(s))
    }
}

// ==================== Items ====================

/// A single field comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterLeaf {
    pub id: String,
    /// Dot-delimited path into the data context, e.g. `user.profile.email`.
    pub field: String,
    pub operator: ComparisonOperator,
    /// Comparison operand. Shape depends on the operator; absent reads as null.
    #[serde(default)]
    pub value: Value,
    pub field_type: FieldType,
    pub enabled: bool,
}

impl FilterLeaf {
    /// Creates an empty `equals` leaf on a `string` field with a fresh id.
    pub fn new() -> Self {
        Self {
            id: generate_id(),
            field: String::new(),
            operator: ComparisonOperator::Equals,
            value: Value::String(String::new()),
            field_type: FieldType::String,
            enabled: true,
        }
    }

    /// Creates an enabled leaf comparing `field` against `value`.
    ///
    /// The field type is inferred from the value where possible.
    pub fn condition(
        field: impl Into<String>,
        operator: ComparisonOperator,
        value: impl Into<Value>,
    ) -> Self {
        let value = value.into();
        let field_type = match &value {
            Value::Number(_) => FieldType::Number,
            Value::Bool(_) => FieldType::Boolean,
            Value::Array(_) => FieldType::Array,
            Value::Object(_) => FieldType::Object,
            Value::String(_) | Value::Null => FieldType::String,
        };
        Self {
            id: generate_id(),
            field: field.into(),
            operator,
            value,
            field_type,
            enabled: true,
        }
    }
}

impl Default for FilterLeaf {
    fn default() -> Self {
        Self::new()
    }
}

/// A logical group of child items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterNode {
    pub id: String,
    pub operator: LogicalOperator,
    pub children: Vec<FilterItem>,
    pub enabled: bool,
}

impl FilterNode {
    /// Creates an enabled, empty group with a fresh id.
    pub fn new(operator: LogicalOperator) -> Self {
        Self {
            id: generate_id(),
            operator,
            children: Vec::new(),
            enabled: true,
        }
    }

    /// Appends a child, builder style.
    pub fn with_child(mut self, child: impl Into<FilterItem>) -> Self {
        self.children.push(child.into());
        self
    }
}

impl Default for FilterNode {
    fn default() -> Self {
        Self::new(LogicalOperator::And)
    }
}

/// Discriminator of a tree item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Node,
    Leaf,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Node => f.write_str("node"),
            ItemKind::Leaf => f.write_str("leaf"),
        }
    }
}

/// A child of a node: either a nested group or a leaf condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FilterItem {
    Node(FilterNode),
    Leaf(FilterLeaf),
}

impl FilterItem {
    /// Returns the item's id.
    pub fn id(&self) -> &str {
        match self {
            FilterItem::Node(node) => &node.id,
            FilterItem::Leaf(leaf) => &leaf.id,
        }
    }

    /// Returns the item's enabled flag.
    pub fn enabled(&self) -> bool {
        match self {
            FilterItem::Node(node) => node.enabled,
            FilterItem::Leaf(leaf) => leaf.enabled,
        }
    }

    /// Returns whether this is a node or a leaf.
    pub fn kind(&self) -> ItemKind {
        match self {
            FilterItem::Node(_) => ItemKind::Node,
            FilterItem::Leaf(_) => ItemKind::Leaf,
        }
    }

    /// Borrows the item as an [`ItemRef`].
    pub fn as_item_ref(&self) -> ItemRef<'_> {
        ItemRef::from(self)
    }
}

impl From<FilterNode> for FilterItem {
    fn from(node: FilterNode) -> Self {
        FilterItem::Node(node)
    }
}

impl From<FilterLeaf> for FilterItem {
    fn from(leaf: FilterLeaf) -> Self {
        FilterItem::Leaf(leaf)
    }
}

/// Borrowed view of a node or leaf, as returned by lookups.
///
/// The root of a tree is a bare [`FilterNode`] rather than a [`FilterItem`],
/// so lookups hand out this view to cover both.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ItemRef<'a> {
    Node(&'a FilterNode),
    Leaf(&'a FilterLeaf),
}

impl<'a> ItemRef<'a> {
    pub fn id(&self) -> &'a str {
        match self {
            ItemRef::Node(node) => &node.id,
            ItemRef::Leaf(leaf) => &leaf.id,
        }
    }

    pub fn enabled(&self) -> bool {
        match self {
            ItemRef::Node(node) => node.enabled,
            ItemRef::Leaf(leaf) => leaf.enabled,
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            ItemRef::Node(_) => ItemKind::Node,
            ItemRef::Leaf(_) => ItemKind::Leaf,
        }
    }

    /// Returns the node, if this is one.
    pub fn as_node(&self) -> Option<&'a FilterNode> {
        match self {
            ItemRef::Node(node) => Some(node),
            ItemRef::Leaf(_) => None,
        }
    }

    /// Returns the leaf, if this is one.
    pub fn as_leaf(&self) -> Option<&'a FilterLeaf> {
        match self {
            ItemRef::Node(_) => None,
            ItemRef::Leaf(leaf) => Some(leaf),
        }
    }

    /// Clones the viewed item into an owned [`FilterItem`].
    pub fn to_owned_item(&self) -> FilterItem {
        match self {
            ItemRef::Node(node) => FilterItem::Node((*node).clone()),
            ItemRef::Leaf(leaf) => FilterItem::Leaf((*leaf).clone()),
        }
    }
}

impl<'a> From<&'a FilterItem> for ItemRef<'a> {
    fn from(item: &'a FilterItem) -> Self {
        match item {
            FilterItem::Node(node) => ItemRef::Node(node),
            FilterItem::Leaf(leaf) => ItemRef::Leaf(leaf),
        }
    }
}

impl<'a> From<&'a FilterNode> for ItemRef<'a> {
    fn from(node: &'a FilterNode) -> Self {
        ItemRef::Node(node)
    }
}

impl<'a> From<&'a FilterLeaf> for ItemRef<'a> {
    fn from(leaf: &'a FilterLeaf) -> Self {
        ItemRef::Leaf(leaf)
    }
}

// ==================== Tree ====================

/// A named, versioned filter tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterTree {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Always a node; a leaf root is rejected on deserialization.
    #[serde(with = "root_node")]
    pub root: FilterNode,
    #[serde(with = "rfc3339_millis")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "rfc3339_millis")]
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    /// Starts at 1 and grows by exactly 1 per accepted structural edit.
    pub version: u64,
}

impl FilterTree {
    /// Creates a tree with a fresh id, an empty AND root and version 1.
    ///
    /// `name` should not be blank: the validator rejects a tree without a
    /// name, so such a tree cannot be exported and imported again.
    /// [`TreeStore::create_tree`](crate::TreeStore::create_tree) enforces this.
    pub fn new(name: impl Into<String>, created_by: impl Into<String>) -> Self {
        let timestamp = now();
        Self {
            id: generate_id(),
            name: name.into(),
            description: None,
            root: FilterNode::new(LogicalOperator::And),
            created_at: timestamp,
            updated_at: timestamp,
            created_by: created_by.into(),
            version: 1,
        }
    }

    /// Sets the description, builder style.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the tree's metadata without its root.
    pub fn metadata(&self) -> TreeMetadata {
        TreeMetadata {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            created_by: self.created_by.clone(),
            version: self.version,
        }
    }

    /// Records an accepted structural edit: bumps the version and `updated_at`.
    pub(crate) fn mark_changed(&mut self) {
        self.updated_at = now().max(self.updated_at);
        self.version = self.version.saturating_add(1);
    }
}

/// A tree's identifying fields, used for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeMetadata {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(with = "rfc3339_millis")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "rfc3339_millis")]
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    pub version: u64,
}

/// Writes timestamps as `2024-01-01T00:00:00.000Z`, the form JavaScript's
/// `Date.toISOString` produces. Any RFC 3339 offset is accepted on input.
pub(crate) mod rfc3339_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        DateTime::<Utc>::deserialize(deserializer)
    }
}

/// Serializes the root as a tagged node and refuses a leaf on the way in.
mod root_node {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::{FilterItem, FilterNode};

    #[derive(Serialize)]
    #[serde(tag = "type", rename_all = "lowercase")]
    enum TaggedRoot<'a> {
        Node(&'a FilterNode),
    }

    pub fn serialize<S: Serializer>(node: &FilterNode, serializer: S) -> Result<S::Ok, S::Error> {
        TaggedRoot::Node(node).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<FilterNode, D::Error> {
        match FilterItem::deserialize(deserializer)? {
            FilterItem::Node(node) => Ok(node),
            FilterItem::Leaf(_) => Err(D::Error::custom("tree root must be a node, found a leaf")),
        }
    }
}
