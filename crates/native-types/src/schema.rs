//! Column schema: the user-visible shape of a table's columns, independent
//! of whether their type descriptors were inferred or supplied explicitly.

/// A column's name and its Native type descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    /// Column name as it will appear on the wire.
    pub name: String,
    /// Textual Native type descriptor, e.g. `"Nullable(UInt32)"`.
    pub type_name: String,
}

impl ColumnSchema {
    /// Build a schema entry from a name and type descriptor.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}
