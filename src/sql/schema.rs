//! Entity metadata consumed by the compiler.
//!
//! The compiler never resolves schema on its own. Callers describe each
//! table through [`EntityDescriptor`] (field list and primary key) and each
//! row through [`EntityInstance`]. [`Schema`] and [`Record`] are plain
//! implementations for callers without their own metadata layer.

use std::fmt::Debug;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::literal::Literal;

/// Read-only description of an entity's table.
pub trait EntityDescriptor: Debug + Send + Sync {
    /// Table the entity is stored in.
    fn source(&self) -> &str;

    /// Field (column) names in declaration order.
    fn fields(&self) -> &[String];

    /// Primary key column, if the entity has one.
    fn primary_key(&self) -> Option<&str>;
}

/// One row of an entity.
pub trait EntityInstance {
    fn entity(&self) -> &dyn EntityDescriptor;

    /// Field/value pairs in field order, optionally without the primary key.
    fn field_values(&self, include_primary_key: bool) -> Vec<(String, Literal)>;

    /// Primary key value, `None` when the key is absent or null.
    fn primary_key_value(&self) -> Option<Literal> {
        let pk = self.entity().primary_key()?.to_string();
        self.field_values(true)
            .into_iter()
            .find(|(name, value)| *name == pk && !value.is_null())
            .map(|(_, value)| value)
    }
}

/// Lookup of the table backing a model.
pub trait ModelDescriptor {
    fn source_table(&self) -> &str;
}

// =============================================================================
// Schema
// =============================================================================

/// Concrete entity descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub source: String,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub primary_key: Option<String>,
}

impl Schema {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            fields: vec![],
            primary_key: None,
        }
    }

    /// Add a field.
    pub fn with_field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(name.into());
        self
    }

    /// Add several fields.
    pub fn with_fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(names.into_iter().map(Into::into));
        self
    }

    /// Mark `name` as the primary key, adding it as a field if missing.
    pub fn with_primary_key(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.fields.contains(&name) {
            self.fields.insert(0, name.clone());
        }
        self.primary_key = Some(name);
        self
    }
}

impl EntityDescriptor for Schema {
    fn source(&self) -> &str {
        &self.source
    }

    fn fields(&self) -> &[String] {
        &self.fields
    }

    fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }
}

impl ModelDescriptor for Schema {
    fn source_table(&self) -> &str {
        &self.source
    }
}

// =============================================================================
// Record
// =============================================================================

/// Concrete entity instance: a schema plus assigned values.
#[derive(Debug, Clone)]
pub struct Record {
    schema: Arc<Schema>,
    values: Vec<(String, Literal)>,
}

impl Record {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            values: vec![],
        }
    }

    /// Assign a field, replacing any earlier value.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Literal>) -> Self {
        let field = field.into();
        let value = value.into();
        match self.values.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = value,
            None => self.values.push((field, value)),
        }
        self
    }

    pub fn get(&self, field: &str) -> Option<&Literal> {
        self.values
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }
}

impl EntityInstance for Record {
    fn entity(&self) -> &dyn EntityDescriptor {
        self.schema.as_ref()
    }

    /// Schema fields first, in schema order (unassigned fields are null),
    /// then fields assigned outside the schema in assignment order.
    fn field_values(&self, include_primary_key: bool) -> Vec<(String, Literal)> {
        let pk = self.schema.primary_key.as_deref();
        let keep = |name: &str| include_primary_key || Some(name) != pk;

        let declared = self
            .schema
            .fields
            .iter()
            .filter(|name| keep(name))
            .map(|name| {
                let value = self.get(name).cloned().unwrap_or(Literal::Null);
                (name.clone(), value)
            });
        let extra = self
            .values
            .iter()
            .filter(|(name, _)| !self.schema.fields.contains(name) && keep(name))
            .cloned();

        declared.chain(extra).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Arc<Schema> {
        Arc::new(
            Schema::new("users")
                .with_fields(["name", "email"])
                .with_primary_key("id"),
        )
    }

    #[test]
    fn test_primary_key_prepended() {
        let schema = users();
        assert_eq!(schema.fields(), &["id", "name", "email"]);
        assert_eq!(schema.primary_key(), Some("id"));
        assert_eq!(schema.source_table(), "users");
    }

    #[test]
    fn test_field_values_follow_schema_order() {
        let record = Record::new(users())
            .set("email", "a@example.com")
            .set("id", 1)
            .set("nickname", "al");

        let names: Vec<_> = record
            .field_values(true)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["id", "name", "email", "nickname"]);

        let values = record.field_values(false);
        assert_eq!(values[0], ("name".to_string(), Literal::Null));
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_set_replaces() {
        let record = Record::new(users()).set("name", "a").set("name", "b");
        assert_eq!(record.get("name"), Some(&Literal::String("b".into())));
    }

    #[test]
    fn test_primary_key_value() {
        let record = Record::new(users()).set("id", 7);
        assert_eq!(record.primary_key_value(), Some(Literal::Integer(7)));

        let unsaved = Record::new(users()).set("id", Literal::Null);
        assert_eq!(unsaved.primary_key_value(), None);

        let keyless = Record::new(Arc::new(Schema::new("logs").with_field("line")));
        assert_eq!(keyless.primary_key_value(), None);
    }

    #[test]
    fn test_schema_deserialize() {
        let schema: Schema =
            serde_json::from_str(r#"{"source": "users", "fields": ["id"], "primary_key": "id"}"#)
                .unwrap();
        assert_eq!(schema, Schema::new("users").with_primary_key("id"));
    }
}
