//! The identifiers offered to the language model, and the check that
//! generated SQL stays within them.

use std::collections::HashSet;

use dbsage_core::{CATALOG_RELATIONS, LiveColumn, RelationRef, SYSTEM_SCHEMAS, referenced_relations};

#[derive(Debug, Clone, Default)]
pub struct GroundingContext {
    identifiers: Vec<String>,
    /// Lowercased `(schema, table)` pairs.
    relations: HashSet<(String, String)>,
    /// Lowercased table names, for unqualified references.
    tables: HashSet<String>,
}

impl GroundingContext {
    #[must_use]
    pub fn from_columns(columns: &[LiveColumn]) -> Self {
        let mut context = Self::default();
        for column in columns {
            context.identifiers.push(column.qualified_name());
            let table = column.table.to_lowercase();
            context.relations.insert((column.schema.to_lowercase(), table.clone()));
            context.tables.insert(table);
        }
        context
    }

    /// `schema.table.column` for every available column.
    #[must_use]
    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    /// Relations referenced by `sql` that are neither grounded nor system
    /// catalogs, rendered as written (after identifier folding).
    #[must_use]
    pub fn out_of_scope(&self, sql: &str) -> Vec<String> {
        referenced_relations(sql)
            .into_iter()
            .filter(|relation| !self.allows(relation))
            .map(|relation| relation.to_string())
            .collect()
    }

    fn allows(&self, relation: &RelationRef) -> bool {
        let name = relation.name.to_lowercase();
        match &relation.schema {
            Some(schema) => {
                let schema = schema.to_lowercase();
                SYSTEM_SCHEMAS.contains(&schema.as_str()) || self.relations.contains(&(schema, name))
            },
            None => self.tables.contains(&name) || CATALOG_RELATIONS.contains(&name.as_str()),
        }
    }
}
