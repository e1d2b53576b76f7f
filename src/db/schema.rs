//! Schema descriptor for the queryable sales data.
//!
//! A static, versioned description of the table(s) the model is allowed to
//! query. The descriptor is pure data: it is rendered into prompts and
//! consulted by the statement guard, but never executed itself.

use serde::{Deserialize, Serialize};

/// Describes the queryable schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    /// Descriptor version, bumped whenever the contract with the live store
    /// changes.
    pub version: u32,

    /// Tables in the schema, in declaration order.
    pub tables: Vec<Table>,
}

impl Schema {
    /// Creates a new empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the descriptor for the sales fact table.
    ///
    /// Column names and types must exactly match the live store, including
    /// the case-sensitive, space-containing identifiers. Generated SQL that
    /// references anything else will fail at execution.
    pub fn sales() -> Self {
        Self {
            version: 1,
            tables: vec![Table {
                name: "sales".to_string(),
                columns: vec![
                    Column::new("Transaction ID", "INTEGER").primary_key(),
                    Column::new("Date", "DATE"),
                    Column::new("Customer ID", "VARCHAR(8)"),
                    Column::new("Gender", "VARCHAR(6)"),
                    Column::new("Age", "INTEGER"),
                    Column::new("Product Category", "VARCHAR(11)"),
                    Column::new("Quantity", "INTEGER"),
                    Column::new("Price per Unit", "INTEGER"),
                    Column::new("Total Amount", "INTEGER"),
                ],
            }],
        }
    }

    /// Renders the schema as a data-definition block for prompt grounding.
    ///
    /// The rendering is a literal `CREATE TABLE` statement per table, with
    /// identifiers quoted exactly as the live store requires.
    pub fn to_ddl(&self) -> String {
        self.tables
            .iter()
            .map(Table::to_ddl)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Returns the named table, if the descriptor contains it.
    ///
    /// Lookup is case-insensitive, matching how unquoted identifiers fold.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Returns true if the named table exists in the descriptor.
    pub fn contains_table(&self, name: &str) -> bool {
        self.table(name).is_some()
    }
}

/// A single table in the schema descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    /// Table name.
    pub name: String,

    /// Columns in store order.
    pub columns: Vec<Column>,
}

impl Table {
    /// Creates a new table with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Renders the table as a `CREATE TABLE` block.
    fn to_ddl(&self) -> String {
        let column_lines = self
            .columns
            .iter()
            .map(|c| format!("  {}", c.to_ddl()))
            .collect::<Vec<_>>()
            .join(",\n");

        format!(
            "CREATE TABLE {}(\n{}\n);",
            quote_identifier(&self.name),
            column_lines
        )
    }
}

/// A column in a schema descriptor table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Column {
    /// Column name, exactly as the live store knows it.
    pub name: String,

    /// SQL type (e.g., "INTEGER", "VARCHAR(8)").
    pub sql_type: String,

    /// Whether the column allows NULL values.
    pub nullable: bool,

    /// Whether the column is the table's primary key.
    pub is_primary_key: bool,
}

impl Column {
    /// Creates a new nullable column with the given name and SQL type.
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            nullable: true,
            is_primary_key: false,
        }
    }

    /// Marks the column NOT NULL.
    pub fn not_null(self) -> Self {
        Self {
            nullable: false,
            ..self
        }
    }

    /// Marks the column as the primary key.
    pub fn primary_key(self) -> Self {
        Self {
            nullable: false,
            is_primary_key: true,
            ..self
        }
    }

    fn to_ddl(&self) -> String {
        let mut line = format!("{} {}", quote_identifier(&self.name), self.sql_type);
        if self.is_primary_key {
            line.push_str(" PRIMARY KEY");
        } else if !self.nullable {
            line.push_str(" NOT NULL");
        }
        line
    }
}

/// Quotes an identifier when the store would not accept it bare.
///
/// Identifiers made of letters, digits, and underscores stay unquoted (they
/// fold case-insensitively in the store, so the prompt and the live table
/// agree); anything else is double-quoted verbatim.
fn quote_identifier(name: &str) -> String {
    let bare = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if bare {
        name.to_string()
    } else {
        format!("\"{}\"", name)
    }
}
