//! Write statements

use crate::entity::Row;
use crate::query_builder::filter::QueryFilter;
use crate::query_builder::sql_generation::SqlGenerator;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: String,
    pub row: Row,
    /// Column whose generated value is read back
    pub returning: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table: String,
    pub row: Row,
    pub conditions: Vec<QueryFilter>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub table: String,
    pub conditions: Vec<QueryFilter>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Insert(Insert),
    Update(Update),
    Delete(Delete),
}

impl Statement {
    pub fn insert(table: impl Into<String>, row: Row, returning: Option<String>) -> Self {
        Statement::Insert(Insert {
            table: table.into(),
            row,
            returning,
        })
    }

    pub fn update(table: impl Into<String>, row: Row, conditions: Vec<QueryFilter>) -> Self {
        Statement::Update(Update {
            table: table.into(),
            row,
            conditions,
        })
    }

    pub fn delete(table: impl Into<String>, conditions: Vec<QueryFilter>) -> Self {
        Statement::Delete(Delete {
            table: table.into(),
            conditions,
        })
    }

    pub fn table(&self) -> &str {
        match self {
            Statement::Insert(insert) => &insert.table,
            Statement::Update(update) => &update.table,
            Statement::Delete(delete) => &delete.table,
        }
    }

    /// Short operation name for logs and errors
    pub fn operation(&self) -> &'static str {
        match self {
            Statement::Insert(_) => "insert",
            Statement::Update(_) => "update",
            Statement::Delete(_) => "delete",
        }
    }

    pub fn build(&self) -> (String, Vec<Value>) {
        match self {
            Statement::Insert(insert) => SqlGenerator::build_insert(insert),
            Statement::Update(update) => SqlGenerator::build_update(update),
            Statement::Delete(delete) => SqlGenerator::build_delete(delete),
        }
    }
}
