// src/utils/error.rs
use std::path::PathBuf;
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Could not read document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Table block has {0} line(s), need at least a header and a divider")]
    BlockTooShort(usize),
}

#[derive(Error, Debug)]
pub enum BomError {
    #[error("No tables to build a bill of materials from")]
    NoTables,

    #[error("Table {table} has data rows but an empty header")]
    EmptyHeader { table: usize },

    #[error("Row {row} of table {table} has no cells")]
    EmptyRow { table: usize, row: usize },
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Could not read template {path}: {source}")]
    TemplateIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Rendering failed: {0}")]
    Render(#[from] handlebars::RenderError),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Error processing input file: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Error converting tables to bill of materials: {0}")]
    Bom(#[from] BomError),

    #[error("Error during rendering: {0}")]
    Render(String),

    #[error("Error writing file: {0}")]
    Storage(#[from] StorageError),
}
