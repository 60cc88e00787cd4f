// src/extractors/table.rs

// --- Imports ---
use crate::utils::error::ExtractError;
use std::path::Path;

// --- Constants ---
const CELL_DELIMITER: char = '|';
const HEADING_MARKER: char = '#';
// Header line plus the divider line below it.
const MIN_BLOCK_LINES: usize = 2;

// --- Data Structures ---

/// One pipe-delimited table: column names plus the rows whose cell count
/// matches the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { header, rows }
    }

    pub fn has_rows(&self) -> bool {
        !self.rows.is_empty()
    }
}

/// Everything the extractor pulls out of a document in one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedTables {
    pub title: Option<String>,
    pub tables: Vec<Table>,
}

/// A source document, read once. Title and tables are derived on load and
/// never change afterwards.
#[derive(Debug, Clone)]
pub struct Document {
    pub text: String,
    pub title: Option<String>,
    pub tables: Vec<Table>,
}

impl Document {
    /// Reads a UTF-8 text file and extracts its title and tables.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ExtractError> {
        let path = path.as_ref();
        tracing::info!("Reading document: {}", path.display());

        let text = std::fs::read_to_string(path).map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self::from_text(text))
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let ExtractedTables { title, tables } = TableExtractor::new().extract(&text);
        Self { text, title, tables }
    }
}

// --- Main Extractor Structure ---
#[derive(Debug, Default)]
pub struct TableExtractor;

impl TableExtractor {
    pub fn new() -> Self { Self {} }

    /// Scans the text line by line, collecting runs of table lines into
    /// blocks and capturing the first heading as the title.
    ///
    /// Never fails: blocks that cannot be parsed are skipped and whatever
    /// was recognized is returned.
    pub fn extract(&self, text: &str) -> ExtractedTables {
        let mut title: Option<String> = None;
        let mut tables = Vec::new();
        let mut block: Vec<&str> = Vec::new();

        for (line_no, raw_line) in split_lines(text).enumerate() {
            let line = raw_line.trim();

            if is_table_line(line) {
                tracing::trace!("Line {} is a table line: '{}'", line_no + 1, line);
                block.push(line);
                continue;
            }

            // Any other line closes the open block.
            self.flush_block(&mut block, &mut tables);

            if title.is_none() {
                if let Some(heading) = heading_text(line) {
                    tracing::debug!("Found title on line {}: '{}'", line_no + 1, heading);
                    title = Some(heading.to_string());
                }
            }
        }

        // A block still open at end of input.
        self.flush_block(&mut block, &mut tables);

        tracing::info!("Extracted {} table(s), title: {:?}", tables.len(), title);
        ExtractedTables { title, tables }
    }

    fn flush_block(&self, block: &mut Vec<&str>, tables: &mut Vec<Table>) {
        if block.is_empty() {
            return;
        }

        match self.parse_block(block) {
            Ok(table) => {
                tracing::debug!(
                    "Accepted table with header {:?} and {} row(s)",
                    table.header,
                    table.rows.len()
                );
                tables.push(table);
            }
            Err(e) => tracing::debug!("Discarding table block: {}", e),
        }

        block.clear();
    }

    /// Parses one block: line 1 is the header, line 2 the divider (always
    /// skipped), the rest are rows. Rows whose cell count differs from the
    /// header's are dropped.
    fn parse_block(&self, block: &[&str]) -> Result<Table, ExtractError> {
        if block.len() < MIN_BLOCK_LINES {
            return Err(ExtractError::BlockTooShort(block.len()));
        }

        let header = split_cells(block[0]);

        let mut rows = Vec::with_capacity(block.len() - MIN_BLOCK_LINES);
        for line in &block[MIN_BLOCK_LINES..] {
            let cells = split_cells(line);
            if cells.len() == header.len() {
                rows.push(cells);
            } else {
                tracing::trace!(
                    "Dropping row with {} cell(s), header has {}: '{}'",
                    cells.len(),
                    header.len(),
                    line
                );
            }
        }

        Ok(Table::new(header, rows))
    }
}

/// Splits on `\n`, `\r\n` and bare `\r`. A blank line closes a table block,
/// so `\r\n` must count as one break.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .flat_map(|line| line.strip_suffix('\r').unwrap_or(line).split('\r'))
}

/// A trimmed line that starts and ends with the cell delimiter.
fn is_table_line(line: &str) -> bool {
    line.starts_with(CELL_DELIMITER) && line.ends_with(CELL_DELIMITER)
}

/// Splits on the delimiter, trims, and discards empty segments (which also
/// removes the segments outside the leading and trailing pipes).
fn split_cells(line: &str) -> Vec<String> {
    line.split(CELL_DELIMITER)
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
        .collect()
}

/// Text after a single leading heading marker. A heading with no text is
/// not a title.
fn heading_text(line: &str) -> Option<&str> {
    line.strip_prefix(HEADING_MARKER)
        .map(str::trim)
        .filter(|text| !text.is_empty())
}
