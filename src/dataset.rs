/// A single dynamically typed value as read from the admissions store.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// Numeric view of the cell. Anything that does not read as a finite
    /// number is treated as missing.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Null => None,
            Cell::Int(value) => Some(*value as f64),
            Cell::Float(value) if value.is_finite() => Some(*value),
            Cell::Float(_) => None,
            Cell::Text(text) => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite()),
        }
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Int(value) => Some(value.to_string()),
            Cell::Float(value) => Some(value.to_string()),
            Cell::Text(text) => Some(text.clone()),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

/// Column-oriented table whose set of columns is only known at runtime.
///
/// Every column holds exactly `row_count()` cells. Callers ask
/// [`Dataset::has_column`] before relying on a column; lookups of absent
/// columns return `None` rather than failing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: usize,
}

impl Dataset {
    pub fn new(names: &[&str]) -> Self {
        Self {
            columns: names
                .iter()
                .map(|name| Column {
                    name: (*name).to_string(),
                    cells: Vec::new(),
                })
                .collect(),
            rows: 0,
        }
    }

    /// Builds a dataset from row-major data. Short rows are padded with
    /// `Cell::Null`, extra trailing cells are dropped.
    pub fn from_rows(names: &[&str], rows: Vec<Vec<Cell>>) -> Self {
        let mut dataset = Self::new(names);
        for row in rows {
            dataset.push_row(row);
        }
        dataset
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        let mut values = row.into_iter();
        for column in self.columns.iter_mut() {
            column.cells.push(values.next().unwrap_or(Cell::Null));
        }
        self.rows += 1;
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&[Cell]> {
        self.columns
            .iter()
            .find(|column| column.name == name)
            .map(|column| column.cells.as_slice())
    }

    pub(crate) fn column_mut(&mut self, name: &str) -> Option<&mut Vec<Cell>> {
        self.columns
            .iter_mut()
            .find(|column| column.name == name)
            .map(|column| &mut column.cells)
    }

    /// Numeric series for `name` with missing values read as 0.
    pub fn numeric_or_zero(&self, name: &str) -> Option<Vec<f64>> {
        self.column(name).map(|cells| {
            cells
                .iter()
                .map(|cell| cell.as_number().unwrap_or(0.0))
                .collect()
        })
    }

    pub fn cell(&self, row: usize, name: &str) -> Option<&Cell> {
        self.column(name).and_then(|cells| cells.get(row))
    }
}
