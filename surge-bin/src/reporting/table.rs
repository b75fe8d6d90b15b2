use std::fmt::{Display, Formatter, Result as FmtResult};

const GUTTER: usize = 5;

/// Column-aligned text table with `[Bracketed]` headers.
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: Into<String>>(headers: Vec<S>) -> Table {
        Table {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.len() + 2).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if cell.len() > widths[i] {
                    widths[i] = cell.len();
                }
            }
        }
        widths
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        let widths = self.widths();
        let last = self.headers.len().saturating_sub(1);
        for (i, h) in self.headers.iter().enumerate() {
            let cell = format!("[{}]", h);
            if i == last {
                write!(f, "{}", cell)?;
            } else {
                write!(f, "{:<width$}", cell, width = widths[i] + GUTTER)?;
            }
        }
        writeln!(f)?;
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i == last {
                    write!(f, "{}", cell)?;
                } else {
                    write!(f, "{:<width$}", cell, width = widths[i] + GUTTER)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
