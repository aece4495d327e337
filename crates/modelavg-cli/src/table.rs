//! Plain-text tables with right-aligned, fixed-precision numeric cells.

use std::fmt::Write;

/// One table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Count(i64),
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Number(v)
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Cell::Count(v)
    }
}

impl From<usize> for Cell {
    fn from(v: usize) -> Self {
        Cell::Count(v as i64)
    }
}

impl Cell {
    fn render(&self, decimal_places: usize) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(v) => format!("{v:.decimal_places$}"),
            Cell::Count(n) => n.to_string(),
        }
    }
}

/// A titled table rendered with every column right-aligned.
pub struct Table {
    title: String,
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
    decimal_places: usize,
}

impl Table {
    pub fn new(title: &str, headers: &[&str], decimal_places: usize) -> Self {
        Self {
            title: title.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
            decimal_places,
        }
    }

    pub fn add_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    pub fn render(&self) -> String {
        let rendered: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| r.iter().map(|c| c.render(self.decimal_places)).collect())
            .collect();

        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &rendered {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.chars().count());
                }
            }
        }
        let rule = widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+");

        let mut out = String::new();
        let _ = writeln!(out, "{}", self.title);
        let _ = writeln!(out, "+{rule}+");
        let _ = writeln!(out, "{}", format_line(&self.headers, &widths));
        let _ = writeln!(out, "+{rule}+");
        if rendered.is_empty() {
            let _ = writeln!(out, "  (no rows)");
        }
        for row in &rendered {
            let _ = writeln!(out, "{}", format_line(row, &widths));
        }
        let _ = writeln!(out, "+{rule}+");
        out
    }
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    let body = widths
        .iter()
        .enumerate()
        .map(|(i, &w)| {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            format!(" {cell:>w$} ")
        })
        .collect::<Vec<_>>()
        .join("|");
    format!("|{body}|")
}
