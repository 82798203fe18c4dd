//! # Terminal table
//!
//! Box-drawing table renderer used to show the curator which chromosome
//! groups have naming problems. Cells hold multiple centred lines; rows
//! carrying errors can be re-rendered with a little surrounding context so
//! a large table does not flood the terminal.
use std::collections::BTreeSet;

/// Text styling applied when a cell line is rendered. Padding is computed
/// from the unstyled text so escape codes do not skew the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Bold,
    BoldRed,
}

impl Style {
    fn apply(&self, txt: &str) -> String {
        match self {
            Style::Bold => format!("\x1b[1m{txt}\x1b[0m"),
            Style::BoldRed => format!("\x1b[1;31m{txt}\x1b[0m"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CellLine {
    text: String,
    style: Option<Style>,
}

impl CellLine {
    fn length(&self) -> usize {
        self.text.chars().count()
    }

    fn format(&self, width: usize) -> String {
        let pad = width - self.length();
        let l_pad = " ".repeat(pad / 2);
        let r_pad = " ".repeat(pad / 2 + pad % 2);
        let txt = match self.style {
            Some(style) => style.apply(&self.text),
            None => self.text.clone(),
        };
        format!("{l_pad}{txt}{r_pad}")
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableCell {
    lines: Vec<CellLine>,
}

impl TableCell {
    pub fn new_line(&mut self, text: impl Into<String>, style: Option<Style>) {
        self.lines.push(CellLine {
            text: text.into(),
            style,
        });
    }

    fn max_line_length(&self) -> usize {
        self.lines.iter().map(CellLine::length).max().unwrap_or(0)
    }

    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn formatted_line(&self, width: usize, index: usize) -> String {
        match self.lines.get(index) {
            Some(line) => line.format(width),
            None => " ".repeat(width),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableRow {
    cells: Vec<TableCell>,
}

impl TableRow {
    pub fn new_cell(&mut self) -> &mut TableCell {
        self.cells.push(TableCell::default());
        self.cells.last_mut().unwrap()
    }

    fn max_line_length(&self) -> usize {
        self.cells.iter().map(TableCell::max_line_length).max().unwrap_or(0)
    }

    fn column_count(&self) -> usize {
        self.cells.len()
    }

    fn line_count(&self) -> usize {
        self.cells.iter().map(TableCell::line_count).max().unwrap_or(0)
    }
}

#[derive(Debug, Default)]
pub struct TerminalTable {
    header: Option<TableRow>,
    rows: Vec<TableRow>,
    errors: BTreeSet<usize>,
}

impl TerminalTable {
    pub fn new() -> TerminalTable {
        TerminalTable::default()
    }

    pub fn new_header(&mut self) -> &mut TableRow {
        self.header = Some(TableRow::default());
        self.header.as_mut().unwrap()
    }

    pub fn new_row(&mut self) -> &mut TableRow {
        self.rows.push(TableRow::default());
        self.rows.last_mut().unwrap()
    }

    /// Mark the most recently added row as holding an error.
    pub fn mark_error(&mut self) {
        if !self.rows.is_empty() {
            self.errors.insert(self.rows.len() - 1);
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Render each contiguous run of error rows, padded by `context` rows.
    pub fn error_render(&self, context: usize) -> Vec<String> {
        contiguous_ranges(&self.errors, self.rows.len(), context)
            .into_iter()
            .map(|(start, end)| self.render_rows(&(start..=end).collect::<Vec<_>>()))
            .collect()
    }

    pub fn render(&self) -> String {
        self.render_rows(&(0..self.rows.len()).collect::<Vec<_>>())
    }

    fn render_rows(&self, row_indices: &[usize]) -> String {
        let n_cols = self.column_count();
        let width = self.max_line_length();
        let pad_width = width + 2;

        let mut out = String::new();
        let bar = |l: char, m: char, r: char| {
            let mut line = String::new();
            line.push(l);
            for i in 0..n_cols {
                if i > 0 {
                    line.push(m);
                }
                line.push_str(&"─".repeat(pad_width));
            }
            line.push(r);
            line.push('\n');
            line
        };

        out.push_str(&bar('┌', '┬', '┐'));
        let mut ruled = false;
        if let Some(hdr) = &self.header {
            self.render_row(&mut out, hdr, n_cols, width);
            ruled = true;
        }
        let ruler = bar('├', '┼', '┤');
        for &i in row_indices {
            if ruled {
                out.push_str(&ruler);
            } else {
                ruled = true;
            }
            self.render_row(&mut out, &self.rows[i], n_cols, width);
        }
        out.push_str(&bar('└', '┴', '┘'));
        out
    }

    fn render_row(&self, out: &mut String, row: &TableRow, n_cols: usize, width: usize) {
        for line_i in 0..row.line_count() {
            let mut cols = Vec::with_capacity(n_cols);
            for col_i in 0..n_cols {
                match row.cells.get(col_i) {
                    Some(cell) => cols.push(cell.formatted_line(width, line_i)),
                    None => cols.push(" ".repeat(width)),
                }
            }
            out.push_str("│ ");
            out.push_str(&cols.join(" │ "));
            out.push_str(" │\n");
        }
    }

    fn column_count(&self) -> usize {
        let mut col_count = self.rows.iter().map(TableRow::column_count).max().unwrap_or(0);
        if let Some(hdr) = &self.header {
            col_count = col_count.max(hdr.column_count());
        }
        col_count
    }

    fn max_line_length(&self) -> usize {
        let mut max_ll = self.header.as_ref().map_or(0, TableRow::max_line_length);
        for r in &self.rows {
            max_ll = max_ll.max(r.max_line_length());
        }
        max_ll
    }
}

/// Given marked indices within a list of `length` rows, returns contiguous
/// ranges padded by `context`, merging runs whose padding touches.
fn contiguous_ranges(
    indices: &BTreeSet<usize>,
    length: usize,
    context: usize,
) -> Vec<(usize, usize)> {
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    if length == 0 {
        return ranges;
    }
    let max_i = length - 1;
    for &x in indices {
        let start = x.saturating_sub(context);
        let end = (x + context).min(max_i);
        match ranges.last_mut() {
            Some((_, last_end)) if start <= *last_end + 1 => {
                *last_end = (*last_end).max(end);
            }
            _ => ranges.push((start, end)),
        }
    }
    ranges
}
