//! Box-drawing table renderer for list output.
//!
//! Widths are measured in chars so memory text with non-ASCII content lines
//! up. Cells longer than the column cap are cut with an ellipsis.

use colored::Colorize;

/// Longest cell shown before truncation.
pub const MAX_CELL_CHARS: usize = 60;

/// Column alignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

pub struct Table {
    headers: Vec<String>,
    alignments: Vec<Align>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a table; all columns are left-aligned until overridden.
    pub fn new(headers: &[&str]) -> Self {
        let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        let alignments = vec![Align::Left; headers.len()];
        Self {
            headers,
            alignments,
            rows: Vec::new(),
        }
    }

    /// Override the alignment of column `col`. Out-of-range indices are ignored.
    pub fn align(mut self, col: usize, alignment: Align) -> Self {
        if let Some(a) = self.alignments.get_mut(col) {
            *a = alignment;
        }
        self
    }

    /// Add a row. Extra cells are dropped; missing cells are blank.
    pub fn add_row<S: AsRef<str>>(&mut self, cells: &[S]) {
        let row = (0..self.headers.len())
            .map(|i| cells.get(i).map(|c| clip(c.as_ref())).unwrap_or_default())
            .collect();
        self.rows.push(row);
    }

    fn column_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }
        widths
    }

    fn pad(text: &str, width: usize, alignment: Align) -> String {
        let fill = " ".repeat(width.saturating_sub(text.chars().count()));
        match alignment {
            Align::Left => format!("{text}{fill}"),
            Align::Right => format!("{fill}{text}"),
        }
    }

    fn border(widths: &[usize], left: &str, mid: &str, right: &str) -> String {
        let segments: Vec<String> = widths.iter().map(|w| "\u{2500}".repeat(w + 2)).collect();
        format!("{left}{}{right}", segments.join(mid))
    }

    /// Render with a bold header row:
    /// ```text
    /// ┌────┬─────────┐
    /// │ ID │ Content │
    /// ├────┼─────────┤
    /// │ n1 │ hello   │
    /// └────┴─────────┘
    /// ```
    pub fn render(&self) -> String {
        let widths = self.column_widths();
        let mut lines = vec![Self::border(&widths, "\u{250c}", "\u{252c}", "\u{2510}")];

        let header: Vec<String> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| format!(" {} ", Self::pad(h, widths[i], self.alignments[i]).bold()))
            .collect();
        lines.push(format!("\u{2502}{}\u{2502}", header.join("\u{2502}")));
        lines.push(Self::border(&widths, "\u{251c}", "\u{253c}", "\u{2524}"));

        for row in &self.rows {
            let cells: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(i, cell)| format!(" {} ", Self::pad(cell, widths[i], self.alignments[i])))
                .collect();
            lines.push(format!("\u{2502}{}\u{2502}", cells.join("\u{2502}")));
        }

        lines.push(Self::border(&widths, "\u{2514}", "\u{2534}", "\u{2518}"));
        lines.join("\n")
    }

    pub fn print(&self) {
        println!("{}", self.render());
    }
}

/// Single-line, length-capped cell text.
fn clip(text: &str) -> String {
    let flat = text.replace(['\n', '\r', '\t'], " ");
    if flat.chars().count() <= MAX_CELL_CHARS {
        return flat;
    }
    let mut cut: String = flat.chars().take(MAX_CELL_CHARS - 1).collect();
    cut.push('\u{2026}');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_table() {
        let mut t = Table::new(&["ID", "Content", "Accesses"]).align(2, Align::Right);
        t.add_row(&["node-a", "first memory", "3"]);
        t.add_row(&["node-b", "second", "12"]);

        let rendered = t.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with('\u{250c}'));
        assert!(lines[5].ends_with('\u{2518}'));
        assert!(lines[1].contains("Content"));
        assert!(lines[3].contains("first memory"));
        // "Accesses" is 8 wide, so "3" is padded on the left
        assert!(lines[3].contains("       3 "));
    }

    #[test]
    fn empty_table() {
        let t = Table::new(&["A", "B"]);
        assert_eq!(t.render().lines().count(), 4);
    }

    #[test]
    fn missing_cells_filled() {
        let mut t = Table::new(&["X", "Y", "Z"]);
        t.add_row(&["only-one"]);
        let data_line = t.render().lines().nth(3).unwrap().to_string();
        assert_eq!(data_line.matches('\u{2502}').count(), 4);
    }

    #[test]
    fn non_ascii_widths_align() {
        let mut t = Table::new(&["Content"]);
        t.add_row(&["caf\u{e9}"]);
        t.add_row(&["cafe"]);
        let rendered = t.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[3].chars().count(), lines[4].chars().count());
    }

    #[test]
    fn long_and_multiline_cells_are_clipped() {
        let mut t = Table::new(&["Content"]);
        t.add_row(&["x".repeat(200)]);
        t.add_row(&["line one\nline two"]);
        let rendered = t.render();
        assert!(rendered.contains('\u{2026}'));
        assert!(rendered.contains("line one line two"));
        let clipped_row = rendered.lines().nth(3).unwrap();
        assert_eq!(clipped_row.chars().count(), MAX_CELL_CHARS + 4);
    }
}
