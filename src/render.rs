use std::fmt::Write;

use crate::types::{CuttingPlanResult, Layout, PlacedPiece, Stock};

const MAX_WIDTH: f64 = 80.0;
const MAX_HEIGHT: f64 = 40.0;

/// Proportional ASCII drawing of one sheet layout. Rotated pieces carry a
/// `*` after their label.
pub fn render_sheet(sheet_width: f64, sheet_height: f64, placements: &[PlacedPiece]) -> String {
    let scale = f64::min(MAX_WIDTH / sheet_width, MAX_HEIGHT / sheet_height);
    let to_cells = |v: f64| (v * scale).round() as usize;
    let (cols, rows) = (to_cells(sheet_width), to_cells(sheet_height));

    if cols == 0 || rows == 0 {
        return String::new();
    }

    let mut canvas = Canvas::new(cols, rows);
    canvas.frame(0, 0, cols, rows);

    let boxes: Vec<(usize, usize, usize, usize, String)> = placements
        .iter()
        .filter_map(|p| {
            let r = p.placed_rect();
            let (w, h) = (to_cells(r.w), to_cells(r.h));
            if w == 0 || h == 0 {
                return None;
            }
            let mut caption = if p.piece.label.is_empty() {
                r.to_string()
            } else {
                p.piece.label.clone()
            };
            if p.rotated {
                caption.push('*');
            }
            Some((to_cells(p.x), to_cells(p.y), w, h, caption))
        })
        .collect();

    // Borders first so shared edges cannot cut through a caption.
    for &(x, y, w, h, _) in &boxes {
        canvas.frame(x, y, w, h);
    }
    for (x, y, w, h, caption) in &boxes {
        canvas.caption(*x, *y, *w, *h, caption);
    }

    let mut out = canvas.into_string();
    if placements.iter().any(|p| p.rotated) {
        out.push_str("* rotated\n");
    }
    out
}

/// One-line drawing of a bar: `#` for cut material, `.` for leftover.
pub fn render_bar(bar_length: f64, placements: &[PlacedPiece]) -> String {
    let cols = MAX_WIDTH as usize;
    let scale = MAX_WIDTH / bar_length;
    let mut line = vec!['.'; cols];

    for (n, p) in placements.iter().enumerate() {
        let start = (p.x * scale).round() as usize;
        let end = (((p.x + p.piece.width) * scale).round() as usize).min(cols);
        // Alternate fill so neighbouring cuts stay distinguishable.
        let fill = if n % 2 == 0 { '#' } else { '=' };
        for c in line.iter_mut().take(end).skip(start) {
            *c = fill;
        }
    }

    let body: String = line.into_iter().collect();
    format!("|{body}|\n")
}

/// Printable cutting sheet for the workshop.
pub fn render_cutting_sheet(stock: &Stock, result: &CuttingPlanResult) -> String {
    let unit = if stock.is_bar() { "cm" } else { "cm2" };
    let mut out = String::new();

    let _ = writeln!(out, "Cutting plan: {stock}");
    let _ = writeln!(
        out,
        "Stock units: {}  Utilization: {:.1}%  Waste: {:.1}% ({:.2} {unit})",
        result.stock_units_used,
        result.utilization_percentage(),
        result.waste_percentage,
        result.total_waste,
    );

    for layout in &result.layouts {
        out.push('\n');
        write_layout(&mut out, stock, layout, unit);
    }

    if !result.unplaced.is_empty() {
        let _ = writeln!(out, "\nNot placed (larger than stock):");
        for p in &result.unplaced {
            let size = if stock.is_bar() {
                format!("{}", p.width)
            } else {
                p.rect().to_string()
            };
            let _ = writeln!(out, "  {size}  {}", p.label);
        }
    }

    out
}

fn write_layout(out: &mut String, stock: &Stock, layout: &Layout, unit: &str) {
    let noun = if stock.is_bar() { "Bar" } else { "Sheet" };
    let _ = writeln!(out, "{noun} {}:", layout.stock_unit_index);

    for p in &layout.placed_pieces {
        if stock.is_bar() {
            let _ = writeln!(out, "  {} @ {}  {}", p.piece.width, p.x, p.piece.label);
        } else {
            let rot = if p.rotated { " [rotated]" } else { "" };
            let _ = writeln!(
                out,
                "  {} @ ({}, {}){rot}  {}",
                p.placed_rect(),
                p.x,
                p.y,
                p.piece.label
            );
        }
    }
    let _ = writeln!(out, "  leftover: {:.2} {unit}", layout.waste);
}

/// Character grid with one extra row and column so right and bottom
/// borders land inside it.
struct Canvas {
    cells: Vec<Vec<char>>,
}

impl Canvas {
    fn new(cols: usize, rows: usize) -> Self {
        Self {
            cells: vec![vec![' '; cols + 1]; rows + 1],
        }
    }

    fn cell(&mut self, col: usize, row: usize) -> Option<&mut char> {
        self.cells.get_mut(row).and_then(|r| r.get_mut(col))
    }

    /// Crossing edges become a junction.
    fn edge(&mut self, col: usize, row: usize, line: char) {
        if let Some(c) = self.cell(col, row) {
            *c = match *c {
                ' ' => line,
                same if same == line => line,
                _ => '+',
            };
        }
    }

    fn frame(&mut self, col: usize, row: usize, w: usize, h: usize) {
        for c in col..=col + w {
            self.edge(c, row, '-');
            self.edge(c, row + h, '-');
        }
        for r in row..=row + h {
            self.edge(col, r, '|');
            self.edge(col + w, r, '|');
        }
        for (c, r) in [(col, row), (col + w, row), (col, row + h), (col + w, row + h)] {
            if let Some(cell) = self.cell(c, r) {
                *cell = '+';
            }
        }
    }

    /// Centers `text` on the middle interior row, truncated to the interior width.
    fn caption(&mut self, col: usize, row: usize, w: usize, h: usize, text: &str) {
        let inner = w.saturating_sub(1);
        if inner == 0 || h < 2 {
            return;
        }
        let chars: Vec<char> = text.chars().take(inner).collect();
        let start = col + 1 + (inner - chars.len()) / 2;
        let mid = row + h / 2;
        for (i, ch) in chars.into_iter().enumerate() {
            if let Some(cell) = self.cell(start + i, mid) {
                *cell = ch;
            }
        }
    }

    fn into_string(self) -> String {
        let mut out = String::new();
        for row in self.cells {
            let line: String = row.into_iter().collect();
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }
}
