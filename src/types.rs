use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::{PlanError, Result};

/// Width/height pair in centimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(w: f64, h: f64) -> Self {
        Self { w, h }
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    pub fn rotated(&self) -> Self {
        Self {
            w: self.h,
            h: self.w,
        }
    }

    pub fn fits_in(&self, other: &Rect) -> bool {
        config::fits(self.w, other.w) && config::fits(self.h, other.h)
    }

    /// Exact containment in either orientation, with no tolerance. Used against
    /// the whole stock, where the catalog size is the hard limit.
    pub fn within_either_way(&self, other: &Rect) -> bool {
        let within = |r: Rect| r.w <= other.w && r.h <= other.h;
        within(*self) || within(self.rotated())
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}

/// One unit of material demand. `height` is zero for bar cuts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutPiece {
    pub id: String,
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub label: String,
}

impl CutPiece {
    pub fn new(id: impl Into<String>, width: f64, height: f64, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            label: label.into(),
        }
    }

    pub fn bar(id: impl Into<String>, length: f64, label: impl Into<String>) -> Self {
        Self::new(id, length, 0.0, label)
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.width, self.height)
    }
}

/// An order line: `qty` identical pieces sharing one label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demand {
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    pub qty: u32,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedPiece {
    pub piece: CutPiece,
    pub x: f64,
    pub y: f64,
    pub rotated: bool,
}

impl PlacedPiece {
    /// Footprint as cut, after rotation.
    pub fn placed_rect(&self) -> Rect {
        let rect = self.piece.rect();
        if self.rotated { rect.rotated() } else { rect }
    }
}

/// Everything cut from one stock unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub stock_unit_index: usize,
    pub placed_pieces: Vec<PlacedPiece>,
    pub waste: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuttingPlanResult {
    pub stock_units_used: usize,
    pub total_pieces_area: f64,
    pub total_stock_area: f64,
    pub total_waste: f64,
    pub waste_percentage: f64,
    pub layouts: Vec<Layout>,
    /// Pieces larger than the stock in every orientation.
    pub unplaced: Vec<CutPiece>,
}

impl CuttingPlanResult {
    pub fn utilization_percentage(&self) -> f64 {
        if self.stock_units_used == 0 {
            return 0.0;
        }
        100.0 - self.waste_percentage
    }

    pub fn placed_count(&self) -> usize {
        self.layouts.iter().map(|l| l.placed_pieces.len()).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.unplaced.is_empty()
    }

    /// Turns any unplaced piece into a hard failure.
    pub fn into_strict(self) -> Result<Self> {
        if self.unplaced.is_empty() {
            return Ok(self);
        }
        let labels = self
            .unplaced
            .iter()
            .map(|p| {
                if p.label.is_empty() {
                    p.id.clone()
                } else {
                    p.label.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        Err(PlanError::OversizedPieces {
            count: self.unplaced.len(),
            labels,
        })
    }
}

/// Catalog stock a plan is cut from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Stock {
    Bar { length: f64 },
    Sheet { width: f64, height: f64 },
}

impl Stock {
    /// Length for bars, area for sheets.
    pub fn unit_area(&self) -> f64 {
        match *self {
            Stock::Bar { length } => length,
            Stock::Sheet { width, height } => width * height,
        }
    }

    pub fn is_bar(&self) -> bool {
        matches!(self, Stock::Bar { .. })
    }

    pub fn validate(&self) -> Result<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        match *self {
            Stock::Bar { length } if !positive(length) => Err(PlanError::invalid_bar(length)),
            Stock::Sheet { width, height } if !positive(width) || !positive(height) => {
                Err(PlanError::invalid_sheet(width, height))
            }
            _ => Ok(()),
        }
    }
}

impl std::fmt::Display for Stock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stock::Bar { length } => write!(f, "bar of {length} cm"),
            Stock::Sheet { width, height } => write!(f, "sheet of {width} x {height} cm"),
        }
    }
}
