//! Closing step shared by both packers: per-bin layouts and plan totals.

use crate::types::{CutPiece, CuttingPlanResult, Layout, PlacedPiece};

/// Placements and leftover of one finished bin.
#[derive(Debug, Clone)]
pub struct BinSummary {
    pub placements: Vec<PlacedPiece>,
    pub waste: f64,
}

/// `unit_area` is the bar length for 1-D stock.
pub fn aggregate(unit_area: f64, bins: Vec<BinSummary>, unplaced: Vec<CutPiece>) -> CuttingPlanResult {
    let stock_units_used = bins.len();
    let total_stock_area = stock_units_used as f64 * unit_area;
    let total_waste: f64 = bins.iter().map(|b| b.waste).sum();
    let total_pieces_area = total_stock_area - total_waste;
    let waste_percentage = if total_stock_area > 0.0 {
        total_waste / total_stock_area * 100.0
    } else {
        0.0
    };

    let layouts = bins
        .into_iter()
        .enumerate()
        .map(|(i, bin)| Layout {
            stock_unit_index: i + 1,
            placed_pieces: bin.placements,
            waste: bin.waste,
        })
        .collect();

    CuttingPlanResult {
        stock_units_used,
        total_pieces_area,
        total_stock_area,
        total_waste,
        waste_percentage,
        layouts,
        unplaced,
    }
}
