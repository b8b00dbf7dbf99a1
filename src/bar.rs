//! First-Fit Decreasing packing of linear cuts (mouldings) into fixed-length bars.

use crate::aggregate::{BinSummary, aggregate};
use crate::config;
use crate::error::{PlanError, Result};
use crate::types::{CutPiece, CuttingPlanResult, PlacedPiece};

#[derive(Debug, Clone)]
struct BarBin {
    remaining: f64,
    placements: Vec<PlacedPiece>,
}

impl BarBin {
    fn new(length: f64) -> Self {
        Self {
            remaining: length,
            placements: Vec::new(),
        }
    }

    fn place(&mut self, bar_length: f64, piece: &CutPiece) {
        self.placements.push(PlacedPiece {
            piece: piece.clone(),
            x: bar_length - self.remaining,
            y: 0.0,
            rotated: false,
        });
        // Within EPS a fit may overshoot; never report negative leftover.
        self.remaining = (self.remaining - piece.width).max(0.0);
    }
}

/// Packs `pieces` by their `width` into bars of `bar_length` cm.
///
/// Pieces longer than the bar are returned in `unplaced`.
pub fn pack_bars(bar_length: f64, pieces: &[CutPiece]) -> Result<CuttingPlanResult> {
    if !bar_length.is_finite() || bar_length <= 0.0 {
        return Err(PlanError::invalid_bar(bar_length));
    }

    let mut sorted: Vec<&CutPiece> = pieces.iter().collect();
    // sort_by is stable: equal lengths keep input order
    sorted.sort_by(|a, b| b.width.total_cmp(&a.width));

    let mut bins: Vec<BarBin> = Vec::new();
    let mut unplaced = Vec::new();

    for piece in sorted {
        // The bar length is a hard limit; tolerance only absorbs drift in `remaining`.
        if piece.width > bar_length {
            tracing::warn!(
                id = %piece.id,
                label = %piece.label,
                length = piece.width,
                bar_length,
                "piece is longer than the bar"
            );
            unplaced.push(piece.clone());
            continue;
        }

        match bins
            .iter()
            .position(|bin| config::fits(piece.width, bin.remaining))
        {
            Some(bi) => bins[bi].place(bar_length, piece),
            None => {
                let mut bin = BarBin::new(bar_length);
                bin.place(bar_length, piece);
                bins.push(bin);
                tracing::debug!(bin = bins.len(), first = piece.width, "opened bar");
            }
        }
    }

    tracing::debug!(
        pieces = pieces.len(),
        bars = bins.len(),
        unplaced = unplaced.len(),
        "bar plan complete"
    );

    let summaries = bins
        .into_iter()
        .map(|bin| BinSummary {
            waste: bin.remaining,
            placements: bin.placements,
        })
        .collect();

    Ok(aggregate(bar_length, summaries, unplaced))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars(lengths: &[f64]) -> Vec<CutPiece> {
        lengths
            .iter()
            .enumerate()
            .map(|(i, &l)| CutPiece::bar(format!("p{i}"), l, format!("L{l}")))
            .collect()
    }

    #[test]
    fn test_first_fit_decreasing_scenario() {
        let result = pack_bars(300.0, &bars(&[200.0, 150.0, 100.0, 50.0])).unwrap();
        assert_eq!(result.stock_units_used, 2);
        assert!((result.total_waste - 100.0).abs() < 1e-9);

        let first: Vec<(f64, f64)> = result.layouts[0]
            .placed_pieces
            .iter()
            .map(|p| (p.piece.width, p.x))
            .collect();
        assert_eq!(first, vec![(200.0, 0.0), (100.0, 200.0)]);
        assert_eq!(result.layouts[0].waste, 0.0);

        let second: Vec<(f64, f64)> = result.layouts[1]
            .placed_pieces
            .iter()
            .map(|p| (p.piece.width, p.x))
            .collect();
        assert_eq!(second, vec![(150.0, 0.0), (50.0, 150.0)]);
        assert_eq!(result.layouts[1].waste, 100.0);
    }

    #[test]
    fn test_first_fit_not_best_fit() {
        // 20 goes into the first bar with room (remaining 50), not the exact fit in the second (remaining 20).
        let result = pack_bars(300.0, &bars(&[140.0, 250.0, 140.0, 20.0])).unwrap();
        assert_eq!(result.stock_units_used, 2);
        assert_eq!(result.layouts[0].placed_pieces[0].piece.width, 250.0);
        assert_eq!(result.layouts[0].placed_pieces[1].piece.width, 20.0);
        assert_eq!(result.layouts[0].placed_pieces[1].x, 250.0);
        assert_eq!(result.layouts[0].waste, 30.0);
        assert_eq!(result.layouts[1].waste, 20.0);
    }

    #[test]
    fn test_equal_lengths_keep_input_order() {
        let result = pack_bars(100.0, &bars(&[40.0, 40.0, 40.0])).unwrap();
        let ids: Vec<&str> = result.layouts[0]
            .placed_pieces
            .iter()
            .map(|p| p.piece.id.as_str())
            .collect();
        assert_eq!(ids, vec!["p0", "p1"]);
        assert_eq!(result.layouts[1].placed_pieces[0].piece.id, "p2");
    }

    #[test]
    fn test_oversized_piece_unplaced() {
        let result = pack_bars(300.0, &bars(&[350.0, 120.0])).unwrap();
        assert_eq!(result.stock_units_used, 1);
        assert_eq!(result.unplaced.len(), 1);
        assert_eq!(result.unplaced[0].width, 350.0);
        assert!(result.layouts.iter().all(|l| l.waste >= 0.0));
    }

    #[test]
    fn test_piece_just_over_bar_length_is_unplaced() {
        let result = pack_bars(300.0, &bars(&[300.00009])).unwrap();
        assert_eq!(result.stock_units_used, 0);
        assert_eq!(result.unplaced.len(), 1);
        assert_eq!(result.total_pieces_area, 0.0);

        let exact = pack_bars(300.0, &bars(&[300.0])).unwrap();
        assert_eq!(exact.stock_units_used, 1);
        assert_eq!(exact.total_pieces_area, 300.0);
        assert_eq!(exact.total_waste, 0.0);
    }

    #[test]
    fn test_invalid_bar_length() {
        assert!(matches!(
            pack_bars(0.0, &bars(&[10.0])),
            Err(PlanError::InvalidStock { .. })
        ));
        assert!(pack_bars(-5.0, &[]).is_err());
    }

    #[test]
    fn test_empty_pieces() {
        let result = pack_bars(300.0, &[]).unwrap();
        assert_eq!(result.stock_units_used, 0);
        assert_eq!(result.waste_percentage, 0.0);
    }

    #[test]
    fn test_fractional_exact_fill() {
        // 3 x 33.3333 fills 100 within tolerance
        let result = pack_bars(100.0, &bars(&[100.0 / 3.0, 100.0 / 3.0, 100.0 / 3.0])).unwrap();
        assert_eq!(result.stock_units_used, 1);
        assert!(result.total_waste.abs() < 1e-6);
    }
}
