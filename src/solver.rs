use crate::aggregate::{BinSummary, aggregate};
use crate::bar::pack_bars;
use crate::config::MAX_PIECES;
use crate::error::{PlanError, Result};
use crate::guillotine::{GuillotineBin, ScoredPlacement};
use crate::types::{CutPiece, CuttingPlanResult, Demand, Rect, Stock};

#[derive(Debug, Clone, Copy)]
struct Candidate {
    bin_idx: usize,
    scored: ScoredPlacement,
}

impl Stock {
    /// Runs the packer matching this stock's topology.
    pub fn plan(&self, pieces: &[CutPiece]) -> Result<CuttingPlanResult> {
        match *self {
            Stock::Bar { length } => pack_bars(length, pieces),
            Stock::Sheet { width, height } => pack_sheets(width, height, pieces),
        }
    }
}

/// Packs rectangular pieces into `sheet_width` x `sheet_height` sheets using
/// guillotine splits and best-short-side-fit, searching every open sheet.
///
/// Pieces that exceed the sheet in both orientations are returned in
/// `unplaced`; no sheet is opened for them.
pub fn pack_sheets(sheet_width: f64, sheet_height: f64, pieces: &[CutPiece]) -> Result<CuttingPlanResult> {
    Stock::Sheet {
        width: sheet_width,
        height: sheet_height,
    }
    .validate()?;

    let stock = Rect::new(sheet_width, sheet_height);
    let mut sorted: Vec<&CutPiece> = pieces.iter().collect();
    sorted.sort_by(|a, b| longest_side(b).total_cmp(&longest_side(a)));

    let mut bins: Vec<GuillotineBin> = Vec::new();
    let mut unplaced = Vec::new();

    for piece in sorted {
        let rect = piece.rect();
        if !rect.within_either_way(&stock) {
            tracing::warn!(
                id = %piece.id,
                label = %piece.label,
                size = %rect,
                sheet = %stock,
                "piece is too large for the sheet"
            );
            unplaced.push(piece.clone());
            continue;
        }

        match best_candidate(&bins, rect) {
            Some(c) => {
                bins[c.bin_idx].place(c.scored, piece);
            }
            None => {
                let mut bin = GuillotineBin::new(stock);
                match bin.find_best(rect) {
                    Some(scored) => {
                        bin.place(scored, piece);
                        bins.push(bin);
                        tracing::debug!(bin = bins.len(), size = %rect, "opened sheet");
                    }
                    None => unplaced.push(piece.clone()),
                }
            }
        }
    }

    tracing::debug!(
        pieces = pieces.len(),
        sheets = bins.len(),
        unplaced = unplaced.len(),
        "sheet plan complete"
    );

    let summaries = bins
        .into_iter()
        .map(|bin| BinSummary {
            waste: bin.waste(),
            placements: bin.placements,
        })
        .collect();

    Ok(aggregate(stock.area(), summaries, unplaced))
}

fn longest_side(piece: &CutPiece) -> f64 {
    f64::max(piece.width, piece.height)
}

/// Lowest score over all open bins; earlier bins win ties.
fn best_candidate(bins: &[GuillotineBin], piece: Rect) -> Option<Candidate> {
    bins.iter()
        .enumerate()
        .filter_map(|(bin_idx, bin)| bin.find_best(piece).map(|scored| Candidate { bin_idx, scored }))
        .fold(None, |best: Option<Candidate>, c| match best {
            Some(b) if b.scored.score <= c.scored.score => Some(b),
            _ => Some(c),
        })
}

/// Expands order lines into individual pieces with ids `"{line}-{n}"`.
///
/// A blank label becomes the piece size. Bars ignore `height`. The total
/// quantity is capped at [`MAX_PIECES`].
pub fn expand_demands(stock: &Stock, demands: &[Demand]) -> Result<Vec<CutPiece>> {
    let mut total: u32 = 0;
    for (line, d) in demands.iter().enumerate() {
        total = total
            .checked_add(d.qty)
            .filter(|&t| t <= MAX_PIECES)
            .ok_or_else(|| PlanError::InvalidPiece {
                line: line + 1,
                reason: format!("order exceeds {MAX_PIECES} pieces"),
            })?;
    }

    let mut pieces = Vec::with_capacity(total as usize);
    for (line, d) in demands.iter().enumerate() {
        let height = if stock.is_bar() { 0.0 } else { d.height };
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(d.width) || (!stock.is_bar() && !positive(height)) {
            return Err(PlanError::InvalidPiece {
                line: line + 1,
                reason: format!("dimensions must be positive, got {}x{}", d.width, d.height),
            });
        }
        if d.qty == 0 {
            return Err(PlanError::InvalidPiece {
                line: line + 1,
                reason: "quantity must be non-zero".to_string(),
            });
        }

        let label = if d.label.trim().is_empty() {
            if stock.is_bar() {
                format!("{}", d.width)
            } else {
                format!("{}", Rect::new(d.width, height))
            }
        } else {
            d.label.clone()
        };

        for n in 0..d.qty {
            pieces.push(CutPiece::new(format!("{}-{n}", line + 1), d.width, height, label.clone()));
        }
    }
    Ok(pieces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlacedPiece;

    fn sheet_pieces(sizes: &[(f64, f64)]) -> Vec<CutPiece> {
        sizes
            .iter()
            .enumerate()
            .map(|(i, &(w, h))| CutPiece::new(format!("p{i}"), w, h, format!("#{i}")))
            .collect()
    }

    /// Every placement lies inside the sheet and no two placements on the
    /// same sheet overlap.
    fn assert_plan_valid(result: &CuttingPlanResult, sheet: Rect, expected_pieces: usize) {
        assert_eq!(
            result.placed_count() + result.unplaced.len(),
            expected_pieces,
            "placed + unplaced must equal input"
        );

        for layout in &result.layouts {
            let si = layout.stock_unit_index;
            for (pi, p) in layout.placed_pieces.iter().enumerate() {
                let r = p.placed_rect();
                assert!(
                    p.x >= 0.0 && p.x + r.w <= sheet.w + 1e-6,
                    "sheet {si}, piece {pi} ({r}) exceeds width at x={}",
                    p.x
                );
                assert!(
                    p.y >= 0.0 && p.y + r.h <= sheet.h + 1e-6,
                    "sheet {si}, piece {pi} ({r}) exceeds height at y={}",
                    p.y
                );
            }
            assert_no_overlaps(si, &layout.placed_pieces);
        }
    }

    fn assert_no_overlaps(sheet_idx: usize, placements: &[PlacedPiece]) {
        for i in 0..placements.len() {
            for j in (i + 1)..placements.len() {
                let a = &placements[i];
                let b = &placements[j];
                let (ar, br) = (a.placed_rect(), b.placed_rect());

                let overlaps = a.x < b.x + br.w - 1e-6
                    && b.x < a.x + ar.w - 1e-6
                    && a.y < b.y + br.h - 1e-6
                    && b.y < a.y + ar.h - 1e-6;

                assert!(
                    !overlaps,
                    "sheet {sheet_idx}: piece {i} ({ar} @ ({},{})) overlaps piece {j} ({br} @ ({},{}))",
                    a.x, a.y, b.x, b.y
                );
            }
        }
    }

    #[test]
    fn test_single_piece() {
        let result = pack_sheets(100.0, 100.0, &sheet_pieces(&[(50.0, 50.0)])).unwrap();
        assert_plan_valid(&result, Rect::new(100.0, 100.0), 1);
        assert_eq!(result.stock_units_used, 1);
        assert_eq!(result.total_pieces_area, 2500.0);
        assert_eq!(result.total_waste, 7500.0);
    }

    #[test]
    fn test_two_large_squares_need_two_sheets() {
        let result = pack_sheets(100.0, 100.0, &sheet_pieces(&[(60.0, 60.0), (60.0, 60.0)])).unwrap();
        assert_plan_valid(&result, Rect::new(100.0, 100.0), 2);
        assert_eq!(result.stock_units_used, 2);
        assert!((result.waste_percentage - 64.0).abs() < 1e-9);
    }

    #[test]
    fn test_oversized_piece_opens_no_sheet() {
        let result = pack_sheets(50.0, 50.0, &sheet_pieces(&[(60.0, 60.0)])).unwrap();
        assert_eq!(result.stock_units_used, 0);
        assert_eq!(result.unplaced.len(), 1);
        assert_eq!(result.waste_percentage, 0.0);
    }

    #[test]
    fn test_four_quarters_fill_one_sheet() {
        let result = pack_sheets(100.0, 100.0, &sheet_pieces(&[(50.0, 50.0); 4])).unwrap();
        assert_plan_valid(&result, Rect::new(100.0, 100.0), 4);
        assert_eq!(result.stock_units_used, 1);
        assert!(result.total_waste.abs() < 1e-9);
    }

    #[test]
    fn test_rotation_helps() {
        let result = pack_sheets(100.0, 50.0, &sheet_pieces(&[(50.0, 100.0)])).unwrap();
        assert_plan_valid(&result, Rect::new(100.0, 50.0), 1);
        assert!(result.layouts[0].placed_pieces[0].rotated);
    }

    #[test]
    fn test_search_reaches_earlier_sheets() {
        // Sorted 90x90, 80x80, 20x100: each square opens a sheet and the strip
        // only fits beside the 80x80 on the second one.
        let result = pack_sheets(
            100.0,
            100.0,
            &sheet_pieces(&[(80.0, 80.0), (90.0, 90.0), (20.0, 100.0)]),
        )
        .unwrap();
        assert_plan_valid(&result, Rect::new(100.0, 100.0), 3);
        assert_eq!(result.stock_units_used, 2);
        let second: Vec<&str> = result.layouts[1]
            .placed_pieces
            .iter()
            .map(|p| p.piece.id.as_str())
            .collect();
        assert_eq!(second, vec!["p0", "p2"]);
    }

    #[test]
    fn test_piece_over_sheet_size_is_unplaced_exactly() {
        let pieces = vec![
            CutPiece::new("over", 100.00009, 50.0, ""),
            CutPiece::new("exact", 100.0, 50.0, ""),
        ];
        let result = pack_sheets(100.0, 100.0, &pieces).unwrap();
        assert_eq!(result.stock_units_used, 1);
        assert_eq!(result.unplaced.len(), 1);
        assert_eq!(result.unplaced[0].id, "over");
    }

    #[test]
    fn test_invalid_sheet() {
        assert!(matches!(
            pack_sheets(0.0, 100.0, &[]),
            Err(PlanError::InvalidStock { .. })
        ));
        assert!(pack_sheets(100.0, f64::INFINITY, &[]).is_err());
    }

    #[test]
    fn test_stock_dispatch() {
        let bar = Stock::Bar { length: 300.0 };
        let result = bar.plan(&[CutPiece::bar("a", 120.0, "")]).unwrap();
        assert_eq!(result.total_stock_area, 300.0);

        let sheet = Stock::Sheet { width: 100.0, height: 80.0 };
        let result = sheet.plan(&[CutPiece::new("a", 40.0, 30.0, "")]).unwrap();
        assert_eq!(result.total_stock_area, 8000.0);
    }

    #[test]
    fn test_expand_demands() {
        let stock = Stock::Sheet { width: 100.0, height: 80.0 };
        let demands = vec![
            Demand { width: 40.0, height: 30.0, qty: 2, label: "#1042".to_string() },
            Demand { width: 25.5, height: 20.0, qty: 1, label: String::new() },
        ];
        let pieces = expand_demands(&stock, &demands).unwrap();
        let ids: Vec<&str> = pieces.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1-0", "1-1", "2-0"]);
        assert_eq!(pieces[0].label, "#1042");
        assert_eq!(pieces[2].label, "25.5x20");
    }

    #[test]
    fn test_expand_demands_bar_drops_height() {
        let stock = Stock::Bar { length: 290.0 };
        let demands = vec![Demand { width: 54.0, height: 12.0, qty: 2, label: String::new() }];
        let pieces = expand_demands(&stock, &demands).unwrap();
        assert!(pieces.iter().all(|p| p.height == 0.0 && p.label == "54"));
    }

    #[test]
    fn test_expand_demands_caps_total_quantity() {
        let stock = Stock::Bar { length: 300.0 };
        let huge = vec![Demand { width: 10.0, height: 0.0, qty: 4_000_000_000, label: String::new() }];
        assert!(matches!(
            expand_demands(&stock, &huge),
            Err(PlanError::InvalidPiece { line: 1, .. })
        ));

        // Each line is under the cap but the sum is not; u32 overflow is caught too.
        let split = vec![
            Demand { width: 10.0, height: 0.0, qty: MAX_PIECES, label: String::new() },
            Demand { width: 10.0, height: 0.0, qty: 1, label: String::new() },
        ];
        assert!(matches!(
            expand_demands(&stock, &split),
            Err(PlanError::InvalidPiece { line: 2, .. })
        ));
        let overflow = vec![
            Demand { width: 10.0, height: 0.0, qty: u32::MAX, label: String::new() },
            Demand { width: 10.0, height: 0.0, qty: u32::MAX, label: String::new() },
        ];
        assert!(expand_demands(&stock, &overflow).is_err());

        let at_cap = vec![Demand { width: 10.0, height: 0.0, qty: MAX_PIECES, label: String::new() }];
        assert_eq!(expand_demands(&stock, &at_cap).unwrap().len(), MAX_PIECES as usize);
    }

    #[test]
    fn test_equal_scores_prefer_earlier_sheet() {
        // Each 60x60 opens its own sheet, leaving identical free space in
        // both. The 40x40 scores 0 on either sheet and must go to the first.
        let result = pack_sheets(
            100.0,
            100.0,
            &sheet_pieces(&[(60.0, 60.0), (60.0, 60.0), (40.0, 40.0)]),
        )
        .unwrap();
        assert_plan_valid(&result, Rect::new(100.0, 100.0), 3);
        assert_eq!(result.stock_units_used, 2);

        let first: Vec<(&str, f64, f64)> = result.layouts[0]
            .placed_pieces
            .iter()
            .map(|p| (p.piece.id.as_str(), p.x, p.y))
            .collect();
        assert_eq!(first, vec![("p0", 0.0, 0.0), ("p2", 60.0, 0.0)]);
        assert_eq!(result.layouts[1].placed_pieces.len(), 1);
    }

    #[test]
    fn test_expand_demands_rejects_bad_lines() {
        let stock = Stock::Sheet { width: 100.0, height: 80.0 };
        let zero_qty = vec![Demand { width: 10.0, height: 10.0, qty: 0, label: String::new() }];
        assert!(matches!(
            expand_demands(&stock, &zero_qty),
            Err(PlanError::InvalidPiece { line: 1, .. })
        ));
        let no_height = vec![
            Demand { width: 10.0, height: 10.0, qty: 1, label: String::new() },
            Demand { width: 10.0, height: 0.0, qty: 1, label: String::new() },
        ];
        assert!(matches!(
            expand_demands(&stock, &no_height),
            Err(PlanError::InvalidPiece { line: 2, .. })
        ));
    }
}
