use crate::config::EPS;
use crate::types::{CutPiece, PlacedPiece, Rect};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreeRect {
    pub x: f64,
    pub y: f64,
    pub rect: Rect,
}

/// One sheet being cut: its unallocated rectangles and what was placed so far.
#[derive(Debug, Clone)]
pub struct GuillotineBin {
    stock: Rect,
    pub free_rects: Vec<FreeRect>,
    pub placements: Vec<PlacedPiece>,
}

/// Best-short-side-fit candidate inside one bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredPlacement {
    pub free_idx: usize,
    pub rotated: bool,
    pub score: f64,
}

impl GuillotineBin {
    pub fn new(stock: Rect) -> Self {
        Self {
            stock,
            free_rects: vec![FreeRect {
                x: 0.0,
                y: 0.0,
                rect: stock,
            }],
            placements: Vec::new(),
        }
    }

    pub fn used_area(&self) -> f64 {
        self.placements.iter().map(|p| p.placed_rect().area()).sum()
    }

    pub fn waste(&self) -> f64 {
        self.stock.area() - self.used_area()
    }

    /// Lowest-scoring free rectangle for `piece`; the first one wins ties.
    ///
    /// A rectangle is tried rotated only when the piece does not fit it as
    /// given, so `rotated` always means the turn was needed.
    pub fn find_best(&self, piece: Rect) -> Option<ScoredPlacement> {
        let mut best: Option<ScoredPlacement> = None;

        for (idx, free) in self.free_rects.iter().enumerate() {
            let candidate = if piece.fits_in(&free.rect) {
                Some((piece, false))
            } else if piece.rotated().fits_in(&free.rect) {
                Some((piece.rotated(), true))
            } else {
                None
            };

            if let Some((placed, rotated)) = candidate {
                let score = Self::short_side_leftover(placed, free.rect);
                if best.is_none_or(|b| score < b.score) {
                    best = Some(ScoredPlacement {
                        free_idx: idx,
                        rotated,
                        score,
                    });
                }
            }
        }

        best
    }

    fn short_side_leftover(placed: Rect, free: Rect) -> f64 {
        f64::min(free.w - placed.w, free.h - placed.h)
    }

    pub fn place(&mut self, scored: ScoredPlacement, piece: &CutPiece) -> &PlacedPiece {
        // Order-preserving removal keeps tie-breaking stable across placements.
        let free = self.free_rects.remove(scored.free_idx);
        let placed = if scored.rotated {
            piece.rect().rotated()
        } else {
            piece.rect()
        };

        self.split(free, placed);
        self.placements.push(PlacedPiece {
            piece: piece.clone(),
            x: free.x,
            y: free.y,
            rotated: scored.rotated,
        });

        &self.placements[self.placements.len() - 1]
    }

    /// Single straight cut: the right part keeps the full height, the bottom
    /// part only spans the placed width.
    fn split(&mut self, free: FreeRect, placed: Rect) {
        if free.rect.w - placed.w > EPS {
            self.free_rects.push(FreeRect {
                x: free.x + placed.w,
                y: free.y,
                rect: Rect::new(free.rect.w - placed.w, free.rect.h),
            });
        }
        if free.rect.h - placed.h > EPS {
            self.free_rects.push(FreeRect {
                x: free.x,
                y: free.y + placed.h,
                rect: Rect::new(placed.w, free.rect.h - placed.h),
            });
        }
    }
}
