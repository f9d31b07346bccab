//! Packing captured words into the heart
//!
//! Rows are filled greedily (first fit, in word order) against the heart's
//! width at each row's height. Every row takes at least one word; words that
//! still don't fit once the heart is full join the last row.

use glam::Vec2;

use super::heart::heart_width_at;
use crate::tuning::Tuning;

/// A measured word
#[derive(Debug, Clone, PartialEq)]
pub struct WordBox {
    pub id: String,
    /// Rendered width and height (px)
    pub size: Vec2,
}

/// Where a word's centre goes
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub id: String,
    pub center: Vec2,
}

/// Lay out `words` inside the heart for a viewport of `viewport` pixels
pub fn pack_into_heart(words: &[WordBox], viewport: Vec2, tuning: &Tuning) -> Vec<Placement> {
    let Some(first) = words.first() else {
        return Vec::new();
    };

    let top = viewport.y * tuning.heart_top;
    let bottom = viewport.y * tuning.heart_bottom;
    let center_x = viewport.x * tuning.heart_center_x;
    let total_h = (bottom - top).max(f32::EPSILON);
    let row_h = first.size.y;
    let row_gap = tuning.row_gap;
    let word_gap = tuning.word_gap;

    let mut queue: Vec<&WordBox> = words.iter().collect();
    let mut rows: Vec<Vec<&WordBox>> = Vec::new();
    let mut y = top;

    while !queue.is_empty() && y + row_h <= bottom {
        let max_width = heart_width_at((y - top) / total_h) * viewport.x * tuning.heart_row_fill;
        let mut row = Vec::new();
        let mut row_width = 0.0;
        let mut i = 0;
        while i < queue.len() {
            let gap = if row.is_empty() { 0.0 } else { word_gap };
            let needed = row_width + queue[i].size.x + gap;
            if needed <= max_width || row.is_empty() {
                row_width = needed;
                row.push(queue.remove(i));
                if row_width >= max_width {
                    break;
                }
            } else {
                i += 1;
            }
        }
        rows.push(row);
        y += row_h + row_gap;
    }

    match rows.last_mut() {
        Some(last) => last.append(&mut queue),
        // Heart shorter than one row: everything shares a single row
        None => rows.push(queue),
    }

    let used_h = rows.len() as f32 * (row_h + row_gap) - row_gap;
    let y_offset = (total_h - used_h) / 2.0;

    let mut placements = Vec::with_capacity(words.len());
    for (ri, row) in rows.iter().enumerate() {
        let row_y = top + y_offset + ri as f32 * (row_h + row_gap) + row_h / 2.0;
        let row_w: f32 = row.iter().map(|w| w.size.x).sum::<f32>()
            + row.len().saturating_sub(1) as f32 * word_gap;
        let mut x = center_x - row_w / 2.0;
        for word in row {
            placements.push(Placement {
                id: word.id.clone(),
                center: Vec2::new(x + word.size.x / 2.0, row_y),
            });
            x += word.size.x + word_gap;
        }
    }
    placements
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn boxes(widths: &[f32]) -> Vec<WordBox> {
        widths
            .iter()
            .enumerate()
            .map(|(i, &w)| WordBox {
                id: format!("w{i}"),
                size: Vec2::new(w, 24.0),
            })
            .collect()
    }

    #[test]
    fn test_single_word_centred() {
        let viewport = Vec2::new(1000.0, 800.0);
        let placed = pack_into_heart(&boxes(&[100.0]), viewport, &Tuning::default());
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].center.x, 500.0);
        // Centre of the heart box: (0.16 + 0.72) / 2 * 800
        assert!((placed[0].center.y - 352.0).abs() < 1e-3);
    }

    #[test]
    fn test_wide_word_still_gets_a_row() {
        let viewport = Vec2::new(400.0, 800.0);
        let placed = pack_into_heart(&boxes(&[2000.0, 50.0]), viewport, &Tuning::default());
        assert_eq!(placed.len(), 2);
        assert!(placed[0].center.y < placed[1].center.y);
    }

    #[test]
    fn test_tiny_viewport_uses_one_row() {
        let viewport = Vec2::new(300.0, 20.0);
        let placed = pack_into_heart(&boxes(&[60.0, 60.0, 60.0]), viewport, &Tuning::default());
        assert_eq!(placed.len(), 3);
        assert!(placed.iter().all(|p| p.center.y == placed[0].center.y));
    }

    #[test]
    fn test_empty() {
        assert!(pack_into_heart(&[], Vec2::new(800.0, 600.0), &Tuning::default()).is_empty());
    }

    proptest! {
        #[test]
        fn prop_every_word_placed_once_without_overlap(
            widths in prop::collection::vec(20.0f32..240.0, 1..16),
            vw in 320.0f32..1600.0,
            vh in 480.0f32..1200.0,
        ) {
            let tuning = Tuning::default();
            let words = boxes(&widths);
            let placed = pack_into_heart(&words, Vec2::new(vw, vh), &tuning);
            prop_assert_eq!(placed.len(), words.len());

            let mut ids: Vec<&str> = placed.iter().map(|p| p.id.as_str()).collect();
            ids.sort_unstable();
            ids.dedup();
            prop_assert_eq!(ids.len(), words.len());

            let width_of = |id: &str| words.iter().find(|w| w.id == id).unwrap().size.x;
            for (i, a) in placed.iter().enumerate() {
                for b in &placed[i + 1..] {
                    if (a.center.y - b.center.y).abs() < 1e-3 {
                        let gap = (a.center.x - b.center.x).abs();
                        let min = (width_of(&a.id) + width_of(&b.id)) / 2.0;
                        prop_assert!(gap + 1e-2 >= min + tuning.word_gap);
                    } else {
                        prop_assert!((a.center.y - b.center.y).abs() + 1e-3 >= 24.0 + tuning.row_gap);
                    }
                }
            }
        }

        #[test]
        fn prop_rows_centred_on_heart(
            widths in prop::collection::vec(20.0f32..200.0, 1..12),
        ) {
            let tuning = Tuning::default();
            let words = boxes(&widths);
            let viewport = Vec2::new(900.0, 700.0);
            let placed = pack_into_heart(&words, viewport, &tuning);
            let mut rows: Vec<(f32, f32, f32)> = Vec::new();
            for p in &placed {
                let w = words.iter().find(|b| b.id == p.id).unwrap().size.x;
                let (l, r) = (p.center.x - w / 2.0, p.center.x + w / 2.0);
                match rows.iter_mut().find(|(y, _, _)| (*y - p.center.y).abs() < 1e-3) {
                    Some(row) => { row.1 = row.1.min(l); row.2 = row.2.max(r); }
                    None => rows.push((p.center.y, l, r)),
                }
            }
            for (_, l, r) in rows {
                prop_assert!(((l + r) / 2.0 - 450.0).abs() < 1e-2);
            }
        }
    }
}
