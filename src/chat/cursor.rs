//! Selection movement and scroll offsets.
//!
//! Works on message heights (rows per message, newest first) and bottom-up
//! row offsets, matching [`Transcript`](super::layout::Transcript).

/// Which way the selection moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Toward older messages (+1).
    Older,
    /// Toward newer messages (-1).
    Newer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    To { index: usize, offset: usize },
    /// Nothing to move to; state is unchanged.
    Stay,
    /// Moved past the oldest cached message while older history may exist.
    NeedMoreHistory,
}

fn span(heights: &[usize], index: usize) -> (usize, usize) {
    let start: usize = heights.iter().take(index).sum();
    (start, start + heights.get(index).copied().unwrap_or(0))
}

/// Smallest scroll change that shows message `index` in full.
///
/// A message taller than the viewport is aligned so its first row sits at the
/// top of the screen.
pub fn fit_offset(heights: &[usize], index: usize, offset: usize, viewport: usize) -> usize {
    let (start, end) = span(heights, index);
    if end - start > viewport {
        end.saturating_sub(viewport)
    } else if start < offset {
        start
    } else if end > offset + viewport {
        end - viewport
    } else {
        offset
    }
}

/// Move the selection one message in `direction`.
///
/// `history_exhausted` tells whether the backend has already returned
/// everything older than the cached window.
pub fn move_selection(
    heights: &[usize],
    current: usize,
    direction: Direction,
    offset: usize,
    viewport: usize,
    history_exhausted: bool,
) -> Move {
    let count = heights.len();
    let target = match direction {
        Direction::Older => current + 1,
        Direction::Newer => match current.checked_sub(1) {
            Some(t) => t,
            None => return Move::Stay,
        },
    };
    if target >= count {
        return if history_exhausted || count == 0 {
            Move::Stay
        } else {
            Move::NeedMoreHistory
        };
    }
    Move::To {
        index: target,
        offset: fit_offset(heights, target, offset, viewport),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fully_visible(heights: &[usize], index: usize, offset: usize, viewport: usize) -> bool {
        let (start, end) = span(heights, index);
        if end - start > viewport {
            // First (top) row on screen.
            end - 1 >= offset && end - 1 < offset + viewport
        } else {
            start >= offset && end <= offset + viewport
        }
    }

    #[test]
    fn test_three_single_line_messages() {
        let heights = [1, 1, 1];
        let mut index = 0;
        let mut offset = 0;
        for expected in [1, 2] {
            match move_selection(&heights, index, Direction::Older, offset, 10, true) {
                Move::To { index: i, offset: o } => {
                    index = i;
                    offset = o;
                }
                other => panic!("unexpected {other:?}"),
            }
            assert_eq!(index, expected);
            assert_eq!(offset, 0);
        }
        assert_eq!(move_selection(&heights, index, Direction::Older, offset, 10, true), Move::Stay);
        assert_eq!(
            move_selection(&heights, index, Direction::Older, offset, 10, false),
            Move::NeedMoreHistory
        );
    }

    #[test]
    fn test_newest_is_a_wall() {
        assert_eq!(move_selection(&[2, 2], 0, Direction::Newer, 0, 5, false), Move::Stay);
    }

    #[test]
    fn test_empty_channel_never_asks_for_history() {
        assert_eq!(move_selection(&[], 0, Direction::Older, 0, 5, false), Move::Stay);
    }

    #[test]
    fn test_scrolls_up_when_target_leaves_top() {
        // Viewport of 4 rows; message 2 spans rows 4..7.
        let heights = [2, 2, 3];
        let m = move_selection(&heights, 1, Direction::Older, 0, 4, true);
        assert_eq!(m, Move::To { index: 2, offset: 3 });
        // Coming back down scrolls just enough to show message 1 (rows 2..4).
        let m = move_selection(&heights, 2, Direction::Newer, 3, 4, true);
        assert_eq!(m, Move::To { index: 1, offset: 2 });
        let m = move_selection(&heights, 1, Direction::Newer, 2, 4, true);
        assert_eq!(m, Move::To { index: 0, offset: 0 });
    }

    #[test]
    fn test_tall_message_shows_its_first_line() {
        let heights = [1, 9];
        let m = move_selection(&heights, 0, Direction::Older, 0, 4, true);
        assert_eq!(m, Move::To { index: 1, offset: 6 });
    }

    #[test]
    fn test_selection_always_visible_across_walks() {
        let heights = [1, 3, 2, 5, 1, 4, 2, 2, 1, 6];
        for viewport in [1, 3, 5, 8] {
            let mut index = 0;
            let mut offset = 0;
            let walk = [Direction::Older; 12]
                .into_iter()
                .chain([Direction::Newer; 5])
                .chain([Direction::Older; 3])
                .chain([Direction::Newer; 12]);
            for dir in walk {
                if let Move::To { index: i, offset: o } =
                    move_selection(&heights, index, dir, offset, viewport, true)
                {
                    index = i;
                    offset = o;
                }
                assert!(index < heights.len());
                assert!(
                    fully_visible(&heights, index, offset, viewport),
                    "viewport {viewport}: message {index} hidden at offset {offset}"
                );
            }
        }
    }

    #[test]
    fn test_fit_offset_after_shrinking_viewport() {
        // Message 1 spans rows 2..5; with only 2 rows it is too tall.
        assert_eq!(fit_offset(&[2, 3], 1, 0, 2), 3);
        assert_eq!(fit_offset(&[2, 3], 1, 0, 10), 0);
    }
}
