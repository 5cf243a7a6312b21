//! Procedural enemy path over the defense grid: a weighted random walk
//! that drifts rightward from column 0 toward the treasury corner.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use arcade_core::entity::Vec2;

pub const GRID_COLS: u32 = 8;
pub const GRID_ROWS: u32 = 6;

/// The walk runs at most this many cells before the treasury is
/// force-appended, bounding the final path at one more cell.
pub const MAX_WALK_CELLS: usize = 20;
pub const MAX_PATH_LEN: usize = MAX_WALK_CELLS + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub col: u32,
    pub row: u32,
}

/// The cell enemies are marching for, bottom-right corner.
pub const TREASURY: Cell = Cell {
    col: GRID_COLS - 1,
    row: GRID_ROWS - 1,
};

/// World-space center of a cell.
pub fn cell_center(cell: Cell, cell_size: f32) -> Vec2 {
    Vec2::new(
        (cell.col as f32 + 0.5) * cell_size,
        (cell.row as f32 + 0.5) * cell_size,
    )
}

/// The cell containing a world-space point, if it is on the grid.
pub fn cell_at(x: f32, y: f32, cell_size: f32) -> Option<Cell> {
    if x < 0.0 || y < 0.0 {
        return None;
    }
    let col = (x / cell_size) as u32;
    let row = (y / cell_size) as u32;
    (col < GRID_COLS && row < GRID_ROWS).then_some(Cell { col, row })
}

/// Generate the enemy path for one run.
///
/// Starts at a random row in column 0 and walks with weights right 3,
/// down 1, up 1. Moves that leave the grid or revisit a cell are
/// re-rolled; in the last column the walk is forced down toward the
/// treasury. If the walk has not arrived after [`MAX_WALK_CELLS`] cells
/// (or strands itself), the treasury is appended so the path always
/// ends there.
pub fn generate_path(rng: &mut StdRng) -> Vec<Cell> {
    let start = Cell {
        col: 0,
        row: rng.random_range(0..GRID_ROWS),
    };
    let mut path = vec![start];
    'walk: while path.len() < MAX_WALK_CELLS {
        let Some(&current) = path.last() else {
            break;
        };
        if current == TREASURY {
            break;
        }
        if current.col == GRID_COLS - 1 {
            // Last column: straight down to the treasury. These cells
            // cannot have been visited, the walk never leaves the
            // column again.
            path.push(Cell {
                col: current.col,
                row: current.row + 1,
            });
            continue;
        }
        for _ in 0..10 {
            let candidate = match rng.random_range(0..5u8) {
                0..=2 => Cell {
                    col: current.col + 1,
                    row: current.row,
                },
                3 if current.row + 1 < GRID_ROWS => Cell {
                    col: current.col,
                    row: current.row + 1,
                },
                4 if current.row > 0 => Cell {
                    col: current.col,
                    row: current.row - 1,
                },
                _ => continue,
            };
            if path.contains(&candidate) {
                continue;
            }
            path.push(candidate);
            continue 'walk;
        }
        // Stranded between visited cells; bail out to the force-append.
        break;
    }
    if path.last() != Some(&TREASURY) {
        path.push(TREASURY);
    }
    path
}
