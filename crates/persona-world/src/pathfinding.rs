//! A* path-finding over the tile grid.
//!
//! Movement is 4-directional with unit step cost. The heuristic is the
//! Manhattan distance to the nearest target tile, which is admissible and
//! consistent for this movement model, so the first target popped from the
//! open set ends the search with a shortest path.
//!
//! The open set is a [`BinaryHeap`] of `Reverse((f, h, tile))`. Among equal
//! f-scores the node closer to a target wins, then the smaller tile; the
//! result is deterministic but callers must not depend on which of several
//! equally short paths comes back.
//!
//! Unreachable targets are not an error: the finder returns `[start]` so
//! the caller keeps the character where it is.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};

use persona_types::Tile;

use crate::grid::Grid;

/// Shortest path from `start` to `target`, both inclusive.
///
/// Returns `[start]` when `start == target` or when `target` cannot be
/// reached (blocked, walled off, or out of bounds).
pub fn find_path(grid: &Grid, start: Tile, target: Tile) -> Vec<Tile> {
    find_path_to_any(grid, start, &BTreeSet::from([target]))
}

/// Shortest path from `start` to whichever tile of `targets` is closest by
/// walking distance.
///
/// Returns `[start]` when `start` is itself a target, when no target is
/// passable, or when none can be reached. The start tile is never checked
/// for passability: the character already stands there.
pub fn find_path_to_any(grid: &Grid, start: Tile, targets: &BTreeSet<Tile>) -> Vec<Tile> {
    let stay = vec![start];
    if targets.contains(&start) {
        return stay;
    }
    let goals: Vec<Tile> = targets
        .iter()
        .copied()
        .filter(|t| grid.is_passable(*t))
        .collect();
    if goals.is_empty() {
        return stay;
    }
    let Some(start_index) = grid.index_of(start) else {
        return stay;
    };

    let heuristic = |tile: Tile| -> u32 {
        goals
            .iter()
            .map(|g| tile.manhattan(*g))
            .min()
            .unwrap_or(u32::MAX)
    };

    let cells = grid.len();
    let mut g_score: Vec<u32> = vec![u32::MAX; cells];
    let mut came_from: Vec<Option<Tile>> = vec![None; cells];
    let mut closed: Vec<bool> = vec![false; cells];
    let mut open = BinaryHeap::new();

    if let Some(g) = g_score.get_mut(start_index) {
        *g = 0;
    }
    let h = heuristic(start);
    open.push(Reverse((h, h, start)));

    while let Some(Reverse((_, _, current))) = open.pop() {
        let Some(current_index) = grid.index_of(current) else {
            continue;
        };
        if closed.get(current_index).copied().unwrap_or(true) {
            continue;
        }
        if let Some(c) = closed.get_mut(current_index) {
            *c = true;
        }

        if targets.contains(&current) {
            return reconstruct(grid, &came_from, start, current);
        }

        let current_g = g_score.get(current_index).copied().unwrap_or(u32::MAX);
        let tentative = current_g.saturating_add(1);

        for neighbor in grid.neighbors(current) {
            let Some(neighbor_index) = grid.index_of(neighbor) else {
                continue;
            };
            let known = g_score.get(neighbor_index).copied().unwrap_or(0);
            if tentative >= known {
                continue;
            }
            if let Some(g) = g_score.get_mut(neighbor_index) {
                *g = tentative;
            }
            if let Some(prev) = came_from.get_mut(neighbor_index) {
                *prev = Some(current);
            }
            let h = heuristic(neighbor);
            open.push(Reverse((tentative.saturating_add(h), h, neighbor)));
        }
    }

    tracing::trace!(%start, targets = targets.len(), "no path to any target");
    stay
}

/// Walk `came_from` back from `goal` to `start`.
fn reconstruct(grid: &Grid, came_from: &[Option<Tile>], start: Tile, goal: Tile) -> Vec<Tile> {
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        let Some(prev) = grid
            .index_of(current)
            .and_then(|i| came_from.get(i).copied().flatten())
        else {
            break;
        };
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

/// Whether `path` is a walk on `grid`: consecutive tiles are orthogonal
/// neighbors and every tile after the first is passable.
pub fn is_walkable(grid: &Grid, path: &[Tile]) -> bool {
    let Some(first) = path.first() else {
        return false;
    };
    if !grid.contains(*first) {
        return false;
    }
    path.windows(2).all(|pair| match pair {
        [a, b] => a.is_adjacent(*b) && grid.is_passable(*b),
        _ => false,
    })
}
