use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::debug;

use crate::config::{RouteParams, RouterTuning};
use crate::geometry::{Anchor, Obstacle, Point, Rect, Side};

/// Grids larger than this are not searched; the edge takes the fallback path.
const MAX_GRID_CELLS: usize = 4_000_000;

/// Step vectors, indexed by direction: right, left, down, up.
const DIRS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
/// Direction slot of the search's initial state.
const NO_DIR: u8 = 4;

fn side_direction(side: Side) -> u8 {
    match side {
        Side::Right => 0,
        Side::Left => 1,
        Side::Bottom => 2,
        Side::Top => 3,
    }
}

fn is_reversal(a: u8, b: u8) -> bool {
    if a == NO_DIR || b == NO_DIR {
        return false;
    }
    let (ax, ay) = DIRS[a as usize];
    let (bx, by) = DIRS[b as usize];
    ax + bx == 0 && ay + by == 0
}

#[derive(Debug, Clone)]
struct RoutingGrid {
    cell: f32,
    min_x: f32,
    min_y: f32,
    cols: i32,
    rows: i32,
    blocked: Vec<bool>,
}

impl RoutingGrid {
    /// Builds a grid covering `points` and `obstacles` plus `margin`, with a
    /// vertex exactly on `origin` so straight stubs stay on grid lines.
    fn new(
        origin: Point,
        points: &[Point],
        obstacles: &[Rect],
        cell: f32,
        margin: f32,
    ) -> Option<Self> {
        let cell = cell.max(1.0);
        let mut min_x = f32::MAX;
        let mut min_y = f32::MAX;
        let mut max_x = f32::MIN;
        let mut max_y = f32::MIN;
        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        for obs in obstacles {
            min_x = min_x.min(obs.x);
            min_y = min_y.min(obs.y);
            max_x = max_x.max(obs.right());
            max_y = max_y.max(obs.bottom());
        }
        if !(min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite()) {
            return None;
        }
        min_x = origin.x - ((origin.x - (min_x - margin)) / cell).ceil() * cell;
        min_y = origin.y - ((origin.y - (min_y - margin)) / cell).ceil() * cell;
        max_x += margin;
        max_y += margin;

        // Sized in floating point first; huge extents must not reach the casts.
        let cols_f = (((max_x - min_x) / cell).ceil() + 1.0).max(2.0);
        let rows_f = (((max_y - min_y) / cell).ceil() + 1.0).max(2.0);
        if !(cols_f * rows_f <= MAX_GRID_CELLS as f32) {
            return None;
        }
        let cols = cols_f as i32;
        let rows = rows_f as i32;
        let total = cols as usize * rows as usize;

        let mut grid = Self {
            cell,
            min_x,
            min_y,
            cols,
            rows,
            blocked: vec![false; total],
        };
        for obs in obstacles {
            grid.block_rect(obs);
        }
        Some(grid)
    }

    fn block_rect(&mut self, rect: &Rect) {
        let start_x = (((rect.x - self.min_x) / self.cell).floor() as i32).max(0);
        let end_x = (((rect.right() - self.min_x) / self.cell).ceil() as i32).min(self.cols - 1);
        let start_y = (((rect.y - self.min_y) / self.cell).floor() as i32).max(0);
        let end_y = (((rect.bottom() - self.min_y) / self.cell).ceil() as i32).min(self.rows - 1);
        for iy in start_y..=end_y {
            for ix in start_x..=end_x {
                if rect.contains(self.point_for_cell(ix, iy)) {
                    let idx = self.index(ix, iy);
                    self.blocked[idx] = true;
                }
            }
        }
    }

    fn index(&self, ix: i32, iy: i32) -> usize {
        (iy * self.cols + ix) as usize
    }

    fn in_bounds(&self, ix: i32, iy: i32) -> bool {
        ix >= 0 && iy >= 0 && ix < self.cols && iy < self.rows
    }

    fn cell_for_point(&self, p: Point) -> (i32, i32) {
        let ix = ((p.x - self.min_x) / self.cell).round() as i32;
        let iy = ((p.y - self.min_y) / self.cell).round() as i32;
        (ix.clamp(0, self.cols - 1), iy.clamp(0, self.rows - 1))
    }

    fn point_for_cell(&self, ix: i32, iy: i32) -> Point {
        Point::new(
            self.min_x + ix as f32 * self.cell,
            self.min_y + iy as f32 * self.cell,
        )
    }

    fn is_blocked(&self, ix: i32, iy: i32) -> bool {
        self.blocked[self.index(ix, iy)]
    }

    fn unblock(&mut self, (ix, iy): (i32, i32)) {
        let idx = self.index(ix, iy);
        self.blocked[idx] = false;
    }

    fn blocked_neighbours(&self, ix: i32, iy: i32) -> u32 {
        let mut count = 0;
        for ny in iy - 1..=iy + 1 {
            for nx in ix - 1..=ix + 1 {
                if (nx == ix && ny == iy) || !self.in_bounds(nx, ny) {
                    continue;
                }
                if self.is_blocked(nx, ny) {
                    count += 1;
                }
            }
        }
        count
    }

    fn state_index(&self, state: GridState) -> usize {
        self.index(state.x, state.y) * 5 + state.dir as usize
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct GridState {
    x: i32,
    y: i32,
    dir: u8,
}

/// Frontier entry. Lowest estimate first; equal estimates go to the state
/// that entered the frontier first.
#[derive(Clone, Copy, Debug)]
struct GridEntry {
    est: f32,
    seq: u64,
    state: GridState,
}

impl Ord for GridEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .est
            .total_cmp(&self.est)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for GridEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for GridEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GridEntry {}

fn stub_point(anchor: &Anchor, length: f32) -> Option<Point> {
    let side = anchor.side?;
    let (nx, ny) = side.normal();
    Some(Point::new(anchor.x + nx * length, anchor.y + ny * length))
}

fn search_grid(
    grid: &RoutingGrid,
    start: (i32, i32),
    end: (i32, i32),
    preferred: Option<u8>,
    tuning: &RouterTuning,
) -> Option<Vec<(i32, i32)>> {
    let states = (grid.cols as usize) * (grid.rows as usize) * 5;
    let mut g_score = vec![f32::INFINITY; states];
    let mut came_from: Vec<Option<GridState>> = vec![None; states];
    // Frontier membership: the sequence number a state entered with.
    let mut open_seq: Vec<Option<u64>> = vec![None; states];
    let mut next_seq = 0u64;
    let mut heap = BinaryHeap::new();

    let heuristic = |x: i32, y: i32| ((x - end.0).abs() + (y - end.1).abs()) as f32;

    let start_state = GridState {
        x: start.0,
        y: start.1,
        dir: NO_DIR,
    };
    let start_idx = grid.state_index(start_state);
    g_score[start_idx] = 0.0;
    open_seq[start_idx] = Some(next_seq);
    heap.push(GridEntry {
        est: heuristic(start.0, start.1),
        seq: next_seq,
        state: start_state,
    });

    let mut expansions = 0usize;
    while let Some(entry) = heap.pop() {
        let state = entry.state;
        let state_idx = grid.state_index(state);
        if open_seq[state_idx] != Some(entry.seq) {
            continue;
        }
        // A state improved while queued keeps its seq; only the newest entry is live.
        if entry.est > g_score[state_idx] + heuristic(state.x, state.y) {
            continue;
        }
        open_seq[state_idx] = None;

        if (state.x, state.y) == end {
            return Some(reconstruct(grid, &came_from, state));
        }
        expansions += 1;
        if expansions > tuning.max_expansions {
            return None;
        }

        let current_cost = g_score[state_idx];
        for (dir_idx, (dx, dy)) in DIRS.iter().enumerate() {
            let dir = dir_idx as u8;
            let nx = state.x + dx;
            let ny = state.y + dy;
            if !grid.in_bounds(nx, ny) || grid.is_blocked(nx, ny) {
                continue;
            }

            let mut step = 1.0 + grid.blocked_neighbours(nx, ny) as f32 * tuning.proximity_penalty;
            if state.dir != NO_DIR && state.dir != dir {
                step += tuning.turn_penalty;
            }
            if is_reversal(state.dir, dir) {
                step += tuning.uturn_penalty;
            }
            if state.dir == NO_DIR && preferred.is_some_and(|p| p != dir) {
                step += tuning.start_direction_penalty;
            }

            let next = GridState { x: nx, y: ny, dir };
            let next_idx = grid.state_index(next);
            let tentative = current_cost + step;
            if tentative >= g_score[next_idx] {
                continue;
            }
            came_from[next_idx] = Some(state);
            g_score[next_idx] = tentative;
            let seq = match open_seq[next_idx] {
                Some(seq) => seq,
                None => {
                    next_seq += 1;
                    open_seq[next_idx] = Some(next_seq);
                    next_seq
                }
            };
            heap.push(GridEntry {
                est: tentative + heuristic(nx, ny),
                seq,
                state: next,
            });
        }
    }
    None
}

fn reconstruct(
    grid: &RoutingGrid,
    came_from: &[Option<GridState>],
    end: GridState,
) -> Vec<(i32, i32)> {
    let mut cells = vec![(end.x, end.y)];
    let mut cur = end;
    while let Some(prev) = came_from[grid.state_index(cur)] {
        if cells.last() != Some(&(prev.x, prev.y)) {
            cells.push((prev.x, prev.y));
        }
        cur = prev;
    }
    cells.reverse();
    cells
}

/// Appends `next`, inserting an elbow first when the step would be diagonal.
fn push_orthogonal(points: &mut Vec<Point>, next: Point, horizontal_first: bool) {
    if let Some(&last) = points.last() {
        let dx = (next.x - last.x).abs() > 1e-4;
        let dy = (next.y - last.y).abs() > 1e-4;
        if dx && dy {
            let elbow = if horizontal_first {
                Point::new(next.x, last.y)
            } else {
                Point::new(last.x, next.y)
            };
            points.push(elbow);
        }
    }
    points.push(next);
}

/// Drops repeated points and the middle of every straight run.
pub(crate) fn simplify_path(points: &[Point]) -> Vec<Point> {
    let mut compact: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        if compact.last().is_none_or(|last| !last.approx_eq(p)) {
            compact.push(p);
        }
    }
    if compact.len() <= 2 {
        return compact;
    }

    let mut out = vec![compact[0]];
    for idx in 1..compact.len() - 1 {
        let prev = out[out.len() - 1];
        let curr = compact[idx];
        let next = compact[idx + 1];
        let same_vertical = (prev.x - curr.x).abs() <= 1e-4 && (curr.x - next.x).abs() <= 1e-4;
        let same_horizontal = (prev.y - curr.y).abs() <= 1e-4 && (curr.y - next.y).abs() <= 1e-4;
        if !same_vertical && !same_horizontal {
            out.push(curr);
        }
    }
    out.push(compact[compact.len() - 1]);
    out
}

/// Routes an axis-aligned connector from `start` to `end` around `obstacles`.
///
/// Always returns a path whose first point is `start` and last point is
/// `end`. When the grid search cannot connect the two (or the grid would be
/// too large), a two-segment path between the stubs is returned instead.
pub fn route_orthogonal(
    start: &Anchor,
    end: &Anchor,
    obstacles: &[Obstacle],
    params: &RouteParams,
    tuning: &RouterTuning,
) -> Vec<Point> {
    let start_point = start.point();
    let end_point = end.point();
    let start_stub = stub_point(start, params.stub_length);
    let end_stub = stub_point(end, params.stub_length);
    let routing_start = start_stub.unwrap_or(start_point);
    let routing_end = end_stub.unwrap_or(end_point);

    let padded: Vec<Rect> = obstacles
        .iter()
        .map(|obs| obs.rect.inflate(params.padding))
        .collect();
    let points = [start_point, end_point, routing_start, routing_end];

    let cells = RoutingGrid::new(routing_start, &points, &padded, params.grid_size, tuning.margin)
        .and_then(|mut grid| {
            let start_cell = grid.cell_for_point(routing_start);
            let end_cell = grid.cell_for_point(routing_end);
            grid.unblock(start_cell);
            grid.unblock(end_cell);
            let preferred = start.side.map(side_direction);
            search_grid(&grid, start_cell, end_cell, preferred, tuning)
                .map(|cells| (grid, cells))
        });

    let start_horizontal = start.side.is_none_or(Side::is_horizontal);
    let end_horizontal = end.side.is_none_or(Side::is_horizontal);

    let mut path = vec![start_point];
    if start_stub.is_some() {
        path.push(routing_start);
    }
    match cells {
        Some((grid, cells)) => {
            let interior = if cells.len() > 2 {
                &cells[1..cells.len() - 1]
            } else {
                &[][..]
            };
            for (i, &(ix, iy)) in interior.iter().enumerate() {
                let horizontal_first = if i == 0 { start_horizontal } else { true };
                push_orthogonal(&mut path, grid.point_for_cell(ix, iy), horizontal_first);
            }
        }
        None => {
            debug!(
                from:? = (start.x, start.y),
                to:? = (end.x, end.y),
                obstacles = obstacles.len();
                "no grid route, using fallback path"
            );
            path.push(Point::new(routing_start.x, routing_end.y));
        }
    }
    push_orthogonal(&mut path, routing_end, !end_horizontal);
    if end_stub.is_some() {
        path.push(end_point);
    }
    simplify_path(&path)
}
