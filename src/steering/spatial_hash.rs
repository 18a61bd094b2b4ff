use bevy::prelude::*;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use super::query::CandidateProvider;


type CellEntries = SmallVec<[(Entity, Vec2, f32); 4]>;

/// Uniform grid over the agents, used to find steering candidates.
///
/// The grid is centered on the world origin and covers `world_size`. An agent
/// is stored in every cell its radius overlaps, so a radius query only needs
/// the cells overlapping the query circle. Agents outside the covered area
/// are clamped into the edge cells rather than dropped; queries clamp the
/// same way and filter by real distance, so results stay exact.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::{Entity, Vec2, World};
/// use harrier::steering::query::CandidateProvider;
/// use harrier::steering::spatial_hash::SpatialHash;
///
/// let mut world = World::new();
/// let a = world.spawn_empty().id();
/// let b = world.spawn_empty().id();
///
/// let mut hash = SpatialHash::new(Vec2::splat(100.0), 5.0);
/// hash.insert(a, Vec2::ZERO, 0.5);
/// hash.insert(b, Vec2::new(3.0, 0.0), 0.5);
///
/// let mut nearby = Vec::new();
/// hash.agents_in_radius(Vec2::ZERO, 2.5, Some(a), &mut nearby);
/// assert_eq!(nearby, vec![b]);
/// ```
#[derive(Resource, Debug, Clone)]
pub struct SpatialHash {
    cell_size: f32,
    cols: usize,
    rows: usize,
    world_size: Vec2,
    cells: Vec<CellEntries>,
}

impl Default for SpatialHash {
    fn default() -> Self {
        Self::new(Vec2::splat(256.0), 4.0)
    }
}

impl SpatialHash {
    pub fn new(world_size: Vec2, cell_size: f32) -> Self {
        let cell_size = cell_size.max(f32::EPSILON);
        let cols = (world_size.x / cell_size).ceil().max(1.0) as usize;
        let rows = (world_size.y / cell_size).ceil().max(1.0) as usize;

        Self {
            cell_size,
            cols,
            rows,
            world_size,
            cells: vec![CellEntries::new(); cols * rows],
        }
    }

    pub fn resize(&mut self, world_size: Vec2, cell_size: f32) {
        *self = Self::new(world_size, cell_size);
    }

    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn world_size(&self) -> Vec2 {
        self.world_size
    }

    /// Count the total number of entries across all cells.
    pub fn total_entries(&self) -> usize {
        self.cells.iter().map(|cell| cell.len()).sum()
    }

    pub fn non_empty_cells(&self) -> usize {
        self.cells.iter().filter(|cell| !cell.is_empty()).count()
    }

    /// Inclusive (col, row) range of cells overlapping the box around a circle.
    fn cell_range(&self, pos: Vec2, radius: f32) -> (usize, usize, usize, usize) {
        let half = self.world_size / 2.0;
        let to_col = |x: f32| {
            let c = ((x + half.x) / self.cell_size).floor();
            c.clamp(0.0, (self.cols - 1) as f32) as usize
        };
        let to_row = |y: f32| {
            let r = ((y + half.y) / self.cell_size).floor();
            r.clamp(0.0, (self.rows - 1) as f32) as usize
        };

        (
            to_col(pos.x - radius),
            to_col(pos.x + radius),
            to_row(pos.y - radius),
            to_row(pos.y + radius),
        )
    }

    /// Cells an agent of `radius` at `pos` occupies.
    pub fn occupied_cells(&self, pos: Vec2, radius: f32) -> Vec<(usize, usize)> {
        let (min_col, max_col, min_row, max_row) = self.cell_range(pos, radius);
        let mut cells = Vec::new();
        for row in min_row..=max_row {
            for col in min_col..=max_col {
                cells.push((col, row));
            }
        }
        cells
    }

    /// Insert an agent into every cell its radius overlaps.
    pub fn insert(&mut self, entity: Entity, pos: Vec2, radius: f32) {
        let (min_col, max_col, min_row, max_row) = self.cell_range(pos, radius);
        for row in min_row..=max_row {
            for col in min_col..=max_col {
                self.cells[row * self.cols + col].push((entity, pos, radius));
            }
        }
    }
}

impl CandidateProvider for SpatialHash {
    /// Agents whose circle overlaps the query circle, sorted by entity so
    /// tie-breaks downstream do not depend on grid layout.
    fn agents_in_radius(
        &self,
        point: Vec2,
        radius: f32,
        exclude: Option<Entity>,
        out: &mut Vec<Entity>,
    ) {
        out.clear();
        let mut seen = FxHashSet::default();
        let (min_col, max_col, min_row, max_row) = self.cell_range(point, radius);

        for row in min_row..=max_row {
            for col in min_col..=max_col {
                for &(entity, pos, r) in &self.cells[row * self.cols + col] {
                    if Some(entity) == exclude || seen.contains(&entity) {
                        continue;
                    }
                    if pos.distance(point) <= radius + r {
                        seen.insert(entity);
                        out.push(entity);
                    }
                }
            }
        }

        out.sort_unstable();
    }
}
