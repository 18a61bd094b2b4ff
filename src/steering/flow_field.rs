use bevy::prelude::*;

use super::query::{layers, ColliderShape, OverlapHit, SpatialQuery};

/// World-space rectangle covered by the grid.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlowFieldBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl FlowFieldBounds {
    /// Half-open on the max edges so every inside point maps to one cell.
    pub fn contains(&self, pos: Vec2) -> bool {
        pos.x >= self.min.x && pos.y >= self.min.y && pos.x < self.max.x && pos.y < self.max.y
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

/// Grid of precomputed "push away from clutter" bias vectors.
///
/// Each cell stores the unnormalized sum of unit vectors pointing away from
/// every static obstacle within `detection_radius` of the cell center (or
/// toward it, for boundary colliders). Agents sample it with
/// [`FlowField::force`] instead of raycasting every tick.
///
/// # Staleness
///
/// The grid is regenerated wholesale on a slow wall-clock timer, not every
/// steering tick. Readers see a grid up to one interval old and must not
/// assume it changes monotonically between reads.
///
/// # Bounds
///
/// The grid is centered on `origin`, which may follow a moving anchor. Bounds
/// are recomputed on every regeneration and queries always use the bounds
/// stored alongside the cells they read.
///
/// # Example
///
/// ```rust
/// use bevy::math::Vec2;
/// use harrier::steering::flow_field::FlowField;
/// use harrier::steering::obstacles::{CircleWorld, Obstacle};
///
/// let mut world = CircleWorld::new();
/// world.insert(None, Vec2::new(2.0, 0.0), Obstacle::solid(1.0));
///
/// let mut field = FlowField::new(16, 16, 1.0, 2.0);
/// field.generate(Vec2::ZERO, &world);
///
/// // Left of the rock the bias points further left.
/// let push = field.force(Vec2::new(0.4, 0.4), 1.0);
/// assert!(push.x < 0.0);
/// ```
#[derive(Resource, Debug, Clone)]
pub struct FlowField {
    width: usize,
    height: usize,
    cell_size: f32,
    detection_radius: f32,
    layer_mask: u32,
    origin: Vec2,
    bounds: FlowFieldBounds,
    cells: Vec<Vec2>,
    generation: u64,
}

impl Default for FlowField {
    fn default() -> Self {
        Self::new(64, 64, 1.0, 1.5)
    }
}

impl FlowField {
    pub fn new(width: usize, height: usize, cell_size: f32, detection_radius: f32) -> Self {
        let mut field = Self {
            width,
            height,
            cell_size,
            detection_radius,
            layer_mask: layers::STATIC,
            origin: Vec2::ZERO,
            bounds: FlowFieldBounds::default(),
            cells: vec![Vec2::ZERO; width * height],
            generation: 0,
        };
        field.bounds = field.bounds_for(Vec2::ZERO);
        field
    }

    pub fn with_layer_mask(mut self, mask: u32) -> Self {
        self.layer_mask = mask;
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn detection_radius(&self) -> f32 {
        self.detection_radius
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn bounds(&self) -> FlowFieldBounds {
        self.bounds
    }

    /// Number of completed regenerations.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cells(&self) -> &[Vec2] {
        &self.cells
    }

    pub fn get_index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<Vec2> {
        if x < self.width && y < self.height {
            Some(self.cells[self.get_index(x, y)])
        } else {
            None
        }
    }

    fn bounds_for(&self, origin: Vec2) -> FlowFieldBounds {
        let half = Vec2::new(self.width as f32, self.height as f32) * self.cell_size * 0.5;
        FlowFieldBounds {
            min: origin - half,
            max: origin + half,
        }
    }

    pub fn world_to_grid(&self, pos: Vec2) -> Option<(usize, usize)> {
        if !self.bounds.contains(pos) || self.cell_size <= 0.0 {
            return None;
        }
        let local = (pos - self.bounds.min) / self.cell_size;
        let x = (local.x as usize).min(self.width.saturating_sub(1));
        let y = (local.y as usize).min(self.height.saturating_sub(1));
        Some((x, y))
    }

    /// World-space center of a cell.
    pub fn grid_to_world(&self, x: usize, y: usize) -> Vec2 {
        self.bounds.min + (Vec2::new(x as f32, y as f32) + 0.5) * self.cell_size
    }

    /// Rebuild every cell around `origin`.
    ///
    /// The new grid is built off to the side and swapped in whole, so the
    /// field is never observed half-updated.
    pub fn generate<Q: SpatialQuery + ?Sized>(&mut self, origin: Vec2, query: &Q) {
        self.origin = origin;
        self.bounds = self.bounds_for(origin);

        let mut hits = Vec::new();
        let mut cells = Vec::with_capacity(self.width * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let center = self.grid_to_world(x, y);
                cells.push(self.calculate_flow_vector(center, query, &mut hits));
            }
        }

        self.cells = cells;
        self.generation += 1;
    }

    /// Bias for a single point.
    ///
    /// Vectors are summed without normalizing, so a cell ringed by clutter
    /// pushes harder than one next to a single rock.
    pub fn calculate_flow_vector<Q: SpatialQuery + ?Sized>(
        &self,
        center: Vec2,
        query: &Q,
        hits: &mut Vec<OverlapHit>,
    ) -> Vec2 {
        query.circle_overlap_all(center, self.detection_radius, self.layer_mask, hits);
        let mut flow = Vec2::ZERO;
        for hit in hits.iter().filter(|h| !h.is_trigger) {
            let away = (center - hit.position).normalize_or_zero();
            flow += match hit.shape {
                ColliderShape::Solid => away,
                ColliderShape::Boundary => -away,
            };
        }
        flow
    }

    /// Sum of every cell whose center lies within `radius` of `pos`.
    ///
    /// Positions outside the current bounds get the zero vector; agents that
    /// drifted off the grid simply feel no bias.
    pub fn force(&self, pos: Vec2, radius: f32) -> Vec2 {
        let Some((cx, cy)) = self.world_to_grid(pos) else {
            return Vec2::ZERO;
        };

        // Never more than the whole grid, whatever the radius.
        let max_reach = self.width.max(self.height) as f32;
        let reach = (radius.max(0.0) / self.cell_size).ceil().min(max_reach) as usize;
        let x_range = cx.saturating_sub(reach)..=cx.saturating_add(reach).min(self.width - 1);
        let y_range = cy.saturating_sub(reach)..=cy.saturating_add(reach).min(self.height - 1);
        let radius_sq = radius * radius;

        let mut total = Vec2::ZERO;
        for y in y_range {
            for x in x_range.clone() {
                if self.grid_to_world(x, y).distance_squared(pos) <= radius_sq {
                    total += self.cells[self.get_index(x, y)];
                }
            }
        }
        total
    }
}

#[cfg(test)]
mod tests;
