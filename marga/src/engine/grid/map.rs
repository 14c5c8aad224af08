//! Terrain grid the reference engine searches on.

use crate::context::SearchContext;
use crate::core::Point2D;

/// Integer cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCoord {
    pub x: i32,
    pub y: i32,
}

impl GridCoord {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance (diagonal moves count as one).
    #[inline]
    pub fn chebyshev_distance(&self, other: &GridCoord) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

/// Terrain class of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    /// Inside a field, with standing fruit density in percent
    Field { field: u32, fruit: u8 },
    /// Pile of harvested crop
    FruitHeap,
    /// Outside any field, drivable at a penalty
    OffField,
    /// Building, tree, fence
    Blocked,
}

impl Default for Cell {
    fn default() -> Self {
        Cell::Field { field: 1, fruit: 0 }
    }
}

/// Row-major grid of [`Cell`]s.
#[derive(Clone, Debug)]
pub struct TerrainGrid {
    width: usize,
    height: usize,
    /// Meters per cell
    resolution: f32,
    /// World position of the corner of cell (0, 0)
    origin: Point2D,
    cells: Vec<Cell>,
}

impl TerrainGrid {
    /// Create a grid filled with empty field cells of field 1.
    pub fn new(width: usize, height: usize, resolution: f32, origin: Point2D) -> Self {
        Self {
            width,
            height,
            resolution,
            origin,
            cells: vec![Cell::default(); width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    #[inline]
    pub fn in_bounds(&self, coord: GridCoord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && (coord.x as usize) < self.width
            && (coord.y as usize) < self.height
    }

    #[inline]
    fn index(&self, coord: GridCoord) -> Option<usize> {
        self.in_bounds(coord)
            .then(|| coord.y as usize * self.width + coord.x as usize)
    }

    /// Cell at `coord`, `None` outside the grid.
    pub fn get(&self, coord: GridCoord) -> Option<Cell> {
        self.index(coord).map(|i| self.cells[i])
    }

    /// Set a cell. Out-of-bounds writes are ignored.
    pub fn set(&mut self, coord: GridCoord, cell: Cell) {
        if let Some(i) = self.index(coord) {
            self.cells[i] = cell;
        }
    }

    /// Set every cell in the inclusive rectangle `a`..=`b`.
    pub fn fill_rect(&mut self, a: GridCoord, b: GridCoord, cell: Cell) {
        for y in a.y.min(b.y)..=a.y.max(b.y) {
            for x in a.x.min(b.x)..=a.x.max(b.x) {
                self.set(GridCoord::new(x, y), cell);
            }
        }
    }

    pub fn world_to_grid(&self, p: Point2D) -> GridCoord {
        GridCoord::new(
            ((p.x - self.origin.x) / self.resolution).floor() as i32,
            ((p.y - self.origin.y) / self.resolution).floor() as i32,
        )
    }

    /// Center of a cell in world coordinates.
    pub fn grid_to_world(&self, coord: GridCoord) -> Point2D {
        Point2D::new(
            self.origin.x + (coord.x as f32 + 0.5) * self.resolution,
            self.origin.y + (coord.y as f32 + 0.5) * self.resolution,
        )
    }

    /// Cost multiplier for entering `coord` under `context`.
    ///
    /// `None` means the cell may not be entered.
    pub fn traversal_cost(&self, coord: GridCoord, context: &SearchContext) -> Option<f32> {
        let cell = self.get(coord)?;

        if let Some(area) = &context.area_to_avoid
            && area.contains(self.grid_to_world(coord))
        {
            return None;
        }

        let off_field = 1.0 + context.off_field_penalty.max(0.0);
        match cell {
            Cell::Blocked => None,
            Cell::FruitHeap if context.ignore_fruit_heaps => Some(1.0),
            Cell::FruitHeap => None,
            Cell::OffField => Some(off_field),
            Cell::Field { fruit, .. } if f32::from(fruit) > context.max_fruit_percent => None,
            Cell::Field { field, .. } => match context.use_field_num {
                Some(wanted) if wanted != field => Some(off_field),
                _ => Some(1.0),
            },
        }
    }
}
