#![warn(missing_docs)]

//! Flat row-major storage for the squares of a square map.

use isla_coords::{CoordMapper, MinimalPoint, StandardPoint};
use std::fmt;

use crate::error::MapError;
use crate::square::Square;

/// Owns every [`Square`] of a `width x width` map.
///
/// Cells are stored flat at `x + y * width`. Slots without a colour sample stay empty
/// and read back as absent, the same as cells outside the grid.
#[derive(Debug, Clone)]
pub struct GridIndex {
    /// Number of cells per row (and rows per map)
    width: usize,
    /// Standard <-> minimal transform for this map
    mapper: CoordMapper,
    /// One slot per cell, row-major
    squares: Vec<Option<Square>>,
}

impl GridIndex {
    /// Creates an empty grid.
    ///
    /// # Arguments
    /// * `width` - Cells per row; the grid holds `width * width` cells
    /// * `mapper` - Transform used by the standard-coordinate lookups
    ///
    /// # Returns
    /// * `Result<Self, MapError>` - The grid or an error if the width is zero or too large,
    ///   or if some square's standard anchor would not fit in `i32`
    pub fn new(width: usize, mapper: CoordMapper) -> Result<Self, MapError> {
        if width == 0 {
            return Err(MapError::InvalidDimensions("Width must be non-zero"));
        }
        // Minimal coordinates are i32, so wider grids could never be addressed
        if width > i32::MAX as usize {
            return Err(MapError::InvalidDimensions("Width exceeds the minimal coordinate range"));
        }
        let Some(cells) = width.checked_mul(width) else {
            return Err(MapError::InvalidDimensions("Map dimensions too large, would cause overflow"));
        };
        // Anchors grow with the cell, so the far corner bounds every square
        let last = (width - 1) as i32;
        if mapper.checked_to_standard(MinimalPoint::new(last, last)).is_none() {
            return Err(MapError::InvalidDimensions("Tile size and origin push squares past the standard coordinate range"));
        }

        Ok(GridIndex {
            width,
            mapper,
            squares: vec![None; cells],
        })
    }

    /// Cells per row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The coordinate transform of this grid.
    pub fn mapper(&self) -> &CoordMapper {
        &self.mapper
    }

    /// Number of populated cells.
    pub fn len(&self) -> usize {
        self.squares.iter().filter(|slot| slot.is_some()).count()
    }

    /// Whether no cell is populated.
    pub fn is_empty(&self) -> bool {
        self.squares.iter().all(Option::is_none)
    }

    /// Flat index of a minimal cell, or `None` outside `[0, width)²`.
    pub fn index_of(&self, cell: MinimalPoint) -> Option<usize> {
        let x = usize::try_from(cell.x).ok()?;
        let y = usize::try_from(cell.y).ok()?;
        if x < self.width && y < self.width {
            Some(x + y * self.width)
        } else {
            None
        }
    }

    /// Minimal cell for a flat index, the inverse of [`GridIndex::index_of`].
    pub fn cell_of(&self, index: usize) -> Option<MinimalPoint> {
        if index < self.squares.len() {
            Some(MinimalPoint::new((index % self.width) as i32, (index / self.width) as i32))
        } else {
            None
        }
    }

    /// Square containing the standard point, if any.
    pub fn get(&self, p: StandardPoint) -> Option<&Square> {
        self.get_cell(self.mapper.to_minimal(p))
    }

    /// Mutable access to the square containing the standard point, if any.
    pub fn get_mut(&mut self, p: StandardPoint) -> Option<&mut Square> {
        let index = self.index_of(self.mapper.to_minimal(p))?;
        self.squares[index].as_mut()
    }

    /// `get` on raw standard components.
    pub fn get_xy(&self, x: i32, y: i32) -> Option<&Square> {
        self.get(StandardPoint::new(x, y))
    }

    /// Square at a minimal cell, if any.
    pub fn get_cell(&self, cell: MinimalPoint) -> Option<&Square> {
        let index = self.index_of(cell)?;
        self.squares[index].as_ref()
    }

    /// Stores a square at its own cell.
    ///
    /// # Returns
    /// * `Result<(), MapError>` - Error if the cell is outside the grid or already populated
    pub fn insert(&mut self, square: Square) -> Result<(), MapError> {
        let cell = square.cell();
        let Some(index) = self.index_of(cell) else {
            return Err(MapError::SampleOutOfBounds { cell, width: self.width });
        };
        let slot = &mut self.squares[index];
        if slot.is_some() {
            return Err(MapError::DuplicateSample(cell));
        }
        *slot = Some(square);
        Ok(())
    }

    /// Populated squares in row-major scan order.
    pub fn iter(&self) -> impl Iterator<Item = &Square> {
        self.squares.iter().flatten()
    }

    /// Spawn-point squares in row-major scan order.
    pub fn spawn_points(&self) -> impl Iterator<Item = &Square> {
        self.iter().filter(|square| square.is_player_spawn_point())
    }

    /// Squares carrying an active event, in scan order.
    pub fn active_events(&self) -> impl Iterator<Item = &Square> {
        self.iter().filter(|square| square.active_event().is_some())
    }
}

impl fmt::Display for GridIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "GridIndex ({}x{}, {})", self.width, self.width, self.mapper)?;

        for row in self.squares.chunks(self.width) {
            for slot in row {
                let glyph = match slot {
                    None => ' ',
                    Some(square) if square.is_obstacle() => '#',
                    Some(square) if square.is_player_spawn_point() => 'S',
                    Some(square) if square.active_event().is_some() => '!',
                    Some(_) => '.',
                };
                write!(f, "{}", glyph)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::square::{Palette, Rgb};
    use std::collections::HashSet;

    fn square_at(grid: &GridIndex, x: i32, y: i32, color: Rgb) -> Square {
        let cell = MinimalPoint::new(x, y);
        Square::new(grid.mapper().to_standard(cell), cell, color, &Palette::default())
    }

    #[test]
    fn test_grid_creation() {
        let grid = GridIndex::new(8, CoordMapper::default()).unwrap();
        assert_eq!(grid.width(), 8);
        assert_eq!(grid.squares.len(), 64);
        assert!(grid.is_empty());
    }

    #[test]
    fn test_invalid_creation() {
        assert!(matches!(
            GridIndex::new(0, CoordMapper::default()),
            Err(MapError::InvalidDimensions(_))
        ));
        assert!(matches!(
            GridIndex::new(usize::MAX, CoordMapper::default()),
            Err(MapError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn test_rejects_anchors_past_coordinate_range() {
        let huge = CoordMapper::new(1 << 30, StandardPoint::default()).unwrap();
        assert!(GridIndex::new(2, huge).is_ok());
        assert!(matches!(GridIndex::new(4, huge), Err(MapError::InvalidDimensions(_))));

        let near_edge = CoordMapper::new(1, StandardPoint::new(0, i32::MAX - 2)).unwrap();
        assert!(GridIndex::new(3, near_edge).is_ok());
        assert!(matches!(GridIndex::new(4, near_edge), Err(MapError::InvalidDimensions(_))));
    }

    #[test]
    fn test_index_injective() {
        let grid = GridIndex::new(12, CoordMapper::default()).unwrap();
        let mut seen = HashSet::new();
        for y in 0..12 {
            for x in 0..12 {
                let index = grid.index_of(MinimalPoint::new(x, y)).unwrap();
                assert!(seen.insert(index), "index {} produced twice", index);
                assert_eq!(grid.cell_of(index), Some(MinimalPoint::new(x, y)));
            }
        }
        assert_eq!(seen.len(), 144);
    }

    #[test]
    fn test_index_rejects_out_of_range() {
        let grid = GridIndex::new(4, CoordMapper::default()).unwrap();
        assert_eq!(grid.index_of(MinimalPoint::new(-1, 0)), None);
        assert_eq!(grid.index_of(MinimalPoint::new(0, -1)), None);
        assert_eq!(grid.index_of(MinimalPoint::new(4, 0)), None);
        assert_eq!(grid.index_of(MinimalPoint::new(0, 4)), None);
        // Row overflow must not wrap into the next row
        assert_eq!(grid.index_of(MinimalPoint::new(5, 1)), None);
        assert_eq!(grid.cell_of(16), None);
    }

    #[test]
    fn test_lookup_by_standard_coordinates() {
        let mapper = CoordMapper::new(10, StandardPoint::new(0, 0)).unwrap();
        let mut grid = GridIndex::new(4, mapper).unwrap();
        let wall = square_at(&grid, 2, 1, Rgb::BLACK);
        grid.insert(wall).unwrap();

        // Any point inside the tile resolves to the same square
        assert!(grid.get_xy(20, 10).unwrap().is_obstacle());
        assert!(grid.get_xy(29, 19).unwrap().is_obstacle());
        assert!(grid.get_xy(30, 10).is_none());
        // Outside the grid is absent, never a panic
        assert!(grid.get_xy(-1, 0).is_none());
        assert!(grid.get_xy(400, 400).is_none());
        assert!(grid.get_xy(i32::MAX, i32::MIN).is_none());
    }

    #[test]
    fn test_insert_rejects_duplicates_and_out_of_bounds() {
        let mut grid = GridIndex::new(3, CoordMapper::default()).unwrap();
        grid.insert(square_at(&grid, 1, 1, Rgb::WHITE)).unwrap();
        assert!(matches!(
            grid.insert(square_at(&grid, 1, 1, Rgb::BLACK)),
            Err(MapError::DuplicateSample(cell)) if cell == MinimalPoint::new(1, 1)
        ));
        assert!(matches!(
            grid.insert(square_at(&grid, 3, 0, Rgb::WHITE)),
            Err(MapError::SampleOutOfBounds { width: 3, .. })
        ));
        // Rejected inserts leave the original untouched
        assert!(!grid.get_xy(1, 1).unwrap().is_obstacle());
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_spawn_points_in_scan_order() {
        let mut grid = GridIndex::new(4, CoordMapper::default()).unwrap();
        grid.insert(square_at(&grid, 3, 2, Rgb::RED)).unwrap();
        grid.insert(square_at(&grid, 0, 0, Rgb::WHITE)).unwrap();
        grid.insert(square_at(&grid, 2, 1, Rgb::RED)).unwrap();

        let cells: Vec<_> = grid.spawn_points().map(Square::cell).collect();
        assert_eq!(cells, vec![MinimalPoint::new(2, 1), MinimalPoint::new(3, 2)]);
    }

    #[test]
    fn test_display() {
        let mut grid = GridIndex::new(2, CoordMapper::default()).unwrap();
        grid.insert(square_at(&grid, 0, 0, Rgb::BLACK)).unwrap();
        grid.insert(square_at(&grid, 1, 0, Rgb::RED)).unwrap();
        grid.insert(square_at(&grid, 0, 1, Rgb::WHITE)).unwrap();

        let display_str = format!("{}", grid);
        assert!(display_str.contains("GridIndex (2x2"));
        assert!(display_str.contains("#S\n. \n"));
    }
}
