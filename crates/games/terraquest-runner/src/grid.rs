use serde::{Deserialize, Serialize};

/// Which edges of a tile carry a dark border line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Edges {
    pub top: bool,
    pub right: bool,
    pub bottom: bool,
    pub left: bool,
}

impl Edges {
    const fn new(top: bool, right: bool, bottom: bool, left: bool) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }
}

/// Art family of a solid tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Family {
    /// Themed tile with a walkable top.
    Surface,
    /// Theme-neutral dirt beneath surface tiles.
    Fill,
}

/// Border classification of a solid tile, named by the bordered edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BorderKind {
    // Surface family
    TopLeft,
    Top,
    TopRight,
    TopRightLeft,
    TopBottomLeft,
    TopBottom,
    TopRightBottom,
    TopRightBottomLeft,
    // Fill family
    BottomLeft,
    Bottom,
    RightBottom,
    RightBottomLeft,
    Left,
    Pure,
    Right,
    RightLeft,
}

impl BorderKind {
    /// Surface kinds in atlas order.
    pub const SURFACE: [BorderKind; 8] = [
        BorderKind::TopLeft,
        BorderKind::Top,
        BorderKind::TopRight,
        BorderKind::TopRightLeft,
        BorderKind::TopBottomLeft,
        BorderKind::TopBottom,
        BorderKind::TopRightBottom,
        BorderKind::TopRightBottomLeft,
    ];

    /// Fill kinds in atlas order.
    pub const FILL: [BorderKind; 8] = [
        BorderKind::BottomLeft,
        BorderKind::Bottom,
        BorderKind::RightBottom,
        BorderKind::RightBottomLeft,
        BorderKind::Left,
        BorderKind::Pure,
        BorderKind::Right,
        BorderKind::RightLeft,
    ];

    pub fn family(self) -> Family {
        if Self::SURFACE.contains(&self) {
            Family::Surface
        } else {
            Family::Fill
        }
    }

    pub fn is_surface(self) -> bool {
        self.family() == Family::Surface
    }

    pub fn edges(self) -> Edges {
        use BorderKind::*;
        match self {
            TopLeft => Edges::new(true, false, false, true),
            Top => Edges::new(true, false, false, false),
            TopRight => Edges::new(true, true, false, false),
            TopRightLeft => Edges::new(true, true, false, true),
            TopBottomLeft => Edges::new(true, false, true, true),
            TopBottom => Edges::new(true, false, true, false),
            TopRightBottom => Edges::new(true, true, true, false),
            TopRightBottomLeft => Edges::new(true, true, true, true),
            BottomLeft => Edges::new(false, false, true, true),
            Bottom => Edges::new(false, false, true, false),
            RightBottom => Edges::new(false, true, true, false),
            RightBottomLeft => Edges::new(false, true, true, true),
            Left => Edges::new(false, false, false, true),
            Pure => Edges::new(false, false, false, false),
            Right => Edges::new(false, true, false, false),
            RightLeft => Edges::new(false, true, false, true),
        }
    }

    /// Index of this kind's art within its family sheet.
    pub fn atlas_index(self) -> u8 {
        let sheet = match self.family() {
            Family::Surface => &Self::SURFACE,
            Family::Fill => &Self::FILL,
        };
        sheet.iter().position(|&k| k == self).unwrap_or(0) as u8
    }
}

/// Contents of one grid cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    #[default]
    Empty,
    Border(BorderKind),
    Coin,
    Gem,
    Spike,
    /// A spike that already dealt its damage. Drawn like a spike, never triggers.
    SpentSpike,
    Decor(u8),
}

impl Tile {
    pub fn is_empty(self) -> bool {
        self == Tile::Empty
    }

    /// Solid tiles block horizontal movement.
    pub fn is_solid(self) -> bool {
        matches!(self, Tile::Border(_))
    }

    /// Surface tiles can be landed on from above.
    pub fn is_surface(self) -> bool {
        matches!(self, Tile::Border(kind) if kind.is_surface())
    }
}

/// One chunk's tile grid, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGrid {
    width: u32,
    height: u32,
    cells: Vec<Tile>,
}

impl TileGrid {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![Tile::Empty; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Tile at `(col, row)`. Anything outside the grid reads as `Empty`.
    pub fn get(&self, col: i32, row: i32) -> Tile {
        if col < 0 || row < 0 || col >= self.width as i32 || row >= self.height as i32 {
            return Tile::Empty;
        }
        self.cells[row as usize * self.width as usize + col as usize]
    }

    /// Overwrite a cell. Out-of-range writes are ignored.
    pub fn set(&mut self, col: u32, row: u32, tile: Tile) {
        if col < self.width && row < self.height {
            self.cells[row as usize * self.width as usize + col as usize] = tile;
        }
    }

    /// Write `tile` only into an in-range `Empty` cell. Returns whether it wrote.
    pub fn place_if_empty(&mut self, col: u32, row: u32, tile: Tile) -> bool {
        if col >= self.width || row >= self.height {
            return false;
        }
        let cell = &mut self.cells[row as usize * self.width as usize + col as usize];
        if cell.is_empty() {
            *cell = tile;
            true
        } else {
            false
        }
    }

    pub fn row(&self, row: u32) -> &[Tile] {
        let start = row as usize * self.width as usize;
        &self.cells[start..start + self.width as usize]
    }

    /// Every non-empty cell as `(col, row, tile)`, row by row.
    pub fn iter_occupied(&self) -> impl Iterator<Item = (u32, u32, Tile)> + '_ {
        let width = self.width as usize;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.is_empty())
            .map(move |(i, &t)| ((i % width) as u32, (i / width) as u32, t))
    }

    pub fn count(&self, pred: impl Fn(Tile) -> bool) -> usize {
        self.cells.iter().filter(|&&t| pred(t)).count()
    }
}
