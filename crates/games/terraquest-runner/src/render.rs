use std::collections::HashMap;

use terraquest_core::terrain::Terrain;

use crate::config::WorldConfig;
use crate::grid::{BorderKind, Tile, TileGrid};

/// Asset collaborator: resolves a tile kind to something drawable. The
/// handle is opaque to the simulation.
pub trait TileAtlas {
    type Handle: Clone;

    fn handle(&self, theme: Terrain, tile: Tile) -> Self::Handle;
}

/// Every handle needed to draw a chunk of one theme.
#[derive(Debug, Clone)]
pub struct ThemeTiles<H> {
    pub theme: Terrain,
    handles: HashMap<Tile, H>,
}

impl<H: Clone> ThemeTiles<H> {
    pub fn resolve<A: TileAtlas<Handle = H>>(atlas: &A, theme: Terrain, decor_variants: u8) -> Self {
        let mut handles = HashMap::new();
        let mut kinds: Vec<Tile> = BorderKind::SURFACE
            .into_iter()
            .chain(BorderKind::FILL)
            .map(Tile::Border)
            .collect();
        kinds.extend([Tile::Coin, Tile::Gem, Tile::Spike]);
        kinds.extend((0..decor_variants).map(Tile::Decor));
        for tile in kinds {
            handles.insert(tile, atlas.handle(theme, tile));
        }
        // Spent spikes share the spike art.
        if let Some(spike) = handles.get(&Tile::Spike).cloned() {
            handles.insert(Tile::SpentSpike, spike);
        }
        Self { theme, handles }
    }

    pub fn get(&self, tile: Tile) -> Option<&H> {
        self.handles.get(&tile)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// One tile for the renderer to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCmd {
    pub tile: Tile,
    pub column: u32,
    pub row: u32,
    pub screen_x: i32,
    pub screen_y: i32,
}

/// Horizontal camera offset that keeps the actor at the viewport center.
pub fn camera_offset(world: &WorldConfig, actor_x: i32) -> i32 {
    (world.viewport_width / 2) as i32 - actor_x
}

/// Draw commands for every non-empty cell.
pub fn draw_list<'a>(
    grid: &'a TileGrid,
    world: &'a WorldConfig,
    offset: i32,
) -> impl Iterator<Item = DrawCmd> + 'a {
    let tile = world.tile_size as i32;
    grid.iter_occupied().map(move |(column, row, t)| DrawCmd {
        tile: t,
        column,
        row,
        screen_x: column as i32 * tile + offset,
        screen_y: row as i32 * tile,
    })
}

/// Like [`draw_list`], skipping tiles entirely outside the viewport.
pub fn visible_draw_list<'a>(
    grid: &'a TileGrid,
    world: &'a WorldConfig,
    offset: i32,
) -> impl Iterator<Item = DrawCmd> + 'a {
    let tile = world.tile_size as i32;
    let view_w = world.viewport_width as i32;
    draw_list(grid, world, offset).filter(move |cmd| cmd.screen_x + tile > 0 && cmd.screen_x < view_w)
}
