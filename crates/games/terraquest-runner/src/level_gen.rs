use rand::Rng;

use terraquest_core::terrain::Terrain;

use crate::config::RunnerConfig;
use crate::grid::{BorderKind, Tile, TileGrid};
use crate::render::{ThemeTiles, TileAtlas};

/// Position of a column within a land mass. Decides which side borders the
/// fill stack and its surface cap carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnStyle {
    First,
    Middle,
    Last,
    Single,
}

impl ColumnStyle {
    pub fn for_position(col: u32, width: u32) -> Self {
        if width == 1 {
            ColumnStyle::Single
        } else if col == 0 {
            ColumnStyle::First
        } else if col + 1 == width {
            ColumnStyle::Last
        } else {
            ColumnStyle::Middle
        }
    }

    pub fn fill(self) -> BorderKind {
        match self {
            ColumnStyle::First => BorderKind::Left,
            ColumnStyle::Middle => BorderKind::Pure,
            ColumnStyle::Last => BorderKind::Right,
            ColumnStyle::Single => BorderKind::RightLeft,
        }
    }

    pub fn cap(self) -> BorderKind {
        match self {
            ColumnStyle::First => BorderKind::TopLeft,
            ColumnStyle::Middle => BorderKind::Top,
            ColumnStyle::Last => BorderKind::TopRight,
            ColumnStyle::Single => BorderKind::TopRightLeft,
        }
    }
}

/// Placement counts for one generated chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenStats {
    pub coins: u32,
    pub gems: u32,
    pub floating: u32,
    pub land: u32,
    pub spikes: u32,
    pub decorations: u32,
    /// Placements dropped because their cell was taken or unsupported.
    pub skipped: u32,
}

/// A chunk plus the handles needed to draw it.
#[derive(Debug, Clone)]
pub struct GeneratedChunk<H> {
    pub grid: TileGrid,
    pub tiles: ThemeTiles<H>,
    pub stats: GenStats,
}

/// Generate a chunk and resolve its theme's render handles.
pub fn generate<A, R>(
    config: &RunnerConfig,
    theme: Terrain,
    atlas: &A,
    rng: &mut R,
) -> GeneratedChunk<A::Handle>
where
    A: TileAtlas,
    R: Rng + ?Sized,
{
    let (grid, stats) = generate_chunk_with_stats(config, rng);
    GeneratedChunk {
        grid,
        tiles: ThemeTiles::resolve(atlas, theme, config.generation.decor_variants),
        stats,
    }
}

/// Generate one chunk's tile grid.
pub fn generate_chunk<R: Rng + ?Sized>(config: &RunnerConfig, rng: &mut R) -> TileGrid {
    generate_chunk_with_stats(config, rng).0
}

pub fn generate_chunk_with_stats<R: Rng + ?Sized>(
    config: &RunnerConfig,
    rng: &mut R,
) -> (TileGrid, GenStats) {
    let width = config.world.chunk_columns;
    let height = config.world.rows();
    let margin = config.world.margin_columns();
    let g = &config.generation;

    let mut grid = TileGrid::new(width, height);
    let mut stats = GenStats::default();

    for col in 0..width {
        lay_floor(&mut grid, col);
    }

    let content_end = width.saturating_sub(margin);
    for i in margin..content_end {
        let platform_height = rng.random_range(1..=g.platform_height_max);
        let platform_width = rng.random_range(1..=g.platform_width_max);

        if rng.random_bool(g.coin_chance) {
            let run = rng.random_range(g.coin_run_min..=g.coin_run_max);
            let x = rng.random_range(0..=width - 1 - run);
            let y = rng.random_range(0..=height - 4);
            for j in 0..run {
                if grid.place_if_empty(x + j, y, Tile::Coin) {
                    stats.coins += 1;
                } else {
                    stats.skipped += 1;
                }
            }
        }

        if rng.random_bool(g.gem_chance) {
            let x = rng.random_range(0..width);
            let y = rng.random_range(0..=height - 4);
            if grid.place_if_empty(x, y, Tile::Gem) {
                stats.gems += 1;
            } else {
                stats.skipped += 1;
            }
        }

        // A platform must end before the trailing margin, or the re-stamp
        // would cut it off mid-run and leave an unbordered edge.
        if rng.random_bool(g.platform_chance) && i + platform_width <= content_end {
            let total = g.floating_weight + g.land_weight;
            if rng.random_range(0..total) < g.floating_weight {
                let Some(max_x) = width.checked_sub(margin + 2 + platform_width) else {
                    stats.skipped += 1;
                    continue;
                };
                let x = rng.random_range(0..=max_x);
                let y = rng.random_range(g.floating_min_row..=height - 4);
                stamp_floating(&mut grid, x, y, platform_width);
                stats.floating += 1;
            } else {
                build_land(
                    &mut grid,
                    rng,
                    config,
                    &mut stats,
                    i,
                    platform_width,
                    platform_height,
                );
                stats.land += 1;
            }
        }
    }

    // Margin purity wins over anything the random pass put there.
    for col in (0..margin.min(width)).chain(width.saturating_sub(margin)..width) {
        for row in 0..height {
            grid.set(col, row, Tile::Empty);
        }
        lay_floor(&mut grid, col);
    }

    tracing::debug!(
        coins = stats.coins,
        gems = stats.gems,
        floating = stats.floating,
        land = stats.land,
        spikes = stats.spikes,
        decorations = stats.decorations,
        skipped = stats.skipped,
        "Generated chunk"
    );

    (grid, stats)
}

fn lay_floor(grid: &mut TileGrid, col: u32) {
    let bottom = grid.height() - 1;
    grid.set(col, bottom, Tile::Border(BorderKind::Pure));
    grid.set(col, bottom - 1, Tile::Border(BorderKind::Top));
}

/// Stamp a floating shelf: a left end, `width` interior cells, and a right
/// end, all on row `y`. Overwrites whatever is there.
pub fn stamp_floating(grid: &mut TileGrid, x: u32, y: u32, width: u32) {
    grid.set(x, y, Tile::Border(BorderKind::TopBottomLeft));
    for j in 1..=width {
        grid.set(x + j, y, Tile::Border(BorderKind::TopBottom));
    }
    grid.set(x + width + 1, y, Tile::Border(BorderKind::TopRightBottom));
}

/// Stack `height` fill cells from the bottom row up in column `col`, topped
/// by a surface cap. Returns the cap row.
pub fn stamp_land_column(grid: &mut TileGrid, col: u32, height: u32, style: ColumnStyle) -> u32 {
    let bottom = grid.height() - 1;
    let height = height.min(bottom);
    for row in 0..height {
        grid.set(col, bottom - row, Tile::Border(style.fill()));
    }
    let cap_row = bottom - height;
    grid.set(col, cap_row, Tile::Border(style.cap()));
    cap_row
}

/// Place `tile` at `(col, row)` only if the cell is empty and the cell
/// directly below is a surface tile. Hazards and decorations never float.
pub fn place_supported(grid: &mut TileGrid, col: u32, row: u32, tile: Tile) -> bool {
    let below = grid.get(col as i32, row as i32 + 1);
    below.is_surface() && grid.place_if_empty(col, row, tile)
}

fn build_land<R: Rng + ?Sized>(
    grid: &mut TileGrid,
    rng: &mut R,
    config: &RunnerConfig,
    stats: &mut GenStats,
    x: u32,
    width: u32,
    height: u32,
) {
    let g = &config.generation;
    for col in 0..width {
        let ex = x + col;
        let cap_row = stamp_land_column(grid, ex, height, ColumnStyle::for_position(col, width));
        if cap_row < 2 {
            continue;
        }
        let above = cap_row - 1;

        if rng.random_bool(g.spike_chance) {
            let run = rng.random_range(1..=width);
            for j in 0..run {
                if place_supported(grid, ex + j, above, Tile::Spike) {
                    stats.spikes += 1;
                } else {
                    stats.skipped += 1;
                }
            }
        }

        if rng.random_bool(g.decor_chance) {
            let variant = rng.random_range(0..g.decor_variants);
            if place_supported(grid, ex, above, Tile::Decor(variant)) {
                stats.decorations += 1;
            } else {
                stats.skipped += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::grid::Family;

    fn chunk(seed: u64) -> TileGrid {
        generate_chunk(&RunnerConfig::default(), &mut StdRng::seed_from_u64(seed))
    }

    #[test]
    fn deterministic_generation() {
        assert_eq!(chunk(42), chunk(42), "Same seed must produce same chunk");
    }

    #[test]
    fn different_seeds_different_chunks() {
        assert_ne!(chunk(42), chunk(123));
    }

    #[test]
    fn dimensions_follow_config() {
        let grid = chunk(1);
        assert_eq!(grid.width(), 400);
        assert_eq!(grid.height(), 24);
    }

    #[test]
    fn column_styles_by_position() {
        assert_eq!(ColumnStyle::for_position(0, 1), ColumnStyle::Single);
        assert_eq!(ColumnStyle::for_position(0, 4), ColumnStyle::First);
        assert_eq!(ColumnStyle::for_position(2, 4), ColumnStyle::Middle);
        assert_eq!(ColumnStyle::for_position(3, 4), ColumnStyle::Last);
    }

    #[test]
    fn land_column_borders_match_run_position() {
        for style in [
            ColumnStyle::First,
            ColumnStyle::Middle,
            ColumnStyle::Last,
            ColumnStyle::Single,
        ] {
            let fill = style.fill().edges();
            let cap = style.cap().edges();
            assert!(!fill.top && !fill.bottom, "{style:?} fill stacks seamlessly");
            assert!(cap.top && !cap.bottom, "{style:?} cap joins the fill below");
            assert_eq!(fill.left, cap.left);
            assert_eq!(fill.right, cap.right);
            let expect_left = matches!(style, ColumnStyle::First | ColumnStyle::Single);
            let expect_right = matches!(style, ColumnStyle::Last | ColumnStyle::Single);
            assert_eq!(fill.left, expect_left, "{style:?}");
            assert_eq!(fill.right, expect_right, "{style:?}");
        }
    }

    #[test]
    fn stamped_land_mass_stacks_fill_under_cap() {
        let mut grid = TileGrid::new(10, 24);
        let cap_row = stamp_land_column(&mut grid, 3, 4, ColumnStyle::Middle);
        assert_eq!(cap_row, 19);
        for row in 20..24 {
            assert_eq!(grid.get(3, row), Tile::Border(BorderKind::Pure));
        }
        assert_eq!(grid.get(3, 19), Tile::Border(BorderKind::Top));
        assert_eq!(grid.get(3, 18), Tile::Empty);
    }

    #[test]
    fn floating_shelf_borders_connect() {
        let mut grid = TileGrid::new(20, 10);
        stamp_floating(&mut grid, 2, 4, 3);
        let kinds: Vec<BorderKind> = (2..=6)
            .map(|c| match grid.get(c, 4) {
                Tile::Border(k) => k,
                other => panic!("Expected border tile, got {other:?}"),
            })
            .collect();
        assert_eq!(kinds.len(), 5);
        for pair in kinds.windows(2) {
            assert!(!pair[0].edges().right, "{:?} must open to the right", pair[0]);
            assert!(!pair[1].edges().left, "{:?} must open to the left", pair[1]);
        }
        assert!(kinds[0].edges().left);
        assert!(kinds[4].edges().right);
        assert!(kinds.iter().all(|k| k.edges().top && k.edges().bottom));
        assert_eq!(grid.get(1, 4), Tile::Empty);
        assert_eq!(grid.get(7, 4), Tile::Empty);
    }

    #[test]
    fn supported_placement_requires_surface_below() {
        let mut grid = TileGrid::new(6, 6);
        grid.set(1, 5, Tile::Border(BorderKind::Top));
        grid.set(2, 5, Tile::Border(BorderKind::Pure));
        assert!(place_supported(&mut grid, 1, 4, Tile::Spike));
        assert!(!place_supported(&mut grid, 2, 4, Tile::Spike), "fill is not a surface");
        assert!(!place_supported(&mut grid, 3, 4, Tile::Spike), "never float a hazard");
        assert!(!place_supported(&mut grid, 1, 4, Tile::Decor(0)), "cell already taken");
        assert_eq!(grid.get(1, 4), Tile::Spike);
    }

    #[test]
    fn dense_config_still_respects_guards() {
        let mut cfg = RunnerConfig::default();
        cfg.generation.coin_chance = 1.0;
        cfg.generation.gem_chance = 1.0;
        cfg.generation.platform_chance = 1.0;
        cfg.generation.spike_chance = 1.0;
        cfg.generation.decor_chance = 1.0;
        let (grid, stats) = generate_chunk_with_stats(&cfg, &mut StdRng::seed_from_u64(9));
        assert!(stats.skipped > 0, "a packed chunk must skip some placements");
        assert!(stats.spikes > 0);
        assert_supported(&grid);
    }

    #[test]
    fn zero_chance_chunk_is_flat_floor() {
        let mut cfg = RunnerConfig::default();
        cfg.generation.coin_chance = 0.0;
        cfg.generation.gem_chance = 0.0;
        cfg.generation.platform_chance = 0.0;
        let grid = generate_chunk(&cfg, &mut StdRng::seed_from_u64(3));
        assert_eq!(grid.count(|t| !t.is_empty()), 2 * 400);
    }

    #[test]
    fn generate_resolves_theme_tiles() {
        struct IndexAtlas;
        impl TileAtlas for IndexAtlas {
            type Handle = u8;
            fn handle(&self, _theme: Terrain, tile: Tile) -> u8 {
                match tile {
                    Tile::Border(k) => k.atlas_index(),
                    _ => 99,
                }
            }
        }
        let chunk = generate(
            &RunnerConfig::default(),
            Terrain::Desert,
            &IndexAtlas,
            &mut StdRng::seed_from_u64(5),
        );
        assert_eq!(chunk.tiles.theme, Terrain::Desert);
        for (_, _, tile) in chunk.grid.iter_occupied() {
            assert!(chunk.tiles.get(tile).is_some(), "{tile:?} has no handle");
        }
    }

    fn assert_floor(grid: &TileGrid) {
        let h = grid.height();
        for (col, tile) in grid.row(h - 1).iter().enumerate() {
            match tile {
                Tile::Border(k) => assert_eq!(k.family(), Family::Fill, "bottom row col {col}"),
                other => panic!("bottom row col {col} holds {other:?}"),
            }
        }
        for (col, tile) in grid.row(h - 2).iter().enumerate() {
            assert!(tile.is_solid(), "second row col {col} holds {tile:?}");
        }
    }

    fn assert_margins_pure(grid: &TileGrid, margin: u32) {
        let (w, h) = (grid.width(), grid.height());
        for col in (0..margin).chain(w - margin..w) {
            for row in 0..h - 2 {
                assert_eq!(grid.get(col as i32, row as i32), Tile::Empty, "margin ({col},{row})");
            }
            assert_eq!(grid.get(col as i32, (h - 2) as i32), Tile::Border(BorderKind::Top));
            assert_eq!(grid.get(col as i32, (h - 1) as i32), Tile::Border(BorderKind::Pure));
        }
    }

    fn assert_supported(grid: &TileGrid) {
        for (col, row, tile) in grid.iter_occupied() {
            if matches!(tile, Tile::Spike | Tile::Decor(_)) {
                let below = grid.get(col as i32, row as i32 + 1);
                assert!(below.is_surface(), "{tile:?} at ({col},{row}) rests on {below:?}");
            }
        }
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn floor_rows_always_solid(seed in 0u64..500) {
                assert_floor(&chunk(seed));
            }

            #[test]
            fn margins_hold_only_floor(seed in 0u64..500) {
                let cfg = RunnerConfig::default();
                assert_margins_pure(&chunk(seed), cfg.world.margin_columns());
            }

            #[test]
            fn hazards_and_decor_rest_on_surface(seed in 0u64..500) {
                assert_supported(&chunk(seed));
            }

            #[test]
            fn land_never_cut_at_trailing_margin(seed in 0u64..100, floating_weight in 0u32..2) {
                let mut cfg = RunnerConfig::default();
                cfg.generation.platform_chance = 1.0;
                cfg.generation.floating_weight = floating_weight;
                let grid = generate_chunk(&cfg, &mut StdRng::seed_from_u64(seed));
                let edge = (grid.width() - cfg.world.margin_columns() - 1) as i32;
                for row in 0..grid.height() as i32 - 2 {
                    if let Tile::Border(kind) = grid.get(edge, row) {
                        prop_assert!(
                            kind.edges().right || !grid.get(edge + 1, row).is_empty(),
                            "col {edge} row {row} holds {kind:?} next to an empty cell"
                        );
                    }
                }
            }

            #[test]
            fn stats_match_grid_upper_bounds(seed in 0u64..200) {
                let (grid, stats) = generate_chunk_with_stats(
                    &RunnerConfig::default(),
                    &mut StdRng::seed_from_u64(seed),
                );
                // Later platforms and margin clearing can only remove entities.
                prop_assert!(grid.count(|t| t == Tile::Coin) as u32 <= stats.coins);
                prop_assert!(grid.count(|t| t == Tile::Gem) as u32 <= stats.gems);
                prop_assert!(grid.count(|t| t == Tile::Spike) as u32 <= stats.spikes);
            }
        }
    }
}
