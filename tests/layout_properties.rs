//! Packer property tests: the placement guarantees the renderer relies on.
//!
//! These exercise the public `generate_layout` contract on whole catalogs;
//! unit tests inside `src/layout.rs` cover the ordering internals.

use std::collections::HashSet;

use gridsight::{generate_layout, GridDims, Layout, SizeClass, Tile};

fn square(id: &str) -> Tile {
    Tile::new(id, SizeClass::Square, id)
}

fn assert_disjoint_and_in_bounds(layout: &Layout, dims: GridDims) {
    let mut seen = HashSet::new();
    for placed in &layout.placed {
        assert!(placed.fits(dims), "{} out of bounds", placed.tile.id);
        for cell in placed.cells() {
            assert!(seen.insert(cell), "cell {:?} occupied twice", cell);
        }
    }
}

// ---------------------------------------------------------------------------
// P01: Every tile places when total footprint <= capacity
// ---------------------------------------------------------------------------
#[test]
fn p01_full_placement_under_capacity() {
    let catalogs: Vec<Vec<Tile>> = vec![
        // 4 + 2 + 2 + 4x1 = 12 cells on 16
        vec![
            Tile::new("l", SizeClass::Large, "L"),
            Tile::new("v", SizeClass::Vertical, "V"),
            Tile::new("h", SizeClass::Horizontal, "H"),
            square("a"),
            square("b"),
            square("c"),
            square("d"),
        ],
        // exactly at capacity: 4x 2x2 on a 4x4
        vec![
            Tile::new("l1", SizeClass::Large, "L1"),
            Tile::new("l2", SizeClass::Large, "L2"),
            Tile::new("l3", SizeClass::Large, "L3"),
            Tile::new("l4", SizeClass::Large, "L4"),
        ],
        // all squares
        (0..16).map(|i| square(&format!("s{}", i))).collect(),
    ];

    let dims = GridDims::new(4, 4);
    for tiles in catalogs {
        let layout = generate_layout(&tiles, dims);
        assert_eq!(layout.placed.len(), tiles.len());
        assert!(layout.unplaced.is_empty());
        assert_disjoint_and_in_bounds(&layout, dims);
    }
}

// ---------------------------------------------------------------------------
// P02: Overflow degrades gracefully, never silently drops
// ---------------------------------------------------------------------------
#[test]
fn p02_overflow_reported_as_unplaced() {
    let tiles: Vec<Tile> = (0..5)
        .map(|i| Tile::new(format!("l{}", i), SizeClass::Large, "L"))
        .collect();
    let dims = GridDims::new(4, 4);
    let layout = generate_layout(&tiles, dims);

    assert!(layout.occupied_cells() <= dims.capacity() as usize);
    assert!(!layout.unplaced.is_empty());
    assert_eq!(layout.placed.len() + layout.unplaced.len(), tiles.len());

    let placed_ids: HashSet<_> = layout.placed.iter().map(|p| p.tile.id.clone()).collect();
    for tile in &layout.unplaced {
        assert!(!placed_ids.contains(&tile.id));
    }
    assert_disjoint_and_in_bounds(&layout, dims);
}

// ---------------------------------------------------------------------------
// P03: Below-hint lands directly under its target, or falls back cleanly
// ---------------------------------------------------------------------------
#[test]
fn p03_below_hint_adjacency() {
    let tiles = vec![
        Tile::new("hero", SizeClass::Large, "Hero"),
        Tile::new("detail", SizeClass::Horizontal, "Detail").below("hero"),
        square("misc"),
    ];
    let dims = GridDims::new(4, 4);
    let layout = generate_layout(&tiles, dims);
    assert_disjoint_and_in_bounds(&layout, dims);

    let hero = layout.placed.iter().find(|p| p.tile.id == "hero").unwrap();
    let detail = layout.placed.iter().find(|p| p.tile.id == "detail").unwrap();
    assert_eq!(detail.column_start, hero.column_start);
    assert_eq!(detail.row_start, hero.row_start + 2);
}

#[test]
fn p03b_hint_fallback_never_overlaps_target() {
    // Grid too short for "below": the child must still place, elsewhere.
    let tiles = vec![
        Tile::new("anchor", SizeClass::Vertical, "Anchor"),
        square("child").below("anchor"),
    ];
    let dims = GridDims::new(2, 2);
    let layout = generate_layout(&tiles, dims);
    assert_eq!(layout.placed.len(), 2);
    assert_disjoint_and_in_bounds(&layout, dims);
}

// ---------------------------------------------------------------------------
// P04: Idempotence
// ---------------------------------------------------------------------------
#[test]
fn p04_identical_input_identical_placement() {
    let tiles = vec![
        Tile::new("l", SizeClass::Large, "L"),
        Tile::new("v1", SizeClass::Vertical, "V1"),
        Tile::new("v2", SizeClass::Vertical, "V2"),
        Tile::new("h", SizeClass::Horizontal, "H").below("l"),
        square("a"),
        square("b").below("v1"),
    ];
    let dims = GridDims::new(4, 4);

    let coords = |layout: &Layout| {
        layout
            .placed
            .iter()
            .map(|p| (p.tile.id.clone(), p.column_start, p.row_start))
            .collect::<Vec<_>>()
    };

    let first = generate_layout(&tiles, dims);
    for _ in 0..5 {
        let again = generate_layout(&tiles, dims);
        assert_eq!(coords(&first), coords(&again));
    }
}

// ---------------------------------------------------------------------------
// P05: The 17-cells-on-16 reference scenario
// ---------------------------------------------------------------------------
#[test]
fn p05_reference_scenario_one_square_overflows() {
    // 1x large + 2x vertical + 1x horizontal + 7x square = 17 cells > 16.
    let mut tiles = vec![
        Tile::new("hero", SizeClass::Large, "Hero"),
        Tile::new("v1", SizeClass::Vertical, "V1"),
        Tile::new("v2", SizeClass::Vertical, "V2"),
        Tile::new("h1", SizeClass::Horizontal, "H1"),
    ];
    tiles.extend((0..7).map(|i| square(&format!("sq{}", i))));

    let dims = GridDims::new(4, 4);
    let layout = generate_layout(&tiles, dims);
    assert_disjoint_and_in_bounds(&layout, dims);

    // Exactly one tile overflows, and it is the lowest-priority square.
    assert_eq!(layout.placed.len(), 10);
    assert_eq!(layout.unplaced.len(), 1);
    assert_eq!(layout.unplaced[0].id, "sq6");
    assert_eq!(layout.occupied_cells(), 16);

    // The large tile owns the top-left 2x2 block.
    let hero = layout.placed.iter().find(|p| p.tile.id == "hero").unwrap();
    assert_eq!((hero.column_start, hero.row_start), (0, 0));
    let hero_cells: HashSet<_> = hero.cells().collect();
    assert_eq!(hero_cells, HashSet::from([(0, 0), (1, 0), (0, 1), (1, 1)]));
}
