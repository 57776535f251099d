//! Grid Packer: assign every tile a non-overlapping rectangle in a fixed
//! N x M grid, honoring size classes and below-tile placement hints.
//!
//! Two phases. First an explicit ordering: stable sort by descending
//! footprint, then a dependency pass that places hint targets before their
//! dependents and breaks hint cycles outright. Second a single placement
//! sweep: hinted position if free, else row-major first fit, else the tile
//! is reported unplaced. Overflow shrinks the rendered grid; it is logged,
//! never thrown.

use std::collections::{HashMap, HashSet};

use crate::logging::{log, obj, v_num, v_str, Domain, Level};
use crate::tile::{GridDims, PlacedTile, Tile};

/// Packer output. `unplaced` is explicit: tiles are never silently dropped.
#[derive(Debug, Clone)]
pub struct Layout {
    pub placed: Vec<PlacedTile>,
    pub unplaced: Vec<Tile>,
}

impl Layout {
    pub fn occupied_cells(&self) -> usize {
        self.placed.iter().map(|p| p.tile.size.footprint() as usize).sum()
    }
}

/// Pack `tiles` into `dims`. Pure: identical input yields identical output.
pub fn generate_layout(tiles: &[Tile], dims: GridDims) -> Layout {
    let mut ordered: Vec<Tile> = tiles.to_vec();
    // Stable: equal-footprint tiles keep catalog order.
    ordered.sort_by_key(|t| std::cmp::Reverse(t.size.footprint()));

    drop_cyclic_hints(&mut ordered);
    let order = dependency_order(&ordered);

    let mut occupied: HashSet<(u32, u32)> = HashSet::new();
    let mut placed: Vec<PlacedTile> = Vec::new();
    let mut placed_by_id: HashMap<String, usize> = HashMap::new();
    let mut unplaced: Vec<Tile> = Vec::new();

    for idx in order {
        let tile = &ordered[idx];

        let hinted = tile.preferred.as_ref().and_then(|pref| {
            placed_by_id
                .get(&pref.below)
                .map(|&i| &placed[i])
                .and_then(|target| {
                    let col = target.column_start;
                    let row = target.row_start + target.tile.size.height();
                    try_place(tile, col, row, dims, &occupied)
                })
        });

        let position = hinted.or_else(|| scan_first_fit(tile, dims, &occupied));

        match position {
            Some((col, row)) => {
                let placement = PlacedTile {
                    tile: tile.clone(),
                    column_start: col,
                    row_start: row,
                };
                occupied.extend(placement.cells());
                placed_by_id.insert(tile.id.clone(), placed.len());
                placed.push(placement);
            }
            None => {
                log(
                    Level::Warn,
                    Domain::Layout,
                    "tile_unplaced",
                    obj(&[
                        ("tile_id", v_str(&tile.id)),
                        ("size", v_str(tile.size.as_str())),
                        ("occupied_cells", v_num(occupied.len() as f64)),
                        ("capacity", v_num(dims.capacity() as f64)),
                    ]),
                );
                unplaced.push(tile.clone());
            }
        }
    }

    log(
        Level::Debug,
        Domain::Layout,
        "layout_generated",
        obj(&[
            ("placed", v_num(placed.len() as f64)),
            ("unplaced", v_num(unplaced.len() as f64)),
            ("occupied_cells", v_num(occupied.len() as f64)),
        ]),
    );

    Layout { placed, unplaced }
}

/// Validate the given position for `tile`: in bounds and all cells free.
fn try_place(
    tile: &Tile,
    col: u32,
    row: u32,
    dims: GridDims,
    occupied: &HashSet<(u32, u32)>,
) -> Option<(u32, u32)> {
    let w = tile.size.width();
    let h = tile.size.height();
    if col + w > dims.columns || row + h > dims.rows {
        return None;
    }
    for dr in 0..h {
        for dc in 0..w {
            if occupied.contains(&(col + dc, row + dr)) {
                return None;
            }
        }
    }
    Some((col, row))
}

/// Row-major sweep (top-to-bottom, left-to-right), first fit wins.
fn scan_first_fit(
    tile: &Tile,
    dims: GridDims,
    occupied: &HashSet<(u32, u32)>,
) -> Option<(u32, u32)> {
    for row in 0..dims.rows {
        for col in 0..dims.columns {
            if let Some(pos) = try_place(tile, col, row, dims, occupied) {
                return Some(pos);
            }
        }
    }
    None
}

/// Each tile declares at most one `below` edge, so the hint graph is a
/// functional graph: cycles are simple pointer loops. Any tile on a loop
/// loses its hint and packs as an ordinary tile.
fn drop_cyclic_hints(tiles: &mut [Tile]) {
    let index_by_id: HashMap<String, usize> = tiles
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id.clone(), i))
        .collect();

    let next: Vec<Option<usize>> = tiles
        .iter()
        .map(|t| {
            t.preferred
                .as_ref()
                .and_then(|p| index_by_id.get(&p.below).copied())
        })
        .collect();

    // 0 = unvisited, 1 = on current chain, 2 = resolved
    let mut state = vec![0u8; tiles.len()];
    let mut cyclic = vec![false; tiles.len()];

    for start in 0..tiles.len() {
        if state[start] != 0 {
            continue;
        }
        let mut chain = Vec::new();
        let mut cur = start;
        loop {
            state[cur] = 1;
            chain.push(cur);
            match next[cur] {
                Some(n) if state[n] == 0 => cur = n,
                Some(n) if state[n] == 1 => {
                    // Found a loop: everything from n onward in the chain.
                    let loop_start = chain.iter().position(|&c| c == n).unwrap_or(0);
                    for &member in &chain[loop_start..] {
                        cyclic[member] = true;
                    }
                    break;
                }
                _ => break,
            }
        }
        for &visited in &chain {
            state[visited] = 2;
        }
    }

    for (i, tile) in tiles.iter_mut().enumerate() {
        if cyclic[i] && tile.preferred.is_some() {
            log(
                Level::Warn,
                Domain::Layout,
                "hint_cycle_dropped",
                obj(&[
                    ("tile_id", v_str(&tile.id)),
                    (
                        "target",
                        v_str(&tile.preferred.as_ref().map(|p| p.below.clone()).unwrap_or_default()),
                    ),
                ]),
            );
            tile.preferred = None;
        }
    }
}

/// Topological order over the (acyclic, post-drop) hint edges that
/// otherwise preserves the priority order of `tiles`. Kahn's algorithm,
/// always taking the lowest-priority-index ready node.
fn dependency_order(tiles: &[Tile]) -> Vec<usize> {
    let index_by_id: HashMap<&str, usize> = tiles
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id.as_str(), i))
        .collect();

    let mut indegree = vec![0usize; tiles.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); tiles.len()];
    for (i, tile) in tiles.iter().enumerate() {
        if let Some(pref) = &tile.preferred {
            // A hint naming an unknown id stays inert: no edge, scan fallback.
            if let Some(&target) = index_by_id.get(pref.below.as_str()) {
                if target != i {
                    indegree[i] += 1;
                    dependents[target].push(i);
                }
            }
        }
    }

    let mut ready: Vec<usize> = (0..tiles.len()).filter(|&i| indegree[i] == 0).collect();
    let mut order = Vec::with_capacity(tiles.len());
    while let Some(pos) = ready.iter().enumerate().min_by_key(|(_, &i)| i).map(|(p, _)| p) {
        let node = ready.swap_remove(pos);
        order.push(node);
        for &dep in &dependents[node] {
            indegree[dep] -= 1;
            if indegree[dep] == 0 {
                ready.push(dep);
            }
        }
    }
    order
}
