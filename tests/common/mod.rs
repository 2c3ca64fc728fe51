// Shared fixtures for integration tests: small lattice and ring graphs.
#![allow(dead_code)]

use std::collections::HashMap;

use districtwalk::{Graph, Partition};

/// Four-neighbour lattice with the given population and locality per node (row-major).
pub fn grid(rows: usize, cols: usize, population: &[i64], localities: &[&str]) -> Graph {
    let edges = (0..rows * cols).map(|i| {
        let (r, c) = (i / cols, i % cols);
        let mut adj = Vec::new();
        if r > 0 { adj.push((i - cols) as u32) }
        if c > 0 { adj.push((i - 1) as u32) }
        if c + 1 < cols { adj.push((i + 1) as u32) }
        if r + 1 < rows { adj.push((i + cols) as u32) }
        adj
    }).collect::<Vec<_>>();

    Graph::new(&edges, HashMap::from([("TOTPOP".to_string(), population.to_vec())]), HashMap::new())
        .with_localities(localities)
        .with_geo_ids((0..rows * cols).map(|i| format!("g{i:03}")).collect())
}

/// Lattice with unit population and a single locality.
pub fn uniform_grid(rows: usize, cols: usize) -> Graph {
    grid(rows, cols, &vec![1; rows * cols], &vec!["all"; rows * cols])
}

/// Six-node cycle; nodes 0..=4 lie in locality X and node 5 in Y.
pub fn ring() -> Graph {
    let edges = (0..6u32).map(|i| vec![(i + 5) % 6, (i + 1) % 6]).collect::<Vec<_>>();
    Graph::new(&edges, HashMap::from([("TOTPOP".to_string(), vec![1; 6])]), HashMap::new())
        .with_localities(&["X", "X", "X", "X", "X", "Y"])
}

/// Relabel arbitrary part ids densely in order of first appearance.
pub fn dense(raw: &[u32]) -> Vec<u32> {
    let mut seen = HashMap::new();
    raw.iter().map(|&label| {
        let next = seen.len() as u32;
        *seen.entry(label).or_insert(next)
    }).collect()
}

pub fn partition(graph: Graph, assignment: Vec<u32>) -> Partition {
    Partition::new(graph, assignment).unwrap()
}
