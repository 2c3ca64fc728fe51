//! Adjacency-graph JSON in the networkx / gerrychain `adjacency_data` layout:
//! `{ "nodes": [{ "id": .., <attrs> }], "adjacency": [[{ "id": .. }, ..], ..] }`.

use std::{collections::HashMap, fs::File, io::{BufReader, Read}, path::Path};

use ahash::AHashMap;
use anyhow::{Context, Result, bail, ensure};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::{config::RunConfig, graph::Graph, io::labels::dense_labels};

/// Locality fields tried, in order, when no county field is configured.
pub const COUNTY_FIELDS: [&str; 11] = [
    "COUNTYFP10", "COUNTYFP20", "CTYNAME", "COUNTYFIPS", "COUNTYFP", "cnty_nm",
    "county_nam", "FIPS2", "COUNTY", "County", "CNTY_NAME",
];

#[derive(Deserialize)]
struct AdjacencyData {
    nodes: Vec<Map<String, Value>>,
    adjacency: Vec<Vec<Map<String, Value>>>,
}

/// A graph read from disk, with the starting plan found in its node attributes (if any).
#[derive(Debug)]
pub struct LoadedGraph {
    pub graph: Graph,
    /// Dense district ids from the apportionment field, when every node carries one.
    pub assignment: Option<Vec<u32>>,
    /// Original district label of each dense id.
    pub labels: Vec<String>,
}

/// Read an adjacency-graph JSON file.
pub fn read_graph_json(path: &Path, config: &RunConfig) -> Result<LoadedGraph> {
    let file = File::open(path)
        .with_context(|| format!("[io::json] Failed to open graph file: {}", path.display()))?;
    read_graph_json_from(BufReader::new(file), config)
        .with_context(|| format!("[io::json] Failed to load graph from {}", path.display()))
}

/// Read an adjacency-graph JSON document from any reader.
pub fn read_graph_json_from(reader: impl Read, config: &RunConfig) -> Result<LoadedGraph> {
    let data: AdjacencyData = serde_json::from_reader(reader)
        .context("[io::json] Graph JSON is not in adjacency format")?;
    ensure!(data.nodes.len() == data.adjacency.len(),
        "[io::json] {} nodes but {} adjacency lists", data.nodes.len(), data.adjacency.len());

    // Node ids may be numbers or strings; key them by their JSON text.
    let mut index = AHashMap::with_capacity(data.nodes.len());
    for (i, node) in data.nodes.iter().enumerate() {
        let key = id_key(node.get("id"), i)?;
        ensure!(!index.contains_key(&key), "[io::json] duplicate node id {key} at position {i}");
        index.insert(key, i as u32);
    }

    let edges = data.adjacency.iter().enumerate()
        .map(|(u, neighbors)| neighbors.iter()
            .map(|neighbor| {
                let key = id_key(neighbor.get("id"), u)?;
                index.get(&key).copied()
                    .with_context(|| format!("[io::json] node {u} lists unknown neighbor {key}"))
            })
            .collect::<Result<Vec<_>>>())
        .collect::<Result<Vec<_>>>()?;

    for (u, neighbors) in edges.iter().enumerate() {
        for &v in neighbors {
            ensure!(edges[v as usize].contains(&(u as u32)),
                "[io::json] node {u} lists neighbor {v}, but node {v} does not list {u}");
        }
    }

    let mut series = vec![config.pop_field.as_str()];
    for election in &config.elections {
        series.push(&election.dem_series);
        series.push(&election.rep_series);
    }
    let (weights_i64, weights_f64) = read_weights(&data.nodes, &series)?;

    let mut graph = Graph::new(&edges, weights_i64, weights_f64);

    match county_field(&data.nodes, config) {
        Some(field) => {
            info!(field, "using locality field");
            graph = graph.with_localities(&string_column(&data.nodes, field)?);
        }
        None => warn!("no county field found; treating the whole graph as one locality"),
    }

    if data.nodes.iter().all(|node| node.contains_key(&config.node_id_field)) {
        graph = graph.with_geo_ids(string_column(&data.nodes, &config.node_id_field)?);
    }

    let (assignment, labels) = if data.nodes.iter().all(|node| node.contains_key(&config.apportionment_field)) {
        let (ids, labels) = dense_labels(&string_column(&data.nodes, &config.apportionment_field)?);
        (Some(ids), labels)
    } else {
        (None, Vec::new())
    };

    Ok(LoadedGraph { graph, assignment, labels })
}

/// Canonical text of a node id value.
fn id_key(value: Option<&Value>, position: usize) -> Result<String> {
    match value {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => bail!("[io::json] unsupported node id {other} at position {position}"),
        None => bail!("[io::json] missing node id at position {position}"),
    }
}

/// The configured county field, or the first known county field present on the nodes.
fn county_field<'a>(nodes: &[Map<String, Value>], config: &'a RunConfig) -> Option<&'a str> {
    if let Some(field) = config.county_field.as_deref() { return Some(field) }
    let first = nodes.first()?;
    COUNTY_FIELDS.into_iter().find(|field| first.contains_key(*field))
}

/// Read an attribute of every node as text.
fn string_column(nodes: &[Map<String, Value>], field: &str) -> Result<Vec<String>> {
    nodes.iter().enumerate()
        .map(|(i, node)| match node.get(field) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(Value::Bool(b)) => Ok(b.to_string()),
            _ => bail!("[io::json] node {i} has no usable '{field}' attribute"),
        })
        .collect()
}

/// Read numeric node attributes. A column whose values are all integers is kept as i64.
fn read_weights(
    nodes: &[Map<String, Value>],
    series: &[&str],
) -> Result<(HashMap<String, Vec<i64>>, HashMap<String, Vec<f64>>)> {
    let mut weights_i64 = HashMap::new();
    let mut weights_f64 = HashMap::new();

    for &name in series {
        if weights_i64.contains_key(name) || weights_f64.contains_key(name) { continue }

        let values = nodes.iter().enumerate()
            .map(|(i, node)| match node.get(name) {
                Some(Value::Number(n)) => Ok(n.clone()),
                Some(Value::String(s)) => s.trim().parse::<serde_json::Number>()
                    .with_context(|| format!("[io::json] node {i} has non-numeric '{name}': {s}")),
                Some(Value::Null) | None => bail!("[io::json] node {i} is missing '{name}'"),
                Some(other) => bail!("[io::json] node {i} has non-numeric '{name}': {other}"),
            })
            .collect::<Result<Vec<_>>>()?;

        match values.iter().map(|n| n.as_i64()).collect::<Option<Vec<_>>>() {
            Some(ints) => { weights_i64.insert(name.to_string(), ints); }
            None => {
                let floats = values.iter().map(|n| n.as_f64().unwrap_or(0.0)).collect();
                weights_f64.insert(name.to_string(), floats);
            }
        }
    }

    Ok((weights_i64, weights_f64))
}
