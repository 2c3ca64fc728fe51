//! Plan assignment files: two columns, `geo_id,district`.

use std::{fs::File, path::Path};

use ahash::AHashMap;
use anyhow::{Context, Result, ensure};
use polars::{frame::DataFrame, io::{SerReader, SerWriter}, prelude::{CsvReadOptions, CsvWriter, DataType, NamedFrom}, series::Series};

use crate::{graph::Graph, io::labels::dense_labels};

/// A starting plan read from disk.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanFile {
    /// Dense district id of each graph node.
    pub assignment: Vec<u32>,
    /// Original district label of each dense id.
    pub labels: Vec<String>,
}

/// Reads a CSV file as all-string columns, preserving leading zeros in identifiers.
fn read_csv(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)
        .with_context(|| format!("[io::csv] Failed to open CSV file: {}", path.display()))?;
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(file)
        .finish()
        .with_context(|| format!("[io::csv] Failed to read CSV from {}", path.display()))
}

/// Read a `geo_id,district` plan and align it with the graph's nodes.
pub fn read_plan_csv(path: &Path, graph: &Graph) -> Result<PlanFile> {
    let df = read_csv(path)?;
    ensure!(df.width() >= 2, "[io::csv] CSV must have two columns: geo_id,district");
    ensure!(df.height() == graph.node_count(),
        "[io::csv] CSV has {} rows, expected {}", df.height(), graph.node_count());

    let names = df.get_column_names();
    let geo_ids = df.column(names[0])?.cast(&DataType::String)?;
    let districts = df.column(names[1])?.cast(&DataType::String)?;

    let node_of = graph.geo_ids().iter().enumerate()
        .map(|(node, geo_id)| (geo_id.as_str(), node))
        .collect::<AHashMap<_, _>>();

    let mut raw = vec![None; graph.node_count()];
    for (geo_id, district) in geo_ids.str()?.into_no_null_iter().zip(districts.str()?.into_no_null_iter()) {
        let node = *node_of.get(geo_id.trim())
            .with_context(|| format!("[io::csv] GeoId {geo_id} in CSV not found in graph"))?;
        ensure!(raw[node].is_none(), "[io::csv] GeoId {geo_id} assigned twice");
        raw[node] = Some(district.trim().to_string());
    }

    let raw = raw.into_iter().flatten().collect::<Vec<_>>();
    ensure!(raw.len() == graph.node_count(), "[io::csv] CSV does not assign every node");

    let (assignment, labels) = dense_labels(&raw);
    Ok(PlanFile { assignment, labels })
}

/// Write a plan as `geo_id,district`, translating dense ids back to labels when available.
pub fn write_plan_csv(path: &Path, geo_ids: &[String], assignment: &[u32], labels: &[String]) -> Result<()> {
    ensure!(geo_ids.len() == assignment.len(), "[io::csv] geo_ids and assignment lengths differ");

    let districts = assignment.iter()
        .map(|&part| labels.get(part as usize).cloned().unwrap_or_else(|| part.to_string()))
        .collect::<Vec<_>>();

    let mut df = DataFrame::new(vec![
        Series::new("geo_id".into(), geo_ids).into(),
        Series::new("district".into(), districts).into(),
    ])?;

    let file = File::create(path)
        .with_context(|| format!("[io::csv] Failed to create CSV file: {}", path.display()))?;
    CsvWriter::new(file)
        .finish(&mut df)
        .with_context(|| format!("[io::csv] Failed to write CSV to {}", path.display()))
}
