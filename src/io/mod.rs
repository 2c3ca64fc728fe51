//! Reading graphs and plans, writing plan artifacts.
//!
//! - `json` - adjacency-graph JSON with node attributes
//! - `csv` - `geo_id,district` plan assignments

mod csv;
mod json;
mod labels;

pub use csv::{PlanFile, read_plan_csv, write_plan_csv};
pub use json::{COUNTY_FIELDS, LoadedGraph, read_graph_json, read_graph_json_from};
