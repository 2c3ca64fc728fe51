use anyhow::Result;
use districtwalk::{
    fracking_total_splits, fractional_seat_wins, population_deviation, population_deviations,
    proportional_frac_deviation,
};
use serde_json::json;

use crate::{cli::{Cli, ScoreArgs}, commands::{Inputs, load_inputs}};

pub fn run(_cli: &Cli, args: &ScoreArgs) -> Result<()> {
    let Inputs { config, partition, labels } = load_inputs(&args.input)?;

    let (fracking, splits) = fracking_total_splits(&partition);
    let elections = &config.elections;
    let seats = (!elections.is_empty())
        .then(|| fractional_seat_wins(&partition, elections, config.win_volatility));
    let proportional = config.vote_share.filter(|_| !elections.is_empty())
        .map(|share| proportional_frac_deviation(&partition, elections, config.win_volatility, share));

    let deviations = population_deviations(&partition, &config.pop_field);
    let parts = (0..partition.num_parts())
        .map(|part| {
            let label = labels.get(part as usize).cloned().unwrap_or_else(|| part.to_string());
            json!({
                "district": label,
                "population": partition.part_total(&config.pop_field, part),
                "deviation": deviations[part as usize],
                "contiguous": partition.part_is_contiguous(part),
            })
        })
        .collect::<Vec<_>>();

    let report = json!({
        "nodes": partition.num_nodes(),
        "districts": partition.num_parts(),
        "population_deviation": population_deviation(&partition, &config.pop_field),
        "fracking": fracking,
        "total_splits": splits,
        "cut_edges": partition.num_cut_edges(),
        "contiguous": partition.is_contiguous(),
        "seats": seats,
        "proportional_deviation": proportional,
        "parts": parts,
    });

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("nodes                  {}", partition.num_nodes());
    println!("districts              {}", partition.num_parts());
    println!("population deviation   {:.6}", population_deviation(&partition, &config.pop_field));
    println!("fracking               {fracking}");
    println!("total splits           {splits}");
    println!("cut edges              {}", partition.num_cut_edges());
    println!("contiguous             {}", partition.is_contiguous());
    if let Some(seats) = seats { println!("expected seats         {seats:.4}") }
    if let Some(deviation) = proportional { println!("proportional deviation {deviation:.6}") }
    Ok(())
}
