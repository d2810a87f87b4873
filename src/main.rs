use std::env;
use std::fs;

use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use prettytable::row;
use prettytable::Table;
use stochastic_portfolio::ingest::load_series;
use stochastic_portfolio::ingest::CsvSource;
use stochastic_portfolio::ingest::PriceRequest;
use stochastic_portfolio::portfolio::ReportOptions;
use stochastic_portfolio::risk::loss_probability_curve;
use stochastic_portfolio::CorrelatedMonteCarloEngine;
use stochastic_portfolio::Portfolio;
use stochastic_portfolio::SimulationConfig;
use stochastic_portfolio::SimulationSummary;
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: portfolio-mc <data-dir> <SYMBOL>... [--config <simulation.json>]";

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let mut args = env::args().skip(1);
  let Some(dir) = args.next() else {
    bail!(USAGE);
  };

  let mut symbols = Vec::new();
  let mut config = SimulationConfig::default();
  while let Some(arg) = args.next() {
    if arg == "--config" {
      let path = args.next().context(USAGE)?;
      let json = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
      config = SimulationConfig::from_json(&json)?;
    } else {
      symbols.push(arg);
    }
  }
  if symbols.is_empty() {
    bail!(USAGE);
  }

  let source = CsvSource::new(&dir);
  let series = symbols
    .iter()
    .map(|s| load_series(&source, &PriceRequest::new(s.clone(), None, None)))
    .collect::<Result<Vec<_>, _>>()?;
  let portfolio = Portfolio::new(symbols, series, None)?;
  info!(assets = portfolio.len(), observations = portfolio.dates().len(), "portfolio loaded");

  let engine = CorrelatedMonteCarloEngine::new(config)?;
  let result = engine.run(&portfolio.snapshot())?;
  let summary = SimulationSummary::from_result(&result, None);

  let report = portfolio.report(&ReportOptions {
    simulation: Some(summary.clone()),
    ..Default::default()
  })?;
  println!("{report}");

  let mut table = Table::new();
  table.add_row(row!["Metric", "Value"]);
  table.add_row(row!["Mean final value", format!("{:.2}", summary.mean_final)]);
  table.add_row(row!["Median final value", format!("{:.2}", summary.median_final)]);
  table.add_row(row!["P(gain)", format!("{:.1}%", summary.probability_of_gain * 100.0)]);
  table.add_row(row!["VaR 95%", format!("{:.2}", summary.var_95)]);
  table.add_row(row!["CVaR 95%", format!("{:.2}", summary.cvar_95)]);
  for point in loss_probability_curve(&result) {
    for (threshold, p) in point.probabilities {
      table.add_row(row![
        format!("P(year {} return < {:.0}%)", point.year, threshold * 100.0),
        format!("{:.1}%", p * 100.0)
      ]);
    }
  }
  table.printstd();

  Ok(())
}
