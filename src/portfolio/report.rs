//! # Portfolio Report
//!
//! $$
//! \text{report} = f(\text{PortfolioStats},\ \text{SeriesSummary}_{1..n},\ \text{SimulationSummary}^?)
//! $$
//!
//! Markdown rendering of statistics that have already been computed. Nothing
//! here recomputes a metric.

use std::fmt::Write;

use serde::Serialize;

use super::model::Portfolio;
use super::stats::PortfolioStats;
use crate::error::Result;
use crate::risk::SimulationSummary;

const MIN_ASSETS: usize = 3;
const MAX_WEIGHT: f64 = 0.5;
const MAX_VOLATILITY: f64 = 0.3;
const MIN_SHARPE: f64 = 1.0;
const MIN_DIVERSIFICATION: f64 = 1.1;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportOptions {
  pub include_warnings: bool,
  pub include_statistics: bool,
  pub include_quality_check: bool,
  /// Appended as a final section when present.
  pub simulation: Option<SimulationSummary>,
}

impl Default for ReportOptions {
  fn default() -> Self {
    Self {
      include_warnings: true,
      include_statistics: true,
      include_quality_check: true,
      simulation: None,
    }
  }
}

/// Advisory findings on concentration, volatility and risk-adjusted return.
pub fn warnings(stats: &PortfolioStats) -> Vec<String> {
  let mut out = Vec::new();

  if stats.symbols.len() < MIN_ASSETS {
    out.push(format!(
      "Only {} assets held; consider diversifying further.",
      stats.symbols.len()
    ));
  }
  let max_weight = stats.max_weight();
  if max_weight > MAX_WEIGHT {
    out.push(format!(
      "High concentration in a single asset ({:.1}%); consider rebalancing.",
      max_weight * 100.0
    ));
  }
  if stats.annualized_volatility > MAX_VOLATILITY {
    out.push(format!(
      "High annualized volatility ({:.1}%); consider more stable assets.",
      stats.annualized_volatility * 100.0
    ));
  }
  if stats.sharpe_ratio < 0.0 {
    out.push("Negative Sharpe ratio; returns do not compensate for risk.".to_string());
  } else if stats.sharpe_ratio < MIN_SHARPE {
    out.push("Low Sharpe ratio (< 1); consider optimizing the allocation.".to_string());
  }
  if stats.diversification_ratio.is_finite() && stats.diversification_ratio < MIN_DIVERSIFICATION {
    out.push(format!(
      "Low diversification ratio ({:.2}); holdings move largely together.",
      stats.diversification_ratio
    ));
  }

  out
}

fn pct(x: f64) -> String {
  format!("{:.2}%", x * 100.0)
}

impl Portfolio {
  /// Markdown report of the portfolio statistics.
  pub fn report(&self, options: &ReportOptions) -> Result<String> {
    let mut md = String::new();
    self.write_report(options, &mut md)?;
    Ok(md)
  }

  /// Render the markdown report into any [`Write`] sink.
  pub fn write_report<W: Write>(&self, options: &ReportOptions, out: &mut W) -> Result<()> {
    let stats = self.stats()?;
    self.render(&stats, options, out)?;
    Ok(())
  }

  fn render<W: Write>(&self, stats: &PortfolioStats, options: &ReportOptions, md: &mut W) -> std::fmt::Result {
    writeln!(md, "# Portfolio Report: {}", self.name())?;
    writeln!(md)?;
    writeln!(md, "## Overview")?;
    writeln!(md, "- **Assets:** {}", self.len())?;
    writeln!(md, "- **Weights:**")?;
    for asset in self.assets() {
      writeln!(md, "  - {}: {}", asset.symbol(), pct(asset.weight()))?;
    }
    if let (Some(first), Some(last)) = (stats.first_date, stats.last_date) {
      writeln!(md, "- **Date range:** {first} to {last} ({} observations)", stats.observations)?;
    }
    writeln!(md)?;

    if options.include_statistics {
      writeln!(md, "## Portfolio Statistics")?;
      writeln!(md, "- **Mean value:** {:.2}", stats.mean_value)?;
      writeln!(md, "- **Value std:** {:.2}", stats.std_value)?;
      writeln!(md, "- **Value range:** {:.2} to {:.2}", stats.min_value, stats.max_value)?;
      writeln!(md, "- **Total return:** {}", pct(stats.total_return))?;
      writeln!(md, "- **Annualized return:** {}", pct(stats.annualized_return))?;
      writeln!(md, "- **Annualized volatility:** {}", pct(stats.annualized_volatility))?;
      writeln!(md, "- **Sharpe ratio:** {:.2}", stats.sharpe_ratio)?;
      writeln!(md, "- **Max drawdown:** {}", pct(stats.max_drawdown))?;
      writeln!(md, "- **VaR (95%, daily):** {}", pct(stats.var_95))?;
      writeln!(md, "- **CVaR (95%, daily):** {}", pct(stats.cvar_95))?;
      writeln!(md, "- **Skewness:** {:.3}", stats.skewness)?;
      writeln!(md, "- **Excess kurtosis:** {:.3}", stats.kurtosis)?;
      writeln!(md, "- **Diversification ratio:** {:.3}", stats.diversification_ratio)?;
      writeln!(md, "- **Mean pairwise correlation:** {:.3}", stats.mean_pairwise_correlation)?;
      writeln!(md)?;

      writeln!(md, "## Asset Statistics")?;
      for asset in self.assets() {
        let s = asset.series().summary();
        writeln!(md, "### {}", s.symbol)?;
        writeln!(md, "- **Total return:** {}", pct(s.total_return))?;
        writeln!(md, "- **Annualized volatility:** {}", pct(s.volatility_annualized))?;
        writeln!(md, "- **Sharpe ratio (30d):** {:.2}", s.sharpe_ratio)?;
        writeln!(md, "- **Max drawdown:** {}", pct(s.max_drawdown))?;
        writeln!(md, "- **Mean price:** {:.2}", s.mean_price)?;
        writeln!(md, "- **Observations:** {}", s.observations)?;
        writeln!(md)?;
      }
    }

    if options.include_warnings {
      writeln!(md, "## Warnings")?;
      let found = warnings(stats);
      if found.is_empty() {
        writeln!(md, "No significant issues detected.")?;
      }
      for w in found {
        writeln!(md, "- {w}")?;
      }
      writeln!(md)?;
    }

    if options.include_quality_check {
      writeln!(md, "## Data Quality")?;
      for asset in self.assets() {
        let q = asset.quality();
        if q.is_clean() {
          writeln!(md, "- {}: clean", asset.symbol())?;
          continue;
        }
        writeln!(md, "- {}:", asset.symbol())?;
        for (field, n) in &q.missing_values {
          writeln!(md, "  - {n} missing {field} values")?;
        }
        for (field, n) in &q.outliers {
          writeln!(md, "  - {n} {field} outliers")?;
        }
        if q.duplicate_dates {
          writeln!(md, "  - duplicate dates")?;
        }
        if q.non_positive_prices {
          writeln!(md, "  - non-positive prices")?;
        }
        for e in &q.logical_errors {
          writeln!(md, "  - {e}")?;
        }
      }
      writeln!(md)?;
    }

    if let Some(sim) = &options.simulation {
      writeln!(md, "## Monte Carlo Simulation")?;
      writeln!(md, "- **Initial value:** {:.2}", sim.initial_value)?;
      writeln!(md, "- **Mean final value:** {:.2}", sim.mean_final)?;
      writeln!(md, "- **Median final value:** {:.2}", sim.median_final)?;
      writeln!(md, "- **Expected return:** {}", pct(sim.expected_return))?;
      writeln!(md, "- **Probability of gain:** {}", pct(sim.probability_of_gain))?;
      if let (Some(target), Some(p)) = (sim.target_value, sim.probability_of_target) {
        writeln!(md, "- **Probability of reaching {target:.2}:** {}", pct(p))?;
      }
      writeln!(md, "- **VaR (95%):** {:.2}", sim.var_95)?;
      writeln!(md, "- **CVaR (95%):** {:.2}", sim.cvar_95)?;
      for (p, v) in &sim.percentiles {
        writeln!(md, "  - p{p}: {v:.2}")?;
      }
      writeln!(md)?;
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::error::RiskError;
  use crate::series::price_series::tests::series_from_returns;

  fn stats_with(symbols: usize, weights: Vec<f64>, vol: f64, sharpe: f64, dr: f64) -> PortfolioStats {
    PortfolioStats {
      symbols: (0..symbols).map(|i| format!("S{i}")).collect(),
      weights,
      first_date: None,
      last_date: None,
      observations: 100,
      mean_value: 100.0,
      std_value: 2.0,
      min_value: 96.0,
      max_value: 104.0,
      total_return: 0.1,
      mean_daily_return: 0.0004,
      std_daily_return: 0.01,
      annualized_return: 0.1,
      annualized_volatility: vol,
      sharpe_ratio: sharpe,
      max_drawdown: -0.1,
      var_95: -0.02,
      cvar_95: -0.03,
      skewness: 0.0,
      kurtosis: 0.0,
      diversification_ratio: dr,
      mean_pairwise_correlation: 0.2,
      individual_volatilities: Vec::new(),
      correlation_matrix: Vec::new(),
    }
  }

  #[test]
  fn warns_on_concentration_and_risk() {
    let w = warnings(&stats_with(2, vec![0.7, 0.3], 0.35, -0.2, 1.05));
    assert_eq!(w.len(), 5);
    assert!(w[1].contains("70.0%"));
    assert!(w[3].contains("Negative"));

    let healthy = warnings(&stats_with(4, vec![0.25; 4], 0.12, 1.3, 1.4));
    assert!(healthy.is_empty());

    let low = warnings(&stats_with(4, vec![0.25; 4], 0.12, 0.5, f64::NAN));
    assert_eq!(low, vec!["Low Sharpe ratio (< 1); consider optimizing the allocation.".to_string()]);
  }

  #[test]
  fn report_contains_sections() {
    let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let a: Vec<f64> = (0..40).map(|i| ((i * 3) % 7) as f64 / 300.0 - 0.01).collect();
    let b: Vec<f64> = (0..40).map(|i| ((i * 5) % 9) as f64 / 300.0 - 0.013).collect();
    let p = Portfolio::new(
      vec!["A".into(), "B".into()],
      vec![series_from_returns("A", start, &a), series_from_returns("B", start, &b)],
      None,
    )
    .unwrap();

    let md = p.report(&ReportOptions::default()).unwrap();
    assert!(md.starts_with("# Portfolio Report: Portfolio"));
    assert!(md.contains("## Portfolio Statistics"));
    assert!(md.contains("- **Value std:**"));
    assert!(md.contains("### B"));
    assert!(md.contains("Only 2 assets held"));
    assert!(md.contains("## Data Quality"));
    assert!(!md.contains("## Monte Carlo Simulation"));

    let bare = p
      .report(&ReportOptions {
        include_statistics: false,
        include_warnings: false,
        include_quality_check: false,
        simulation: None,
      })
      .unwrap();
    assert!(!bare.contains("## Warnings"));
    assert!(bare.contains("  - A: 50.00%"));
  }

  struct Rejecting;

  impl Write for Rejecting {
    fn write_str(&mut self, _: &str) -> std::fmt::Result {
      Err(std::fmt::Error)
    }
  }

  #[test]
  fn writer_failure_is_reported() {
    let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let r: Vec<f64> = (0..20).map(|i| ((i * 3) % 7) as f64 / 300.0 - 0.01).collect();
    let p = Portfolio::new(vec!["A".into()], vec![series_from_returns("A", start, &r)], None).unwrap();

    let err = p.write_report(&ReportOptions::default(), &mut Rejecting).unwrap_err();
    assert!(matches!(err, RiskError::Render(_)));
  }
}
