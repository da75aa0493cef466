//! Historical summary fed into the prompt

use crate::model::PricePoint;
use serde::Serialize;
use ta::Next;
use ta::indicators::{RelativeStrengthIndex, SimpleMovingAverage};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
/// Bars compared on each side of the trend split
const TREND_WINDOW: usize = 30;
/// Average-price move that counts as a trend, in percent
const TREND_THRESHOLD_PCT: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Upward,
    Downward,
    Sideways,
}

/// Statistics over a snapshot's price history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalSummary {
    pub data_points: usize,
    pub period_return_pct: f64,
    pub range_low: f64,
    pub range_high: f64,
    pub annualized_volatility_pct: Option<f64>,
    pub trend: Trend,
    pub average_volume: f64,
    pub sma20: Option<f64>,
    pub sma50: Option<f64>,
    pub rsi14: Option<f64>,
}

/// Summarise chronological `history`; `None` with fewer than two bars
pub fn summarize(history: &[PricePoint]) -> Option<HistoricalSummary> {
    if history.len() < 2 {
        return None;
    }

    let closes: Vec<f64> = history.iter().map(|p| p.close).collect();
    let first = closes[0];
    let last = closes[closes.len() - 1];

    let range_low = history.iter().map(|p| p.low.min(p.close)).fold(f64::INFINITY, f64::min);
    let range_high = history.iter().map(|p| p.high.max(p.close)).fold(f64::NEG_INFINITY, f64::max);

    let average_volume = history.iter().map(|p| p.volume as f64).sum::<f64>() / history.len() as f64;

    Some(HistoricalSummary {
        data_points: history.len(),
        period_return_pct: (last - first) / first * 100.0,
        range_low,
        range_high,
        annualized_volatility_pct: volatility(&closes),
        trend: trend(&closes),
        average_volume,
        sma20: sma(&closes, 20),
        sma50: sma(&closes, 50),
        rsi14: rsi(&closes, 14),
    })
}

fn volatility(closes: &[f64]) -> Option<f64> {
    let returns: Vec<f64> = closes
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect();
    if returns.len() < 2 {
        return None;
    }

    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance =
        returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (returns.len() - 1) as f64;
    Some(variance.sqrt() * TRADING_DAYS_PER_YEAR.sqrt() * 100.0)
}

/// Recent window average against the window before it
fn trend(closes: &[f64]) -> Trend {
    let window = TREND_WINDOW.min(closes.len() / 2);
    if window == 0 {
        return Trend::Sideways;
    }

    let recent = &closes[closes.len() - window..];
    let previous = &closes[closes.len() - 2 * window..closes.len() - window];
    let avg = |xs: &[f64]| xs.iter().sum::<f64>() / xs.len() as f64;

    let change = (avg(recent) - avg(previous)) / avg(previous) * 100.0;
    if change > TREND_THRESHOLD_PCT {
        Trend::Upward
    } else if change < -TREND_THRESHOLD_PCT {
        Trend::Downward
    } else {
        Trend::Sideways
    }
}

fn sma(closes: &[f64], period: usize) -> Option<f64> {
    if closes.len() < period {
        return None;
    }
    let mut indicator = SimpleMovingAverage::new(period).ok()?;
    closes.iter().fold(None, |_, &c| Some(indicator.next(c)))
}

fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if closes.len() <= period {
        return None;
    }
    let mut indicator = RelativeStrengthIndex::new(period).ok()?;
    closes.iter().fold(None, |_, &c| Some(indicator.next(c)))
}
