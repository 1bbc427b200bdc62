// In crates/strategies/src/volatility.rs

use crate::{Error, Result};
use core_types::Bar;
use rust_decimal::Decimal;
use std::collections::VecDeque;
use ta::Next;

/// One reading of the estimator, kept as the exact sum of the last `period`
/// true ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Atr {
    total: Decimal,
    period: usize,
}

impl Atr {
    pub fn new(total: Decimal, period: usize) -> Self {
        Self { total, period }
    }

    /// The average true range. Division rounds to 28 significant digits, so
    /// threshold decisions go through [`Atr::is_exceeded_by`] instead.
    pub fn value(&self) -> Decimal {
        self.total / Decimal::from(self.period)
    }

    /// `distance > value() * factor`, compared as
    /// `distance * period > total * factor`.
    pub fn is_exceeded_by(&self, distance: Decimal, factor: Decimal) -> bool {
        distance * Decimal::from(self.period) > self.total * factor
    }
}

/// Average True Range over a fixed window of bars.
///
/// True range is `max(high - low, |high - prev_close|, |low - prev_close|)`,
/// or plain `high - low` for the very first bar. The estimate is the simple
/// average of the last `period` true ranges and stays `None` until that many
/// bars have been seen. All arithmetic stays in `Decimal`.
#[derive(Debug, Clone)]
pub struct VolatilityEstimator {
    period: usize,
    prev_close: Option<Decimal>,
    window: VecDeque<Decimal>,
    estimate: Option<Atr>,
}

impl VolatilityEstimator {
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(Error::InvalidParameters(format!("volatility period {}: must be at least 1", period)));
        }

        Ok(Self {
            period,
            prev_close: None,
            window: VecDeque::with_capacity(period),
            estimate: None,
        })
    }

    pub fn estimate(&self) -> Option<Atr> {
        self.estimate
    }

    fn true_range(&self, bar: &Bar) -> Decimal {
        let range = bar.high() - bar.low();
        match self.prev_close {
            Some(prev) => range.max((bar.high() - prev).abs()).max((bar.low() - prev).abs()),
            None => range,
        }
    }
}

impl Next<&Bar> for VolatilityEstimator {
    type Output = Option<Atr>;

    /// Advances the window by one bar and returns the current estimate.
    fn next(&mut self, bar: &Bar) -> Self::Output {
        let tr = self.true_range(bar);
        self.prev_close = Some(bar.close());

        if self.window.len() == self.period {
            self.window.pop_front();
        }
        self.window.push_back(tr);

        self.estimate = if self.window.len() == self.period {
            Some(Atr::new(self.window.iter().sum(), self.period))
        } else {
            None
        };
        self.estimate
    }
}
