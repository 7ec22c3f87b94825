use crate::config::StrategyParameters;
use crate::data::Bar;

//exponential moving average over a value series
//returns an array of the input's length, none before the warm-up index
//seed at index period-1 is the simple mean of the first period values,
//then ema[i] = v[i]*k + ema[i-1]*(1-k) with k = 2/(period+1)
pub fn ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    assert!(period >= 1, "ema period must be at least 1");

    let mut out = vec![None; values.len()];

    if values.len() < period {
        //not enough data, signalled as all-undefined rather than an error
        return out;
    }

    let seed = values[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(seed);

    let k = 2.0 / (period as f64 + 1.0);
    let mut prev = seed;

    for i in period..values.len() {
        let current = values[i] * k + prev * (1.0 - k);
        out[i] = Some(current);
        prev = current;
    }

    out
}

//true range at index i, using the previous close for gap moves
//tr[0] has no prior close and falls back to the plain bar range
fn true_range(high: &[f64], low: &[f64], close: &[f64], i: usize) -> f64 {
    let range = high[i] - low[i];
    if i == 0 {
        return range;
    }

    let prev_close = close[i - 1];
    range
        .max((high[i] - prev_close).abs())
        .max((low[i] - prev_close).abs())
}

//average true range with wilder smoothing
//seed at index period-1 is the simple mean of the first period true ranges,
//then atr[i] = (atr[i-1]*(period-1) + tr[i]) / period
pub fn atr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<Option<f64>> {
    assert!(period >= 1, "atr period must be at least 1");
    assert!(
        high.len() == low.len() && low.len() == close.len(),
        "atr input arrays must be the same length"
    );

    let len = close.len();
    let mut out = vec![None; len];

    if len < period {
        return out;
    }

    let tr: Vec<f64> = (0..len).map(|i| true_range(high, low, close, i)).collect();

    let seed = tr[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(seed);

    let mut prev = seed;
    for i in period..len {
        let current = (prev * (period as f64 - 1.0) + tr[i]) / period as f64;
        out[i] = Some(current);
        prev = current;
    }

    out
}

//the three indicator arrays the simulator consumes, index-aligned to the bars
#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub ema_short: Vec<Option<f64>>,
    pub ema_medium: Vec<Option<f64>>,
    pub atr: Vec<Option<f64>>,
}

impl IndicatorSeries {
    //computes all indicator arrays for a bar series
    pub fn compute(bars: &[Bar], params: &StrategyParameters) -> Self {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();

        IndicatorSeries {
            ema_short: ema(&closes, params.ema_short_period),
            ema_medium: ema(&closes, params.ema_medium_period),
            atr: atr(&highs, &lows, &closes, params.atr_period),
        }
    }

    //true when every indicator has a value at the given index
    pub fn all_defined(&self, i: usize) -> bool {
        self.ema_short.get(i).copied().flatten().is_some()
            && self.ema_medium.get(i).copied().flatten().is_some()
            && self.atr.get(i).copied().flatten().is_some()
    }

    //first index usable by the simulator, none if the series never warms up
    pub fn first_defined_index(&self) -> Option<usize> {
        (0..self.ema_short.len()).find(|&i| self.all_defined(i))
    }
}
