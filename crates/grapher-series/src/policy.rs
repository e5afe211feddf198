//! Missing-value policy.
//!
//! One rule set for every engine that aligns series on shared positions:
//! given a series' readings at each position, decide what is drawn where
//! the reading is Missing.

use grapher_model::MissingDataStrategy;

/// A drawable reading at one position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved {
    pub value: f64,
    pub is_interpolated: bool,
    pub is_fake: bool,
}

impl Resolved {
    fn present(value: f64) -> Self {
        Self {
            value,
            is_interpolated: false,
            is_fake: false,
        }
    }

    fn estimated(value: f64) -> Self {
        Self {
            value,
            is_interpolated: true,
            is_fake: false,
        }
    }

    fn fake_zero() -> Self {
        Self {
            value: 0.0,
            is_interpolated: false,
            is_fake: true,
        }
    }
}

/// Fill the gaps of one series.
///
/// `coords` gives each position's place on a numeric axis (times, or
/// category indices) and is used only by interpolation. Returns `None`
/// when the series must be dropped: under [`MissingDataStrategy::Drop`] if
/// any reading is Missing, and under every strategy if none is present.
///
/// - `Zero`: a fake zero point.
/// - `Interpolate`: linear between the nearest present neighbours; a fake
///   zero before the first and after the last present reading.
/// - `CarryForward`: the previous present reading, marked interpolated; a
///   fake zero before the first.
pub fn apply(
    readings: &[Option<f64>],
    coords: &[f64],
    strategy: MissingDataStrategy,
) -> Option<Vec<Resolved>> {
    if readings.iter().all(Option::is_none) {
        return None;
    }
    match strategy {
        MissingDataStrategy::Drop => readings
            .iter()
            .map(|reading| reading.map(Resolved::present))
            .collect(),
        MissingDataStrategy::Zero => Some(
            readings
                .iter()
                .map(|reading| reading.map_or_else(Resolved::fake_zero, Resolved::present))
                .collect(),
        ),
        MissingDataStrategy::Interpolate => Some(interpolate(readings, coords)),
        MissingDataStrategy::CarryForward => {
            let mut last = None;
            Some(
                readings
                    .iter()
                    .map(|reading| match reading {
                        Some(v) => {
                            last = Some(*v);
                            Resolved::present(*v)
                        }
                        None => last.map_or_else(Resolved::fake_zero, Resolved::estimated),
                    })
                    .collect(),
            )
        }
    }
}

fn interpolate(readings: &[Option<f64>], coords: &[f64]) -> Vec<Resolved> {
    let mut out = Vec::with_capacity(readings.len());
    let mut prev: Option<usize> = None;
    for (idx, reading) in readings.iter().enumerate() {
        if let Some(v) = reading {
            prev = Some(idx);
            out.push(Resolved::present(*v));
            continue;
        }
        let next = readings[idx + 1..]
            .iter()
            .position(Option::is_some)
            .map(|offset| idx + 1 + offset);
        let resolved = match (prev, next) {
            (Some(p), Some(n)) => match (readings[p], readings[n], coords.get(p), coords.get(n)) {
                (Some(v0), Some(v1), Some(&c0), Some(&c1)) if c1 > c0 => {
                    let at = coords.get(idx).copied().unwrap_or(c0);
                    Resolved::estimated(v0 + (v1 - v0) * (at - c0) / (c1 - c0))
                }
                _ => Resolved::fake_zero(),
            },
            _ => Resolved::fake_zero(),
        };
        out.push(resolved);
    }
    out
}
