use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamError {
    #[error("invalid period stamp '{0}': expected YYYY or YYYYMM")]
    BadStamp(String),
    #[error("window start {start} is after end {end}")]
    InvertedWindow { start: String, end: String },
    #[error("window bounds {start} and {end} mix granularities")]
    MixedGranularity { start: String, end: String },
}

/// Inclusive harvest window bounded by period stamps. The stamp length
/// picks the granularity: `YYYY` for yearly units, `YYYYMM` for monthly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub start: String,
    pub end: String,
}

impl Window {
    pub fn label(&self) -> String {
        if self.start == self.end {
            self.start.clone()
        } else {
            format!("{}-{}", self.start, self.end)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Granularity {
    Year,
    Month,
}

/// Query parameters shared by every call variant of a provider, plus the
/// name of the period parameter the planner fills in per unit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParamSpec {
    pub fixed: Vec<(String, String)>,
    pub period_param: Option<String>,
}

/// One call variant: an ordered parameter bundle, opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    params: Vec<(String, String)>,
    reducible: Option<ReduciblePeriod>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ReduciblePeriod {
    key: String,
    year: i32,
}

impl Variant {
    /// A plain, non-reducible bundle.
    pub fn fixed(params: Vec<(String, String)>) -> Self {
        Self {
            params,
            reducible: None,
        }
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn is_reducible(&self) -> bool {
        self.reducible.is_some()
    }

    /// One reduction step rewinds the period parameter by a year.
    pub fn reduce(&mut self) {
        if let Some(period) = &mut self.reducible {
            period.year -= 1;
            let value = format!("{:04}", period.year);
            if let Some(entry) = self.params.iter_mut().find(|(key, _)| key == &period.key) {
                entry.1 = value;
            }
        }
    }
}

/// Expand a provider's parameter spec over the window: one variant per
/// period unit, oldest first. A single-unit yearly plan is reducible.
pub fn build_variants(spec: &ParamSpec, window: &Window) -> Result<Vec<Variant>, ParamError> {
    let Some(period_param) = &spec.period_param else {
        // No period axis: the whole window is one opaque variant.
        return Ok(vec![Variant::fixed(spec.fixed.clone())]);
    };

    let (start_granularity, start) = parse_stamp(&window.start)?;
    let (end_granularity, end) = parse_stamp(&window.end)?;
    if start_granularity != end_granularity {
        return Err(ParamError::MixedGranularity {
            start: window.start.clone(),
            end: window.end.clone(),
        });
    }
    if start > end {
        return Err(ParamError::InvertedWindow {
            start: window.start.clone(),
            end: window.end.clone(),
        });
    }

    let single_year = start == end && start_granularity == Granularity::Year;
    let variants = (start..=end)
        .map(|ordinal| {
            let unit = format_unit(start_granularity, ordinal);
            let mut params = spec.fixed.clone();
            params.push((period_param.clone(), unit));
            let reducible = single_year.then(|| ReduciblePeriod {
                key: period_param.clone(),
                year: ordinal,
            });
            Variant { params, reducible }
        })
        .collect();
    Ok(variants)
}

/// Parse a stamp into its granularity and a linear ordinal (years, or
/// months since year zero) so windows enumerate with plain ranges.
fn parse_stamp(stamp: &str) -> Result<(Granularity, i32), ParamError> {
    let bad = || ParamError::BadStamp(stamp.to_string());
    if !stamp.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }
    match stamp.len() {
        4 => {
            let year: i32 = stamp.parse().map_err(|_| bad())?;
            if year == 0 {
                return Err(bad());
            }
            Ok((Granularity::Year, year))
        }
        6 => {
            let year: i32 = stamp[..4].parse().map_err(|_| bad())?;
            let month: i32 = stamp[4..].parse().map_err(|_| bad())?;
            if year == 0 || !(1..=12).contains(&month) {
                return Err(bad());
            }
            Ok((Granularity::Month, year * 12 + (month - 1)))
        }
        _ => Err(bad()),
    }
}

fn format_unit(granularity: Granularity, ordinal: i32) -> String {
    match granularity {
        Granularity::Year => format!("{ordinal:04}"),
        Granularity::Month => format!("{:04}{:02}", ordinal / 12, ordinal % 12 + 1),
    }
}
