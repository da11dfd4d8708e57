use chrono::NaiveDateTime;
use serde::Serialize;

/// Timestamp layouts the estimated completion token may use.
const ETA_FORMATS: &[&str] = &["%Y-%m-%d-%H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// A line announcing the zoom level being seeded.
///
/// `[10:00:01] 3 40.00% 0.0, 0.0, 1.0, 1.0 (42 tiles) ETA: 2024-01-01-10:05:00`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    pub zoom_level: u32,
    /// Percentage without the `%` sign, e.g. `40.00`
    pub percent: String,
    pub eta: Option<NaiveDateTime>,
}

/// A percentage-only update, usually redrawn over the previous one with `\r`.
///
/// `[10:00:02] 45.00% ETA: 2024-01-01-10:05:00`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentRecord {
    pub percent: String,
    pub eta: Option<NaiveDateTime>,
}

/// Most recent progress found in a log.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LatestProgress {
    /// Latest step line, its percentage replaced by any newer percent line
    pub step: Option<StepRecord>,
    /// Newest percent line after the latest step, if any
    pub percent: Option<PercentRecord>,
}

impl LatestProgress {
    pub fn is_empty(&self) -> bool {
        self.step.is_none() && self.percent.is_none()
    }

    /// Best known overall percentage.
    pub fn percent(&self) -> Option<&str> {
        self.step
            .as_ref()
            .map(|s| s.percent.as_str())
            .or_else(|| self.percent.as_ref().map(|p| p.percent.as_str()))
    }

    pub fn zoom_level(&self) -> Option<u32> {
        self.step.as_ref().map(|s| s.zoom_level)
    }

    pub fn eta(&self) -> Option<NaiveDateTime> {
        self.step
            .as_ref()
            .and_then(|s| s.eta)
            .or_else(|| self.percent.as_ref().and_then(|p| p.eta))
    }
}

/// Classified log line.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ProgressLine {
    Step(StepRecord),
    Percent(PercentRecord),
}

impl ProgressLine {
    /// Classify one line; `None` for anything that is not progress.
    pub(crate) fn parse(line: &str) -> Option<Self> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let second = *tokens.get(1)?;

        if tokens.len() > 2 {
            if let Ok(zoom_level) = second.parse::<u32>() {
                return Some(ProgressLine::Step(StepRecord {
                    zoom_level,
                    percent: strip_percent(tokens[2]),
                    eta: parse_eta(&tokens),
                }));
            }
        }

        if second.ends_with('%') {
            return Some(ProgressLine::Percent(PercentRecord {
                percent: strip_percent(second),
                eta: parse_eta(&tokens),
            }));
        }

        None
    }
}

fn strip_percent(token: &str) -> String {
    token.trim_end_matches('%').to_string()
}

/// The estimated completion time is the last token; unparseable is unknown.
fn parse_eta(tokens: &[&str]) -> Option<NaiveDateTime> {
    let last = tokens.last()?;
    ETA_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(last, fmt).ok())
}
