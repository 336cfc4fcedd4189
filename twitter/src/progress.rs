use std::fmt::Display;
use std::time::Duration;

const BAR_WIDTH: usize = 50;
const WINDOW_MINUTES: u64 = 15;

/// Snapshot of how far a fetch has come, derived purely from two counts and the endpoint quota.
#[derive(Clone, PartialEq, Debug)]
pub struct ProgressReport {
    pub expected: u64,
    pub fetched: u64,
    /// Not clamped: the expected total is a point-in-time estimate and can be overtaken.
    pub percent: f64,
    pub eta_minutes: u64,
    pub bar: String,
}

impl ProgressReport {
    pub fn render(expected: u64, fetched: u64, quota_per_window: u64) -> Self {
        // Nothing to fetch counts as finished
        let percent = if expected == 0 {
            100.0
        } else {
            fetched as f64 / expected as f64 * 100.0
        };

        let remaining = expected.saturating_sub(fetched);
        let windows = remaining.div_ceil(quota_per_window.max(1));

        let mut report = Self {
            expected,
            fetched,
            percent,
            eta_minutes: windows * WINDOW_MINUTES,
            bar: String::new(),
        };
        report.bar = report.bar_with_width(BAR_WIDTH);
        report
    }

    pub fn bar_with_width(&self, width: usize) -> String {
        let done = ((width as f64) * self.percent / 100.0).floor();
        let done = (done.max(0.0) as usize).min(width);
        format!("{}{}", "#".repeat(done), ".".repeat(width - done))
    }
}

impl Display for ProgressReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{:>5.1}%] {}/{}, about {} min left",
            self.bar, self.percent, self.fetched, self.expected, self.eta_minutes
        )
    }
}

/// Display hooks driven by the fetch loops.
pub trait ProgressBar {
    fn init(total: Option<u64>, description: &str) -> Self;
    fn update(&self, report: &ProgressReport);
    fn throttled(&self, report: &ProgressReport, wait: Duration);
    fn destroy(self);
}

impl ProgressBar for () {
    fn init(_total: Option<u64>, _description: &str) -> Self {}
    fn update(&self, _report: &ProgressReport) {}
    fn throttled(&self, _report: &ProgressReport, _wait: Duration) {}
    fn destroy(self) {}
}
