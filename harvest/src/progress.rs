use std::time::Duration;

use twitter::ProgressReport;

pub struct ProgressBar(indicatif::ProgressBar);

impl twitter::ProgressBar for ProgressBar {
    fn init(total: Option<u64>, description: &str) -> Self {
        let pb = match total {
            Some(total) => {
                let pb = indicatif::ProgressBar::new(total);
                let sty = indicatif::ProgressStyle::default_bar()
                    .template("{msg} [{wide_bar}] {pos:>5}/{len:5}")
                    .unwrap()
                    .progress_chars("=> ");
                pb.set_style(sty);
                pb
            }
            // Mentions have no known size
            None => {
                let pb = indicatif::ProgressBar::new_spinner();
                let sty = indicatif::ProgressStyle::default_spinner()
                    .template("{spinner} {msg} {pos}")
                    .unwrap();
                pb.set_style(sty);
                pb
            }
        };
        pb.set_message(description.to_owned());
        Self(pb)
    }

    fn update(&self, report: &ProgressReport) {
        self.0.set_position(report.fetched);
    }

    fn throttled(&self, report: &ProgressReport, wait: Duration) {
        self.0.println(format!(
            "rate limited, waiting {}s: {}",
            wait.as_secs(),
            report
        ));
    }

    fn destroy(self) {
        self.0.finish_and_clear();
    }
}
