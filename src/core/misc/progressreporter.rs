use indicatif::*;

/// Receives `(done, total)` progress of long, non-interruptible operations.
pub trait ProgressCallback: Send + Sync {
    fn update(&self, done: usize, total: usize);
    fn done(&self) {}
}

pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn update(&self, _done: usize, _total: usize) {}
}

pub struct ProgressReporter {
    pb: ProgressBar,
}

impl ProgressReporter {
    pub fn new(total_work: usize, title: &str) -> Self {
        let pb = ProgressBar::new(total_work as u64);
        let template = format!("{{spinner:.bold.green}} {}: ", title)
            + "[{wide_bar:.cyan}]  ({elapsed_precise}|{eta_precise}) ";
        if let Ok(style) = ProgressStyle::with_template(&template) {
            pb.set_style(style.progress_chars("█▇▆▅▄▃▂▁  "));
        }
        pb.tick();
        ProgressReporter { pb }
    }

    pub fn set_position(&self, pos: usize) {
        self.pb.set_position(pos as u64);
    }

    pub fn finish(&self) {
        self.pb.finish();
    }
}

impl ProgressCallback for ProgressReporter {
    fn update(&self, done: usize, total: usize) {
        if self.pb.length() != Some(total as u64) {
            self.pb.set_length(total as u64);
        }
        self.pb.set_position(done as u64);
    }

    fn done(&self) {
        self.pb.finish();
    }
}
