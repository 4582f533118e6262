use super::stats_accumulator::*;

use std::sync::Arc;
use std::sync::Mutex;

pub trait StatReporter: Send + Sync {
    fn report(&self, accum: &mut StatsAccumulator);
    fn clear(&self);
}

pub type StatReporterRef = Arc<dyn StatReporter>;

static REGISTER_REPORTERS: Mutex<Vec<StatReporterRef>> = Mutex::new(Vec::new());

pub fn register_stat_reporter(reporter: StatReporterRef) {
    let mut reporters = REGISTER_REPORTERS.lock().unwrap();
    reporters.push(reporter);
}

pub fn report_stats(accum: &mut StatsAccumulator) {
    let reporters = REGISTER_REPORTERS.lock().unwrap();
    for reporter in reporters.iter() {
        reporter.report(accum);
    }
}

pub fn print_stats() {
    let mut accum = StatsAccumulator::new();
    report_stats(&mut accum);
    println!("{}", accum);
}

pub fn clear_stats() {
    let reporters = REGISTER_REPORTERS.lock().unwrap();
    for reporter in reporters.iter() {
        reporter.clear();
    }
}
