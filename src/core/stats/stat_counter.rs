use super::stat_reporter::*;
use super::stats_accumulator::StatsAccumulator;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// Counters are bumped from every render thread, so they are plain atomics
// rather than locked reporters.

struct CountReporter {
    name: String,
    value: AtomicU64,
}

impl StatReporter for CountReporter {
    fn report(&self, accum: &mut StatsAccumulator) {
        accum.report_counter(&self.name, self.value.load(Ordering::Relaxed));
    }
    fn clear(&self) {
        self.value.store(0, Ordering::Relaxed);
    }
}

struct FractionReporter {
    name: String,
    num: AtomicU64,
    denom: AtomicU64,
    as_ratio: bool,
}

impl StatReporter for FractionReporter {
    fn report(&self, accum: &mut StatsAccumulator) {
        let num = self.num.load(Ordering::Relaxed);
        let denom = self.denom.load(Ordering::Relaxed);
        if self.as_ratio {
            accum.report_ratio(&self.name, num, denom);
        } else {
            accum.report_percentage(&self.name, num, denom);
        }
    }
    fn clear(&self) {
        self.num.store(0, Ordering::Relaxed);
        self.denom.store(0, Ordering::Relaxed);
    }
}

//-----------------------------------------------------------------------

pub struct StatCounter {
    reporter: Arc<CountReporter>,
}

impl StatCounter {
    pub fn new(name: &str) -> Self {
        let reporter = Arc::new(CountReporter {
            name: name.to_string(),
            value: AtomicU64::new(0),
        });
        register_stat_reporter(reporter.clone());
        StatCounter { reporter }
    }
    pub fn inc(&self) {
        self.add(1);
    }
    pub fn add(&self, val: u64) {
        self.reporter.value.fetch_add(val, Ordering::Relaxed);
    }
    pub fn get(&self) -> u64 {
        return self.reporter.value.load(Ordering::Relaxed);
    }
}

fn new_fraction(name: &str, as_ratio: bool) -> Arc<FractionReporter> {
    let reporter = Arc::new(FractionReporter {
        name: name.to_string(),
        num: AtomicU64::new(0),
        denom: AtomicU64::new(0),
        as_ratio,
    });
    register_stat_reporter(reporter.clone());
    return reporter;
}

pub struct StatPercent {
    reporter: Arc<FractionReporter>,
}

impl StatPercent {
    pub fn new(name: &str) -> Self {
        StatPercent {
            reporter: new_fraction(name, false),
        }
    }
    pub fn add_num(&self, val: u64) {
        self.reporter.num.fetch_add(val, Ordering::Relaxed);
    }
    pub fn add_denom(&self, val: u64) {
        self.reporter.denom.fetch_add(val, Ordering::Relaxed);
    }
}

pub struct StatRatio {
    reporter: Arc<FractionReporter>,
}

impl StatRatio {
    pub fn new(name: &str) -> Self {
        StatRatio {
            reporter: new_fraction(name, true),
        }
    }
    pub fn add_num(&self, val: u64) {
        self.reporter.num.fetch_add(val, Ordering::Relaxed);
    }
    pub fn add_denom(&self, val: u64) {
        self.reporter.denom.fetch_add(val, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_001() {
        let counter = StatCounter::new("Test/Unit counter");
        let before = counter.get();
        counter.inc();
        counter.add(4);
        assert!(counter.get() >= before + 5);

        let mut accum = StatsAccumulator::new();
        report_stats(&mut accum);
        assert!(accum.get_counter("Test/Unit counter") >= 5);
    }

    #[test]
    fn test_002() {
        let percent = StatPercent::new("Test/Unit percent");
        percent.add_num(1);
        percent.add_denom(2);
        let mut accum = StatsAccumulator::new();
        report_stats(&mut accum);
        let (num, denom) = accum.get_percentage("Test/Unit percent");
        assert!(num >= 1 && denom >= 2);
    }
}
