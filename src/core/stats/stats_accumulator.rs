use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
enum StatValue {
    Counter(u64),
    Percentage(u64, u64),
    Ratio(u64, u64),
}

impl StatValue {
    fn merge(&mut self, other: StatValue) {
        match (self, other) {
            (StatValue::Counter(a), StatValue::Counter(b)) => *a += b,
            (StatValue::Percentage(n, d), StatValue::Percentage(bn, bd))
            | (StatValue::Ratio(n, d), StatValue::Ratio(bn, bd)) => {
                *n += bn;
                *d += bd;
            }
            (s, o) => *s = o,
        }
    }

    fn format(&self, title: &str) -> Option<String> {
        match *self {
            StatValue::Counter(0) => None,
            StatValue::Counter(v) => Some(format!("{} {}", title, v)),
            StatValue::Percentage(_, 0) | StatValue::Ratio(_, 0) => None,
            StatValue::Percentage(n, d) => Some(format!(
                "{} {:.3}% ({} / {})",
                title,
                100.0 * n as f64 / d as f64,
                n,
                d
            )),
            StatValue::Ratio(n, d) => Some(format!(
                "{} {:.3} ({} / {})",
                title,
                n as f64 / d as f64,
                n,
                d
            )),
        }
    }
}

/// Collects the values of every registered statistic, keyed by
/// `"Category/Title"`.
#[derive(Debug, Default)]
pub struct StatsAccumulator {
    values: BTreeMap<String, StatValue>,
}

impl StatsAccumulator {
    pub fn new() -> Self {
        StatsAccumulator::default()
    }

    fn report(&mut self, name: &str, value: StatValue) {
        match self.values.get_mut(name) {
            Some(v) => v.merge(value),
            None => {
                self.values.insert(name.to_string(), value);
            }
        }
    }

    pub fn report_counter(&mut self, name: &str, val: u64) {
        self.report(name, StatValue::Counter(val));
    }

    pub fn report_percentage(&mut self, name: &str, num: u64, denom: u64) {
        self.report(name, StatValue::Percentage(num, denom));
    }

    pub fn report_ratio(&mut self, name: &str, num: u64, denom: u64) {
        self.report(name, StatValue::Ratio(num, denom));
    }

    pub fn get_counter(&self, name: &str) -> u64 {
        match self.values.get(name) {
            Some(StatValue::Counter(v)) => *v,
            _ => 0,
        }
    }

    pub fn get_percentage(&self, name: &str) -> (u64, u64) {
        match self.values.get(name) {
            Some(StatValue::Percentage(n, d)) => (*n, *d),
            _ => (0, 0),
        }
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl fmt::Display for StatsAccumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut categories: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for (name, value) in self.values.iter() {
            let (category, title) = name.split_once('/').unwrap_or((name.as_str(), ""));
            if let Some(line) = value.format(title) {
                categories.entry(category).or_default().push(line);
            }
        }
        writeln!(f, "  Statistics:")?;
        for (category, lines) in categories.iter() {
            writeln!(f, "    {}", category)?;
            for line in lines.iter() {
                writeln!(f, "      {}", line)?;
            }
        }
        Ok(())
    }
}
