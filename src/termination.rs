use std::time::{Duration, Instant};

/// When to stop the evolutionary loop. Criteria are polled cooperatively,
/// between generations and after every offspring insertion.
#[derive(Debug, Clone)]
pub enum Termination {
    /// Stop after this many consecutive offspring without improvement
    Stagnation(u32),
    /// Maximum running time from `Instant`
    Timeout(Instant, Duration),
    /// Run forever
    Never,
    /// Stop when either of the two criteria says so
    Any(Box<Termination>, Box<Termination>),
}

impl Termination {
    pub fn should_terminate(&self, stagnation: u32) -> bool {
        match self {
            Termination::Stagnation(limit) => stagnation >= *limit,
            Termination::Timeout(from, budget) => from.elapsed() > *budget,
            Termination::Never => false,
            Termination::Any(one, two) => {
                one.should_terminate(stagnation) || two.should_terminate(stagnation)
            }
        }
    }
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::Stagnation(limit) => write!(f, "{limit} stagnation"),
            Termination::Timeout(_, budget) => write!(f, "{} timeout", budget.as_secs()),
            Termination::Never => write!(f, "never"),
            Termination::Any(one, two) => write!(f, "({one}) | ({two})"),
        }
    }
}
