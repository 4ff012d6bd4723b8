//! The six analysis passes. Each one takes the shared `AnalysisSession`,
//! records issues through it, and returns a serializable report.
//!
//! Passes are total over document text; the only error that escapes is
//! `Interrupted` raised from an interactive prompt inside `record`.

/// Compile a literal pattern once and hand out a `&'static Regex`.
macro_rules! cached_regex {
    ($pat:expr) => {{
        static RE: ::std::sync::OnceLock<::regex::Regex> = ::std::sync::OnceLock::new();
        RE.get_or_init(|| ::regex::Regex::new($pat).expect("static regex"))
    }};
}

pub mod contradictions;
pub mod gaps;
pub mod links;
pub mod lint;
pub mod terms;
pub mod viewpoints;

/// Integer percentage of `part` over `whole`, rounded; 0 when `whole` is 0.
pub fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        0
    } else {
        ((part as f64 / whole as f64) * 100.0).round() as u32
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_rounds_and_handles_zero() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(4, 4), 100);
    }
}
