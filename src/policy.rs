//! Allocation policies for free-block selection.

/// Selects which FREE block satisfies an allocation request when more than
/// one candidate exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllocPolicy {
    /// Scan front to back, return the first FREE block with `size >= k`.
    #[default]
    FirstFit,
    /// Scan the whole list, return the FREE block with minimal `size >= k`;
    /// ties broken by earliest address.
    BestFit,
    /// Scan the whole list, return the FREE block with maximal `size`; ties
    /// broken by earliest address.
    WorstFit,
}

impl AllocPolicy {
    /// Parse a policy name, case-insensitively. Unrecognized input is a
    /// caller error, distinct from the environment-variable fallback in
    /// [`policy_from_env`], which defaults instead of failing.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "first-fit" | "first_fit" | "firstfit" => Some(Self::FirstFit),
            "best-fit" | "best_fit" | "bestfit" => Some(Self::BestFit),
            "worst-fit" | "worst_fit" | "worstfit" => Some(Self::WorstFit),
            _ => None,
        }
    }
}

/// Reads the `RALLOC_POLICY` environment variable and resolves it to a
/// policy, defaulting to [`AllocPolicy::FirstFit`] if unset or unrecognized.
/// Consulted once, at lazy-init time, by [`crate::facade`].
pub fn policy_from_env() -> AllocPolicy {
    match std::env::var("RALLOC_POLICY") {
        Ok(val) => AllocPolicy::parse(&val).unwrap_or_default(),
        Err(_) => AllocPolicy::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_names() {
        assert_eq!(AllocPolicy::parse("first-fit"), Some(AllocPolicy::FirstFit));
        assert_eq!(AllocPolicy::parse("BEST_FIT"), Some(AllocPolicy::BestFit));
        assert_eq!(AllocPolicy::parse("WorstFit"), Some(AllocPolicy::WorstFit));
    }

    #[test]
    fn rejects_unknown_names() {
        assert_eq!(AllocPolicy::parse("banker's-fit"), None);
    }

    #[test]
    fn default_is_first_fit() {
        assert_eq!(AllocPolicy::default(), AllocPolicy::FirstFit);
    }
}
