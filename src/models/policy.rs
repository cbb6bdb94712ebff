use std::fmt;
use std::ops::BitOr;

use crate::models::ConfirmationType;

/// Bitmask of confirmation types this run is allowed to accept.
/// Immutable once the shell has resolved it; the scheduler only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptPolicy(u8);

impl AcceptPolicy {
    pub const NONE: AcceptPolicy = AcceptPolicy(0);
    pub const TRADES: AcceptPolicy = AcceptPolicy(1);
    pub const MARKET: AcceptPolicy = AcceptPolicy(1 << 1);
    pub const OTHERS: AcceptPolicy = AcceptPolicy(1 << 2);
    pub const ALL: AcceptPolicy = AcceptPolicy(1 | 1 << 1 | 1 << 2);

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, flag: AcceptPolicy) -> bool {
        self.0 & flag.0 == flag.0 && flag.0 != 0
    }

    /// Pure accept/skip decision for one confirmation type.
    pub fn accepts(self, kind: ConfirmationType) -> bool {
        match kind {
            ConfirmationType::Trade => self.contains(Self::TRADES),
            ConfirmationType::MarketSell => self.contains(Self::MARKET),
            ConfirmationType::Unknown => self.contains(Self::OTHERS),
        }
    }
}

impl BitOr for AcceptPolicy {
    type Output = AcceptPolicy;

    fn bitor(self, rhs: AcceptPolicy) -> AcceptPolicy {
        AcceptPolicy(self.0 | rhs.0)
    }
}

impl fmt::Display for AcceptPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.contains(Self::TRADES) {
            names.push("trades");
        }
        if self.contains(Self::MARKET) {
            names.push("market");
        }
        if self.contains(Self::OTHERS) {
            names.push("others");
        }
        if names.is_empty() {
            names.push("nothing");
        }
        write!(f, "{}", names.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KINDS: [ConfirmationType; 3] = [
        ConfirmationType::Trade,
        ConfirmationType::MarketSell,
        ConfirmationType::Unknown,
    ];

    fn flag_for(kind: ConfirmationType) -> AcceptPolicy {
        match kind {
            ConfirmationType::Trade => AcceptPolicy::TRADES,
            ConfirmationType::MarketSell => AcceptPolicy::MARKET,
            ConfirmationType::Unknown => AcceptPolicy::OTHERS,
        }
    }

    #[test]
    fn accepts_iff_matching_flag_is_set() {
        // every policy subset against every confirmation type
        for mask in 0..8u8 {
            let mut policy = AcceptPolicy::NONE;
            if mask & 1 != 0 {
                policy = policy | AcceptPolicy::TRADES;
            }
            if mask & 2 != 0 {
                policy = policy | AcceptPolicy::MARKET;
            }
            if mask & 4 != 0 {
                policy = policy | AcceptPolicy::OTHERS;
            }
            for kind in KINDS {
                assert_eq!(
                    policy.accepts(kind),
                    policy.contains(flag_for(kind)),
                    "policy {policy:?} kind {kind:?}"
                );
            }
        }
    }

    #[test]
    fn decision_is_deterministic() {
        let policy = AcceptPolicy::TRADES | AcceptPolicy::OTHERS;
        for kind in KINDS {
            assert_eq!(policy.accepts(kind), policy.accepts(kind));
        }
    }

    #[test]
    fn full_policy_accepts_every_type() {
        for kind in KINDS {
            assert!(AcceptPolicy::ALL.accepts(kind));
        }
    }

    #[test]
    fn empty_policy_accepts_nothing() {
        for kind in KINDS {
            assert!(!AcceptPolicy::NONE.accepts(kind));
        }
        assert!(AcceptPolicy::NONE.is_empty());
        assert!(!AcceptPolicy::ALL.is_empty());
    }

    #[test]
    fn display_lists_active_flags() {
        assert_eq!(AcceptPolicy::ALL.to_string(), "trades market others");
        assert_eq!(
            (AcceptPolicy::MARKET | AcceptPolicy::OTHERS).to_string(),
            "market others"
        );
        assert_eq!(AcceptPolicy::NONE.to_string(), "nothing");
    }
}
