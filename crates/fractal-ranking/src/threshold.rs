//! Absolute-majority vote threshold.
//!
//! A round resolves outright when one candidate holds at least half of
//! the *total* membership's votes, rounded up:
//!
//! - 2 members → 1 vote
//! - 3 members → 2 votes
//! - 6 members → 3 votes
//!
//! The count is always taken against full membership, never the shrinking
//! candidate pool, so eliminated members still weigh into the bar.

/// Smallest vote count that wins a round outright for a group of
/// `member_count` members.
///
/// Formula: `floor(n/2) + n mod 2` (i.e. `ceil(n/2)`), clamped to a
/// minimum of 1 so a round can always resolve.
///
/// # Examples
///
/// ```
/// use fractal_ranking::vote_threshold;
///
/// assert_eq!(vote_threshold(2), 1);
/// assert_eq!(vote_threshold(3), 2);
/// assert_eq!(vote_threshold(4), 2);
/// assert_eq!(vote_threshold(6), 3);
/// ```
pub const fn vote_threshold(member_count: usize) -> usize {
    let needed = member_count / 2 + member_count % 2;
    if needed == 0 {
        1
    } else {
        needed
    }
}

/// Check whether a vote count meets the winning threshold.
pub const fn meets_threshold(votes: usize, member_count: usize) -> bool {
    votes >= vote_threshold(member_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_matches_ceiling_division() {
        let test_cases = [
            (1, 1),
            (2, 1),
            (3, 2),
            (4, 2),
            (5, 3),
            (6, 3),
            (7, 4),
            (10, 5),
            (11, 6),
        ];

        for (members, expected) in test_cases {
            assert_eq!(
                vote_threshold(members),
                expected,
                "vote_threshold({}) should be {}",
                members,
                expected
            );
        }
    }

    #[test]
    fn threshold_floor_is_one() {
        // Degenerate counts still produce a resolvable round.
        assert_eq!(vote_threshold(0), 1);
        assert_eq!(vote_threshold(1), 1);
    }

    #[test]
    fn threshold_never_exceeds_membership() {
        for n in 1..=64 {
            assert!(
                vote_threshold(n) <= n,
                "vote_threshold({}) = {} exceeds membership",
                n,
                vote_threshold(n)
            );
        }
    }

    #[test]
    fn threshold_monotonic() {
        // Adding members never lowers the bar.
        let mut prev = 0;
        for n in 1..=64 {
            let t = vote_threshold(n);
            assert!(t >= prev, "threshold should be monotonic");
            prev = t;
        }
    }

    #[test]
    fn meets_threshold_checks() {
        assert!(meets_threshold(1, 2));
        assert!(!meets_threshold(1, 3));
        assert!(meets_threshold(2, 4));
        assert!(meets_threshold(3, 4));
        assert!(!meets_threshold(2, 6));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn formula_holds(n in 1usize..10_000) {
                prop_assert_eq!(vote_threshold(n), n / 2 + n % 2);
            }

            #[test]
            fn at_least_one_and_a_strict_majority_always_wins(n in 1usize..10_000) {
                let t = vote_threshold(n);
                prop_assert!(t >= 1);
                // Two candidates cannot both reach the threshold with one
                // vote per member unless they tie exactly at n/2.
                prop_assert!(2 * t >= n);
            }
        }
    }
}
