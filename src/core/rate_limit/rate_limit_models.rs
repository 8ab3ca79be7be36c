// Rate limit domain models - buckets, their policies and admission results.

use std::time::{Duration, Instant};

/// A named rate-limit policy. Each client has an independent counter per bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateBucket {
    CommentSubmission,
    ContentGeneration,
    AdminLogin,
    General,
}

/// Limits attached to a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketPolicy {
    pub window: Duration,
    pub max_hits: u32,
    /// Successful requests give their admission back.
    pub skip_successful: bool,
    pub message: &'static str,
}

impl RateBucket {
    #[cfg(test)]
    pub const ALL: [RateBucket; 4] = [
        RateBucket::CommentSubmission,
        RateBucket::ContentGeneration,
        RateBucket::AdminLogin,
        RateBucket::General,
    ];

    pub fn policy(self) -> BucketPolicy {
        const HOUR: Duration = Duration::from_secs(60 * 60);
        const QUARTER_HOUR: Duration = Duration::from_secs(15 * 60);

        match self {
            RateBucket::CommentSubmission => BucketPolicy {
                window: HOUR,
                max_hits: 20,
                skip_successful: false,
                message: "Too many comments submitted, please try again later.",
            },
            RateBucket::ContentGeneration => BucketPolicy {
                window: HOUR,
                max_hits: 10,
                skip_successful: false,
                message: "Too many AI content generation requests, please try again later.",
            },
            RateBucket::AdminLogin => BucketPolicy {
                window: QUARTER_HOUR,
                max_hits: 5,
                skip_successful: true,
                message: "Too many login attempts, please try again later.",
            },
            RateBucket::General => BucketPolicy {
                window: QUARTER_HOUR,
                max_hits: 100,
                skip_successful: false,
                message: "Too many requests, please try again later.",
            },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RateBucket::CommentSubmission => "comment-submission",
            RateBucket::ContentGeneration => "content-generation",
            RateBucket::AdminLogin => "admin-login",
            RateBucket::General => "general",
        }
    }
}

impl std::fmt::Display for RateBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Counter state after recording a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowHit {
    /// Hits recorded in the current window, this one included.
    pub hits: u32,
    pub resets_at: Instant,
}

/// Result of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed {
        /// Admissions left in the current window
        remaining: u32,
        /// Time until the current window closes
        reset_after: Duration,
    },
    Throttled {
        retry_after: Duration,
    },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed { .. })
    }

    pub fn remaining(&self) -> u32 {
        match self {
            Admission::Allowed { remaining, .. } => *remaining,
            Admission::Throttled { .. } => 0,
        }
    }

    /// Time until the client gets a fresh budget.
    pub fn reset_after(&self) -> Duration {
        match self {
            Admission::Allowed { reset_after, .. } => *reset_after,
            Admission::Throttled { retry_after } => *retry_after,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_limits() {
        let limits: Vec<(u64, u32)> = RateBucket::ALL
            .iter()
            .map(|b| (b.policy().window.as_secs(), b.policy().max_hits))
            .collect();
        assert_eq!(limits, vec![(3600, 20), (3600, 10), (900, 5), (900, 100)]);
    }

    #[test]
    fn test_only_login_skips_successful() {
        for bucket in RateBucket::ALL {
            assert_eq!(
                bucket.policy().skip_successful,
                bucket == RateBucket::AdminLogin
            );
        }
    }
}
