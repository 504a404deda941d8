//! Rate control

use super::error::SupplierResult;
use super::member::Member;
use super::traits::{MemberSupplier, SupplierDecorator};
use crate::error::ConfigError;
use std::time::{Duration, Instant};

/// Spaces members at least `1 / members_per_second` apart.
///
/// Only applies to a positive, finite rate whose interval fits a [`Duration`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Throttle {
    pub members_per_second: Option<f64>,
}

impl Throttle {
    pub fn new(members_per_second: Option<f64>) -> Self {
        Self { members_per_second }
    }

    fn interval(&self) -> Option<Duration> {
        self.members_per_second
            .filter(|rate| rate.is_finite() && *rate > 0.0)
            .and_then(|rate| Duration::try_from_secs_f64(1.0 / rate).ok())
    }

    /// Reject a positive rate so small that its interval cannot be represented.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.members_per_second {
            Some(rate) if rate.is_finite() && rate > 0.0 && self.interval().is_none() => Err(
                ConfigError::Invalid(format!("members_per_second {} is too small", rate)),
            ),
            _ => Ok(()),
        }
    }
}

impl SupplierDecorator for Throttle {
    fn name(&self) -> &str {
        "throttle"
    }

    fn applies(&self) -> bool {
        self.interval().is_some()
    }

    fn wrap(&self, inner: Box<dyn MemberSupplier>) -> Box<dyn MemberSupplier> {
        Box::new(ThrottledSupplier {
            inner,
            interval: self.interval().unwrap_or_default(),
            last: None,
        })
    }
}

struct ThrottledSupplier {
    inner: Box<dyn MemberSupplier>,
    interval: Duration,
    last: Option<Instant>,
}

impl MemberSupplier for ThrottledSupplier {
    fn next_member(&mut self) -> SupplierResult<Option<Member>> {
        let member = self.inner.next_member()?;
        if member.is_some() {
            if let Some(last) = self.last {
                let elapsed = last.elapsed();
                if elapsed < self.interval {
                    std::thread::sleep(self.interval - elapsed);
                }
            }
            self.last = Some(Instant::now());
        }
        Ok(member)
    }
}
