//! Drop members whose identifier was already supplied

use super::error::SupplierResult;
use super::member::Member;
use super::traits::{MemberSupplier, SupplierDecorator};
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExactlyOnceFilter {
    pub enabled: bool,
}

impl ExactlyOnceFilter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl SupplierDecorator for ExactlyOnceFilter {
    fn name(&self) -> &str {
        "exactly-once"
    }

    fn applies(&self) -> bool {
        self.enabled
    }

    fn wrap(&self, inner: Box<dyn MemberSupplier>) -> Box<dyn MemberSupplier> {
        Box::new(ExactlyOnceSupplier {
            inner,
            seen: HashSet::new(),
        })
    }
}

struct ExactlyOnceSupplier {
    inner: Box<dyn MemberSupplier>,
    seen: HashSet<String>,
}

impl MemberSupplier for ExactlyOnceSupplier {
    fn next_member(&mut self) -> SupplierResult<Option<Member>> {
        while let Some(member) = self.inner.next_member()? {
            if self.seen.insert(member.id().to_string()) {
                return Ok(Some(member));
            }
            debug!(member = member.id(), "skipping already supplied member");
        }
        Ok(None)
    }
}
