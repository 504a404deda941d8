//! Base suppliers that sit at the bottom of a chain

use super::error::SupplierResult;
use super::member::Member;
use super::traits::MemberSupplier;
use crate::adapter::{Adapter, Content, Graphs};
use std::sync::Arc;
use tracing::trace;

/// Supplies members from any iterator.
pub struct IterMemberSupplier {
    members: Box<dyn Iterator<Item = Member> + Send>,
}

impl IterMemberSupplier {
    pub fn new<I>(members: I) -> Self
    where
        I: IntoIterator<Item = Member>,
        I::IntoIter: Send + 'static,
    {
        Self {
            members: Box::new(members.into_iter()),
        }
    }
}

impl MemberSupplier for IterMemberSupplier {
    fn next_member(&mut self) -> SupplierResult<Option<Member>> {
        Ok(self.members.next())
    }
}

/// Pulls contents one at a time, adapts them and yields a member per graph.
///
/// A content is only adapted once every graph of the previous one has been
/// handed out.
pub struct AdaptedMemberSupplier {
    adapter: Arc<dyn Adapter>,
    contents: Box<dyn Iterator<Item = Content> + Send>,
    current: Option<Graphs>,
}

impl AdaptedMemberSupplier {
    pub fn new<I>(adapter: Arc<dyn Adapter>, contents: I) -> Self
    where
        I: IntoIterator<Item = Content>,
        I::IntoIter: Send + 'static,
    {
        Self {
            adapter,
            contents: Box::new(contents.into_iter()),
            current: None,
        }
    }
}

impl MemberSupplier for AdaptedMemberSupplier {
    fn next_member(&mut self) -> SupplierResult<Option<Member>> {
        loop {
            if let Some(graphs) = self.current.as_mut() {
                match graphs.next() {
                    Some(graph) => {
                        let member = Member::from_graph(graph?);
                        trace!(member = member.id(), "adapted member");
                        return Ok(Some(member));
                    }
                    None => self.current = None,
                }
            }
            match self.contents.next() {
                Some(content) => self.current = Some(self.adapter.apply(&content)?),
                None => return Ok(None),
            }
        }
    }
}
