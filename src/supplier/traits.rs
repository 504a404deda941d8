//! Supplier and decorator contracts

use super::error::SupplierResult;
use super::member::Member;

/// A pull-based source of members.
pub trait MemberSupplier: Send {
    /// The next member, or `None` once the source is exhausted.
    fn next_member(&mut self) -> SupplierResult<Option<Member>>;
}

/// A cross-cutting behaviour that can wrap a supplier.
///
/// `applies` must depend only on the decorator's configuration so the
/// composed shape is fixed when the chain is built.
pub trait SupplierDecorator: Send + Sync {
    fn name(&self) -> &str;

    fn applies(&self) -> bool;

    fn wrap(&self, inner: Box<dyn MemberSupplier>) -> Box<dyn MemberSupplier>;
}

/// Wrap `base` if the decorator applies, otherwise hand it back untouched.
pub fn compose(
    decorator: &dyn SupplierDecorator,
    base: Box<dyn MemberSupplier>,
) -> Box<dyn MemberSupplier> {
    if decorator.applies() {
        decorator.wrap(base)
    } else {
        base
    }
}

impl<S: MemberSupplier + ?Sized> MemberSupplier for Box<S> {
    fn next_member(&mut self) -> SupplierResult<Option<Member>> {
        (**self).next_member()
    }
}
