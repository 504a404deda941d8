//! Ordered decorator chains

use super::traits::{compose, MemberSupplier, SupplierDecorator};
use tracing::debug;

/// Decorators listed innermost (closest to the source) first.
#[derive(Default)]
pub struct SupplierChain {
    decorators: Vec<Box<dyn SupplierDecorator>>,
}

impl SupplierChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a decorator outside the ones already added.
    pub fn with(mut self, decorator: impl SupplierDecorator + 'static) -> Self {
        self.decorators.push(Box::new(decorator));
        self
    }

    pub fn push(&mut self, decorator: Box<dyn SupplierDecorator>) {
        self.decorators.push(decorator);
    }

    pub fn len(&self) -> usize {
        self.decorators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorators.is_empty()
    }

    /// Names of the decorators that will actually wrap, innermost first.
    pub fn applied(&self) -> Vec<&str> {
        self.decorators
            .iter()
            .filter(|d| d.applies())
            .map(|d| d.name())
            .collect()
    }

    pub fn build(&self, base: Box<dyn MemberSupplier>) -> Box<dyn MemberSupplier> {
        self.decorators.iter().fold(base, |supplier, decorator| {
            debug!(
                decorator = decorator.name(),
                applies = decorator.applies(),
                "composing supplier"
            );
            compose(decorator.as_ref(), supplier)
        })
    }
}
