//! Supplier decoration framework
//!
//! A base supplier yields members; decorators wrap it with cross-cutting
//! behaviour (deduplication, version filtering, rate control). Whether a
//! decorator wraps at all is decided once, from its configuration, when the
//! chain is built.

mod base;
mod chain;
mod error;
mod exactly_once;
mod latest_state;
mod member;
mod throttle;
mod traits;

pub use base::{AdaptedMemberSupplier, IterMemberSupplier};
pub use chain::SupplierChain;
pub use error::{SupplierError, SupplierResult};
pub use exactly_once::ExactlyOnceFilter;
pub use latest_state::LatestStateFilter;
pub use member::Member;
pub use throttle::Throttle;
pub use traits::{compose, MemberSupplier, SupplierDecorator};
