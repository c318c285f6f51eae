//! Rule evaluation
//!
//! Rules are declarative automations owned by a user: a set of conditions
//! combined with one shared logic (AND/OR) and an ordered list of actions.
//!
//! - `engine` - the pure [`RuleEngine`] that turns one transaction into an
//!   optional [`Changeset`]
//! - `changeset` - the staged mutation value handed to the executor
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sift_core::rules::RuleEngine;
//!
//! let engine = RuleEngine::new(categories, accounts, rules);
//! if let Some(changeset) = engine.process_transaction(&tx) {
//!     println!("{:?}", changeset.staged_kinds());
//! }
//! ```

pub mod changeset;
pub mod engine;

pub use changeset::{Changeset, FieldKind, TransferInfo};
pub use engine::RuleEngine;
