//! @acp:module "Command Model"
//! @acp:summary "Declarative command tree: nodes, parameters and choice sets"
//! @acp:domain cli
//! @acp:layer model
//!
//! The tree declared here is the single source both binders consume:
//!
//! - [`CommandNode`]: name, description, ordered parameters, children, action
//! - [`Param`]: an argument or option with defaults and choices
//! - [`Choice`]: a normalized key/value/label triple

pub mod choice;
pub mod node;
pub mod param;

pub use choice::{normalize, Choice, ChoiceEntry, ChoiceFn, ChoiceSource};
pub use node::{Action, CommandBuilder, CommandNode};
pub use param::{Param, ParamKind};

pub(crate) use node::{validate_choice_set, validate_sibling_names};
