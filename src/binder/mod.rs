//! @acp:module "Binders"
//! @acp:summary "Direct (argv) and interactive (prompt) parameter binding"
//! @acp:domain cli
//! @acp:layer service

pub mod cache;
pub mod direct;
pub mod interactive;
pub mod resolve;

pub use cache::ChoiceCache;
pub use direct::{DirectBinder, DirectParse, INTERACTIVE_FLAG};
pub use interactive::{InteractiveBinder, Selection, WizardStep, SELECT_COMMAND};
pub use resolve::{resolve_param, ResolvedData};
