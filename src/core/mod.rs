//! Engine-facing plumbing shared by the activity and the trigger.

pub mod context;
pub mod metadata;
