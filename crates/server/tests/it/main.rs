mod loaders;
mod reconcile;
mod sync_action;
pub mod utils;
