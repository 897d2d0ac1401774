// Analysis history: which store feeds the listing, lookups, and deletion across
// both stores.

pub mod handlers;
pub mod reconcile;
