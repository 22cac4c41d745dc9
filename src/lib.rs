#![doc(test(attr(deny(warnings))))]

//! Planner Core implements the recurring-obligation scheduler and forecast
//! engine behind a personal-finance tracker: recurrence rules with calendar
//! stepping, bounded occurrence enumeration, window projections, and the
//! state machine that turns due obligations into ledger entries exactly once.

pub mod engine;
pub mod errors;
pub mod forecast;
pub mod obligation;
pub mod persistence;
pub mod schedule;
pub mod sink;
pub mod store;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Planner Core tracing initialized.");
    });
}
