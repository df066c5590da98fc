//! Periodic feed ingestion.
//!
//! The [`Scheduler`] wakes on each [`Ticker`] tick, selects the least
//! recently fetched feeds and hands each one to the shared [`Ingestor`],
//! which marks, fetches, parses and stores it. A [`Shutdown`] signal reaches
//! every in-flight ingestor.

mod ingestor;
mod scheduler;
mod shutdown;

pub use ingestor::{IngestError, IngestReport, Ingestor};
pub use scheduler::{IntervalTicker, Scheduler, TickReport, Ticker};
pub use shutdown::{Shutdown, ShutdownTrigger};
