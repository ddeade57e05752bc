//! Cycle coordination and scheduling.

mod coordinator;
mod scheduler;

pub use coordinator::{
    CoordinatorConfig, CycleError, CycleOutcome, CycleReport, CycleState, RunCoordinator,
};
pub use scheduler::{ReportSink, ScheduleError, Scheduler, SymbolRun};
