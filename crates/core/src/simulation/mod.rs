//! Running fires on a landscape
//!
//! - [`run`] steps a landscape until nothing burns or the run is cancelled
//! - [`Simulation`] keeps the initial snapshot for restarts
//! - [`SweepPlan`] runs every combination of environment values and feeds a
//!   [`ResultSink`]
//! - [`StepObserver`] implementations watch a run frame by frame

pub mod cancel;
pub mod observer;
pub mod results;
pub mod run;
pub mod sweep;

pub use cancel::CancellationToken;
pub use observer::{ChannelObserver, Frame, NullObserver, StepObserver};
pub use results::{
    count_completed_rows, CsvResultSink, MemorySink, ResultSink, RunRecord, RESULT_COLUMNS,
};
pub use run::{run, RunMetrics, RunOutcome, Simulation};
pub use sweep::{
    run_sweep, LandscapeSource, Sweep, SweepPlan, SweepRecord, SweepSummary, DEFAULT_SWEEP_VALUES,
};
