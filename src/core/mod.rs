/// Core functionality modules
///
/// The command use record and the pieces around it: marks, the in-memory
/// history, and the record/restore paths.

pub mod command_use;
pub mod history;
pub mod mark;
pub mod recorder;
pub mod restorer;

pub use command_use::{CommandUse, MarkState};
pub use history::{CommandHistory, CommandHistoryEntry, ResolveSummary};
pub use mark::{MarkLookup, MarkRegistry, ScreenMark};
pub use recorder::Recorder;
pub use restorer::{RestoreReport, Restorer};
