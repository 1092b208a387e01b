pub mod state;

pub use state::{JournalSnapshot, RunId, RunJournal, RunProgress, RunState};
