pub mod audit;
pub mod eddy;
pub mod paradox;
pub mod report;
pub mod review;
pub mod synchronicity;
pub mod thread;

pub use audit::AuditEntry;
pub use eddy::{Eddy, EddyStatus};
pub use paradox::{ContradictionMark, ParadoxRecord, ParadoxSide};
pub use report::{BatchReport, RejectedRecord};
pub use review::{ReviewEntry, ReviewReason};
pub use synchronicity::SynchronicityRecord;
pub use thread::{Thread, ThreadStatus};
