//! Feature use cases composed over [`EntityTable`](studyhub_core::repository::EntityTable).
//!
//! Each service fetches rows, applies the pure aggregate or decision from
//! `studyhub_core::feature`, and writes back. Errors go straight to the caller.

mod attendance;
mod board;
mod finance;
mod poll;

pub use attendance::AttendanceService;
pub use board::BoardService;
pub use finance::FinanceService;
pub use poll::{PollService, VoteOutcome};
