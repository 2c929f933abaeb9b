pub mod lap;
pub mod macros;
pub mod participant;
pub mod race;

pub use lap::LapTime;
pub use participant::{Participant, BRANCH_SUFFIX};
pub use race::{Race, ALL};
