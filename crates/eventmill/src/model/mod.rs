//! Event record model: closed vocabularies, the loose candidate phase,
//! recurrence rule canonicalization, and the validated record itself.

pub mod candidate;
pub mod enums;
pub mod error;
pub mod event;
pub mod rrule;

pub use candidate::Candidate;
pub use enums::{
    BookingType, EventType, LocationType, OccurrenceType, TargetAudience, TimeOfDay,
};
pub use error::ValidationError;
pub use event::Event;
