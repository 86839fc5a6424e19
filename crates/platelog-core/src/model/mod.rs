//! Log entry data model.

pub mod event;
pub mod rating;

pub use event::{DATE_FORMAT, DedupKey, Event, EventId};
pub use rating::{Rating, RatingError};
