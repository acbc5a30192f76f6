pub mod appointment;
pub mod dates;
pub mod enums;
pub mod patient;
pub mod professional;
pub mod tag;

pub use appointment::*;
pub use enums::*;
pub use patient::*;
pub use professional::*;
pub use tag::*;

/// Fresh client-side identifier for a new record.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
