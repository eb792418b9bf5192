//! Built-in intake steps collecting birth data for a natal chart:
//! date, time, and place.

mod birth_date;
mod birth_place;
mod birth_time;

pub use birth_date::BirthDateStep;
pub use birth_place::BirthPlaceStep;
pub use birth_time::BirthTimeStep;
