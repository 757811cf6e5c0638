//! Application layer: the collaborator-facing facade and the repository
//! bundle it is built from.

pub mod facade;
pub mod unit_of_work;

pub use facade::{DEFAULT_SLOTS_PER_ALBUM, TouristFacade, VIEWPORT_SETTING_KEY};
pub use unit_of_work::AppUnitOfWork;
