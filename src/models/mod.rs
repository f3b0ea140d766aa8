pub mod dose_event;
pub mod enums;
pub mod medication;
pub mod renewal;

pub use dose_event::*;
pub use medication::*;
pub use renewal::*;
