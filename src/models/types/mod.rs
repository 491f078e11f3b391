mod local_datetime;
mod name;

pub use local_datetime::LocalDateTime;
pub use name::{Division, PlayerName};
