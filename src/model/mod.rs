pub mod enums;
pub mod profile;
pub mod rule;
