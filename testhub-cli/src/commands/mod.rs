pub mod clear;
pub mod diff;
pub mod generate;
pub mod rollback;
pub mod stale;
pub mod status;
pub mod sync;
pub mod template;
pub mod verify;
