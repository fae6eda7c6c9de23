pub mod push;
pub mod task;
