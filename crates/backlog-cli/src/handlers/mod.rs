pub mod board;
pub mod sprint;
