pub mod cases;
pub mod decision;
pub mod fusion;
pub mod gate;
pub mod hit;
pub mod lexical;
pub mod objection;
pub mod query;
pub mod rules;
