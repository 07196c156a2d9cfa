pub mod check;
pub mod publish;
pub mod sync;
