pub mod demo;
pub mod quote;
pub mod simulate;
