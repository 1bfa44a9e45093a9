pub mod bars;
pub mod terminal;
