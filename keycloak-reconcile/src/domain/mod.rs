pub mod comparators;
pub mod entities;
pub mod errors;
