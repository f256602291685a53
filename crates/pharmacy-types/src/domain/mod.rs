pub mod medicine;
pub mod order;
pub mod summary;
pub mod validation;
