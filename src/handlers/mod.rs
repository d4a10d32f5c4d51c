pub mod extract;
pub mod protected;
pub mod public;
pub mod validation;
