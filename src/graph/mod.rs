pub mod error;
pub mod layout;
pub mod model;
pub mod tree;
