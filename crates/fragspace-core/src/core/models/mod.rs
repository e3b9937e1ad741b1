pub mod hit;
pub mod ids;
pub mod node;
pub mod synthon;
pub mod tree;
