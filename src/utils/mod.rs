pub mod fs;
pub mod sort;
pub mod sparse;
