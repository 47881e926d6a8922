pub mod courses;
pub mod departments;
