pub mod course;
pub mod favorite;
pub mod filters;
