pub mod images;
pub mod predict;
pub mod upload;
