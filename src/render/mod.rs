pub mod minimap;
pub mod page;
pub mod split_row;
