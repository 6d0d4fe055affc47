pub mod renderer;
pub mod selection;
