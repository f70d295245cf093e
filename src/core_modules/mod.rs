pub mod channel;
pub mod color_space;
pub mod detection;
pub mod face;
pub mod gesture;
pub mod grid_layout;
pub mod mapper;
pub mod pixel;
pub mod pixel_buffer;
pub mod source;
pub mod utils;
