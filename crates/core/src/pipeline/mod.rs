pub mod frame_source;
pub mod infrastructure;
pub mod session;
