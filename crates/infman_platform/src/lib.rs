pub mod audio;
pub mod window;
