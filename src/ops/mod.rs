pub mod compositor;
pub mod export;
pub mod icon_tools;
