pub mod guides;
pub mod preview;
