//! NinePatchFE: nine-patch guide editor and `.9.png` compiler.
//!
//! The pure core (`geometry`, `transform`, `drag`, `codec`, `ops`) has no UI
//! dependency; `canvas`, `components` and `app` are the egui shell over it and
//! `cli` is the headless front end.

pub mod logger;

pub mod app;
pub mod canvas;
pub mod cli;
pub mod codec;
pub mod components;
pub mod drag;
pub mod geometry;
pub mod io;
pub mod ops;
pub mod session;
pub mod settings;
pub mod transform;
