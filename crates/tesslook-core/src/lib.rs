pub mod archive;
pub mod consts;
pub mod decode;
pub mod error;
pub mod frame;
pub mod io;
pub mod pipeline;
pub mod query;
pub mod render;
pub mod target;
