pub mod realtime;

pub use realtime::*;
