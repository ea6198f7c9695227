pub mod http;
pub mod net;
pub mod request;
pub mod runtime;
pub mod synth;
