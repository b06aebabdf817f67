//! Request head framing, one line at a time; see [`LineDecoder`].

mod line_decoder;

pub use line_decoder::LineDecoder;
