pub mod decoders;
pub mod gmail;
pub mod parser;
pub mod source;
