// Re-export model modules
mod dimensions;
mod facts;
mod rates;

pub use dimensions::*;
pub use facts::*;
pub use rates::*;
