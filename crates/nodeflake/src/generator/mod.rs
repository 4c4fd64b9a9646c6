mod builder;
mod sequence;
mod snowflake;
mod status;
#[cfg(test)]
mod tests;

pub use builder::*;
pub use sequence::*;
pub use snowflake::*;
pub use status::*;
