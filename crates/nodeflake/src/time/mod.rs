mod interface;
mod manual;
mod mono_clock;
mod system;

pub use interface::*;
pub use manual::*;
pub use mono_clock::*;
pub use system::*;
