pub mod dist;
pub mod driver;
pub mod sink;
pub mod source;

pub use dist::Dist;
pub use driver::Sim;
pub use sink::Sink;
pub use source::Source;
