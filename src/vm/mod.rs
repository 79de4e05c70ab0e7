pub mod machine;

pub use machine::{Machine, MachineError};
