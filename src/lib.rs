pub mod asm;
pub mod tape;
pub mod vm;
pub mod console;
