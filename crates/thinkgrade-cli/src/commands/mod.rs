pub mod evaluate;
pub mod exercises;
pub mod init;
pub mod progress;
pub mod prompt;
pub mod serve;
pub mod session;
