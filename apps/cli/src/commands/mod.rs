pub mod dispatch;
pub mod init;
