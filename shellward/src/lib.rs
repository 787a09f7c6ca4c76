//! # Shellward
//!
//! Async privilege-aware automation of interactive Linux shells over SSH.
//!
//! Shellward drives a remote shell the way an operator would: it discovers
//! the prompt, becomes root with `sudo` (answering the password prompt),
//! drops back to the login user, and verifies copied files by free space,
//! size and checksum.
//!
//! ## Features
//!
//! - Async SSH connections via russh
//! - Prompt discovery with configurable terminators (`$`, `#`)
//! - Two-state privilege tracking derived from the prompt
//! - Single-attempt elevation with typed failures
//! - File transfer verification (`df`, `ls`, `md5sum`)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shellward::{SessionBuilder, ShellSession};
//! use shellward::platform::{ElevateOptions, PromptOptions};
//! use shellward::transfer::{FileTransferDescriptor, FileTransferSession, TransferDirection};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), shellward::Error> {
//!     let mut session = SessionBuilder::new("192.168.1.10")
//!         .username("admin")
//!         .password("secret")
//!         .secret("secret")
//!         .connect()
//!         .await?;
//!
//!     session.prepare().await?;
//!     session.refresh_base_prompt(&PromptOptions::default()).await?;
//!     session.elevate(&ElevateOptions::default()).await?;
//!
//!     let descriptor = FileTransferDescriptor::new("fw.img", "fw.img", TransferDirection::Put);
//!     let mut transfer = FileTransferSession::new(session.channel_mut(), descriptor);
//!     println!("{}", transfer.remote_checksum("md5sum", None).await?);
//!
//!     session.cleanup("exit").await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod driver;
pub mod error;
pub mod platform;
pub mod transfer;
pub mod transport;

pub use channel::SessionChannel;
pub use driver::{LinuxSession, SessionBuilder, ShellSession};
pub use error::Error;
pub use platform::{PrivilegeLevel, PromptTerminators};
pub use transport::{AuthMethod, SshConfig};
