pub mod daemon;
pub mod generate;
pub mod get;
pub mod health;
pub mod init;
pub mod list;
pub mod nodes;
pub mod register;
pub mod retrieve;
pub mod upload;
pub mod version;

pub use daemon::Daemon;
pub use generate::Generate;
pub use get::Get;
pub use health::Health;
pub use init::Init;
pub use list::List;
pub use nodes::Nodes;
pub use register::Register;
pub use retrieve::Retrieve;
pub use upload::Upload;
pub use version::Version;
