pub mod google;
pub mod local;
pub mod memory;
pub mod store;

pub use google::GoogleDrive;
pub use local::LocalFolder;
pub use memory::MemoryDrive;
pub use store::{DriveStore, RemoteFile, LIST_PAGE_SIZE};
