mod directory;

pub use directory::DeviceDirectory;
