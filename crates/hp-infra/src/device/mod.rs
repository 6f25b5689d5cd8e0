mod cache;

pub use cache::FileDeviceCache;
