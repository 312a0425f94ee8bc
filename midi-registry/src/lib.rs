pub mod device;
pub mod patch;
pub mod registry;

// Re-export the main types for convenience
pub use device::Device;
pub use patch::Patch;
pub use registry::Registry;
