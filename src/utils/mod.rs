pub mod file_utils; // Atomic, lock-guarded file replacement
pub mod system_info;
