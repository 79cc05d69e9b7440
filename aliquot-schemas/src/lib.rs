pub mod file_formats;
pub mod instruction;
pub mod labware;
pub mod liquid;
pub mod protocol;
