mod address;
mod payload;
mod session_phase;
mod settings;
mod shims;
