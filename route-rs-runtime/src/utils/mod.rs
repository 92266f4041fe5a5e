pub mod maintenance;
pub use self::maintenance::run_maintenance;
