//! Utility modules

pub mod time;

/// Number of logical CPUs, for reporting achievable parallelism
pub fn num_cpus() -> usize {
    num_cpus::get()
}
