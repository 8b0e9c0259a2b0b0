mod pool;
pub mod kv;

pub use pool::create_pool;
#[cfg(test)]
pub use pool::memory_pool;
