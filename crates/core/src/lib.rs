pub mod pipeline;
pub mod recognition;
pub mod session;
pub mod shared;
pub mod video;

#[cfg(test)]
mod test_support;
