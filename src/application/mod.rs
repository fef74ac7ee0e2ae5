pub mod dto;
pub mod locator;
pub mod ports;
pub mod services;

#[cfg(test)]
pub mod testing;
