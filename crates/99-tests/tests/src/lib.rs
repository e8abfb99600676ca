//! Cross-crate test suite for the VM step scheduler.

#[cfg(all(test, not(target_arch = "wasm32")))]
mod native_e2e;

#[cfg(test)]
mod subscription_props;
