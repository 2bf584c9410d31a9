pub mod client;
pub mod constants;
pub mod display;
pub mod polling;
pub mod restore_workflow;
pub mod ui;

#[cfg(test)]
pub mod testing;
