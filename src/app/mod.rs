// Application layer: one module per utility.

pub mod commands;
