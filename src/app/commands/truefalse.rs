use crate::core::{Context, Result};
use std::ffi::OsString;

pub const TRUE_NAME: &str = "true";
pub const TRUE_ABOUT: &str = "Do nothing, successfully";
pub const FALSE_NAME: &str = "false";
pub const FALSE_ABOUT: &str = "Do nothing, unsuccessfully";

pub fn run_true(_ctx: &mut Context<'_>, _args: Vec<OsString>) -> Result<i32> {
    Ok(0)
}

pub fn run_false(_ctx: &mut Context<'_>, _args: Vec<OsString>) -> Result<i32> {
    Ok(1)
}
