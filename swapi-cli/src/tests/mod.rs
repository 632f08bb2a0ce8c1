//! Shared test harness modules for the loader CLI.

use super::*;

mod steps;
mod unit;
