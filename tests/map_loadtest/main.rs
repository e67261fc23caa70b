//! End-to-end runs of the tool against an in-process cluster.

mod cli_test;
mod fill_test;
mod helpers;
mod size_test;
