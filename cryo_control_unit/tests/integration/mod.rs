mod common;
mod config_loading;
mod cooldown_sequence;
mod fault_handling;
mod warm_restart;
