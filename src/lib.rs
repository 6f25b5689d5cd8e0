//! hpfs
//!
//! HPFS 灌溉控制器认领工具：命令行与启动装配。

pub mod bootstrap;
pub mod cli;
