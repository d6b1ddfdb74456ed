#![allow(dead_code)]

pub mod scripted;
pub mod static_server;
