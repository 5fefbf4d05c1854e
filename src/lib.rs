//! briefing-clock: a talking alarm clock served as a web page.
//!
//! When an alarm goes off it is read aloud together with a Covid-19
//! report and, if asked for, the latest news and weather. A notification
//! feed of the same three sources refreshes every few hours.

pub mod announcement;
pub mod briefing;
pub mod config;
pub mod error;
pub mod history;
pub mod scheduler;
pub mod service;
pub mod speech;
pub mod timefmt;
pub mod web;
