pub mod config;
pub mod controller;
pub mod domain;
pub mod dto;
pub mod middleware;
pub mod repository;
pub mod service;
pub mod util;
