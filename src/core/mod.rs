//! Core Module
//!
//! Infraestrutura independente de hardware: logging e o scheduler
//! periódico que dirige a manutenção do cache.

pub mod logging;
pub mod tick;
