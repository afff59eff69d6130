//! # Attack Simulations
//!
//! | Module | Attack | Expected defence |
//! |--------|--------|------------------|
//! | `replay` | resubmitting a signed fragment, stale epochs | `ReplayAttack` with a distinct reason |
//! | `forgery` | swapped author keys, edited payloads | envelope verification fails |
//! | `escalation` | capabilities outside the scope table | `DENY` without consulting trust |

pub mod escalation;
pub mod forgery;
pub mod replay;
