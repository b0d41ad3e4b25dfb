// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer
//!
//! - [`library`]: photo library listing and decoding
//! - [`camera`]: camera session control and capture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               Picker Layer                  │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                  │
//! │  ┌──────────────────┐  ┌──────────────────┐ │
//! │  │     Library      │  │      Camera      │ │
//! │  │ (dir / memory)   │  │    (virtual)     │ │
//! │  └──────────────────┘  └──────────────────┘ │
//! └─────────────────────────────────────────────┘
//! ```

pub mod camera;
pub mod library;
