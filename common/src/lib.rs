// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

pub mod backend;
pub mod config;
pub mod dashboard;

pub use smart_city_model as model;
