// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

mod measurementbackend;
mod dummybackend;

pub use measurementbackend::{
    BackendError, BackendPointer, CollectionRef, ErrorCallback, LiveRef, MeasurementBackend,
    Subscription, ValueCallback,
};

pub use dummybackend::DummyBackend;

#[cfg(feature = "firebase")]
mod firebase;

#[cfg(feature = "firebase")]
pub use firebase::FirebaseClient;
