// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod driver;
pub mod error;
pub mod geometry;
pub mod ids;
pub mod model;
pub mod state;

pub use driver::*;
pub use error::*;
pub use geometry::*;
pub use ids::*;
pub use model::*;
pub use state::*;
