pub mod model_loader;
pub mod sampler;
pub mod viewer;

use crate::node::{PinDefinition, PinType};

pub const CATEGORY: &str = "Image to Mesh";

/// Filename prefix for everything the nodes write.
pub const OUTPUT_PREFIX: &str = "meshsave";

pub fn pin(name: &'static str, pin_type: PinType) -> PinDefinition {
    PinDefinition {
        name,
        pin_type,
        optional: false,
    }
}

pub fn optional_pin(name: &'static str, pin_type: PinType) -> PinDefinition {
    PinDefinition {
        name,
        pin_type,
        optional: true,
    }
}

/// Integer param as a positive size.
pub(crate) fn positive_param(value: i32, key: &str) -> Result<u32, String> {
    u32::try_from(value)
        .ok()
        .filter(|value| *value > 0)
        .ok_or_else(|| format!("{key} must be positive, got {value}"))
}
