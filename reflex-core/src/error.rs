use alloc::string::String;
use core::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseDeviceTypeError {
    pub value: String,
}

impl fmt::Display for ParseDeviceTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown device type: {:?} (expected mobile, desktop or tablet)",
            self.value
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseDeviceTypeError {}
