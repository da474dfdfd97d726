//! Measure error codes following a structured numbering system
//!
//! Error code ranges:
//! - MSR0001-MSR0099: Definition errors (malformed measure description)
//! - MSR0100-MSR0199: Basis mismatch errors (result types vs population basis)
//! - MSR0200-MSR0299: Population legality errors (scoring type vs populations)
//! - MSR0300-MSR0399: Aggregation basis errors (measure observations)
//! - MSR0400-MSR0499: Unsupported feature errors
//! - MSR0500-MSR0599: System errors (input documents, I/O, configuration)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric code
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    /// Check if this is a definition error (0001-0099)
    pub const fn is_definition_error(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    /// Check if this is a basis mismatch error (0100-0199)
    pub const fn is_basis_error(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    /// Check if this is a population legality error (0200-0299)
    pub const fn is_legality_error(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Check if this is an aggregation basis error (0300-0399)
    pub const fn is_aggregation_error(&self) -> bool {
        self.0 >= 300 && self.0 < 400
    }

    /// Check if this is an unsupported feature error (0400-0499)
    pub const fn is_unsupported_error(&self) -> bool {
        self.0 >= 400 && self.0 < 500
    }

    /// Check if this is a system error (0500-0599)
    pub const fn is_system_error(&self) -> bool {
        self.0 >= 500 && self.0 < 600
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MSR{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Definition errors (0001-0099)
    map.insert(1, ErrorInfo::new("Missing measure scoring")
        .with_help("Declare scoring on the measure or on every group"));
    map.insert(2, ErrorInfo::new("Invalid measure scoring code"));
    map.insert(3, ErrorInfo::new("Invalid population basis code"));
    map.insert(4, ErrorInfo::new("Invalid measure population code"));
    map.insert(5, ErrorInfo::new("Invalid aggregate method code"));
    map.insert(6, ErrorInfo::new("Invalid improvement notation coding"));
    map.insert(7, ErrorInfo::new("Missing element id"));
    map.insert(8, ErrorInfo::new("Supplemental data usage missing")
        .with_help("Add the 'supplemental-data' code to the usage element"));
    map.insert(9, ErrorInfo::new("Missing criteria expression"));
    map.insert(10, ErrorInfo::new("Invalid stratifier definition"));

    // Basis mismatch errors (0100-0199)
    map.insert(100, ErrorInfo::new("Population result type does not match population basis"));
    map.insert(101, ErrorInfo::new("Stratifier value type is not a comparable stratum value"));
    map.insert(102, ErrorInfo::new("Stratifier criteria result type does not match population basis"));

    // Population legality errors (0200-0299)
    map.insert(200, ErrorInfo::new("Population not allowed for scoring type"));
    map.insert(201, ErrorInfo::new("Required population missing for scoring type"));

    // Aggregation basis errors (0300-0399)
    map.insert(300, ErrorInfo::new("Observation result shape does not match population basis"));
    map.insert(301, ErrorInfo::new("Observation value is not numeric")
        .with_help("Measure observation functions must return String, Integer or Decimal"));
    map.insert(302, ErrorInfo::new("Missing aggregate method"));
    map.insert(303, ErrorInfo::new("Invalid measure observation count"));
    map.insert(304, ErrorInfo::new("Invalid criteria reference"));
    map.insert(305, ErrorInfo::new("Observation aggregate out of decimal range"));

    // Unsupported feature errors (0400-0499)
    map.insert(400, ErrorInfo::new("Multi-component stratifier not supported"));

    // System errors (0500-0599)
    map.insert(500, ErrorInfo::new("Invalid input document"));
    map.insert(501, ErrorInfo::new("I/O error"));
    map.insert(502, ErrorInfo::new("Invalid configuration"));

    map
});

// Definition errors
pub const MSR0001: ErrorCode = ErrorCode::new(1);
pub const MSR0002: ErrorCode = ErrorCode::new(2);
pub const MSR0003: ErrorCode = ErrorCode::new(3);
pub const MSR0004: ErrorCode = ErrorCode::new(4);
pub const MSR0005: ErrorCode = ErrorCode::new(5);
pub const MSR0006: ErrorCode = ErrorCode::new(6);
pub const MSR0007: ErrorCode = ErrorCode::new(7);
pub const MSR0008: ErrorCode = ErrorCode::new(8);
pub const MSR0009: ErrorCode = ErrorCode::new(9);
pub const MSR0010: ErrorCode = ErrorCode::new(10);

// Basis mismatch errors
pub const MSR0100: ErrorCode = ErrorCode::new(100);
pub const MSR0101: ErrorCode = ErrorCode::new(101);
pub const MSR0102: ErrorCode = ErrorCode::new(102);

// Population legality errors
pub const MSR0200: ErrorCode = ErrorCode::new(200);
pub const MSR0201: ErrorCode = ErrorCode::new(201);

// Aggregation basis errors
pub const MSR0300: ErrorCode = ErrorCode::new(300);
pub const MSR0301: ErrorCode = ErrorCode::new(301);
pub const MSR0302: ErrorCode = ErrorCode::new(302);
pub const MSR0303: ErrorCode = ErrorCode::new(303);
pub const MSR0304: ErrorCode = ErrorCode::new(304);
pub const MSR0305: ErrorCode = ErrorCode::new(305);

// Unsupported feature errors
pub const MSR0400: ErrorCode = ErrorCode::new(400);

// System errors
pub const MSR0500: ErrorCode = ErrorCode::new(500);
pub const MSR0501: ErrorCode = ErrorCode::new(501);
pub const MSR0502: ErrorCode = ErrorCode::new(502);
