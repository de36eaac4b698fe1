//! Memory-pool rows of the Squid cache manager `mem` report.
//!
//! Only the per-worker rows matter here. They start with a `kid` token and
//! carry at least three whitespace-separated fields:
//!
//! ```text
//! kid1 aufs_queue 4096
//! ```
//!
//! Everything else in the report (headers, totals, free text) is ignored.

use crate::domain::errors::RecordError;

/// Path of the memory report on the cache manager interface
pub const MEM_REPORT_PATH: &str = "/squid-internal-mgr/mem";

/// Prefix identifying per-worker rows
pub const KID_MARKER: &str = "kid";

/// Divisor turning the object size into the chunk figure
pub const CHUNK_SCALE: f64 = 1024.0;

/// One parsed `kid` row
#[derive(Debug, Clone, PartialEq)]
pub struct MemPoolRecord {
    pub k_id: String,
    pub pool: String,
    pub obj_size: f64,
}

impl MemPoolRecord {
    /// Whether the line belongs to the per-worker section
    pub fn is_relevant(line: &str) -> bool {
        line.trim_start().starts_with(KID_MARKER)
    }

    /// Parse a relevant line. Extra fields past the third are ignored.
    pub fn parse(line: &str) -> Result<Self, RecordError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            return Err(RecordError::TooFewFields {
                found: fields.len(),
            });
        }

        let obj_size = fields[2]
            .parse::<f64>()
            .map_err(|e| RecordError::InvalidValue {
                value: fields[2].to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            k_id: fields[0].to_string(),
            pool: fields[1].to_string(),
            obj_size,
        })
    }

    /// Chunk figure, always derived from the parsed object size
    pub fn chunk_kb(&self) -> f64 {
        self.obj_size / CHUNK_SCALE
    }
}
