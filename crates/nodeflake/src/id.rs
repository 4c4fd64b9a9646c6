use core::{fmt, str::FromStr, time::Duration};

use crate::{
    error::{Error, Result},
    time::Granularity,
};

/// A 64-bit Snowflake ID.
///
/// - 42 bits timestamp (ticks since the clock's epoch)
/// - 8 bits node ID
/// - 14 bits iteration (sequence within one tick)
///
/// ```text
///  Bit Index:  63             22 21            14 13              0
///              +----------------+----------------+----------------+
///  Field:      | timestamp (42) |  node ID (8)   | iteration (14) |
///              +----------------+----------------+----------------+
///              |<----- MSB ---------- 64 bits --------- LSB ----->|
/// ```
///
/// Any `u64` is a structurally valid ID, so decoding is total: every value
/// maps back to some `(timestamp, node_id, iteration)` triple whether or not a
/// generator ever produced it. The ID is its own canonical string form: the
/// decimal rendering produced by [`fmt::Display`] parses back with
/// [`FromStr`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SnowflakeId {
    id: u64,
}

impl SnowflakeId {
    /// Bitmask for extracting the 42-bit timestamp field. Occupies bits 22
    /// through 63.
    pub const TIMESTAMP_MASK: u64 = (1 << 42) - 1;

    /// Bitmask for extracting the 8-bit node ID field. Occupies bits 14
    /// through 21.
    pub const NODE_ID_MASK: u64 = (1 << 8) - 1;

    /// Bitmask for extracting the 14-bit iteration field. Occupies bits 0
    /// through 13.
    pub const ITERATION_MASK: u64 = (1 << 14) - 1;

    /// Number of bits to shift the timestamp to its correct position (bit 22).
    pub const TIMESTAMP_SHIFT: u64 = 22;

    /// Number of bits to shift the node ID to its correct position (bit 14).
    pub const NODE_ID_SHIFT: u64 = 14;

    /// Largest timestamp that fits the layout.
    pub const MAX_TIMESTAMP: u64 = Self::TIMESTAMP_MASK;

    /// Largest iteration that fits the layout, and the default max sequence.
    pub const MAX_ITERATION: u16 = Self::ITERATION_MASK as u16;

    /// Packs the three fields into an ID.
    ///
    /// No masking is applied: a field wider than its slot would corrupt its
    /// neighbours, so callers must respect the widths. The generator does;
    /// debug builds assert it.
    pub const fn from_components(timestamp: u64, node_id: u8, iteration: u16) -> Self {
        debug_assert!(timestamp <= Self::TIMESTAMP_MASK, "timestamp overflow");
        debug_assert!((iteration as u64) <= Self::ITERATION_MASK, "iteration overflow");
        Self {
            id: (timestamp << Self::TIMESTAMP_SHIFT)
                | ((node_id as u64) << Self::NODE_ID_SHIFT)
                | iteration as u64,
        }
    }

    /// Reinterprets a raw value previously obtained from [`Self::to_raw`].
    pub const fn from_value(id: u64) -> Self {
        Self { id }
    }

    /// The raw 64-bit value.
    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Extracts the timestamp (elapsed ticks since the epoch).
    pub const fn timestamp(&self) -> u64 {
        self.id >> Self::TIMESTAMP_SHIFT
    }

    /// Extracts the node ID.
    pub const fn node_id(&self) -> u8 {
        ((self.id >> Self::NODE_ID_SHIFT) & Self::NODE_ID_MASK) as u8
    }

    /// Extracts the iteration within the tick.
    pub const fn iteration(&self) -> u16 {
        (self.id & Self::ITERATION_MASK) as u16
    }

    /// Whole seconds since the epoch, given the tick length the ID was
    /// generated with.
    pub const fn seconds(&self, granularity: Granularity) -> u64 {
        self.timestamp() / granularity.ticks_per_second()
    }

    /// Whole minutes since the epoch.
    pub const fn minutes(&self, granularity: Granularity) -> u64 {
        self.seconds(granularity) / 60
    }

    /// Whole hours since the epoch.
    pub const fn hours(&self, granularity: Granularity) -> u64 {
        self.minutes(granularity) / 60
    }

    /// Whole days since the epoch.
    pub const fn days(&self, granularity: Granularity) -> u64 {
        self.hours(granularity) / 24
    }

    /// Whole weeks since the epoch.
    pub const fn weeks(&self, granularity: Granularity) -> u64 {
        self.days(granularity) / 7
    }

    /// Time elapsed between the epoch and this ID's tick.
    pub const fn elapsed(&self, granularity: Granularity) -> Duration {
        granularity.to_duration(self.timestamp())
    }

    /// Returns the ID as a zero-padded 20-digit string, which sorts
    /// lexicographically in numeric order.
    pub fn to_padded_string(&self) -> String {
        format!("{:020}", self.id)
    }
}

impl From<u64> for SnowflakeId {
    fn from(id: u64) -> Self {
        Self::from_value(id)
    }
}

impl From<SnowflakeId> for u64 {
    fn from(id: SnowflakeId) -> Self {
        id.to_raw()
    }
}

impl FromStr for SnowflakeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.parse::<u64>()
            .map(Self::from_value)
            .map_err(|e| Error::InvalidId {
                input: s.to_owned(),
                reason: e.to_string(),
            })
    }
}

impl fmt::Display for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !f.alternate() {
            return f
                .debug_struct("SnowflakeId")
                .field("id", &self.id)
                .field("timestamp", &self.timestamp())
                .field("node_id", &self.node_id())
                .field("iteration", &self.iteration())
                .finish();
        }
        write_bit_layout(f, self)
    }
}

struct Field {
    name: &'static str,
    bits: u8,
    value: u64,
}

/// Renders the `{:#?}` table:
///
/// ```text
/// SnowflakeId(6823236456859828225) {
///         +------------------+---------------+------------------+
///         |  timestamp (42)  |  node_id (8)  |  iteration (14)  |
///         +------------------+---------------+------------------+
///         |  1626786340918   |      128      |        1         |
///         |  0x17ac405a036   |      0x80     |       0x1        |
///         +------------------+---------------+------------------+
/// }
/// ```
fn write_bit_layout(f: &mut fmt::Formatter<'_>, id: &SnowflakeId) -> fmt::Result {
    let fields = [
        Field {
            name: "timestamp",
            bits: 42,
            value: id.timestamp(),
        },
        Field {
            name: "node_id",
            bits: 8,
            value: u64::from(id.node_id()),
        },
        Field {
            name: "iteration",
            bits: 14,
            value: u64::from(id.iteration()),
        },
    ];

    let rows: Vec<[String; 3]> = fields
        .iter()
        .map(|field| {
            [
                format!("{} ({})", field.name, field.bits),
                field.value.to_string(),
                format!("0x{:x}", field.value),
            ]
        })
        .collect();
    let widths: Vec<usize> = rows
        .iter()
        .map(|cells| cells.iter().map(String::len).max().unwrap_or(0) + 4)
        .collect();

    let border = |f: &mut fmt::Formatter<'_>| -> fmt::Result {
        write!(f, "        +")?;
        for &w in &widths {
            write!(f, "{}+", "-".repeat(w))?;
        }
        writeln!(f)
    };
    let line = |f: &mut fmt::Formatter<'_>, row: usize| -> fmt::Result {
        write!(f, "        |")?;
        for (cells, &w) in rows.iter().zip(&widths) {
            write!(f, "{:^w$}|", cells[row])?;
        }
        writeln!(f)
    };

    writeln!(f, "SnowflakeId({}) {{", id.id)?;
    border(f)?;
    line(f, 0)?;
    border(f)?;
    line(f, 1)?;
    line(f, 2)?;
    border(f)?;
    write!(f, "}}")
}
