use serde::Serialize;

/// Zero-based index of a simulated user. Doubles as the ChaCha stream id
/// when each user draws from their own stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct UserId(pub u64);

/// One-based simulated week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Week(pub u32);

impl Week {
    pub fn first() -> Self {
        Week(1)
    }

    pub fn next(self) -> Self {
        Week(self.0 + 1)
    }
}

/// Per-user line of the NDJSON result stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UserTotal {
    pub user: UserId,
    pub points: u64,
}
